//! Complexity triage: constructs the schema cannot express.
//!
//! A block containing any of these is flagged before structural parsing.
//! Patterns are tried in order and the first hit supplies the reason.

use std::sync::LazyLock;

use regex::Regex;

struct Disallow {
    pattern: Regex,
    reason: &'static str,
}

const DISALLOW_SOURCES: &[(&str, &str)] = &[
    (r"\bliftIO\b", "liftIO — side-effect"),
    (r"\bpendingWith\b", "pendingWith — skipped upstream"),
    (r"\\\s*_\s*->", "lambda pattern"),
    (r"\banalyzeTable\b", "analyzeTable — psql shell-out"),
    (r"\bsimpleBody\b", "simpleBody — custom assertion"),
    (r"\bsimpleHeaders\b", "simpleHeaders — custom assertion"),
    (r"\bsimpleStatus\b", "simpleStatus — custom assertion"),
    (r"\bshouldSatisfy\b", "shouldSatisfy — custom predicate"),
    (r"\bshouldBe\b", "shouldBe — custom assertion"),
];

static DISALLOWED: LazyLock<Vec<Disallow>> = LazyLock::new(|| {
    DISALLOW_SOURCES
        .iter()
        .map(|&(src, reason)| Disallow {
            pattern: Regex::new(src).expect("static disallow pattern"),
            reason,
        })
        .collect()
});

/// The reason of the first disallowed construct found in `cleaned`
/// (comment-stripped block text), if any.
pub fn disallowed_construct(cleaned: &str) -> Option<&'static str> {
    DISALLOWED
        .iter()
        .find(|d| d.pattern.is_match(cleaned))
        .map(|d| d.reason)
}
