//! Splitting blocks that hold several `shouldRespondWith` assertions.
//!
//! Only read-only sequences are split. The check is purely syntactic: a span
//! naming a write helper or a write method constant refuses the split.

use std::sync::LazyLock;

use regex::Regex;

/// Line-leading tokens that start a new request expression.
const REQUEST_STARTS: &[&str] = &["get \"", "post \"", "patch \"", "request "];

static MUTATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(post|patch|request\s+method(Delete|Put|Post|Patch))\b")
        .expect("static mutation pattern")
});

/// Byte offsets of every line whose first token starts a request.
fn request_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut offset = 0usize;
    for line in text.split('\n') {
        let stripped = line.trim_start();
        if REQUEST_STARTS.iter().any(|t| stripped.starts_with(t)) {
            starts.push(offset);
        }
        offset += line.len() + 1;
    }
    starts
}

pub fn is_mutating(span: &str) -> bool {
    MUTATING.is_match(span)
}

/// Slice `text` at request boundaries.
///
/// With fewer than two boundaries the whole text comes back as one span.
/// Text before the first boundary (the `it` header) is dropped. Returns
/// `None` when any span contains a mutating request.
pub fn split_assertions(text: &str) -> Option<Vec<&str>> {
    let starts = request_starts(text);
    let spans: Vec<&str> = if starts.len() < 2 {
        vec![text]
    } else {
        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(text.len());
                &text[start..end]
            })
            .collect()
    };

    if spans.iter().any(|span| is_mutating(span)) {
        return None;
    }
    Some(spans)
}

/// Append ` (n)` to the innermost description element.
pub fn numbered(description: &[String], n: usize) -> Vec<String> {
    let mut out = description.to_vec();
    if let Some(last) = out.last_mut() {
        last.push_str(&format!(" ({})", n));
    }
    out
}
