//! Response header matchers from `matchHeaders = [...]`.

use crate::lexer::{self, Cursor};
use crate::schema::{Header, HeaderMatcher};

/// Named content-type matchers and the exact header value each expands to.
const CONTENT_TYPE_MATCHERS: &[(&str, &str)] = &[
    ("matchContentTypeJson", "application/json; charset=utf-8"),
    (
        "matchContentTypeSingular",
        "application/vnd.pgrst.object+json; charset=utf-8",
    ),
    (
        "matchCTArrayStrip",
        "application/vnd.pgrst.array+json;nulls=stripped; charset=utf-8",
    ),
    (
        "matchCTSingularStrip",
        "application/vnd.pgrst.object+json;nulls=stripped; charset=utf-8",
    ),
];

type MatcherShape = fn(&str) -> Option<HeaderMatcher>;

const MATCHER_SHAPES: &[MatcherShape] = &[
    exact_infix,
    absent_content_type,
    absent_named,
    content_type_helper,
];

/// `"Name" <:> "Value"` anywhere in the expression.
fn exact_infix(expr: &str) -> Option<HeaderMatcher> {
    let op = expr.find("<:>")?;
    let left = expr[..op].trim_end();
    let right = expr[op + 3..].trim_start();

    let name_raw = left.strip_suffix('"').and_then(|l| {
        let open = l.rfind('"')?;
        Some(&l[open + 1..])
    })?;
    let value_raw = Cursor::new(right).take_quoted()?;
    if name_raw.is_empty() || value_raw.is_empty() {
        return None;
    }
    Some(HeaderMatcher::Exact {
        name: lexer::unescape(name_raw),
        value: lexer::unescape(value_raw),
    })
}

fn absent_arg(expr: &str) -> Option<Cursor<'_>> {
    let at = lexer::find_word(expr, "matchHeaderAbsent", 0)?;
    let mut c = Cursor::new(&expr[at + "matchHeaderAbsent".len()..]);
    if c.skip_ws() == 0 {
        return None;
    }
    Some(c)
}

fn absent_content_type(expr: &str) -> Option<HeaderMatcher> {
    let mut c = absent_arg(expr)?;
    c.eat_word("hContentType").then(|| HeaderMatcher::Absent {
        name: "Content-Type".to_owned(),
    })
}

fn absent_named(expr: &str) -> Option<HeaderMatcher> {
    let mut c = absent_arg(expr)?;
    let name = c.take_quoted().filter(|s| !s.is_empty())?;
    Some(HeaderMatcher::Absent {
        name: lexer::unescape(name),
    })
}

fn content_type_helper(expr: &str) -> Option<HeaderMatcher> {
    CONTENT_TYPE_MATCHERS
        .iter()
        .find(|(helper, _)| lexer::find_word(expr, helper, 0).is_some())
        .map(|(_, value)| HeaderMatcher::Exact {
            name: "Content-Type".to_owned(),
            value: (*value).to_owned(),
        })
}

/// Resolve one matcher expression, or `None` if it is not recognised.
pub fn resolve_matcher(expr: &str) -> Option<HeaderMatcher> {
    let expr = expr.trim();
    MATCHER_SHAPES.iter().find_map(|shape| shape(expr))
}

/// Header constraints collected from a matcher list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchHeaders {
    pub exact: Vec<Header>,
    pub absent: Vec<String>,
    pub contain: Vec<Header>,
}

impl MatchHeaders {
    fn push(&mut self, matcher: HeaderMatcher) {
        match matcher {
            HeaderMatcher::Exact { name, value } => self.exact.push(Header(name, value)),
            HeaderMatcher::Absent { name } => self.absent.push(name),
            HeaderMatcher::Contain { name, value } => self.contain.push(Header(name, value)),
        }
    }
}

/// Parse a bracketed matcher list. Fails as a whole if any element is not
/// recognised.
pub fn parse_match_headers(raw: &str) -> Option<MatchHeaders> {
    let s = raw.trim();
    let inner = match s.strip_prefix('[') {
        Some(open) => open.strip_suffix(']')?,
        None => s,
    };

    let mut out = MatchHeaders::default();
    for element in lexer::split_top_level(inner, b',') {
        out.push(resolve_matcher(element)?);
    }
    Some(out)
}
