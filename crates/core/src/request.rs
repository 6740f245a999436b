//! Request side of a test: `get`, `post` and the generic `request` form.

use serde_json::Value;

use crate::lexer::{self, Cursor, QUASI_CLOSE, QUASI_OPEN};
use crate::resolve::{parse_relaxed_json, resolve_header_list, resolve_method, LetBindings};
use crate::schema::{Method, Request};

/// A structural match of the request expression, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestShape<'a> {
    /// `get "<path>"`
    Get { path: &'a str },
    /// `post "<path>" <body>`
    Post { path: &'a str, body: &'a str },
    /// `request <method> "<path>" <headers> <body>`
    Generic {
        method: &'a str,
        path: &'a str,
        rest: &'a str,
    },
}

type ShapeMatcher = for<'a> fn(&'a str) -> Option<RequestShape<'a>>;

pub const REQUEST_SHAPES: &[ShapeMatcher] = &[get_shape, post_shape, generic_shape];

/// Cursors positioned just after each word-bounded `keyword` followed by
/// whitespace.
fn after_keyword<'a>(s: &'a str, keyword: &'a str) -> impl Iterator<Item = Cursor<'a>> + 'a {
    let mut from = 0usize;
    std::iter::from_fn(move || {
        while let Some(at) = lexer::find_word(s, keyword, from) {
            from = at + 1;
            let mut c = Cursor::new(&s[at + keyword.len()..]);
            if c.skip_ws() > 0 {
                return Some(c);
            }
        }
        None
    })
}

/// Whitespace then a non-empty remainder.
fn trailing_expr<'a>(c: &mut Cursor<'a>) -> Option<&'a str> {
    if c.skip_ws() == 0 || c.at_end() {
        return None;
    }
    Some(c.rest().trim_end())
}

pub fn get_shape(s: &str) -> Option<RequestShape<'_>> {
    after_keyword(s, "get").find_map(|mut c| {
        let path = c.take_quoted()?;
        Some(RequestShape::Get { path })
    })
}

pub fn post_shape(s: &str) -> Option<RequestShape<'_>> {
    after_keyword(s, "post").find_map(|mut c| {
        let path = c.take_quoted()?;
        let body = trailing_expr(&mut c)?;
        Some(RequestShape::Post { path, body })
    })
}

pub fn generic_shape(s: &str) -> Option<RequestShape<'_>> {
    after_keyword(s, "request").find_map(|mut c| {
        let method = c.take_ident()?;
        if c.skip_ws() == 0 {
            return None;
        }
        let path = c.take_quoted()?;
        let rest = trailing_expr(&mut c)?;
        Some(RequestShape::Generic { method, path, rest })
    })
}

/// First request shape found in whitespace-collapsed text.
pub fn request_shape(collapsed: &str) -> Option<RequestShape<'_>> {
    REQUEST_SHAPES.iter().find_map(|m| m(collapsed))
}

/// Parse the text preceding the assertion separator into a request.
pub fn parse_request(text: &str, bindings: &LetBindings) -> Option<Request> {
    let collapsed = lexer::collapse_whitespace(text);
    match request_shape(&collapsed)? {
        RequestShape::Get { path } => Some(Request {
            method: Method::Get,
            path: lexer::unescape(path),
            headers: Vec::new(),
            body: None,
        }),
        RequestShape::Post { path, body } => Some(Request {
            method: Method::Post,
            path: lexer::unescape(path),
            headers: Vec::new(),
            body: extract_body(body)?,
        }),
        RequestShape::Generic { method, path, rest } => {
            let method = Method::from_token(&resolve_method(method))?;
            let (header_expr, body_expr) = split_headers_and_body(rest)?;
            let headers = resolve_header_list(header_expr, bindings).unwrap_or_else(|| {
                tracing::debug!(expr = header_expr, "unresolved header expression, sending none");
                Vec::new()
            });
            Some(Request {
                method,
                path: lexer::unescape(path),
                headers,
                body: extract_body(body_expr)?,
            })
        }
    }
}

/// Markers that begin a body when the header expression is a bare call,
/// in priority order.
const BODY_MARKERS: &[&str] = &[QUASI_OPEN, "\"\"", "mempty", "\""];

/// Split `<headers> <body>` into its two expressions.
///
/// Bracketed and parenthesised header expressions end at their matching
/// delimiter; a parenthesised one loses its outer parens. A bare call ends
/// where the first body marker begins.
pub fn split_headers_and_body(rest: &str) -> Option<(&str, &str)> {
    let s = rest.trim();
    if s.starts_with('[') {
        let close = lexer::find_matching(s, 0, b'[', b']')?;
        return Some((&s[..=close], s[close + 1..].trim()));
    }
    if s.starts_with('(') {
        let close = lexer::find_matching(s, 0, b'(', b')')?;
        return Some((&s[1..close], s[close + 1..].trim()));
    }
    let at = BODY_MARKERS.iter().find_map(|marker| s.find(marker))?;
    Some((s[..at].trim(), s[at..].trim()))
}

/// Resolve a request body expression.
///
/// `Some(None)` is "no body" (`""`, `mempty`, nothing at all); `None` is an
/// expression that could not be understood.
pub fn extract_body(expr: &str) -> Option<Option<String>> {
    let s = expr.trim();
    if s.is_empty() || s == "\"\"" || s == "mempty" {
        return Some(None);
    }

    if let Some(content) = quasi_content(s) {
        let value = parse_relaxed_json(content).ok()?;
        return serde_json::to_string(&value).ok().map(Some);
    }

    if lexer::closing_quote(s, 0) == Some(s.len() - 1) {
        let text = lexer::unescape(&s[1..s.len() - 1]);
        if text.is_empty() {
            return Some(None);
        }
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(v) => serde_json::to_string(&v).ok()?,
            Err(_) => text,
        };
        return Some(Some(body));
    }

    None
}

/// Content between the first quasi-literal opener and its closer.
pub fn quasi_content(s: &str) -> Option<&str> {
    let start = s.find(QUASI_OPEN)? + QUASI_OPEN.len();
    let end = start + s[start..].find(QUASI_CLOSE)?;
    Some(s[start..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Header;

    fn parse(text: &str) -> Option<Request> {
        parse_request(text, &LetBindings::new())
    }

    #[test]
    fn plain_get() {
        let req = parse("it \"gets a list\" $ get \"/items\"").unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "/items");
        assert!(req.headers.is_empty());
        assert_eq!(req.body, None);
    }

    #[test]
    fn get_path_escapes_are_decoded() {
        let req = parse(r#"get "/items?name=eq.\"x\"""#).unwrap();
        assert_eq!(req.path, r#"/items?name=eq."x""#);
    }

    #[test]
    fn method_constant_is_not_mistaken_for_get() {
        let shape = request_shape(r#"request methodGet "/x" [] """#).unwrap();
        assert!(matches!(shape, RequestShape::Generic { method: "methodGet", .. }));
    }

    #[test]
    fn post_with_quasi_body() {
        let req = parse("post \"/items\"\n  [json| { id: 1, name: \"x\" } |]").unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body.as_deref(), Some(r#"{"id":1,"name":"x"}"#));
    }

    #[test]
    fn post_with_unknown_body_fails() {
        assert_eq!(parse("post \"/items\" (encode payload)"), None);
    }

    #[test]
    fn generic_with_header_list_and_string_body() {
        let req = parse(
            r#"request methodPatch "/items?id=eq.1" [("Prefer", "return=minimal")] "{\"id\": 2}""#,
        )
        .unwrap();
        assert_eq!(req.method, Method::Patch);
        assert_eq!(req.headers, vec![Header::new("Prefer", "return=minimal")]);
        assert_eq!(req.body.as_deref(), Some(r#"{"id":2}"#));
    }

    #[test]
    fn generic_with_parenthesised_range_call() {
        let req = parse(r#"request methodGet "/items" (rangeHdrs $ ByteRangeFromTo 0 1) """#).unwrap();
        assert_eq!(
            req.headers,
            vec![Header::new("Range-Unit", "items"), Header::new("Range", "0-1")]
        );
        assert_eq!(req.body, None);
    }

    #[test]
    fn generic_with_bare_call_and_mempty() {
        let req = parse(r#"request methodHead "/items" planHdr mempty"#).unwrap();
        assert_eq!(req.method, Method::Head);
        assert_eq!(
            req.headers,
            vec![Header::new("Accept", "application/vnd.pgrst.plan+json")]
        );
        assert_eq!(req.body, None);
    }

    #[test]
    fn bare_call_prefers_quasi_marker_over_quotes() {
        let (hdr, body) =
            split_headers_and_body(r#"authHeaderJWT "tok" [json|{"a":1}|]"#).unwrap();
        assert_eq!(hdr, r#"authHeaderJWT "tok""#);
        assert_eq!(body, r#"[json|{"a":1}|]"#);
    }

    #[test]
    fn unresolved_headers_become_empty_list() {
        let req = parse(r#"request methodGet "/items" [someCustomHeader] """#).unwrap();
        assert!(req.headers.is_empty());
    }

    #[test]
    fn headers_resolve_through_bindings() {
        let mut b = LetBindings::new();
        b.insert("csv", r#"acceptHdrs "text/csv""#);
        let req = parse_request(r#"request methodGet "/items" csv """#, &b).unwrap();
        assert_eq!(req.headers, vec![Header::new("Accept", "text/csv")]);
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert_eq!(parse(r#"request methodTrace "/items" [] """#), None);
    }

    #[test]
    fn unbalanced_header_list_is_rejected() {
        assert_eq!(parse(r#"request methodGet "/items" [("A", "b") """#), None);
    }

    #[test]
    fn no_request_expression() {
        assert_eq!(parse("it \"does things\" $ do\n  pure ()"), None);
    }

    #[test]
    fn string_body_that_is_not_json_is_verbatim() {
        assert_eq!(extract_body(r#""a,b\n1,2""#), Some(Some("a,b\n1,2".to_string())));
        assert_eq!(extract_body(r#""""#), Some(None));
        assert_eq!(extract_body("mempty"), Some(None));
    }
}
