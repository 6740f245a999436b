//! Expected-response side: everything after `shouldRespondWith`.

use serde_json::Value;

use crate::lexer::{self, Cursor};
use crate::request::quasi_content;
use crate::resolve::{parse_match_headers, parse_relaxed_json};
use crate::schema::Expected;

const DEFAULT_STATUS: u16 = 200;
const MATCH_FIELDS: &[&str] = &["matchStatus", "matchHeaders"];

fn valid_status(n: u64) -> Option<u16> {
    u16::try_from(n).ok().filter(|s| (100..=599).contains(s))
}

/// Parse the expected-response expression.
///
/// Returns `None` when a body literal is present but cannot be resolved or
/// a status falls outside 100..=599.
pub fn parse_expected(text: &str) -> Option<Expected> {
    let s = text.trim();

    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return valid_status(s.parse().ok()?).map(Expected::status_only);
    }

    let mut expected = Expected::status_only(DEFAULT_STATUS);
    expected.body = expected_body(s)?;

    if let Some(block) = match_attributes(s) {
        if let Some(status) = field_value(block, "matchStatus") {
            expected.status = valid_status(Cursor::new(status).take_uint()?)?;
        }
        if let Some(list) = field_value(block, "matchHeaders").and_then(bracketed) {
            match parse_match_headers(list) {
                Some(matched) => {
                    expected.headers = matched.exact;
                    expected.headers_absent = matched.absent;
                    expected.headers_contain = matched.contain;
                }
                None => {
                    tracing::warn!(
                        headers = list,
                        "unrecognised header matcher, header checks dropped"
                    );
                }
            }
        }
    }

    Some(expected)
}

/// The expected body: a quasi-literal anywhere, else a string literal at the
/// very start. `Some(None)` means there is no body to check.
fn expected_body(s: &str) -> Option<Option<Value>> {
    if let Some(content) = quasi_content(s) {
        return parse_relaxed_json(content).ok().map(Some);
    }
    if s.starts_with('"') {
        let close = lexer::closing_quote(s, 0)?;
        let text = lexer::unescape(&s[1..close]);
        if text.is_empty() {
            return Some(Some(Value::String(text)));
        }
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        return Some(Some(body));
    }
    Some(None)
}

/// Contents of the first `{ matchStatus ... }` / `{ matchHeaders ... }`
/// record, without its braces.
fn match_attributes(s: &str) -> Option<&str> {
    let mut from = 0usize;
    while let Some(offset) = s[from..].find('{') {
        let open = from + offset;
        let after = s[open + 1..].trim_start();
        if MATCH_FIELDS.iter().any(|f| after.starts_with(f)) {
            let close = lexer::find_matching(s, open, b'{', b'}')?;
            return Some(&s[open + 1..close]);
        }
        from = open + 1;
    }
    None
}

/// Text following `<field> =` inside a match-attributes record.
fn field_value<'a>(block: &'a str, field: &str) -> Option<&'a str> {
    let at = lexer::find_word(block, field, 0)?;
    let mut c = Cursor::new(&block[at + field.len()..]);
    c.skip_ws();
    if !c.eat("=") {
        return None;
    }
    c.skip_ws();
    Some(c.rest())
}

/// The leading `[...]` of `s`, brackets included.
fn bracketed(s: &str) -> Option<&str> {
    if !s.starts_with('[') {
        return None;
    }
    let close = lexer::find_matching(s, 0, b'[', b']')?;
    Some(&s[..=close])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Header;
    use serde_json::json;

    #[test]
    fn bare_status_shorthand() {
        let e = parse_expected(" 200\n").unwrap();
        assert_eq!(e, Expected::status_only(200));
    }

    #[test]
    fn out_of_range_status_is_rejected() {
        assert_eq!(parse_expected("42"), None);
        assert_eq!(parse_expected("[json|[]|] { matchStatus = 700 }"), None);
    }

    #[test]
    fn quasi_body_defaults_to_200() {
        let e = parse_expected("[json|[{id: 1}]|]").unwrap();
        assert_eq!(e.status, 200);
        assert_eq!(e.body, Some(json!([{"id": 1}])));
        assert!(e.body_exact);
    }

    #[test]
    fn quasi_body_with_match_attributes() {
        let e = parse_expected(
            r#"[json|{"message": "x"}|] { matchStatus = 404, matchHeaders = [matchContentTypeJson] }"#,
        )
        .unwrap();
        assert_eq!(e.status, 404);
        assert_eq!(e.body, Some(json!({"message": "x"})));
        assert_eq!(
            e.headers,
            vec![Header::new("Content-Type", "application/json; charset=utf-8")]
        );
    }

    #[test]
    fn json_braces_are_not_match_attributes() {
        let e = parse_expected(r#"[json|{"matchStatus": 1}|]"#).unwrap();
        assert_eq!(e.status, 200);
    }

    #[test]
    fn empty_string_body_is_checkable() {
        let e = parse_expected(r#""" { matchStatus = 204, matchHeaders = [matchHeaderAbsent hContentType] }"#)
            .unwrap();
        assert_eq!(e.status, 204);
        assert_eq!(e.body, Some(json!("")));
        assert_eq!(e.headers_absent, vec!["Content-Type".to_string()]);
    }

    #[test]
    fn string_body_decodes_json_when_possible() {
        let e = parse_expected(r#""[{\"id\":1}]""#).unwrap();
        assert_eq!(e.body, Some(json!([{"id": 1}])));

        let e = parse_expected(r#""id,name\n1,x""#).unwrap();
        assert_eq!(e.body, Some(json!("id,name\n1,x")));
    }

    #[test]
    fn unparseable_quasi_body_fails() {
        assert_eq!(parse_expected("[json|{id: }|]"), None);
    }

    #[test]
    fn multi_line_record_with_nested_brackets() {
        let e = parse_expected(
            "[json|[]|]\n  { matchHeaders = [ \"Content-Range\" <:> \"*/0\"\n                 , matchHeaderAbsent \"Location\" ]\n  }",
        )
        .unwrap();
        assert_eq!(e.headers, vec![Header::new("Content-Range", "*/0")]);
        assert_eq!(e.headers_absent, vec!["Location".to_string()]);
    }

    #[test]
    fn unknown_matcher_keeps_status_and_drops_headers() {
        let e = parse_expected("\"\" { matchStatus = 201, matchHeaders = [customMatcher] }").unwrap();
        assert_eq!(e.status, 201);
        assert!(e.headers.is_empty());
        assert!(e.headers_absent.is_empty());
    }

    #[test]
    fn status_only_record() {
        let e = parse_expected("\"\" { matchStatus = 201 }").unwrap();
        assert_eq!(e.status, 201);
        assert_eq!(e.body, Some(json!("")));
    }
}
