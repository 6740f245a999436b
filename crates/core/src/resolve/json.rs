//! Relaxed JSON as written inside `[json| ... |]` quasi-literals.
//!
//! Upstream specs lean on the quasi-quoter's leniency: object keys are
//! often bare identifiers and the odd literal uses single quotes. Parsing
//! is strict first, then retried with those two relaxations applied.

use serde_json::Value;

/// The input could not be read as JSON even after relaxation.
///
/// Distinct from a successful parse of the literal `null`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unparseable JSON literal: {snippet}")]
pub struct UnparseableJson {
    pub snippet: String,
}

pub fn parse_relaxed_json(input: &str) -> Result<Value, UnparseableJson> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    if let Ok(v) = serde_json::from_str(trimmed) {
        return Ok(v);
    }

    let quoted = quote_bare_keys(trimmed);
    if let Ok(v) = serde_json::from_str(&quoted) {
        return Ok(v);
    }

    serde_json::from_str(&quoted.replace('\'', "\"")).map_err(|_| UnparseableJson {
        snippet: trimmed.chars().take(80).collect(),
    })
}

/// Wrap every bare identifier key in double quotes.
///
/// A key is an identifier whose previous non-space byte is `{` or `,` and
/// whose next non-space byte is `:`. String contents are left alone.
fn quote_bare_keys(src: &str) -> String {
    let bytes = src.as_bytes();
    let mut out = String::with_capacity(src.len() + 16);
    let mut prev_significant: Option<u8> = None;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'"' {
            let end = crate::lexer::closing_quote(src, i).unwrap_or(bytes.len() - 1);
            out.push_str(&src[i..=end]);
            prev_significant = Some(b'"');
            i = end + 1;
            continue;
        }

        let starts_key = (b.is_ascii_alphabetic() || b == b'_')
            && matches!(prev_significant, Some(b'{') | Some(b','));
        if starts_key {
            let len = bytes[i..]
                .iter()
                .take_while(|c| crate::lexer::is_ident_byte(**c))
                .count();
            let ident = &src[i..i + len];
            let after = src[i + len..].trim_start();
            if after.starts_with(':') {
                out.push('"');
                out.push_str(ident);
                out.push('"');
            } else {
                out.push_str(ident);
            }
            prev_significant = Some(bytes[i + len - 1]);
            i += len;
            continue;
        }

        let ch_len = src[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&src[i..i + ch_len]);
        if !b.is_ascii_whitespace() {
            prev_significant = Some(b);
        }
        i += ch_len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_json_passes_through() {
        let v = parse_relaxed_json(r#"{"id":1,"name":"x"}"#).unwrap();
        assert_eq!(v, json!({"id": 1, "name": "x"}));
    }

    #[test]
    fn bare_keys_are_quoted() {
        let relaxed = parse_relaxed_json(r#"{id: 1, name: "x"}"#).unwrap();
        let strict = parse_relaxed_json(r#"{"id":1,"name":"x"}"#).unwrap();
        assert_eq!(relaxed, strict);
    }

    #[test]
    fn nested_bare_keys_in_arrays() {
        let v = parse_relaxed_json(r#"[{id: 1, tags: [{k: "a"}]}, {id: 2, tags: []}]"#).unwrap();
        assert_eq!(
            v,
            json!([{"id": 1, "tags": [{"k": "a"}]}, {"id": 2, "tags": []}])
        );
    }

    #[test]
    fn identifiers_inside_strings_are_untouched() {
        let v = parse_relaxed_json(r#"{msg: "{a: 1, b: 2}"}"#).unwrap();
        assert_eq!(v, json!({"msg": "{a: 1, b: 2}"}));
    }

    #[test]
    fn literal_keywords_are_not_keys() {
        let v = parse_relaxed_json("{a: true, b: null, c: [false]}").unwrap();
        assert_eq!(v, json!({"a": true, "b": null, "c": [false]}));
    }

    #[test]
    fn single_quotes_are_last_resort() {
        let v = parse_relaxed_json("{'a': 'b'}").unwrap();
        assert_eq!(v, json!({"a": "b"}));
    }

    #[test]
    fn json_null_is_not_a_failure() {
        assert_eq!(parse_relaxed_json("null"), Ok(Value::Null));
        assert_eq!(parse_relaxed_json("   "), Ok(Value::Null));
    }

    #[test]
    fn garbage_is_unparseable() {
        let err = parse_relaxed_json("{id: }").unwrap_err();
        assert!(err.snippet.contains("id"));
    }

    #[test]
    fn reparsing_serialized_output_is_stable() {
        for src in [
            r#"{id: 1, name: "x", nested: {deep: [1, 2.5, "s"]}}"#,
            r#"[{"a": null}, {b: "--"}]"#,
            r#""just a string""#,
        ] {
            let first = parse_relaxed_json(src).unwrap();
            let again = parse_relaxed_json(&serde_json::to_string(&first).unwrap()).unwrap();
            assert_eq!(first, again, "input: {}", src);
        }
    }
}
