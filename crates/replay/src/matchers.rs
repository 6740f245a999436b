//! Response assertions against an `Expected` block.

use std::fmt;

use serde_json::Value;
use specport_core::Expected;

use crate::client::HttpResponse;

/// One failed expectation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    Status { expected: u16, got: u16 },
    Body { expected: Value, got: String },
    NotJson { got: String },
    Header {
        name: String,
        expected: String,
        got: Option<String>,
    },
    HeaderPresent { name: String, got: String },
    HeaderLacks {
        name: String,
        needle: String,
        got: Option<String>,
    },
}

const SNIPPET_LEN: usize = 200;

fn snippet(s: &str) -> &str {
    match s.char_indices().nth(SNIPPET_LEN) {
        Some((at, _)) => &s[..at],
        None => s,
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Status { expected, got } => {
                write!(f, "status: expected {}, got {}", expected, got)
            }
            Mismatch::Body { expected, got } => write!(
                f,
                "body mismatch:\n--- expected\n{}\n+++ got\n{}",
                serde_json::to_string_pretty(expected).unwrap_or_default(),
                snippet(got)
            ),
            Mismatch::NotJson { got } => {
                write!(f, "expected JSON body but got: {}", snippet(got))
            }
            Mismatch::Header {
                name,
                expected,
                got,
            } => write!(f, "header {}: expected {:?}, got {:?}", name, expected, got),
            Mismatch::HeaderPresent { name, got } => {
                write!(f, "header {} should be absent, got {:?}", name, got)
            }
            Mismatch::HeaderLacks { name, needle, got } => {
                write!(f, "header {}: expected to contain {:?}, got {:?}", name, needle, got)
            }
        }
    }
}

/// Check `resp` against `expected`, collecting every mismatch.
pub fn check_response(resp: &HttpResponse, expected: &Expected) -> Vec<Mismatch> {
    let mut out = Vec::new();

    if resp.status != expected.status {
        out.push(Mismatch::Status {
            expected: expected.status,
            got: resp.status,
        });
    }

    if let Some(body) = &expected.body {
        check_body(resp, body, expected.body_exact, &mut out);
    }

    for h in &expected.headers {
        let got = resp.header(h.name());
        if got != Some(h.value()) {
            out.push(Mismatch::Header {
                name: h.name().to_owned(),
                expected: h.value().to_owned(),
                got: got.map(str::to_owned),
            });
        }
    }

    for name in &expected.headers_absent {
        if let Some(got) = resp.header(name) {
            out.push(Mismatch::HeaderPresent {
                name: name.clone(),
                got: got.to_owned(),
            });
        }
    }

    for h in &expected.headers_contain {
        let got = resp.header(h.name());
        if !got.is_some_and(|v| v.contains(h.value())) {
            out.push(Mismatch::HeaderLacks {
                name: h.name().to_owned(),
                needle: h.value().to_owned(),
                got: got.map(str::to_owned),
            });
        }
    }

    out
}

fn check_body(resp: &HttpResponse, expected: &Value, exact: bool, out: &mut Vec<Mismatch>) {
    // A string body is compared as raw text (an empty string means "no body").
    if let Value::String(text) = expected {
        if resp.body != *text {
            out.push(Mismatch::Body {
                expected: expected.clone(),
                got: resp.body.clone(),
            });
        }
        return;
    }

    let actual: Value = match serde_json::from_str(&resp.body) {
        Ok(v) => v,
        Err(_) => {
            out.push(Mismatch::NotJson {
                got: resp.body.clone(),
            });
            return;
        }
    };

    let matched = if exact {
        json_equal(expected, &actual)
    } else {
        json_subset(expected, &actual)
    };
    if !matched {
        out.push(Mismatch::Body {
            expected: expected.clone(),
            got: resp.body.clone(),
        });
    }
}

/// Deep equality of two JSON values, normalizing number types.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(am), Value::Object(bm)) => {
            am.len() == bm.len()
                && am
                    .iter()
                    .all(|(k, v)| bm.get(k).is_some_and(|bv| json_equal(v, bv)))
        }
        (Value::Array(av), Value::Array(bv)) => {
            av.len() == bv.len() && av.iter().zip(bv).all(|(a, b)| json_equal(a, b))
        }
        (Value::Number(an), Value::Number(bn)) => an.as_f64() == bn.as_f64(),
        _ => a == b,
    }
}

/// `expected` is contained in `actual`: objects may carry extra keys,
/// arrays must match element-wise at equal length.
pub fn json_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(em), Value::Object(am)) => em
            .iter()
            .all(|(k, v)| am.get(k).is_some_and(|av| json_subset(v, av))),
        (Value::Array(ev), Value::Array(av)) => {
            ev.len() == av.len() && ev.iter().zip(av).all(|(e, a)| json_subset(e, a))
        }
        _ => json_equal(expected, actual),
    }
}
