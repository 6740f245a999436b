//! Typed structs for the extracted test schema.
//!
//! The JSON shape is consumed by the replay harness and by external
//! runners, so field names follow the canonical camelCase spelling.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// One `(name, value)` header pair. Names may repeat within a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header(pub String, pub String);

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Header(name.into(), value.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> &str {
        &self.1
    }
}

/// A single expectation on a response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMatcher {
    Exact { name: String, value: String },
    Absent { name: String },
    Contain { name: String, value: String },
}

/// The HTTP methods a test case may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Parse a canonical upper-case method token.
    pub fn from_token(token: &str) -> Option<Method> {
        match token {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// GET and HEAD requests never carry a body on the wire.
    pub fn sends_body(self) -> bool {
        !matches!(self, Method::Get | Method::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: Vec<Header>,
    /// `None` means no body is sent.
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expected {
    pub status: u16,
    /// `None` (JSON `null`) skips the body check; `Some("")` checks for an
    /// empty body.
    pub body: Option<Value>,
    pub body_exact: bool,
    pub headers: Vec<Header>,
    pub headers_absent: Vec<String>,
    pub headers_contain: Vec<Header>,
}

impl Expected {
    /// Expectation of a bare status with no body or header checks.
    pub fn status_only(status: u16) -> Self {
        Expected {
            status,
            body: None,
            body_exact: true,
            headers: Vec::new(),
            headers_absent: Vec::new(),
            headers_contain: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub description: Vec<String>,
    pub request: Request,
    pub expected: Expected,
}

// ──────────────────────────────────────────────
// Flagged blocks
// ──────────────────────────────────────────────

/// Why a leaf test was not converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagReason {
    /// A disallowed construct matched; carries its fixed reason text.
    Disallowed(&'static str),
    NoAssertion,
    ParseFailure,
    SplitParseFailure,
    MutatingMultiAssertion,
}

impl fmt::Display for FlagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagReason::Disallowed(reason) => f.write_str(reason),
            FlagReason::NoAssertion => f.write_str("no shouldRespondWith found"),
            FlagReason::ParseFailure => f.write_str("parse failure"),
            FlagReason::SplitParseFailure => f.write_str("parse failure in split block"),
            FlagReason::MutatingMultiAssertion => {
                f.write_str("multiple shouldRespondWith with mutations")
            }
        }
    }
}

impl Serialize for FlagReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedTest {
    pub description: Vec<String>,
    pub reason: FlagReason,
    /// 1-based line of the `it` declaration.
    pub line: usize,
    pub source: String,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub file: String,
    pub config: String,
    pub tests: Vec<TestCase>,
    pub flagged: Vec<FlaggedTest>,
}

impl ParseResult {
    /// The serialisable per-file document (flagged entries are reported
    /// separately).
    pub fn to_document(&self) -> SpecDocument {
        SpecDocument {
            file: self.file.clone(),
            config: self.config.clone(),
            tests: self.tests.clone(),
        }
    }
}

/// On-disk form of one extracted spec file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecDocument {
    pub file: String,
    pub config: String,
    pub tests: Vec<TestCase>,
}

/// A flagged test tagged with the spec it came from.
#[derive(Debug, Clone, Serialize)]
pub struct FlaggedEntry {
    #[serde(flatten)]
    pub flagged: FlaggedTest,
    pub file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub total_files: usize,
    pub total_tests: usize,
    pub total_flagged: usize,
    pub files: Vec<FileStats>,
}

impl RunStats {
    pub fn record(&mut self, name: &str, result: &ParseResult) {
        self.total_files += 1;
        self.total_tests += result.tests.len();
        self.total_flagged += result.flagged.len();
        self.files.push(FileStats {
            name: name.to_owned(),
            tests: result.tests.len(),
            flagged: result.flagged.len(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub name: String,
    pub tests: usize,
    pub flagged: usize,
}
