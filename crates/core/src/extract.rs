//! Per-file extraction: segment, triage, dispatch on assertion count.

use crate::expect::parse_expected;
use crate::lexer::strip_comments;
use crate::request::parse_request;
use crate::resolve::LetBindings;
use crate::schema::{FlagReason, FlaggedTest, ParseResult, TestCase};
use crate::segment::{RawBlock, Segmenter};
use crate::split::{numbered, split_assertions};
use crate::triage::disallowed_construct;

/// Infix token separating a request from its expected response.
pub const ASSERTION_SEPARATOR: &str = "`shouldRespondWith`";

/// Strip the `Spec.hs` (or plain `.hs`) suffix from a file name.
pub fn spec_file_name(filename: &str) -> &str {
    filename
        .strip_suffix("Spec.hs")
        .or_else(|| filename.strip_suffix(".hs"))
        .unwrap_or(filename)
}

/// Extract every leaf test from one source file.
///
/// Never fails: blocks that cannot be converted are returned as flagged
/// entries, one per leaf (or per split span).
pub fn extract_file(filename: &str, source: &str, config: &str) -> ParseResult {
    let mut out = ParseResult {
        file: spec_file_name(filename).to_owned(),
        config: config.to_owned(),
        tests: Vec::new(),
        flagged: Vec::new(),
    };

    let mut segmenter = Segmenter::new(source);
    while let Some(block) = segmenter.next_block() {
        process_block(block, segmenter.bindings(), &mut out);
    }

    tracing::debug!(
        file = %out.file,
        tests = out.tests.len(),
        flagged = out.flagged.len(),
        "extracted"
    );
    out
}

fn process_block(block: RawBlock, bindings: &LetBindings, out: &mut ParseResult) {
    let cleaned = strip_comments(&block.text);

    let flag = |description: Vec<String>, reason: FlagReason, source: &str| {
        tracing::debug!(line = block.line, %reason, "flagged");
        FlaggedTest {
            description,
            reason,
            line: block.line,
            source: source.trim().to_owned(),
        }
    };

    // Descriptions must be non-empty at every level.
    if block.description.iter().any(|d| d.is_empty()) {
        let f = flag(block.description, FlagReason::ParseFailure, &block.text);
        out.flagged.push(f);
        return;
    }

    if let Some(reason) = disallowed_construct(&cleaned) {
        let f = flag(block.description, FlagReason::Disallowed(reason), &block.text);
        out.flagged.push(f);
        return;
    }

    match cleaned.matches(ASSERTION_SEPARATOR).count() {
        0 => {
            let f = flag(block.description, FlagReason::NoAssertion, &block.text);
            out.flagged.push(f);
        }
        1 => match parse_single(&cleaned, bindings) {
            Some((request, expected)) => out.tests.push(TestCase {
                description: block.description,
                request,
                expected,
            }),
            None => {
                let f = flag(block.description, FlagReason::ParseFailure, &block.text);
                out.flagged.push(f);
            }
        },
        _ => {
            let Some(spans) = split_assertions(&cleaned) else {
                let f = flag(
                    block.description,
                    FlagReason::MutatingMultiAssertion,
                    &block.text,
                );
                out.flagged.push(f);
                return;
            };
            tracing::debug!(line = block.line, spans = spans.len(), "split block");

            for (i, span) in spans.iter().enumerate() {
                let description = numbered(&block.description, i + 1);
                match parse_single(span, bindings) {
                    Some((request, expected)) => out.tests.push(TestCase {
                        description,
                        request,
                        expected,
                    }),
                    None => {
                        let f = flag(description, FlagReason::SplitParseFailure, span);
                        out.flagged.push(f);
                    }
                }
            }
        }
    }
}

/// Parse text holding one request and (at least) one assertion. Only the
/// first separator is significant.
fn parse_single(
    text: &str,
    bindings: &LetBindings,
) -> Option<(crate::schema::Request, crate::schema::Expected)> {
    let (request_part, expected_part) = text.split_once(ASSERTION_SEPARATOR)?;
    let request = parse_request(request_part, bindings)?;
    let expected = parse_expected(expected_part)?;
    Some((request, expected))
}
