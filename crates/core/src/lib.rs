//! specport-core: extraction of hspec-wai HTTP tests into a JSON schema.
//!
//! Turns PostgREST-style `*Spec.hs` sources into [`TestCase`]s, or into
//! [`FlaggedTest`]s when a block cannot be converted without guessing.
//! The crate performs no I/O; callers hand it file contents.
//!
//! # Public API
//!
//! - [`extract_file()`] -- one source file in, one [`ParseResult`] out
//! - [`parse_config_map()`] / [`ConfigMap`] -- config classification from `Main.hs`
//! - Schema types: [`TestCase`], [`Request`], [`Expected`], [`Header`],
//!   [`FlaggedTest`], [`FlagReason`], [`SpecDocument`], [`RunStats`]
//!
//! The stages (segmenter, triage, request and assertion parsers, resolvers)
//! are public modules so each can be exercised on its own.

pub mod config_map;
pub mod expect;
pub mod extract;
pub mod lexer;
pub mod request;
pub mod resolve;
pub mod schema;
pub mod segment;
pub mod split;
pub mod triage;

// ── Convenience re-exports ───────────────────────────────────────────

pub use config_map::{parse_config_map, ConfigMap, DEFAULT_CONFIG};
pub use extract::{extract_file, spec_file_name, ASSERTION_SEPARATOR};
pub use resolve::{parse_relaxed_json, LetBindings, UnparseableJson};
pub use schema::{
    Expected, FileStats, FlagReason, FlaggedEntry, FlaggedTest, Header, HeaderMatcher, Method,
    ParseResult, Request, RunStats, SpecDocument, TestCase,
};
pub use segment::{RawBlock, Segmenter};
