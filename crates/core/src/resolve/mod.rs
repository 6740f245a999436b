//! Expression resolvers: method names, request headers, response header
//! matchers and relaxed JSON literals.
//!
//! Resolvers never fail loudly. An expression they do not understand comes
//! back as `None` (or [`UnparseableJson`]) and the caller decides whether to
//! fall back to a default or flag the block.

pub mod headers;
pub mod json;
pub mod matchers;
pub mod method;

pub use headers::{header_shape, resolve_header_expr, resolve_header_list, HeaderShape, LetBindings};
pub use json::{parse_relaxed_json, UnparseableJson};
pub use matchers::{parse_match_headers, resolve_matcher, MatchHeaders};
pub use method::resolve_method;
