//! Request header expressions.
//!
//! Each recogniser below is a pure `&str -> Option<HeaderShape>` function.
//! [`HEADER_SHAPES`] fixes their priority: the first one that matches wins.

use std::collections::HashMap;

use crate::lexer::{self, Cursor};
use crate::schema::Header;

/// `let` bindings seen so far in the current file, name to right-hand side.
#[derive(Debug, Clone, Default)]
pub struct LetBindings {
    map: HashMap<String, String>,
}

impl LetBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding. A later binding of the same name replaces it.
    pub fn insert(&mut self, name: impl Into<String>, expr: impl Into<String>) {
        self.map.insert(name.into(), expr.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The recognised forms of a single header expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderShape {
    /// `("Name", "Value")`
    Tuple(String, String),
    /// `acceptHdrs "mime"`
    Accept(String),
    /// `authHeaderJWT "token"`
    BearerAuth(String),
    /// `planHdr`
    Plan,
    /// `rangeHdrs $ ByteRangeFromTo from to`
    RangeFromTo(u64, u64),
    /// `rangeHdrs $ ByteRangeFrom from`
    RangeFrom(u64),
    /// `rangeHdrsWithCount $ ByteRangeFromTo from to`
    RangeWithCount(u64, u64),
    /// A bare identifier naming a `let` binding.
    Binding(String),
}

type ShapeMatcher = fn(&str) -> Option<HeaderShape>;

pub const HEADER_SHAPES: &[ShapeMatcher] = &[
    tuple_shape,
    accept_shape,
    bearer_shape,
    plan_shape,
    range_from_to_shape,
    range_from_shape,
    range_with_count_shape,
    binding_shape,
];

const PLAN_ACCEPT: &str = "application/vnd.pgrst.plan+json";
const RANGE_UNIT: &str = "items";

pub fn tuple_shape(expr: &str) -> Option<HeaderShape> {
    let mut c = Cursor::new(expr);
    if !c.eat("(") {
        return None;
    }
    c.skip_ws();
    let name = c.take_quoted().filter(|s| !s.is_empty())?;
    c.skip_ws();
    if !c.eat(",") {
        return None;
    }
    c.skip_ws();
    let value = c.take_quoted().filter(|s| !s.is_empty())?;
    c.skip_ws();
    if !c.eat(")") || !c.at_end() {
        return None;
    }
    Some(HeaderShape::Tuple(
        lexer::unescape(name),
        lexer::unescape(value),
    ))
}

/// `<helper> "literal"` with nothing after it.
fn helper_with_string(expr: &str, helper: &str) -> Option<String> {
    let mut c = Cursor::new(expr);
    if !c.eat_word(helper) || c.skip_ws() == 0 {
        return None;
    }
    let arg = c.take_quoted().filter(|s| !s.is_empty())?;
    c.at_end().then(|| lexer::unescape(arg))
}

pub fn accept_shape(expr: &str) -> Option<HeaderShape> {
    helper_with_string(expr, "acceptHdrs").map(HeaderShape::Accept)
}

pub fn bearer_shape(expr: &str) -> Option<HeaderShape> {
    helper_with_string(expr, "authHeaderJWT").map(HeaderShape::BearerAuth)
}

pub fn plan_shape(expr: &str) -> Option<HeaderShape> {
    (expr == "planHdr").then_some(HeaderShape::Plan)
}

/// `<helper> $ <ctor> N [M]` or `<helper> (<ctor> N [M])`.
///
/// Returns the integer arguments; `arity` is how many the constructor takes.
fn range_call(expr: &str, helper: &str, ctor: &str, arity: usize) -> Option<Vec<u64>> {
    let mut c = Cursor::new(expr);
    if !c.eat_word(helper) || c.skip_ws() == 0 {
        return None;
    }
    let parenthesised = if c.eat("(") {
        true
    } else if c.eat("$") {
        false
    } else {
        return None;
    };
    c.skip_ws();
    if !c.eat_word(ctor) {
        return None;
    }
    let mut args = Vec::with_capacity(arity);
    for _ in 0..arity {
        if c.skip_ws() == 0 {
            return None;
        }
        args.push(c.take_uint()?);
    }
    c.skip_ws();
    // A stray closing paren is tolerated after `$` as well; the
    // surrounding request expression often ends with one.
    if c.eat(")") {
        c.skip_ws();
    } else if parenthesised {
        return None;
    }
    c.at_end().then_some(args)
}

pub fn range_from_to_shape(expr: &str) -> Option<HeaderShape> {
    let args = range_call(expr, "rangeHdrs", "ByteRangeFromTo", 2)?;
    Some(HeaderShape::RangeFromTo(args[0], args[1]))
}

pub fn range_from_shape(expr: &str) -> Option<HeaderShape> {
    let args = range_call(expr, "rangeHdrs", "ByteRangeFrom", 1)?;
    Some(HeaderShape::RangeFrom(args[0]))
}

pub fn range_with_count_shape(expr: &str) -> Option<HeaderShape> {
    let args = range_call(expr, "rangeHdrsWithCount", "ByteRangeFromTo", 2)?;
    Some(HeaderShape::RangeWithCount(args[0], args[1]))
}

pub fn binding_shape(expr: &str) -> Option<HeaderShape> {
    let is_ident = !expr.is_empty() && expr.bytes().all(lexer::is_ident_byte);
    is_ident.then(|| HeaderShape::Binding(expr.to_owned()))
}

/// Classify a header expression without resolving bindings.
pub fn header_shape(expr: &str) -> Option<HeaderShape> {
    let expr = expr.trim();
    HEADER_SHAPES.iter().find_map(|matcher| matcher(expr))
}

/// Resolve one header expression to its headers.
///
/// `None` means the expression is not understood. Binding chains are
/// followed, and a chain that revisits a name is unresolvable.
pub fn resolve_header_expr(expr: &str, bindings: &LetBindings) -> Option<Vec<Header>> {
    let mut visited = Vec::new();
    resolve_with_guard(expr, bindings, &mut visited)
}

fn resolve_with_guard<'b>(
    expr: &str,
    bindings: &'b LetBindings,
    visited: &mut Vec<&'b str>,
) -> Option<Vec<Header>> {
    let headers = match header_shape(expr)? {
        HeaderShape::Tuple(name, value) => vec![Header(name, value)],
        HeaderShape::Accept(mime) => vec![Header::new("Accept", mime)],
        HeaderShape::BearerAuth(token) => {
            vec![Header::new("Authorization", format!("Bearer {}", token))]
        }
        HeaderShape::Plan => vec![Header::new("Accept", PLAN_ACCEPT)],
        HeaderShape::RangeFromTo(from, to) => vec![
            Header::new("Range-Unit", RANGE_UNIT),
            Header::new("Range", format!("{}-{}", from, to)),
        ],
        HeaderShape::RangeFrom(from) => vec![
            Header::new("Range-Unit", RANGE_UNIT),
            Header::new("Range", format!("{}-", from)),
        ],
        HeaderShape::RangeWithCount(from, to) => vec![
            Header::new("Prefer", "count=exact"),
            Header::new("Range-Unit", RANGE_UNIT),
            Header::new("Range", format!("{}-{}", from, to)),
        ],
        HeaderShape::Binding(name) => {
            let (bound_name, bound_expr) = bindings.map.get_key_value(name.as_str())?;
            if visited.contains(&bound_name.as_str()) {
                return None;
            }
            visited.push(bound_name);
            return resolve_with_guard(bound_expr, bindings, visited);
        }
    };
    Some(headers)
}

/// Resolve a request header list: `[]`, `[e1, e2, ...]`, or a single
/// non-bracketed expression. Any unresolvable element fails the whole list.
pub fn resolve_header_list(raw: &str, bindings: &LetBindings) -> Option<Vec<Header>> {
    let s = raw.trim();
    if s == "[]" {
        return Some(Vec::new());
    }
    if !s.starts_with('[') {
        return resolve_header_expr(s, bindings);
    }

    let inner = s.strip_prefix('[')?.strip_suffix(']')?.trim();
    let mut headers = Vec::new();
    for element in lexer::split_top_level(inner, b',') {
        headers.extend(resolve_header_expr(element, bindings)?);
    }
    Some(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(name: &str, value: &str) -> Header {
        Header::new(name, value)
    }

    #[test]
    fn tuple_literal() {
        let got = resolve_header_expr(r#"("Prefer", "return=representation")"#, &LetBindings::new());
        assert_eq!(got, Some(vec![h("Prefer", "return=representation")]));
    }

    #[test]
    fn tuple_requires_two_non_empty_strings() {
        assert_eq!(tuple_shape(r#"("Prefer", "")"#), None);
        assert_eq!(tuple_shape(r#"("Prefer", x)"#), None);
        assert_eq!(tuple_shape(r#"("A", "b") extra"#), None);
    }

    #[test]
    fn accept_and_bearer_helpers() {
        let b = LetBindings::new();
        assert_eq!(
            resolve_header_expr(r#"acceptHdrs "text/csv""#, &b),
            Some(vec![h("Accept", "text/csv")])
        );
        assert_eq!(
            resolve_header_expr(r#"authHeaderJWT "abc.def""#, &b),
            Some(vec![h("Authorization", "Bearer abc.def")])
        );
    }

    #[test]
    fn plan_marker() {
        assert_eq!(
            resolve_header_expr("planHdr", &LetBindings::new()),
            Some(vec![h("Accept", "application/vnd.pgrst.plan+json")])
        );
    }

    #[test]
    fn range_from_to_with_dollar() {
        assert_eq!(
            resolve_header_expr("rangeHdrs $ ByteRangeFromTo 0 1", &LetBindings::new()),
            Some(vec![h("Range-Unit", "items"), h("Range", "0-1")])
        );
    }

    #[test]
    fn range_from_to_parenthesised() {
        assert_eq!(
            resolve_header_expr("rangeHdrs (ByteRangeFromTo 10 19)", &LetBindings::new()),
            Some(vec![h("Range-Unit", "items"), h("Range", "10-19")])
        );
    }

    #[test]
    fn open_ended_range() {
        assert_eq!(
            resolve_header_expr("rangeHdrs $ ByteRangeFrom 5", &LetBindings::new()),
            Some(vec![h("Range-Unit", "items"), h("Range", "5-")])
        );
    }

    #[test]
    fn range_with_count_adds_prefer() {
        assert_eq!(
            resolve_header_expr("rangeHdrsWithCount $ ByteRangeFromTo 0 9", &LetBindings::new()),
            Some(vec![
                h("Prefer", "count=exact"),
                h("Range-Unit", "items"),
                h("Range", "0-9"),
            ])
        );
    }

    #[test]
    fn range_shapes_do_not_bleed_into_each_other() {
        assert_eq!(range_from_shape("rangeHdrs $ ByteRangeFromTo 0 1"), None);
        assert_eq!(range_from_to_shape("rangeHdrsWithCount $ ByteRangeFromTo 0 1"), None);
        assert_eq!(range_from_to_shape("rangeHdrs $ ByteRangeFromTo 0"), None);
    }

    #[test]
    fn binding_resolves_recursively() {
        let mut b = LetBindings::new();
        b.insert("inner", r#"acceptHdrs "application/json""#);
        b.insert("outer", "inner");
        assert_eq!(
            resolve_header_expr("outer", &b),
            Some(vec![h("Accept", "application/json")])
        );
    }

    #[test]
    fn binding_cycle_is_unresolvable() {
        let mut b = LetBindings::new();
        b.insert("a", "b");
        b.insert("b", "a");
        assert_eq!(resolve_header_expr("a", &b), None);

        let mut selfref = LetBindings::new();
        selfref.insert("x", "x");
        assert_eq!(resolve_header_expr("x", &selfref), None);
    }

    #[test]
    fn unknown_identifier_is_unresolvable() {
        assert_eq!(resolve_header_expr("singular", &LetBindings::new()), None);
        assert_eq!(resolve_header_expr("foo bar", &LetBindings::new()), None);
    }

    #[test]
    fn header_list_forms() {
        let b = LetBindings::new();
        assert_eq!(resolve_header_list("[]", &b), Some(vec![]));
        assert_eq!(resolve_header_list("[ ]", &b), Some(vec![]));
        assert_eq!(
            resolve_header_list(r#"[("A", "1"), planHdr]"#, &b),
            Some(vec![h("A", "1"), h("Accept", "application/vnd.pgrst.plan+json")])
        );
        assert_eq!(
            resolve_header_list("rangeHdrs $ ByteRangeFrom 2", &b),
            Some(vec![h("Range-Unit", "items"), h("Range", "2-")])
        );
    }

    #[test]
    fn header_list_fails_when_any_element_fails() {
        let b = LetBindings::new();
        assert_eq!(resolve_header_list(r#"[("A", "1"), mystery]"#, &b), None);
    }

    #[test]
    fn repeated_names_are_kept_in_order() {
        let got = resolve_header_list(r#"[("Prefer", "a"), ("Prefer", "b")]"#, &LetBindings::new());
        assert_eq!(got, Some(vec![h("Prefer", "a"), h("Prefer", "b")]));
    }
}
