//! Indentation-driven segmentation of a spec file into leaf test blocks.
//!
//! Indentation is the only nesting signal used. A `describe`/`context`/`it`
//! at indent `i` closes every open scope whose indent is `>= i`, so a
//! same-indent sibling always replaces the previous scope rather than
//! nesting inside it.

use crate::lexer::Cursor;
use crate::resolve::LetBindings;

/// One line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Column of the first non-whitespace byte; `None` for a blank line.
    pub indent: Option<usize>,
    pub text: &'a str,
}

impl<'a> SourceLine<'a> {
    fn new(number: usize, text: &'a str) -> Self {
        let stripped = text.trim_start();
        let indent = (!stripped.is_empty()).then(|| text.len() - stripped.len());
        SourceLine {
            number,
            indent,
            text,
        }
    }

    fn stripped(&self) -> &'a str {
        self.text.trim_start()
    }
}

/// An open `describe`/`context` scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    pub indent: usize,
    pub text: String,
}

/// A leaf test before request/assertion parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// Enclosing scope texts, outermost first, then the `it` text.
    pub description: Vec<String>,
    /// The `it` line and every line belonging to it, newline-joined.
    pub text: String,
    /// 1-based line of the `it` declaration.
    pub line: usize,
}

/// What a non-blank line declares, as seen from the scanning state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind<'a> {
    Boilerplate,
    Binding { name: &'a str, expr: &'a str },
    Scope(&'a str),
    Leaf(&'a str),
    Other,
}

const BOILERPLATE_PREFIXES: &[&str] = &["module ", "import ", "{-#", "--"];

fn classify(stripped: &str) -> LineKind<'_> {
    if BOILERPLATE_PREFIXES.iter().any(|p| stripped.starts_with(p)) || is_spec_header(stripped) {
        return LineKind::Boilerplate;
    }
    if let Some((name, expr)) = let_binding(stripped) {
        return LineKind::Binding { name, expr };
    }
    if let Some(text) = declaration(stripped, &["describe", "context"]) {
        return LineKind::Scope(text);
    }
    if let Some(text) = declaration(stripped, &["it"]) {
        return LineKind::Leaf(text);
    }
    LineKind::Other
}

/// `spec :: Spec`, `spec::...` and `spec = ...` lines.
fn is_spec_header(stripped: &str) -> bool {
    let mut c = Cursor::new(stripped);
    if !c.eat_word("spec") {
        return false;
    }
    c.skip_ws();
    c.eat("::") || c.eat("=")
}

/// `let <ident> = <expr>`
fn let_binding(stripped: &str) -> Option<(&str, &str)> {
    let mut c = Cursor::new(stripped);
    if !c.eat_word("let") || c.skip_ws() == 0 {
        return None;
    }
    let name = c.take_ident()?;
    c.skip_ws();
    if !c.eat("=") {
        return None;
    }
    let rest = c.rest();
    (!rest.is_empty()).then(|| (name, rest.trim()))
}

/// `<keyword> "<text>"`; returns the raw text between the quotes.
fn declaration<'a>(stripped: &'a str, keywords: &[&str]) -> Option<&'a str> {
    let mut c = Cursor::new(stripped);
    if !keywords.iter().any(|k| c.eat(k)) || c.skip_ws() == 0 {
        return None;
    }
    c.take_quoted()
}

/// The `scanning` / `collecting-block` state machine over one file.
///
/// Blocks are produced lazily so that each one is processed with exactly the
/// `let` bindings seen before it.
pub struct Segmenter<'a> {
    lines: Vec<SourceLine<'a>>,
    pos: usize,
    scopes: Vec<ScopeFrame>,
    bindings: LetBindings,
}

impl<'a> Segmenter<'a> {
    pub fn new(source: &'a str) -> Self {
        let lines = source
            .split('\n')
            .enumerate()
            .map(|(i, text)| SourceLine::new(i + 1, text))
            .collect();
        Segmenter {
            lines,
            pos: 0,
            scopes: Vec::new(),
            bindings: LetBindings::new(),
        }
    }

    /// Bindings recorded so far.
    pub fn bindings(&self) -> &LetBindings {
        &self.bindings
    }

    /// Open scopes, outermost first.
    pub fn scopes(&self) -> &[ScopeFrame] {
        &self.scopes
    }

    fn close_scopes_from(&mut self, indent: usize) {
        while self.scopes.last().is_some_and(|f| f.indent >= indent) {
            self.scopes.pop();
        }
    }

    /// Scan forward to the next leaf declaration and collect its block.
    pub fn next_block(&mut self) -> Option<RawBlock> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.pos += 1;
            let Some(indent) = line.indent else {
                continue;
            };

            match classify(line.stripped()) {
                LineKind::Boilerplate | LineKind::Other => {}
                LineKind::Binding { name, expr } => self.bindings.insert(name, expr),
                LineKind::Scope(text) => {
                    self.close_scopes_from(indent);
                    self.scopes.push(ScopeFrame {
                        indent,
                        text: text.to_owned(),
                    });
                }
                LineKind::Leaf(text) => {
                    self.close_scopes_from(indent);
                    return Some(self.collect_block(line, indent, text));
                }
            }
        }
        None
    }

    fn collect_block(&mut self, head: SourceLine<'a>, indent: usize, text: &str) -> RawBlock {
        let mut body = vec![head.text];
        while let Some(next) = self.lines.get(self.pos) {
            if next.indent.is_some_and(|i| i <= indent) {
                break;
            }
            body.push(next.text);
            self.pos += 1;
        }

        let mut description: Vec<String> = self.scopes.iter().map(|f| f.text.clone()).collect();
        description.push(text.to_owned());

        RawBlock {
            description,
            text: body.join("\n"),
            line: head.number,
        }
    }
}

impl Iterator for Segmenter<'_> {
    type Item = RawBlock;

    fn next(&mut self) -> Option<RawBlock> {
        self.next_block()
    }
}

/// Segment a whole file at once. Bindings are returned in their final state.
pub fn segment(source: &str) -> (Vec<RawBlock>, LetBindings) {
    let mut seg = Segmenter::new(source);
    let blocks: Vec<RawBlock> = seg.by_ref().collect();
    (blocks, seg.bindings)
}
