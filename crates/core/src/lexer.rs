//! Escaping-aware scanners shared by every stage of extraction.
//!
//! All delimiters the extractor cares about are ASCII, so scanning works on
//! bytes and every index handed back is a valid `str` slice boundary.

/// Opening marker of a `[json| ... |]` quasi-literal.
pub const QUASI_OPEN: &str = "[json|";
/// Closing marker of a quasi-literal.
pub const QUASI_CLOSE: &str = "|]";

pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index of the `"` closing the string literal that opens at `start`.
///
/// A backslash escapes the following byte. Returns `None` for an
/// unterminated literal or when `start` is not a quote.
pub fn closing_quote(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.get(start) != Some(&b'"') {
        return None;
    }
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Decode the escapes that appear in DSL string literals.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Index of the `close` delimiter balancing the `open` at `start`.
///
/// Delimiters inside string literals are ignored. `None` means the span
/// runs to end of input unbalanced.
pub fn find_matching(s: &str, start: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' {
            i = closing_quote(s, i)? + 1;
            continue;
        }
        if b == open {
            depth += 1;
        } else if b == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Split `s` at every `delim` that sits outside brackets, parens, braces and
/// string literals. A trailing blank segment is dropped.
pub fn split_top_level(s: &str, delim: u8) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_str = false;
    let mut seg_start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if in_str {
            match b {
                b'\\' => i += 1,
                b'"' => in_str = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_str = true,
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth -= 1,
                _ if b == delim && depth == 0 => {
                    parts.push(&s[seg_start..i]);
                    seg_start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    let tail = &s[seg_start.min(s.len())..];
    if !tail.trim().is_empty() {
        parts.push(tail);
    }
    parts
}

/// Remove `--` line comments.
///
/// A `--` inside a string literal or inside a quasi-literal is content, not
/// a comment. Quasi-literals may span lines, so that state carries over from
/// one line to the next; string state does not.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_quasi = false;
    for (n, line) in text.split('\n').enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let bytes = line.as_bytes();
        let mut in_str = false;
        let mut cut = line.len();
        let mut i = 0usize;
        while i < bytes.len() {
            let rest = &bytes[i..];
            if in_quasi {
                if rest.starts_with(QUASI_CLOSE.as_bytes()) {
                    in_quasi = false;
                    i += QUASI_CLOSE.len();
                } else {
                    i += 1;
                }
                continue;
            }
            let b = bytes[i];
            if in_str {
                match b {
                    b'\\' => i += 1,
                    b'"' => in_str = false,
                    _ => {}
                }
                i += 1;
                continue;
            }
            if b == b'"' {
                in_str = true;
            } else if rest.starts_with(QUASI_OPEN.as_bytes()) {
                in_quasi = true;
                i += QUASI_OPEN.len();
                continue;
            } else if rest.starts_with(b"--") {
                cut = i;
                break;
            }
            i += 1;
        }
        out.push_str(&line[..cut]);
    }
    out
}

/// Collapse every whitespace run (newlines included) to one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of the first occurrence of `word` at or after `from` that is
/// not embedded in a longer identifier.
pub fn find_word(haystack: &str, word: &str, from: usize) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut search = from;
    while search <= haystack.len() {
        let idx = search + haystack.get(search..)?.find(word)?;
        let end = idx + word.len();
        let left_ok = idx == 0 || !is_ident_byte(bytes[idx - 1]);
        let right_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if left_ok && right_ok {
            return Some(idx);
        }
        search = idx + 1;
    }
    None
}

// ──────────────────────────────────────────────
// Cursor
// ──────────────────────────────────────────────

/// Forward-only reader over a single expression.
///
/// Every `take_*`/`eat*` either consumes what it recognised or leaves the
/// position untouched, so callers can chain alternatives.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Cursor { src, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Skip whitespace and return how many bytes were skipped.
    pub fn skip_ws(&mut self) -> usize {
        let rest = self.rest();
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
        skipped
    }

    pub fn eat(&mut self, lit: &str) -> bool {
        if self.rest().starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    /// Like [`Cursor::eat`] but refuses a prefix of a longer identifier.
    pub fn eat_word(&mut self, word: &str) -> bool {
        let rest = self.rest();
        if !rest.starts_with(word) {
            return false;
        }
        if rest
            .as_bytes()
            .get(word.len())
            .is_some_and(|b| is_ident_byte(*b))
        {
            return false;
        }
        self.pos += word.len();
        true
    }

    /// Consume a string literal and return its raw (still escaped) content.
    pub fn take_quoted(&mut self) -> Option<&'a str> {
        let close = closing_quote(self.src, self.pos)?;
        let raw = &self.src[self.pos + 1..close];
        self.pos = close + 1;
        Some(raw)
    }

    pub fn take_uint(&mut self) -> Option<u64> {
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return None;
        }
        let n = rest[..len].parse().ok()?;
        self.pos += len;
        Some(n)
    }

    pub fn take_ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest.bytes().take_while(|b| is_ident_byte(*b)).count();
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// True when only whitespace remains.
    pub fn at_end(&self) -> bool {
        self.rest().trim().is_empty()
    }
}
