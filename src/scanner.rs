//! Brace matching over PHP source that skips strings and comments.
//!
//! No grammar: the scanner only tracks whether it is inside a quoted string,
//! a line comment (`//`, `#`), a block comment, or inline HTML between `?>`
//! and `<?`, and counts braces outside of those.

use crate::types::BodyEnd;

/// Lexical state of the scanner. Exactly one applies at any byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Inside `/* ... */`.
    BlockComment,
    /// Plain code; braces count.
    Code,
    /// Template text outside `<?php ... ?>`.
    Html,
    /// Inside `// ...` or `# ...` until the next newline.
    LineComment,
    /// Inside a string opened by `quote`.
    Str {
        /// The previous byte was an unescaped backslash.
        escaped: bool,
        /// `'` or `"`.
        quote: u8,
    },
}

/// Iterator over the bytes of `text` that are code, with their offsets.
/// Quote characters, comment markers and everything between them are skipped.
struct CodeBytes<'a> {
    bytes: &'a [u8],
    mode: Mode,
    pos: usize,
}

impl<'a> CodeBytes<'a> {
    /// Start scanning at `start`, assumed to be in code.
    const fn new(text: &'a str, start: usize) -> Self {
        return Self::with_mode(text, start, Mode::Code);
    }

    /// Start scanning at `start` in the given mode.
    const fn with_mode(text: &'a str, start: usize, mode: Mode) -> Self {
        return Self {
            bytes: text.as_bytes(),
            mode,
            pos: start,
        };
    }

    /// Byte after the current one, if any.
    fn peek(&self) -> Option<u8> {
        return self.bytes.get(self.pos).copied();
    }
}

impl Iterator for CodeBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let idx = self.pos;
            let byte = *self.bytes.get(idx)?;
            self.pos = idx.saturating_add(1);

            match self.mode {
                Mode::Code => match byte {
                    b'"' | b'\'' => {
                        self.mode = Mode::Str { escaped: false, quote: byte };
                    },
                    b'/' if self.peek() == Some(b'/') => {
                        self.mode = Mode::LineComment;
                        self.pos = self.pos.saturating_add(1);
                    },
                    b'/' if self.peek() == Some(b'*') => {
                        self.mode = Mode::BlockComment;
                        self.pos = self.pos.saturating_add(1);
                    },
                    b'#' => self.mode = Mode::LineComment,
                    b'?' if self.peek() == Some(b'>') => {
                        self.mode = Mode::Html;
                        self.pos = self.pos.saturating_add(1);
                    },
                    _ => return Some((idx, byte)),
                },
                Mode::Html => {
                    if byte == b'<' && self.peek() == Some(b'?') {
                        self.mode = Mode::Code;
                        self.pos = self.pos.saturating_add(1);
                    }
                },
                Mode::Str { escaped, quote } => {
                    // A quote closes the string only after an even run of backslashes.
                    if byte == quote && !escaped {
                        self.mode = Mode::Code;
                    } else {
                        let escaped = byte == b'\\' && !escaped;
                        self.mode = Mode::Str { escaped, quote };
                    }
                },
                Mode::LineComment => {
                    if byte == b'\n' {
                        self.mode = Mode::Code;
                    } else if byte == b'?' && self.peek() == Some(b'>') {
                        self.mode = Mode::Html;
                        self.pos = self.pos.saturating_add(1);
                    }
                },
                Mode::BlockComment => {
                    if byte == b'*' && self.peek() == Some(b'/') {
                        self.mode = Mode::Code;
                        self.pos = self.pos.saturating_add(1);
                    }
                },
            }
        }
    }
}

/// Which byte offsets of a document are live code.
///
/// A document containing an open tag (`<?`) starts as template text; one
/// without is read as code from the first byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMask {
    /// One flag per byte of the document.
    code: Vec<bool>,
}

impl CodeMask {
    /// Scan `text` once and record every code byte.
    pub fn new(text: &str) -> Self {
        let mode = if text.contains("<?") { Mode::Html } else { Mode::Code };
        let mut code = vec![false; text.len()];
        for (idx, _) in CodeBytes::with_mode(text, 0, mode) {
            if let Some(slot) = code.get_mut(idx) {
                *slot = true;
            }
        }
        return Self { code };
    }

    /// Whether the byte at `offset` is outside strings, comments and template text.
    pub fn is_code(&self, offset: usize) -> bool {
        return self.code.get(offset).copied().unwrap_or(false);
    }
}

/// Find the exclusive end of the method body that starts at or after `start`.
///
/// Depth rises on `{` and falls on `}` outside strings and comments; the `}`
/// that brings depth from 1 back to 0 ends the body. A stray `}` at depth 0 is
/// ignored. Running out of text first yields `BodyEnd::Unbounded`.
pub fn find_body_end(text: &str, start: usize) -> BodyEnd {
    let mut depth = 0_u32;

    for (idx, byte) in CodeBytes::new(text, start) {
        match byte {
            b'{' => depth = depth.saturating_add(1),
            b'}' if depth == 1 => return BodyEnd::Bounded(idx.saturating_add(1)),
            b'}' => depth = depth.saturating_sub(1),
            _ => {},
        }
    }

    return BodyEnd::Unbounded;
}

/// Find the opening `{` of the declaration that starts at `start`.
///
/// Returns `None` if a `;` outside parentheses comes first (an abstract or
/// interface method has no body) or the text ends.
pub fn find_body_start(text: &str, start: usize) -> Option<usize> {
    let mut parens = 0_u32;

    for (idx, byte) in CodeBytes::new(text, start) {
        match byte {
            b'(' => parens = parens.saturating_add(1),
            b')' => parens = parens.saturating_sub(1),
            b'{' => return Some(idx),
            b';' if parens == 0 => return None,
            _ => {},
        }
    }

    return None;
}
