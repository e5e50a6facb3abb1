//! Minimal tokeniser for patching constant assignments in source files.
//!
//! It recognises just enough of Python-like syntax to find assignments
//! safely: identifiers, single- and double-quoted strings (including
//! triple-quoted forms) with backslash escapes, `#` and `//` line comments,
//! and single-character punctuation. Comments and whitespace produce no
//! tokens, so a brace inside a string or comment never reaches the caller
//! as punctuation.

use std::ops::Range;

/// The kind of a scanned token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// An identifier or keyword.
    Ident,
    /// A string literal, quotes and any prefix letters excluded.
    Str,
    /// A numeric literal.
    Number,
    /// Any other single character.
    Punct(char),
}

/// One token with its byte span in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Range<usize>,
}

impl Token {
    /// Return the token's source text.
    pub(crate) fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.span.clone()).unwrap_or_default()
    }

    /// Return `true` if this is the punctuation character `c`.
    pub(crate) fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

/// A string literal that never closes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unterminated string starting on line {line}")]
pub struct ScanError {
    /// 1-based line on which the literal starts.
    pub line: usize,
}

struct Cursor<'s> {
    source: &'s str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.source
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(pattern))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while self.peek().is_some_and(&mut predicate) {
            self.bump();
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.source
            .get(..offset)
            .map_or(1, |before| before.matches('\n').count() + 1)
    }

    /// Consume a string body after its opening quote(s).
    fn string_body(&mut self, quote: char, triple: bool, start: usize) -> Result<(), ScanError> {
        let closing: String = std::iter::repeat_n(quote, if triple { 3 } else { 1 }).collect();
        loop {
            if self.starts_with(&closing) {
                self.pos += closing.len();
                return Ok(());
            }
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some('\n') if !triple => break,
                Some(_) => {}
                None => break,
            }
        }
        Err(ScanError {
            line: self.line_of(start),
        })
    }
}

/// Split `source` into tokens, dropping whitespace and comments.
///
/// # Errors
///
/// Returns [`ScanError`] if a string literal is not closed.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ScanError> {
    let mut cursor = Cursor { source, pos: 0 };
    let mut tokens = Vec::new();

    while let Some(c) = cursor.peek() {
        let start = cursor.pos;
        if c.is_whitespace() {
            cursor.bump();
            continue;
        }
        if c == '#' || cursor.starts_with("//") {
            cursor.eat_while(|c| c != '\n');
            continue;
        }
        let kind = if c == '"' || c == '\'' {
            let triple = cursor.starts_with(&c.to_string().repeat(3));
            cursor.pos += if triple { 3 } else { 1 };
            cursor.string_body(c, triple, start)?;
            TokenKind::Str
        } else if c.is_alphabetic() || c == '_' {
            cursor.eat_while(|c| c.is_alphanumeric() || c == '_');
            TokenKind::Ident
        } else if c.is_ascii_digit() {
            cursor.eat_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
            TokenKind::Number
        } else {
            cursor.bump();
            TokenKind::Punct(c)
        };
        tokens.push(Token {
            kind,
            span: start..cursor.pos,
        });
    }

    Ok(tokens)
}

/// Decode the value of a string literal token's text.
///
/// Common escapes are decoded; unknown escapes keep their backslash.
pub(crate) fn string_value(literal: &str) -> String {
    let quote_len = if literal.starts_with("\"\"\"") || literal.starts_with("'''") {
        3
    } else {
        1
    };
    let inner = literal
        .get(quote_len..literal.len().saturating_sub(quote_len))
        .unwrap_or_default();

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some(escaped @ ('\\' | '"' | '\'')) => value.push(escaped),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    value
}

/// Render `value` as a literal delimited by `quote`.
pub(crate) fn quote_string(value: &str, quote: char) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push(quote);
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\t' => literal.push_str("\\t"),
            c if c == quote => {
                literal.push('\\');
                literal.push(c);
            }
            c => literal.push(c),
        }
    }
    literal.push(quote);
    literal
}
