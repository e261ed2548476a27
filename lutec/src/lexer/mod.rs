//!
//! Lexer Module - Anchored-Pattern Scanning
//!
//! This module handles tokenization of lute source code. The scanner is
//! line-oriented: the source is split on `\n` and each line is scanned
//! left-to-right with a byte cursor, trying a fixed priority order of
//! anchored matchers at the cursor. A synthetic `NewLine` token closes
//! every line, including empty ones.
//!
//! Key design decisions:
//! - Zero-copy: token text borrows the source string, no per-token allocation
//! - Invalid characters are recorded inline as `Invalid` tokens and counted;
//!   lexing never fails
//! - Matcher priority makes keywords win over identifiers and multi-char
//!   operators win over their single-char prefixes
//!

use memchr::{memchr, memmem};
use serde::Serialize;
use tracing::trace;

/// Keyword, type and boolean word lists, tried in order at the cursor.
/// Matching is anchored prefix matching with no word boundary, so `iffy`
/// lexes as `if` + `fy`.
const KEYWORDS: [&str; 7] = ["main", "if", "else", "loop", "out", "in", "return"];
const TYPES: [&str; 4] = ["any", "str", "num", "bool"];
const BOOLEANS: [&str; 2] = ["true", "false"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Comment,
    Keyword,
    Type,
    Boolean,
    Identifier,
    NumericalOperator,
    LogicalOperator,
    String,
    Number,
    Equals,
    OpenBrace,
    CloseBrace,
    OpenParenthesis,
    CloseParenthesis,
    ForCondition,
    ForStep,
    Comma,
    NewLine,
    Invalid,
}

/// A single lexeme. `text` is the exact matched substring: strings keep
/// their quotes, numbers keep their decimal point. `line` is 1-based,
/// `column` is the 0-based byte offset within the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub line: u32,
    pub column: u32,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, line: u32, column: u32) -> Self {
        Self {
            kind,
            text,
            line,
            column,
        }
    }
}

/// Lexer output: the token stream plus the count of invalid characters.
/// The count doubles as the lexer's exit code at the CLI boundary.
#[derive(Debug, Serialize)]
pub struct LexResult<'src> {
    pub exit_code: u32,
    pub tokens: Vec<Token<'src>>,
}

impl<'src> LexResult<'src> {
    pub fn invalid_tokens(&self) -> impl Iterator<Item = &Token<'src>> {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Invalid)
    }
}

pub fn tokenize(source: &str) -> LexResult<'_> {
    let mut lexer = Lexer::new();
    for (idx, line) in source.split('\n').enumerate() {
        lexer.scan_line(idx as u32 + 1, line);
    }
    LexResult {
        exit_code: lexer.exit_code,
        tokens: lexer.tokens,
    }
}

struct Lexer<'src> {
    tokens: Vec<Token<'src>>,
    exit_code: u32,
}

impl<'src> Lexer<'src> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            exit_code: 0,
        }
    }

    fn scan_line(&mut self, line_no: u32, line: &'src str) {
        trace!(line = line_no, len = line.len(), "scanning line");

        let bytes = line.as_bytes();
        let mut i = 0;

        while i < line.len() {
            let rest = &line[i..];
            let Some(c) = rest.chars().next() else { break };

            if c.is_whitespace() {
                i += c.len_utf8();
                continue;
            }

            let matched = self
                .match_comment(rest)
                .or_else(|| self.match_word(rest, c))
                .or_else(|| self.match_number(rest, c))
                .or_else(|| match_numerical_operator(c))
                .or_else(|| match_logical_operator(&bytes[i..]))
                .or_else(|| match_punctuation(rest, c))
                .or_else(|| self.match_string(rest, c));

            match matched {
                Some((kind, len)) => {
                    self.tokens
                        .push(Token::new(kind, &line[i..i + len], line_no, i as u32));
                    i += len;
                }
                None => {
                    // No matcher claimed the character: record it inline.
                    let len = c.len_utf8();
                    self.tokens
                        .push(Token::new(TokenKind::Invalid, &line[i..i + len], line_no, i as u32));
                    self.exit_code += 1;
                    i += len;
                }
            }
        }

        self.tokens
            .push(Token::new(TokenKind::NewLine, "\n", line_no, i as u32));
    }

    /// Block comment `/* ... */`, non-greedy, confined to the current line.
    /// An unterminated `/*` matches nothing, so the `/` and `*` fall through
    /// to the operator matchers.
    fn match_comment(&self, rest: &str) -> Option<(TokenKind, usize)> {
        if !rest.starts_with("/*") {
            return None;
        }
        let end = memmem::find(rest[2..].as_bytes(), b"*/")?;
        Some((TokenKind::Comment, 2 + end + 2))
    }

    /// Keyword, type, boolean or identifier. Only entered when the cursor
    /// sits on an ASCII letter, which means a leading `_` never starts an
    /// identifier and lexes as an invalid character instead.
    fn match_word(&self, rest: &str, c: char) -> Option<(TokenKind, usize)> {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        for kw in KEYWORDS {
            if rest.starts_with(kw) {
                return Some((TokenKind::Keyword, kw.len()));
            }
        }
        for ty in TYPES {
            if rest.starts_with(ty) {
                return Some((TokenKind::Type, ty.len()));
            }
        }
        for b in BOOLEANS {
            if rest.starts_with(b) {
                return Some((TokenKind::Boolean, b.len()));
            }
        }
        let len = rest
            .bytes()
            .position(|b| !matches!(b, b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_'))
            .unwrap_or(rest.len());
        Some((TokenKind::Identifier, len))
    }

    /// Number `\d+(\.\d+)?`. A trailing `.` without digits is not consumed.
    fn match_number(&self, rest: &str, c: char) -> Option<(TokenKind, usize)> {
        if !c.is_ascii_digit() {
            return None;
        }
        let bytes = rest.as_bytes();
        let mut len = bytes
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(bytes.len());
        if bytes.get(len) == Some(&b'.') && bytes.get(len + 1).is_some_and(u8::is_ascii_digit) {
            len += 1;
            len += bytes[len..]
                .iter()
                .position(|b| !b.is_ascii_digit())
                .unwrap_or(bytes.len() - len);
        }
        Some((TokenKind::Number, len))
    }

    /// Single-quoted string with no escapes, confined to the current line.
    /// An unterminated quote matches nothing and lexes as invalid.
    fn match_string(&self, rest: &str, c: char) -> Option<(TokenKind, usize)> {
        if c != '\'' {
            return None;
        }
        let end = memchr(b'\'', &rest.as_bytes()[1..])?;
        Some((TokenKind::String, 1 + end + 1))
    }
}

fn match_numerical_operator(c: char) -> Option<(TokenKind, usize)> {
    matches!(c, '+' | '-' | '*' | '/' | '%').then_some((TokenKind::NumericalOperator, 1))
}

/// Logical operators in a fixed alternation order: `&&`, `||`,
/// `<`/`<=`, `>`/`>=`, `!=`, `!`, `==`, `^`. Bare `!` is claimed here,
/// before the `ForStep` arm below ever sees it.
fn match_logical_operator(bytes: &[u8]) -> Option<(TokenKind, usize)> {
    let len = match bytes {
        [b'&', b'&', ..] => 2,
        [b'|', b'|', ..] => 2,
        [b'<' | b'>', b'=', ..] => 2,
        [b'<' | b'>', ..] => 1,
        [b'!', b'=', ..] => 2,
        [b'!', ..] => 1,
        [b'=', b'=', ..] => 2,
        [b'^', ..] => 1,
        _ => return None,
    };
    Some((TokenKind::LogicalOperator, len))
}

fn match_punctuation(rest: &str, c: char) -> Option<(TokenKind, usize)> {
    if rest.starts_with("..") {
        return Some((TokenKind::ForCondition, 2));
    }
    let kind = match c {
        '!' => TokenKind::ForStep,
        '=' => TokenKind::Equals,
        ',' => TokenKind::Comma,
        '{' => TokenKind::OpenBrace,
        '}' => TokenKind::CloseBrace,
        '(' => TokenKind::OpenParenthesis,
        ')' => TokenKind::CloseParenthesis,
        _ => return None,
    };
    Some((kind, 1))
}
