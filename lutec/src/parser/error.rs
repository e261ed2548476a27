//!
//! Parser Error Types
//!
//! Errors carry the line and column of the offending token and render in
//! the fixed diagnostic formats the CLI reports:
//!
//!   `On line <L>, Column <C> <message>, found: <text>`
//!   `On line <L>, Column <C> found invalid keyword: <text>`
//!   `Unexpected end of input`
//!
//! The first mismatch aborts parsing; there is no recovery or batching.
//!

use crate::lexer::Token;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("On line {line}, Column {column} {message}, found: {found}")]
    Unexpected {
        line: u32,
        column: u32,
        message: String,
        found: String,
    },

    #[error("On line {line}, Column {column} found invalid keyword: {found}")]
    InvalidKeyword {
        line: u32,
        column: u32,
        found: String,
    },

    #[error("Unexpected end of input")]
    UnexpectedEof,
}

impl ParseError {
    pub fn unexpected(message: impl Into<String>, token: Token<'_>) -> Self {
        ParseError::Unexpected {
            line: token.line,
            column: token.column,
            message: message.into(),
            found: token.text.to_string(),
        }
    }

    pub fn invalid_keyword(token: Token<'_>) -> Self {
        ParseError::InvalidKeyword {
            line: token.line,
            column: token.column,
            found: token.text.to_string(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
