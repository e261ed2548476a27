//!
//! Parser Module - Flat Statement Recognition
//!
//! Recursive-descent parser over the token stream. It deliberately does not
//! build a tree: it emits a flat list of `Statement` fragments, each carrying
//! a contiguous slice of the token stream plus a kind tag. The list is
//! preorder-linearized: every control-construct header (`main`, `if`, `else`,
//! `loop`, function declarations) is immediately followed by its `Block`
//! statement, then the statements produced inside the block.
//!
//! The preorder shape is achieved with one trick: before descending into a
//! block (or an assignment/call), the parser records the current length of
//! the statement list and *inserts* the new statement at that index once the
//! construct is fully parsed. Everything else appends at the tail. The
//! analyzer and generator index on `statements[i + 1]` expecting the body,
//! so this ordering is load-bearing.
//!
//! Parsing is fail-fast: the first mismatch aborts with a `ParseError`.
//!

pub mod error;

pub use error::{ParseError, ParseResult};

use serde::Serialize;
use tracing::trace;

use crate::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatementKind {
    Main,
    If,
    Else,
    Loop,
    Out,
    In,
    Return,
    VariableDeclaration,
    Assignment,
    Block,
    FunctionDeclaration,
    Call,
    Invalid,
}

/// A statement fragment: a contiguous slice of the input token stream
/// (excluding any trailing `NewLine`) plus a kind tag. `Block` slices span
/// from the opening `{` inclusive to the closing `}` exclusive, so the last
/// token's line is the line the generator closes the block on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statement<'a> {
    pub tokens: &'a [Token<'a>],
    pub kind: StatementKind,
}

impl<'a> Statement<'a> {
    pub fn new(tokens: &'a [Token<'a>], kind: StatementKind) -> Self {
        Self { tokens, kind }
    }

    /// Text of the token at `index`, or `""` when the slice is shorter.
    /// The analyzer and generator address fixed positions inside fragments
    /// (`tokens[1]` is the declared name, `tokens[3]` the initializer head),
    /// and lenient header parsing means those positions are not guaranteed.
    pub fn token_text(&self, index: usize) -> &'a str {
        self.tokens.get(index).map_or("", |t| t.text)
    }

    /// Sub-slice of the fragment's tokens, empty when out of range.
    pub fn token_range(&self, start: usize, end: usize) -> &'a [Token<'a>] {
        self.tokens.get(start..end).unwrap_or(&[])
    }
}

pub fn parse<'a>(tokens: &'a [Token<'a>]) -> Result<Vec<Statement<'a>>, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse_main()?;
    Ok(parser.statements)
}

struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
    statements: Vec<Statement<'a>>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            current: 0,
            statements: Vec::new(),
        }
    }

    // MAIN := {COMMENT|NL} FUNCTIONS {COMMENT|NL} 'main' BLOCK
    fn parse_main(&mut self) -> ParseResult<()> {
        self.skip_trivia();
        self.parse_functions()?;
        let start = self.current;
        self.consume(TokenKind::Keyword, "Expected 'main'")?;
        self.push(start, StatementKind::Main);
        self.parse_block()
    }

    // FUNCTIONS := ( {COMMENT|NL} FUNCTION_DECL )*
    fn parse_functions(&mut self) -> ParseResult<()> {
        self.skip_trivia();
        while self.matches(TokenKind::Type) {
            self.parse_function_declaration()?;
            self.skip_trivia();
        }
        Ok(())
    }

    // FUNCTION_DECL := TYPE IDENT '(' HEADER ')' BLOCK
    fn parse_function_declaration(&mut self) -> ParseResult<()> {
        let start = self.current;
        self.parse_type();
        self.parse_identifier();
        self.consume(TokenKind::OpenParenthesis, "Expected '('")?;
        self.parse_header();
        self.consume(TokenKind::CloseParenthesis, "Expected ')'")?;
        self.push(start, StatementKind::FunctionDeclaration);
        self.parse_block()
    }

    // HEADER := ( TYPE IDENT ( ',' TYPE IDENT )* )?
    fn parse_header(&mut self) {
        self.parse_type();
        self.parse_identifier();
        while self.matches(TokenKind::Comma) {
            self.advance();
            self.parse_type();
            self.parse_identifier();
        }
    }

    fn parse_type(&mut self) {
        if self.matches(TokenKind::Type) {
            self.advance();
        }
    }

    fn parse_identifier(&mut self) {
        if self.matches(TokenKind::Identifier) {
            self.advance();
        }
    }

    // BLOCK := '{' COMMANDS '}'
    //
    // The Block statement is inserted at the index recorded before the `{`
    // was consumed, which places it right after its header statement and
    // before everything the block body produced.
    fn parse_block(&mut self) -> ParseResult<()> {
        let first = self.current;
        let pos = self.statements.len();
        self.consume(TokenKind::OpenBrace, "Expected '{' at the beginning of a block")?;
        self.parse_commands()?;
        let last = self.current;
        self.consume(TokenKind::CloseBrace, "Expected '}' at the end of a block")?;
        self.statements.insert(
            pos,
            Statement::new(&self.tokens[first..last], StatementKind::Block),
        );
        Ok(())
    }

    // COMMANDS := ( {COMMENT|NL} COMMAND {COMMENT} NL )*
    fn parse_commands(&mut self) -> ParseResult<()> {
        loop {
            self.skip_trivia();
            if self.matches(TokenKind::CloseBrace) {
                return Ok(());
            }
            self.parse_command()?;
            while self.matches(TokenKind::Comment) {
                self.advance();
            }
            self.consume(TokenKind::NewLine, "Expected new line")?;
        }
    }

    // COMMAND := IF | LOOP | OUT | RETURN | VAR_DECL | ASSIGN_OR_CALL
    fn parse_command(&mut self) -> ParseResult<()> {
        let token = self.current_token()?;
        match token.kind {
            TokenKind::Keyword => match token.text {
                "if" => self.parse_if(),
                "loop" => self.parse_loop(),
                "out" => self.parse_out(),
                "return" => self.parse_return(),
                _ => Err(ParseError::invalid_keyword(token)),
            },
            TokenKind::Type => self.parse_variable_declaration(),
            TokenKind::Identifier => self.parse_assignment_or_call(),
            TokenKind::Comment => {
                self.advance();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // IF := 'if' '(' CONDITION ')' BLOCK [ 'else' BLOCK ]
    fn parse_if(&mut self) -> ParseResult<()> {
        let start = self.current;
        self.consume(TokenKind::Keyword, "Expected 'if'")?;
        self.consume(TokenKind::OpenParenthesis, "Expected '('")?;
        self.parse_condition()?;
        self.consume(TokenKind::CloseParenthesis, "Expected ')'")?;
        self.push(start, StatementKind::If);
        self.parse_block()?;
        self.parse_else()
    }

    fn parse_else(&mut self) -> ParseResult<()> {
        if self.matches_keyword("else") {
            let start = self.current;
            self.consume(TokenKind::Keyword, "Expected 'else'")?;
            self.push(start, StatementKind::Else);
            self.parse_block()?;
        }
        Ok(())
    }

    // LOOP := 'loop' '(' [ FOR_COND | CONDITION ] ')' BLOCK
    //
    // Dispatch on the first condition token: a type starts a declaring for
    // condition, an identifier starts one only when `..` follows, a logical
    // operator starts a plain condition, and anything else falls through to
    // the closing parenthesis (`loop ()` is the infinite loop).
    fn parse_loop(&mut self) -> ParseResult<()> {
        let start = self.current;
        self.consume(TokenKind::Keyword, "Expected 'loop'")?;
        self.consume(TokenKind::OpenParenthesis, "Expected '('")?;
        if self.matches(TokenKind::Type) {
            self.parse_for_condition()?;
        } else if self.matches(TokenKind::Identifier) {
            if self.peek_kind(1) == Some(TokenKind::ForCondition) {
                self.parse_for_condition()?;
            } else {
                self.parse_condition()?;
            }
        } else if self.matches(TokenKind::LogicalOperator) {
            self.parse_condition()?;
        }
        self.consume(TokenKind::CloseParenthesis, "Expected ')'")?;
        self.push(start, StatementKind::Loop);
        self.parse_block()
    }

    // FOR_COND := ( TYPE IDENT '=' EXPR | IDENT ) '..' EXPR [ '!' EXPR ]
    fn parse_for_condition(&mut self) -> ParseResult<()> {
        if self.matches(TokenKind::Type) {
            self.parse_type();
            self.parse_identifier();
            self.consume(TokenKind::Equals, "Expected '='")?;
            self.parse_expression()?;
        } else {
            self.parse_identifier();
        }
        self.consume(TokenKind::ForCondition, "Expected '..'")?;
        self.parse_expression()?;
        if self.matches_step_marker() {
            self.advance();
            self.parse_expression()?;
        }
        Ok(())
    }

    // The step marker is a bare `!` after the upper bound. The lexer's
    // operator alternation claims `!` as a LogicalOperator, so accept that
    // alongside the dedicated ForStep kind.
    fn matches_step_marker(&self) -> bool {
        self.tokens.get(self.current).is_some_and(|t| {
            t.kind == TokenKind::ForStep || (t.kind == TokenKind::LogicalOperator && t.text == "!")
        })
    }

    // OUT := 'out' '(' EXPR ')'
    fn parse_out(&mut self) -> ParseResult<()> {
        let start = self.current;
        self.consume(TokenKind::Keyword, "Expected 'out'")?;
        self.consume(TokenKind::OpenParenthesis, "Expected '('")?;
        self.parse_expression()?;
        self.consume(TokenKind::CloseParenthesis, "Expected ')'")?;
        self.push(start, StatementKind::Out);
        Ok(())
    }

    // RETURN := 'return' EXPR
    fn parse_return(&mut self) -> ParseResult<()> {
        let start = self.current;
        self.consume(TokenKind::Keyword, "Expected 'return'")?;
        self.parse_expression()?;
        self.push(start, StatementKind::Return);
        Ok(())
    }

    // VAR_DECL := TYPE IDENT '=' EXPR
    fn parse_variable_declaration(&mut self) -> ParseResult<()> {
        let start = self.current;
        self.parse_type();
        self.parse_identifier();
        self.consume(TokenKind::Equals, "Expected '='")?;
        self.parse_expression()?;
        self.push(start, StatementKind::VariableDeclaration);
        Ok(())
    }

    // ASSIGN_OR_CALL := IDENT ( '=' EXPR | '(' ARGS ')' )
    fn parse_assignment_or_call(&mut self) -> ParseResult<()> {
        let start = self.current;
        let pos = self.statements.len();
        self.parse_identifier();
        if self.matches(TokenKind::Equals) {
            self.advance();
            self.parse_expression()?;
            self.statements.insert(
                pos,
                Statement::new(&self.tokens[start..self.current], StatementKind::Assignment),
            );
        } else {
            self.consume(TokenKind::OpenParenthesis, "Expected '('")?;
            self.parse_arguments()?;
            self.consume(TokenKind::CloseParenthesis, "Expected ')'")?;
            self.statements.insert(
                pos,
                Statement::new(&self.tokens[start..self.current], StatementKind::Call),
            );
        }
        Ok(())
    }

    // ARGS := ( EXPR ( ',' EXPR )* )?
    fn parse_arguments(&mut self) -> ParseResult<()> {
        if self.matches(TokenKind::CloseParenthesis) {
            return Ok(());
        }
        self.parse_expression()?;
        while self.matches(TokenKind::Comma) {
            self.advance();
            self.parse_expression()?;
        }
        Ok(())
    }

    // CONDITION := EXPR ( LOGOP EXPR )*
    fn parse_condition(&mut self) -> ParseResult<()> {
        self.parse_expression()?;
        while self.matches(TokenKind::LogicalOperator) {
            self.advance();
            self.parse_expression()?;
        }
        Ok(())
    }

    // EXPR := TERM ( NUMOP TERM )*
    //
    // Flat on purpose: there is no precedence between `+ -` and `* / %`,
    // everything associates left-to-right.
    fn parse_expression(&mut self) -> ParseResult<()> {
        self.parse_term()?;
        while self.matches(TokenKind::NumericalOperator) {
            self.advance();
            self.parse_term()?;
        }
        Ok(())
    }

    // TERM := FACTOR ( NUMOP FACTOR )*
    fn parse_term(&mut self) -> ParseResult<()> {
        self.parse_factor()?;
        while self.matches(TokenKind::NumericalOperator) {
            self.advance();
            self.parse_factor()?;
        }
        Ok(())
    }

    // FACTOR := (NUMOP | LOGOP) FACTOR | VALUE
    fn parse_factor(&mut self) -> ParseResult<()> {
        if self.matches(TokenKind::NumericalOperator) || self.matches(TokenKind::LogicalOperator) {
            self.advance();
            self.parse_factor()
        } else {
            self.parse_value()
        }
    }

    // VALUE := NUMBER | STRING | BOOLEAN | IDENT [ '(' ARGS ')' ]
    //        | 'in' '(' EXPR ')' | '(' EXPR ')'
    fn parse_value(&mut self) -> ParseResult<()> {
        let token = self.current_token()?;
        match token.kind {
            TokenKind::Number | TokenKind::String | TokenKind::Boolean => {
                self.advance();
                Ok(())
            }
            TokenKind::Identifier => {
                if self.peek_kind(1) == Some(TokenKind::OpenParenthesis) {
                    self.parse_call_in_expression()
                } else {
                    self.advance();
                    Ok(())
                }
            }
            TokenKind::Keyword if token.text == "in" => self.parse_input(),
            _ => {
                self.consume(TokenKind::OpenParenthesis, "Expected '('")?;
                self.parse_expression()?;
                self.consume(TokenKind::CloseParenthesis, "Expected ')'")
            }
        }
    }

    // A call in value position consumes its tokens but emits no statement;
    // only statement-position calls become `Call` fragments.
    fn parse_call_in_expression(&mut self) -> ParseResult<()> {
        self.parse_identifier();
        self.consume(TokenKind::OpenParenthesis, "Expected '('")?;
        self.parse_arguments()?;
        self.consume(TokenKind::CloseParenthesis, "Expected ')'")
    }

    // INPUT := 'in' '(' EXPR ')'
    fn parse_input(&mut self) -> ParseResult<()> {
        self.consume(TokenKind::Keyword, "Expected 'in'")?;
        self.consume(TokenKind::OpenParenthesis, "Expected '('")?;
        self.parse_expression()?;
        self.consume(TokenKind::CloseParenthesis, "Expected ')'")
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<()> {
        if self.matches(kind) {
            let token = self.current_token()?;
            trace!(kind = ?token.kind, text = token.text, "consuming");
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(message, self.current_token()?))
        }
    }

    fn current_token(&self) -> ParseResult<Token<'a>> {
        self.tokens
            .get(self.current)
            .copied()
            .ok_or(ParseError::UnexpectedEof)
    }

    fn matches(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.current)
            .is_some_and(|t| t.kind == kind)
    }

    fn matches_keyword(&self, keyword: &str) -> bool {
        self.tokens
            .get(self.current)
            .is_some_and(|t| t.kind == TokenKind::Keyword && t.text == keyword)
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.current + offset).map(|t| t.kind)
    }

    fn advance(&mut self) {
        self.current += 1;
    }

    fn skip_trivia(&mut self) {
        while self.matches(TokenKind::Comment) || self.matches(TokenKind::NewLine) {
            self.advance();
        }
    }

    fn push(&mut self, start: usize, kind: StatementKind) {
        self.statements
            .push(Statement::new(&self.tokens[start..self.current], kind));
    }
}
