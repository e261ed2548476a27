//!
//! Code Generator - Kotlin Text Emission
//!
//! Lowers the flat statement list into a Kotlin source string. Generation
//! is infallible: by the time it runs, the analyzer has accepted the
//! program, and anything it cannot resolve falls back to `Any`.
//!
//! Blocks are closed by line comparison rather than by structure. Each
//! `Block` pushes the line of its last token; after every lowered statement
//! the generator pops all blocks whose recorded line lies behind the
//! current one and prefixes `} ` to the most recent output line. Leftover
//! blocks close with trailing `}` lines at the end. The `else` fragment is
//! emitted without a newline so a closing brace lands in front of it as
//! `} else {`.
//!
//! A final text pass collapses blank lines, repairs `(,` sequences and
//! rewrites single quotes to double quotes.
//!

use std::borrow::Cow;

use tracing::debug;

use crate::analyzer::{SourceType, SymbolTable};
use crate::lexer::{Token, TokenKind};
use crate::parser::{Statement, StatementKind};

pub fn generate<'a>(statements: &'a [Statement<'a>], symbols: &'a SymbolTable) -> String {
    Generator::new(symbols).run(statements)
}

struct Generator<'a> {
    symbols: &'a SymbolTable,
    code: String,
    last_block: Vec<u32>,
    current_line: u32,
    current_scope: &'a str,
}

impl<'a> Generator<'a> {
    fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            code: String::new(),
            last_block: Vec::new(),
            current_line: 0,
            current_scope: "main",
        }
    }

    fn run(mut self, statements: &'a [Statement<'a>]) -> String {
        for statement in statements {
            debug!(kind = ?statement.kind, "lowering statement");
            match statement.kind {
                StatementKind::Main => self.write_main(),
                StatementKind::FunctionDeclaration => self.write_function_declaration(statement),
                StatementKind::Block => self.write_block(statement),
                StatementKind::VariableDeclaration => self.write_variable_declaration(statement),
                StatementKind::Assignment => self.write_assignment(statement),
                StatementKind::If => self.write_if(statement),
                StatementKind::Else => self.code.push_str("else "),
                StatementKind::Loop => self.write_loop(statement),
                StatementKind::Out => self.write_out(statement),
                StatementKind::In => self.write_in(statement),
                StatementKind::Return => self.write_return(statement),
                StatementKind::Call => self.write_call(statement),
                StatementKind::Invalid => {}
            }
            if let Some(last) = statement.tokens.last() {
                self.current_line = last.line;
            }
            self.close_blocks();
        }
        for _ in 0..self.last_block.len() {
            self.code.push_str("}\n");
        }
        finish(&self.code)
    }

    fn write_main(&mut self) {
        self.current_scope = "main";
        self.code.push_str("fun main()");
    }

    fn write_function_declaration(&mut self, statement: &Statement<'a>) {
        let name = statement.token_text(1);
        self.current_scope = name;
        let parameters: Vec<String> = statement
            .token_range(2, statement.tokens.len())
            .iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| format!("{}: {}", t.text, self.host_type_of(t.text)))
            .collect();
        let return_type = SourceType::parse(statement.token_text(0))
            .unwrap_or(SourceType::Any)
            .host();
        self.code.push_str(&format!(
            "fun {}({}) : {}",
            name,
            parameters.join(", "),
            return_type
        ));
    }

    fn write_block(&mut self, statement: &Statement<'a>) {
        self.code.push_str("{\n");
        if let Some(last) = statement.tokens.last() {
            self.last_block.push(last.line);
        }
    }

    fn write_variable_declaration(&mut self, statement: &Statement<'a>) {
        let name = statement.token_text(1);
        let host = SourceType::parse(statement.token_text(0))
            .unwrap_or(SourceType::Any)
            .host();
        let value = render_expression(statement.token_range(3, statement.tokens.len()));
        self.code
            .push_str(&format!("var {name} :{host} = {value}\n"));
    }

    // `x = in('prompt')` reads from standard input instead of assigning.
    fn write_assignment(&mut self, statement: &Statement<'a>) {
        if self.is_input_fed(statement) {
            self.write_in(statement);
            return;
        }
        let name = statement.token_text(0);
        let value = render_expression(statement.token_range(2, statement.tokens.len()));
        self.code.push_str(&format!("{name} = {value}\n"));
    }

    fn write_if(&mut self, statement: &Statement<'a>) {
        let end = statement.tokens.len().saturating_sub(1);
        let condition = render_expression(statement.token_range(2, end));
        self.code.push_str(&format!("if ({condition})\n"));
    }

    // Three forms: `loop ()` is the infinite loop, a `..` range becomes a
    // counted for, anything else a while. The for rewrite keeps the
    // fragment's own closing parenthesis.
    fn write_loop(&mut self, statement: &Statement<'a>) {
        if statement
            .tokens
            .get(2)
            .is_some_and(|t| t.kind == TokenKind::CloseParenthesis)
        {
            self.code.push_str("while(true)");
            return;
        }
        let condition = statement.token_range(2, statement.tokens.len());
        if condition.iter().any(|t| t.kind == TokenKind::ForCondition) {
            self.code.push_str("for(");
            for token in condition {
                match token.kind {
                    TokenKind::Type => {}
                    TokenKind::Equals => self.code.push_str(" in "),
                    TokenKind::ForStep => self.code.push_str(" step "),
                    TokenKind::LogicalOperator if token.text == "!" => {
                        self.code.push_str(" step ")
                    }
                    _ => self.code.push_str(&render_token(token)),
                }
            }
        } else {
            let end = statement.tokens.len().saturating_sub(1);
            let condition = render_expression(statement.token_range(2, end));
            self.code.push_str(&format!("while({condition})"));
        }
    }

    fn write_out(&mut self, statement: &Statement<'a>) {
        let end = statement.tokens.len().saturating_sub(1);
        let value = render_expression(statement.token_range(2, end));
        self.code.push_str(&format!("println({value})\n"));
    }

    // Prompt, then a readLine with a conversion chosen from the target's
    // declared type. The fragment reads `x = in ( <prompt> )`, so the
    // prompt spans tokens 4 to the closing parenthesis.
    fn write_in(&mut self, statement: &Statement<'a>) {
        let target = statement.token_text(0);
        let end = statement.tokens.len().saturating_sub(1);
        let prompt = render_expression(statement.token_range(4, end));
        self.code.push_str(&format!("println({prompt})\n"));
        self.code.push_str(&format!("{target} = readLine()!!"));
        match self.declared_type_of(target) {
            Some(SourceType::Num) => self.code.push_str(".toDouble()"),
            Some(SourceType::Bool) => self.code.push_str(".toBoolean()"),
            _ => {}
        }
        self.code.push('\n');
    }

    fn write_return(&mut self, statement: &Statement<'a>) {
        let value = render_expression(statement.token_range(1, statement.tokens.len()));
        self.code.push_str(&format!("return {value}\n"));
    }

    // Only identifier arguments survive the lowering; literal arguments are
    // dropped.
    fn write_call(&mut self, statement: &Statement<'a>) {
        let name = statement.token_text(0);
        let arguments: Vec<&str> = statement
            .token_range(1, statement.tokens.len())
            .iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text)
            .collect();
        self.code
            .push_str(&format!("{}({})\n", name, arguments.join(", ")));
    }

    fn is_input_fed(&self, statement: &Statement<'a>) -> bool {
        statement
            .tokens
            .iter()
            .any(|t| t.kind == TokenKind::Keyword && t.text == "in")
    }

    fn declared_type_of(&self, name: &str) -> Option<SourceType> {
        self.symbols
            .get(&SymbolTable::key(name, self.current_scope))
            .map(|s| s.declared_type)
    }

    fn host_type_of(&self, name: &str) -> &'static str {
        self.declared_type_of(name)
            .unwrap_or(SourceType::Any)
            .host()
    }

    fn close_blocks(&mut self) {
        while self
            .last_block
            .last()
            .is_some_and(|&line| line < self.current_line)
        {
            self.last_block.pop();
            let start = self.code.rfind('\n').map_or(0, |i| i + 1);
            self.code.insert_str(start, "} ");
        }
    }
}

/// Tokens joined with single spaces. Integer number literals pick up a
/// `.0` suffix since every source number is a Kotlin `Double`, and the
/// `^` operator spells `xor` on the host side.
fn render_expression(tokens: &[Token<'_>]) -> String {
    tokens
        .iter()
        .map(render_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_token<'t>(token: &Token<'t>) -> Cow<'t, str> {
    match token.kind {
        TokenKind::Number if !token.text.contains('.') => {
            Cow::Owned(format!("{}.0", token.text))
        }
        TokenKind::LogicalOperator if token.text == "^" => Cow::Borrowed("xor"),
        _ => Cow::Borrowed(token.text),
    }
}

fn finish(code: &str) -> String {
    code.trim()
        .replace("\n\n", "\n")
        .replace("(,", "(")
        .replace('\'', "\"")
}
