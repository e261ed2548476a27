//!
//! Semantic Analyzer - Declaration and Shape Checks
//!
//! Single pass over the flat statement list. Declarations populate the
//! symbol table; uses are checked against it. Because the list is preorder,
//! "the next statement" after a `main`, function, `if`, `else` or `loop`
//! header is its body, so body-presence checks are plain `statements[i + 1]`
//! lookups.
//!
//! Scope tracking is a single mutable name: it starts at `"main"` and is
//! overwritten whenever a function header or the main header is visited.
//! There is no scope stack and no popping, which faithfully yields the
//! known lookup quirks (calls resolve against `<fn>_<current_scope>` even
//! though functions register under `<fn>_main`).
//!
//! Analysis stops at the first violation.
//!

pub mod error;
pub mod symbols;

pub use error::SemanticError;
pub use symbols::{SourceType, Symbol, SymbolKind, SymbolTable};

use tracing::debug;

use crate::lexer::TokenKind;
use crate::parser::{Statement, StatementKind};

pub fn analyze(statements: &[Statement<'_>]) -> Result<SymbolTable, SemanticError> {
    let mut analyzer = Analyzer::new(statements);
    analyzer.run()?;
    Ok(analyzer.symbols)
}

struct Analyzer<'a, 's> {
    statements: &'s [Statement<'a>],
    symbols: SymbolTable,
    current_scope: &'a str,
}

impl<'a, 's> Analyzer<'a, 's> {
    fn new(statements: &'s [Statement<'a>]) -> Self {
        Self {
            statements,
            symbols: SymbolTable::new(),
            current_scope: "main",
        }
    }

    fn run(&mut self) -> Result<(), SemanticError> {
        for (index, statement) in self.statements.iter().enumerate() {
            debug!(kind = ?statement.kind, index, "analyzing statement");
            match statement.kind {
                StatementKind::FunctionDeclaration => {
                    self.check_function_declaration(index, statement)?
                }
                StatementKind::Main => self.check_main(index)?,
                StatementKind::VariableDeclaration => self.check_variable_declaration(statement)?,
                StatementKind::Assignment => self.check_assignment(statement)?,
                StatementKind::Call => self.check_call(statement)?,
                StatementKind::If => self.check_if(index, statement)?,
                StatementKind::Else => self.check_body(index, SemanticError::ElseMissingBody)?,
                StatementKind::Loop => self.check_body(index, SemanticError::LoopMissingBody)?,
                StatementKind::Out | StatementKind::In => self.check_reference(statement, 2)?,
                StatementKind::Return => self.check_reference(statement, 1)?,
                StatementKind::Block => {}
                StatementKind::Invalid => return Err(SemanticError::InvalidStatement),
            }
        }
        Ok(())
    }

    // Order matters: duplicates are reported before missing bodies, and the
    // return-statement check runs before the function is registered.
    fn check_function_declaration(
        &mut self,
        index: usize,
        statement: &Statement<'a>,
    ) -> Result<(), SemanticError> {
        let name = statement.token_text(1);
        let return_type =
            SourceType::parse(statement.token_text(0)).unwrap_or(SourceType::Any);
        let key = SymbolTable::key(name, "main");
        if self.symbols.contains(&key) {
            return Err(SemanticError::FunctionAlreadyDeclared(name.to_string()));
        }
        let Some(body) = self.statements.get(index + 1) else {
            return Err(SemanticError::FunctionMissingBody(name.to_string()));
        };
        if return_type != SourceType::Any && !body.tokens.iter().any(|t| t.text == "return") {
            return Err(SemanticError::FunctionMissingReturn(name.to_string()));
        }
        self.symbols.insert(
            key,
            Symbol { kind: SymbolKind::Function, declared_type: return_type },
        );
        self.current_scope = name;

        // Header identifiers become variables of the function's scope, each
        // typed by the type token immediately before it.
        let header = statement.token_range(2, statement.tokens.len());
        for (offset, token) in header.iter().enumerate() {
            if token.kind == TokenKind::Identifier {
                let declared_type = offset
                    .checked_sub(1)
                    .and_then(|i| header.get(i))
                    .and_then(|t| SourceType::parse(t.text))
                    .unwrap_or(SourceType::Any);
                self.symbols.insert(
                    SymbolTable::key(token.text, self.current_scope),
                    Symbol { kind: SymbolKind::Variable, declared_type },
                );
            }
        }
        Ok(())
    }

    fn check_main(&mut self, index: usize) -> Result<(), SemanticError> {
        self.current_scope = "main";
        if self.symbols.contains("main") {
            return Err(SemanticError::MainAlreadyDeclared);
        }
        match self.statements.get(index + 1) {
            Some(next) if next.kind == StatementKind::Block => {}
            _ => return Err(SemanticError::MainMissingBody),
        }
        self.symbols.insert(
            "main".to_string(),
            Symbol { kind: SymbolKind::Function, declared_type: SourceType::Any },
        );
        Ok(())
    }

    fn check_variable_declaration(
        &mut self,
        statement: &Statement<'a>,
    ) -> Result<(), SemanticError> {
        let name = statement.token_text(1);
        let Some(declared_type) = SourceType::parse(statement.token_text(0)) else {
            return Ok(());
        };
        let key = SymbolTable::key(name, self.current_scope);
        if self.symbols.contains(&key) {
            return Err(SemanticError::VariableAlreadyDeclared(name.to_string()));
        }
        if let Some(initializer) = statement.tokens.get(3) {
            if !initialization_matches(declared_type, initializer.kind) {
                return Err(SemanticError::InvalidInitialization {
                    name: name.to_string(),
                    expected: declared_type,
                });
            }
        }
        self.symbols.insert(
            key,
            Symbol { kind: SymbolKind::Variable, declared_type },
        );
        Ok(())
    }

    fn check_assignment(&mut self, statement: &Statement<'a>) -> Result<(), SemanticError> {
        let name = statement.token_text(0);
        if !self.symbols.contains(&SymbolTable::key(name, self.current_scope)) {
            return Err(SemanticError::VariableNotDeclared(name.to_string()));
        }
        Ok(())
    }

    // Lookup is against the *current* scope, while functions register under
    // `_main`; calls written inside other functions therefore fail to
    // resolve.
    fn check_call(&mut self, statement: &Statement<'a>) -> Result<(), SemanticError> {
        let name = statement.token_text(0);
        if !self.symbols.contains(&SymbolTable::key(name, self.current_scope)) {
            return Err(SemanticError::FunctionNotDeclared(name.to_string()));
        }
        Ok(())
    }

    // A single-token condition `if (x)` is rejected: the token after it is
    // already the closing parenthesis.
    fn check_if(&mut self, index: usize, statement: &Statement<'a>) -> Result<(), SemanticError> {
        if statement.tokens.get(3).is_some_and(|t| t.text == ")") {
            return Err(SemanticError::IfMissingCondition);
        }
        let end = statement.tokens.len().saturating_sub(1);
        for token in statement.token_range(2, end) {
            if token.kind == TokenKind::Identifier
                && !self
                    .symbols
                    .contains(&SymbolTable::key(token.text, self.current_scope))
            {
                return Err(SemanticError::VariableNotDeclared(token.text.to_string()));
            }
        }
        self.check_body(index, SemanticError::IfMissingBody)
    }

    fn check_body(&self, index: usize, error: SemanticError) -> Result<(), SemanticError> {
        match self.statements.get(index + 1) {
            Some(next) if next.kind == StatementKind::Block => Ok(()),
            _ => Err(error),
        }
    }

    // Literals pass unchecked; only identifier operands must resolve.
    fn check_reference(
        &self,
        statement: &Statement<'a>,
        position: usize,
    ) -> Result<(), SemanticError> {
        if let Some(token) = statement.tokens.get(position) {
            if token.kind == TokenKind::Identifier
                && !self
                    .symbols
                    .contains(&SymbolTable::key(token.text, self.current_scope))
            {
                return Err(SemanticError::VariableNotDeclared(token.text.to_string()));
            }
        }
        Ok(())
    }
}

// `in(...)` initializers (keyword head) are accepted for every declared
// type; literal initializers must match. An `any` variable can only be
// initialized through `in(...)`.
fn initialization_matches(declared: SourceType, initializer: TokenKind) -> bool {
    if initializer == TokenKind::Keyword {
        return true;
    }
    match declared {
        SourceType::Num => initializer == TokenKind::Number,
        SourceType::Str => initializer == TokenKind::String,
        SourceType::Bool => initializer == TokenKind::Boolean,
        SourceType::Any => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{tokenize, Token};
    use crate::parser::parse;

    fn analyze_source(source: &str) -> Result<SymbolTable, SemanticError> {
        let tokens = tokenize(source).tokens;
        let statements = parse(&tokens).unwrap();
        analyze(&statements)
    }

    #[test]
    fn minimal_main_registers_pseudo_entry() {
        let symbols = analyze_source("main {\n}\n").unwrap();
        assert_eq!(symbols.len(), 1);
        let symbol = symbols.get("main").unwrap();
        assert_eq!(symbol.kind, SymbolKind::Function);
        assert_eq!(symbol.declared_type, SourceType::Any);
    }

    #[test]
    fn leading_comment_program_is_clean() {
        analyze_source("/* c */\nmain {\n}\n").unwrap();
    }

    #[test]
    fn variable_declarations_key_on_scope() {
        let symbols = analyze_source("main {\nnum x = 5\nstr y = 'hi'\n}\n").unwrap();
        assert_eq!(symbols.get("x_main").unwrap().declared_type, SourceType::Num);
        assert_eq!(symbols.get("y_main").unwrap().declared_type, SourceType::Str);
    }

    #[test]
    fn duplicate_variable() {
        let err = analyze_source("main {\nnum x = 5\nnum x = 6\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "Variable x already declared");
    }

    #[test]
    fn initializer_type_mismatch() {
        let err = analyze_source("main {\nnum x = 'five'\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "Variable x must be initialized with a num");
    }

    #[test]
    fn any_variable_requires_input_initializer() {
        let err = analyze_source("main {\nany x = 5\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "Variable x must be initialized with a any");
        analyze_source("main {\nany x = in('value?')\n}\n").unwrap();
    }

    #[test]
    fn assignment_to_undeclared_variable() {
        let err = analyze_source("main {\nx = 5\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "Variable x not declared");
    }

    #[test]
    fn if_condition_identifiers_must_resolve() {
        let err = analyze_source("main {\nif (x == 5) {\n}\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "Variable x not declared");
    }

    #[test]
    fn single_token_if_condition_is_rejected() {
        let err = analyze_source("main {\nbool x = true\nif (x) {\n}\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "If statement must have a condition");
    }

    #[test]
    fn function_parameters_register_in_function_scope() {
        let symbols =
            analyze_source("str f(str a, num b) {\nreturn a\n}\nmain {\n}\n").unwrap();
        assert_eq!(symbols.get("f_main").unwrap().kind, SymbolKind::Function);
        assert_eq!(symbols.get("a_f").unwrap().declared_type, SourceType::Str);
        assert_eq!(symbols.get("b_f").unwrap().declared_type, SourceType::Num);
    }

    #[test]
    fn typed_function_must_return() {
        let err = analyze_source("str f() {\nout(5)\n}\nmain {\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "Function f must return a value");
    }

    #[test]
    fn any_function_need_not_return() {
        analyze_source("any f() {\nout(5)\n}\nmain {\n}\n").unwrap();
    }

    #[test]
    fn duplicate_function() {
        let err = analyze_source(
            "any f() {\nout(5)\n}\nany f() {\nout(6)\n}\nmain {\n}\n",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Function f already declared");
    }

    #[test]
    fn call_resolves_in_main_scope() {
        analyze_source("any f() {\nout(5)\n}\nmain {\nf()\n}\n").unwrap();
    }

    #[test]
    fn call_to_undeclared_function() {
        let err = analyze_source("main {\ng()\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "Function g not declared");
    }

    #[test]
    fn out_checks_identifier_operands_only() {
        analyze_source("main {\nout(5)\n}\n").unwrap();
        let err = analyze_source("main {\nout(x)\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "Variable x not declared");
    }

    // Two Main fragments cannot come out of the parser, so the duplicate
    // check is exercised on a hand-built list.
    #[test]
    fn duplicate_main() {
        fn tok(kind: TokenKind, text: &'static str) -> Token<'static> {
            Token::new(kind, text, 1, 0)
        }
        let main_tokens = [tok(TokenKind::Keyword, "main")];
        let block_tokens = [tok(TokenKind::OpenBrace, "{")];
        let statements = [
            Statement::new(&main_tokens, StatementKind::Main),
            Statement::new(&block_tokens, StatementKind::Block),
            Statement::new(&main_tokens, StatementKind::Main),
            Statement::new(&block_tokens, StatementKind::Block),
        ];
        let err = analyze(&statements).unwrap_err();
        assert_eq!(err.to_string(), "Main function already declared");
    }

    #[test]
    fn main_without_body_is_rejected() {
        fn tok(kind: TokenKind, text: &'static str) -> Token<'static> {
            Token::new(kind, text, 1, 0)
        }
        let main_tokens = [tok(TokenKind::Keyword, "main")];
        let statements = [Statement::new(&main_tokens, StatementKind::Main)];
        let err = analyze(&statements).unwrap_err();
        assert_eq!(err.to_string(), "Main function must have a body");
    }

    // Headerless bodies cannot come out of the parser either; the missing-
    // body paths are pinned on hand-built lists like the duplicate-main
    // case above.
    #[test]
    fn function_without_body_is_rejected() {
        fn tok(kind: TokenKind, text: &'static str) -> Token<'static> {
            Token::new(kind, text, 1, 0)
        }
        let decl_tokens = [
            tok(TokenKind::Type, "str"),
            tok(TokenKind::Identifier, "f"),
            tok(TokenKind::OpenParenthesis, "("),
            tok(TokenKind::CloseParenthesis, ")"),
        ];
        let statements = [Statement::new(&decl_tokens, StatementKind::FunctionDeclaration)];
        let err = analyze(&statements).unwrap_err();
        assert_eq!(err.to_string(), "Function f must have a body");
    }

    #[test]
    fn else_without_body_is_rejected() {
        fn tok(kind: TokenKind, text: &'static str) -> Token<'static> {
            Token::new(kind, text, 1, 0)
        }
        let else_tokens = [tok(TokenKind::Keyword, "else")];
        let statements = [Statement::new(&else_tokens, StatementKind::Else)];
        let err = analyze(&statements).unwrap_err();
        assert_eq!(err.to_string(), "Else statement must have a body");
    }

    #[test]
    fn loop_without_body_is_rejected() {
        fn tok(kind: TokenKind, text: &'static str) -> Token<'static> {
            Token::new(kind, text, 1, 0)
        }
        let loop_tokens = [
            tok(TokenKind::Keyword, "loop"),
            tok(TokenKind::OpenParenthesis, "("),
            tok(TokenKind::CloseParenthesis, ")"),
        ];
        let statements = [Statement::new(&loop_tokens, StatementKind::Loop)];
        let err = analyze(&statements).unwrap_err();
        assert_eq!(err.to_string(), "Loop statement must have a body");
    }
}
