///
/// lutec - The Lute Compiler Library
///
/// This crate provides the front-end pipeline for the Lute programming
/// language, a small imperative language that transpiles to Kotlin. It
/// includes:
///
/// - lexer: Line-oriented tokenization of Lute source code
/// - parser: Parsing tokens into a flat, preorder statement list
/// - analyzer: Declaration and shape checks over the statement list
/// - codegen: Kotlin source text generation
///
/// Entry points:
/// - `tokenize`: Convert source text into tokens
/// - `parse`: Parse tokens into statements
/// - `analyze`: Build the symbol table and reject invalid programs
/// - `generate`: Emit Kotlin text from statements and symbols
/// - `compile`: Run all four stages in order
///

pub mod analyzer;
pub mod codegen;
pub mod lexer;
pub mod parser;

pub use analyzer::analyze;
pub use codegen::generate;
pub use lexer::tokenize;
pub use parser::parse;

use analyzer::SemanticError;
use parser::ParseError;
use thiserror::Error;

/// Failure of any pipeline stage. Lexing never aborts on its own; a
/// non-zero invalid-token count is promoted to an error here so that
/// `compile` refuses to go further, the same way the CLI does.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("lexing finished with exit code {0}")]
    Lex(u32),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

/// Source text in, Kotlin text out.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let lexed = tokenize(source);
    if lexed.exit_code > 0 {
        return Err(CompileError::Lex(lexed.exit_code));
    }
    let statements = parse(&lexed.tokens)?;
    let symbols = analyze(&statements)?;
    Ok(generate(&statements, &symbols))
}

#[test]
fn test_compile_demo_program() {
    let source = r#"/* greeter with a counted loop */
str test(str argument, num argument2){
out(argument)
out(argument2)
return 'hello'
}

main {
num x = 5
if (x == 5) {
num y = 7.2 % 2
} else {
loop ( num z = 0 .. 9 ) {
str message = 'its dangerous'
test( message , z)
}
}
}
"#;
    let code = compile(source).unwrap();
    assert!(code.contains("fun test(argument: String, argument2: Double) : String"));
    assert!(code.contains("fun main()"));
    assert!(code.contains("for(z in 0.0..9.0)"));
    assert_eq!(code.matches('{').count(), code.matches('}').count());
}
