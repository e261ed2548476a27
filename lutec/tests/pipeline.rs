///
/// Pipeline Integration Tests
///
/// Drives whole programs through tokenize -> parse -> analyze -> generate
/// and asserts on the observable results: statement shapes, first-error
/// diagnostics and the generated Kotlin text.
///

use lutec::parser::StatementKind;
use lutec::{analyze, compile, generate, parse, tokenize, CompileError};

const DEMO_PROGRAM: &str = "/* this is a comment */
str test(str argument, num argument2){
out(argument) /* this is a comment */
out(argument2)
return 'hello'
}

main {
num x = 5
if (x == 5) {
num y = 7.2 % 2
} else {
loop ( num z = 0 .. 9) {
/*this is also a comment*/ str message = 'its dangerous'
test( message , z)
}
}
}
";

#[test]
fn demo_program_compiles_end_to_end() {
    let code = compile(DEMO_PROGRAM).unwrap();
    assert!(code.contains("fun test(argument: String, argument2: Double) : String"));
    assert!(code.contains("println(argument)"));
    assert!(code.contains("return \"hello\""));
    assert!(code.contains("fun main()"));
    assert!(code.contains("var x :Double = 5.0"));
    assert!(code.contains("if (x == 5.0)"));
    assert!(code.contains("var y :Double = 7.2 % 2.0"));
    assert!(code.contains("} else {"));
    assert!(code.contains("for(z in 0.0..9.0)"));
    assert!(code.contains("var message :String = \"its dangerous\""));
    assert!(code.contains("test(message, z)"));
    assert_eq!(code.matches('{').count(), code.matches('}').count());
}

#[test]
fn empty_main_block_is_accepted() {
    assert_eq!(compile("main {\n}\n").unwrap(), "fun main(){\n}");
}

#[test]
fn every_header_is_followed_by_its_block() {
    let tokens = tokenize(DEMO_PROGRAM).tokens;
    let statements = parse(&tokens).unwrap();
    for (i, statement) in statements.iter().enumerate() {
        if matches!(
            statement.kind,
            StatementKind::Main
                | StatementKind::If
                | StatementKind::Else
                | StatementKind::Loop
                | StatementKind::FunctionDeclaration
        ) {
            assert_eq!(statements[i + 1].kind, StatementKind::Block);
        }
    }
}

#[test]
fn invalid_characters_count_into_the_lexer_exit_code() {
    let lexed = tokenize("main {\nnum x = 5 @ #\n}\n");
    assert_eq!(lexed.exit_code, 2);
    assert_eq!(lexed.invalid_tokens().count(), 2);
    assert_eq!(
        compile("main {\nnum x = 5 @ #\n}\n").unwrap_err(),
        CompileError::Lex(2)
    );
}

#[test]
fn missing_newline_between_commands_is_a_parse_error() {
    let err = compile("main {\nnum x = 5 num y = 2\n}\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "On line 2, Column 10 Expected new line, found: num"
    );
}

#[test]
fn undeclared_identifier_in_if_condition_is_rejected() {
    let err = compile("main {\nif (x == 5) {\nout(5)\n}\n}\n").unwrap_err();
    assert_eq!(err.to_string(), "Variable x not declared");
}

#[test]
fn counted_loop_with_step_rewrites_to_a_kotlin_for() {
    let code = compile("main {\nloop ( num z = 0 .. 9 ! 2 ) {\nout(5)\n}\n}\n").unwrap();
    assert!(code.contains("for(z in 0.0..9.0 step 2.0)"), "got: {code}");
}

#[test]
fn xor_operator_spells_out_in_conditions() {
    let code =
        compile("main {\nbool a = true\nbool b = false\nif (a ^ b) {\nout(a)\n}\n}\n").unwrap();
    assert!(code.contains("if (a xor b)"), "got: {code}");
}

#[test]
fn input_assignment_converts_by_declared_type() {
    let code = compile("main {\nnum x = 5\nx = in('give me a number')\n}\n").unwrap();
    assert!(code.contains("println(\"give me a number\")"), "got: {code}");
    assert!(code.contains("x = readLine()!!.toDouble()"), "got: {code}");
}

#[test]
fn integer_literals_become_doubles_everywhere() {
    let code = compile("main {\nnum x = 1 + 2 * 3\nx = x % 4\n}\n").unwrap();
    assert!(code.contains("var x :Double = 1.0 + 2.0 * 3.0"), "got: {code}");
    assert!(code.contains("x = x % 4.0"), "got: {code}");
}

#[test]
fn generation_only_runs_after_analysis() {
    let err = compile("main {\nx = 5\n}\n").unwrap_err();
    assert!(matches!(err, CompileError::Semantic(_)));
    assert_eq!(err.to_string(), "Variable x not declared");
}

// Generated Kotlin stays inside the lexer's own alphabet as long as the
// source used no strings (no type annotations with ':' and no '"' appear
// then), so re-lexing the output reports a clean exit code.
#[test]
fn quote_free_output_relexes_cleanly() {
    for source in ["main {\n}\n", "main {\nout(5)\n}\n"] {
        let code = compile(source).unwrap();
        let relexed = tokenize(&code);
        assert_eq!(relexed.exit_code, 0, "output not lexable: {code}");
    }
}

#[test]
fn symbols_survive_into_generation() {
    let tokens = tokenize("num f(num a) {\nreturn a * 2\n}\nmain {\nnum x = 1\nf(x)\n}\n").tokens;
    let statements = parse(&tokens).unwrap();
    let symbols = analyze(&statements).unwrap();
    assert!(symbols.contains("f_main"));
    assert!(symbols.contains("a_f"));
    assert!(symbols.contains("x_main"));
    let code = generate(&statements, &symbols);
    assert!(code.contains("fun f(a: Double) : Double"), "got: {code}");
    assert!(code.contains("return a * 2.0"), "got: {code}");
    assert!(code.contains("f(x)"), "got: {code}");
}
