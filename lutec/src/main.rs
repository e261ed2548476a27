///
/// lute CLI - The Lute transpiler command-line interface
///
/// Runs the four-stage pipeline over a Lute program and prints a stage
/// report: lexer exit code and token dump, parser exit code and statement
/// dump, then either the first semantic error or the generated Kotlin
/// source. Errors print in red; any stage failure makes the process exit
/// with status 1.
///
/// Input comes from a positional source string, from `-f <file>`, or from
/// a small interactive menu when no arguments are given.
///

use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lutec::analyzer::SymbolTable;
use lutec::lexer::{LexResult, Token};
use lutec::parser::Statement;
use lutec::{analyze, generate, parse, tokenize};

const RED: &str = "\u{1b}[31m";
const RESET: &str = "\u{1b}[0m";

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

#[derive(Parser)]
#[command(name = "lute")]
#[command(author, version, about = "The Lute to Kotlin transpiler", long_about = None)]
struct Cli {
    /// Lute source text to compile
    source: Option<String>,

    /// Read the source from a file instead
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Dump tokens, statements and symbols as JSON
    #[arg(long)]
    json: bool,

    /// Log every pipeline stage to stderr
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let source = if let Some(path) = &cli.file {
        match read_source_file(path) {
            Some(source) => source,
            None => return ExitCode::FAILURE,
        }
    } else if let Some(source) = cli.source {
        source
    } else {
        match prompt_for_source() {
            Some(source) => source,
            None => return ExitCode::FAILURE,
        }
    };

    run_pipeline(&source, cli.json)
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_source_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(_) => {
            println!("File not found: {}", path.display());
            None
        }
    }
}

fn prompt_for_source() -> Option<String> {
    println!("Choose an option:");
    println!("1. Test a predefined string");
    println!("2. Enter your own string input");
    println!("3. Enter a file location to parse");
    print!("Enter the option number: ");
    let _ = io::stdout().flush();

    match read_input_line()?.trim() {
        "1" => Some(DEMO_PROGRAM.to_string()),
        "2" => {
            println!("Enter your own string input (end with EOF):");
            let mut source = String::new();
            io::stdin().read_to_string(&mut source).ok()?;
            Some(source)
        }
        "3" => {
            print!("Enter the file location to parse: ");
            let _ = io::stdout().flush();
            let path = read_input_line()?;
            read_source_file(Path::new(path.trim()))
        }
        _ => {
            println!("Invalid option");
            None
        }
    }
}

fn read_input_line() -> Option<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    Some(line)
}

fn run_pipeline(source: &str, json: bool) -> ExitCode {
    let lexed = tokenize(source);
    report_lexed(&lexed, json);

    let statements = match parse(&lexed.tokens) {
        Ok(statements) => {
            println!("\nParser Exit Code: 0");
            report_statements(&statements, json);
            statements
        }
        Err(error) => {
            println!("\nParser Exit Code: 1");
            println!("{RED}{error}{RESET}");
            return ExitCode::FAILURE;
        }
    };

    let symbols = match analyze(&statements) {
        Ok(symbols) => symbols,
        Err(error) => {
            println!("{RED}{error}{RESET}");
            return ExitCode::FAILURE;
        }
    };
    report_symbols(&symbols, json);

    println!("{}", generate(&statements, &symbols));

    if lexed.exit_code > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn report_lexed(lexed: &LexResult<'_>, json: bool) {
    println!("Lexer finished with Exit Code: {}", lexed.exit_code);
    if json {
        println!("{}", serde_json::to_string_pretty(&lexed.tokens).unwrap_or_default());
    } else {
        for token in &lexed.tokens {
            print_token(token);
        }
    }
    if lexed.exit_code > 0 {
        println!("Invalid Tokens:");
        for token in lexed.invalid_tokens() {
            println!(
                "{RED}On line: {}, column: {}, found invalid token: {}{RESET}",
                token.line, token.column, token.text
            );
        }
    }
}

fn report_statements(statements: &[Statement<'_>], json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(statements).unwrap_or_default());
        return;
    }
    println!("Parsed Statements:");
    for statement in statements {
        println!("------------------");
        println!("{:?}", statement.kind);
        for token in statement.tokens {
            print_token(token);
        }
        println!();
    }
}

fn report_symbols(symbols: &SymbolTable, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(symbols).unwrap_or_default());
    }
}

fn print_token(token: &Token<'_>) {
    println!(
        "Token Type: {:?}, Text: '{}', Line: {}, Column: {}",
        token.kind,
        token.text.escape_debug(),
        token.line,
        token.column
    );
}
