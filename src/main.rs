use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser as ClapParser;
use rustyline::error::ReadlineError;
use rustyline::Editor;

use loxide::error::ErrorReporter;
use loxide::interpreter::Interpreter;
use loxide::parser::Parser;
use loxide::resolver::Resolver;
use loxide::scanner::Scanner;

static HISTORY_FILE: &str = ".repl-history.txt";

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script to execute; starts an interactive prompt when omitted.
    script: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();

    match args.script.len() {
        0 => run_prompt()?,
        1 => run_file(&args.script[0])?,
        _ => {
            eprintln!("Usage: loxide [script]");
            std::process::exit(64);
        }
    }

    Ok(())
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(path)?;

    let mut reporter = ErrorReporter::new();
    let mut interpreter = Interpreter::new();

    run(&source, &mut interpreter, &mut reporter);

    if reporter.had_error {
        std::process::exit(65);
    }
    if reporter.had_runtime_error {
        std::process::exit(70);
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let mut reporter = ErrorReporter::new();
    let mut interpreter = Interpreter::new();

    let mut rl = Editor::<(), rustyline::history::DefaultHistory>::new()?;
    rl.load_history(HISTORY_FILE).ok();

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                run(&line, &mut interpreter, &mut reporter);
                // A bad line must not poison the next one; runtime failures
                // keep their mark for the session.
                reporter.had_error = false;
            }

            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,

            Err(err) => {
                eprintln!("repl error: {:?}", err);
                break;
            }
        }
    }

    rl.save_history(HISTORY_FILE).ok();

    Ok(())
}

/// Full pipeline for one source unit: scan, parse, resolve, execute.
/// Static errors gate execution; runtime errors are reported and halt this
/// run only.
fn run(source: &str, interpreter: &mut Interpreter, reporter: &mut ErrorReporter) {
    let tokens = Scanner::new(source, reporter).scan_tokens();
    let statements = Parser::new(tokens, reporter).parse();

    if reporter.had_error {
        return;
    }

    Resolver::new(interpreter, reporter).resolve(&statements);

    if reporter.had_error {
        return;
    }

    if let Err(error) = interpreter.interpret(&statements) {
        reporter.runtime_error(&error);
    }
}
