use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser as CliParser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ssi::compiler::Compiler;
use ssi::evaluator::Evaluator;
use ssi::printer::to_text;
use ssi::repl::LineBuffer;
use ssi::Error;

/// A small Scheme interpreter.
#[derive(CliParser, Debug)]
#[clap(name = "ssi", version)]
struct Args {
    /// Source file to run or compile
    file: Option<PathBuf>,

    /// Start the interactive loop, after running FILE if one is given
    #[clap(long)]
    repl: bool,

    /// Compile FILE to JavaScript instead of running it
    #[clap(long, requires = "file")]
    compile: bool,

    /// Output path for --compile (defaults to FILE with a .js extension)
    #[clap(short, long, requires = "compile")]
    output: Option<PathBuf>,

    /// Prepend JavaScript definitions of the primitives to compiled output
    #[clap(long, requires = "compile")]
    prelude: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u64,
}

fn init_logging(verbose: u64) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report(err: &Error) {
    eprintln!("{}", err.to_string().red());
}

fn run_file(evaluator: &Evaluator, path: &Path) -> Result<(), Error> {
    let source = fs::read_to_string(path)?;
    info!(path = %path.display(), "running");

    ssi::run(evaluator, &source).map(|_| ())
}

fn compile_file(args: &Args, path: &Path) -> Result<(), Error> {
    let source = fs::read_to_string(path)?;
    let program = ssi::parse(&source)?;
    let code = Compiler::new().with_prelude(args.prelude).compile(&program)?;

    let output = args.output.clone().unwrap_or_else(|| path.with_extension("js"));
    fs::write(&output, code)?;
    info!(output = %output.display(), "compiled");

    Ok(())
}

fn repl(evaluator: &Evaluator) -> Result<(), ReadlineError> {
    let mut rl = DefaultEditor::new()?;
    let mut buffer = LineBuffer::new();

    loop {
        match rl.readline(&buffer.prompt()) {
            Ok(line) => {
                if buffer.is_empty() && line.trim() == ":quit" {
                    break;
                }

                let source = match buffer.push(&line) {
                    Some(source) => source,
                    None => continue,
                };
                let _ = rl.add_history_entry(source.as_str());

                match ssi::run(evaluator, &source) {
                    Ok(value) => println!("{}", to_text(&value)),
                    Err(err) => report(&err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let evaluator = Evaluator::default();

    if let Some(path) = &args.file {
        let result = if args.compile {
            compile_file(&args, path)
        } else {
            run_file(&evaluator, path)
        };

        if let Err(err) = result {
            report(&err);
            process::exit(1);
        }
    }

    if args.repl || args.file.is_none() {
        if let Err(err) = repl(&evaluator) {
            eprintln!("{}", format!("{}", err).red());
            process::exit(1);
        }
    }
}
