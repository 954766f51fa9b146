use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tinylisp::builtins;
use tinylisp::evaluator::{self, Environment};
use tinylisp::reader::{paren_depth, parse};
use tinylisp::value::{Procedure, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tinylisp")]
#[command(about = "Interactive evaluator for a tiny lexically-scoped Lisp")]
struct Args {
    /// Source file to evaluate instead of starting the interactive loop
    file: Option<PathBuf>,

    /// Prompt shown before each new expression
    #[arg(long, default_value = "tinylisp> ")]
    prompt: String,

    /// Do not print the startup banner
    #[arg(short, long)]
    quiet: bool,

    /// Raise the log level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const CONTINUATION_PROMPT: &str = "...> ";

/// Set by the `exit` procedure; checked after every top-level expression
type ExitFlag = Rc<Cell<bool>>;

/// Root environment for a session: the default builtins plus `(exit)`
fn session_env(exit: &ExitFlag) -> Environment {
    evaluator::create_env_with(|env| {
        builtins::install(env);
        let exit = Rc::clone(exit);
        env.register_builtin_operation("exit", move || {
            exit.set(true);
            Value::Unspecified
        });
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let exit = ExitFlag::default();
    let env = session_env(&exit);

    match &args.file {
        Some(path) => run_file(path, &env, &exit),
        None => run_repl(&args, &env, &exit),
    }
}

/// Log to stderr. `RUST_LOG` is honored unless `-v` asks for a specific level.
fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tinylisp=warn")),
        1 => EnvFilter::new("tinylisp=debug"),
        _ => EnvFilter::new("tinylisp=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

/// Evaluate every expression of a file, stopping at the first error or at `(exit)`
fn run_file(path: &Path, env: &Environment, exit: &ExitFlag) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let exprs = match parse(&source) {
        Ok(exprs) => exprs,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    for expr in &exprs {
        if let Err(e) = evaluator::eval(expr, env) {
            eprintln!("Error: {e}");
            process::exit(1);
        }
        if exit.get() {
            break;
        }
    }
    Ok(())
}

fn run_repl(args: &Args, env: &Environment, exit: &ExitFlag) -> anyhow::Result<()> {
    if !args.quiet {
        println!("tinylisp - a tiny lexically-scoped Lisp");
        println!("Enter S-expressions like: (+ 1 2)");
        println!("Type :help for more commands, or (exit) to leave the REPL.");
        println!();
    }

    let mut rl = DefaultEditor::new().context("could not initialize line editor")?;
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() {
            args.prompt.as_str()
        } else {
            CONTINUATION_PROMPT
        };

        match rl.readline(prompt) {
            Ok(line) => {
                // Commands are only recognized at the start of an expression
                if buffer.is_empty() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    match trimmed {
                        ":help" => {
                            print_help();
                            continue;
                        }
                        ":env" => {
                            print_environment(env);
                            continue;
                        }
                        ":quit" | ":exit" => {
                            println!("Goodbye!");
                            break;
                        }
                        _ => {}
                    }
                } else {
                    let _ = rl.add_history_entry(line.trim());
                }

                buffer.push_str(&line);
                buffer.push('\n');

                // Keep reading until the parentheses balance
                if paren_depth(&buffer) > 0 {
                    continue;
                }

                let source = std::mem::take(&mut buffer);
                eval_and_print(&source, env, exit);
                if exit.get() {
                    println!("Goodbye!");
                    break;
                }
            }

            Err(ReadlineError::Interrupted) if !buffer.is_empty() => {
                // Ctrl-C abandons an unfinished expression
                buffer.clear();
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => return Err(err).context("failed to read input line"),
        }
    }
    Ok(())
}

/// Read and evaluate a complete input, printing each result that is not Unspecified.
///
/// Expressions after a call to `(exit)` are not evaluated.
fn eval_and_print(source: &str, env: &Environment, exit: &ExitFlag) {
    let exprs = match parse(source) {
        Ok(exprs) => exprs,
        Err(e) => {
            println!("Error: {e}");
            return;
        }
    };

    for expr in &exprs {
        match evaluator::eval(expr, env) {
            Ok(Value::Unspecified) => {}
            Ok(result) => println!("{result}"),
            Err(e) => {
                println!("Error: {e}");
                return;
            }
        }
        if exit.get() {
            return;
        }
    }
}

fn print_help() {
    println!("tinylisp commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  (exit)     - Exit the interpreter");
    println!("  Ctrl+D     - Exit the interpreter");
    println!();
    println!("Special forms:");
    println!("  (quote datum)  (if test then else)  (define name expr)");
    println!("  (set! name expr)  (lambda (params) body)  (begin expr ...)");
    println!();
    println!("Only #f is false; 0 and () are true.");
    println!();
    println!("Examples:");
    println!("  (define make_adder (lambda (n) (lambda (x) (+ x n))))");
    println!("  ((make_adder 3) 4)");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    // Separate built-in functions from user-defined values
    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::Procedure(Procedure::Builtin(_)) => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        // Print in columns for readability
        let mut col = 0;
        for name in builtins {
            print!("  {name:<15}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
