//! Europa CLI - thin front end over the `europa-runtime` embedding API.
//!
//! This binary is not part of the interpreter's core surface: it exists to
//! give a terminal user something to run, not to define any interpreter
//! semantics of its own.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use europa_runtime::{Runtime, RuntimeConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Europa - an embeddable Scheme interpreter.
#[derive(Parser, Debug)]
#[command(name = "europa")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run Europa Scheme programs", long_about = None)]
struct Cli {
    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true, env = "EUROPA_VERBOSE")]
    verbose: bool,

    /// Path to a runtime configuration file (defaults to the usual search path)
    #[arg(short, long, global = true, env = "EUROPA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a Scheme source file and print its final value
    Run(RunCommand),

    /// Start an interactive read-eval-print loop
    Repl,
}

#[derive(Parser, Debug)]
struct RunCommand {
    /// Path to the Scheme source file to load
    path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;
    let mut runtime = Runtime::new(config);
    runtime.register_standard_library();
    runtime.set_standard_ports();

    match cli.command {
        Commands::Run(args) => run_file(&mut runtime, &args.path),
        Commands::Repl => run_repl(&mut runtime),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .context("failed to initialize logging")
}

fn load_config(path: Option<&std::path::Path>) -> Result<RuntimeConfig> {
    let result = match path {
        Some(path) => RuntimeConfig::load_from_path(path),
        None => RuntimeConfig::load(),
    };
    result.context("failed to load runtime configuration")
}

fn run_file(runtime: &mut Runtime, path: &std::path::Path) -> Result<()> {
    match runtime.do_file(path) {
        Ok(value) => {
            println!("{}", europa_stdlib::write_string(runtime.symbols(), value));
            Ok(())
        }
        Err(err) => {
            let obj = runtime.recover().unwrap_or_else(|| err.to_error_obj());
            anyhow::bail!("{}: {}", path.display(), obj.message);
        }
    }
}

/// A minimal blocking stdin loop: reads one form's worth of text per line,
/// evaluates it, and prints the result or error. Multi-line forms are not
/// supported here - line editing and continuation prompts are a front-end
/// concern this binary deliberately leaves out.
fn run_repl(runtime: &mut Runtime) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("europa> ");
        stdout.flush()?;

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            println!();
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == ",quit" {
            return Ok(());
        }

        match runtime.do_string(trimmed) {
            Ok(value) => println!("{}", europa_stdlib::write_string(runtime.symbols(), value)),
            Err(_) => {
                if let Some(obj) = runtime.recover() {
                    eprintln!("error: {}", obj.message);
                }
            }
        }
    }
}
