//! minipy CLI

use clap::{Parser, Subcommand};
use minipy::bytecode::{disassemble, render};
use minipy::interp::Dict;
use minipy::{format_uncaught, EngineConfig, Error, Interpreter, Value};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "minipy", version, about = "minipy - register-based bytecode VM")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile and run a source file
    Run {
        /// Source file to run
        source: PathBuf,
        /// Compiler bytecode (overrides the config file)
        #[arg(long)]
        bootstrap: Option<PathBuf>,
        /// Engine configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Arguments exposed as sys.argv
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Run a compiled bytecode file
    Exec {
        /// Bytecode file to run
        bytecode: PathBuf,
        /// Engine configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Arguments exposed as sys.argv
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Compile a source file to bytecode
    Compile {
        /// Source file to compile
        source: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Compiler bytecode (overrides the config file)
        #[arg(long)]
        bootstrap: Option<PathBuf>,
        /// Engine configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the instructions of a bytecode file
    Disasm {
        /// Bytecode file to list
        bytecode: PathBuf,
        /// Emit JSON records instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            source,
            bootstrap,
            config,
            args,
        } => run_file(&source, bootstrap, config.as_deref(), args),
        Command::Exec {
            bytecode,
            config,
            args,
        } => exec_file(&bytecode, config.as_deref(), args),
        Command::Compile {
            source,
            output,
            bootstrap,
            config,
        } => compile_file(&source, &output, bootstrap, config.as_deref()),
        Command::Disasm { bytecode, json } => disasm_file(&bytecode, json),
    };

    match result {
        Ok(()) => {}
        Err(Error::Uncaught(e)) => {
            eprintln!("{}", format_uncaught(&e));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Log to stderr, filtered by MINIPY_LOG (default `warn`)
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env("MINIPY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn engine(
    config: Option<&Path>,
    bootstrap: Option<PathBuf>,
    argv: Vec<String>,
) -> minipy::Result<Interpreter> {
    let mut config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if bootstrap.is_some() {
        config.bootstrap = bootstrap;
    }
    config.argv = argv;
    Ok(Interpreter::with_config(config))
}

fn load_compiler(interp: &mut Interpreter) -> minipy::Result<()> {
    let path = interp
        .config()
        .bootstrap
        .clone()
        .ok_or(Error::MissingBootstrap)?;
    let code = std::fs::read(&path)?;
    interp.load_bootstrap(&code)?;
    Ok(())
}

fn main_globals() -> minipy::interp::DictRef {
    let mut globals = Dict::new();
    globals.set("__name__", Value::str("__main__"));
    globals.into_ref()
}

fn script_argv(script: &Path, args: Vec<String>) -> Vec<String> {
    std::iter::once(script.display().to_string()).chain(args).collect()
}

fn run_file(
    source: &Path,
    bootstrap: Option<PathBuf>,
    config: Option<&Path>,
    args: Vec<String>,
) -> minipy::Result<()> {
    let mut interp = engine(config, bootstrap, script_argv(source, args))?;
    load_compiler(&mut interp)?;
    let text = std::fs::read(source)?;
    let filename = source.display().to_string();
    interp.run_source(&text, main_globals(), &filename)?;
    Ok(())
}

fn exec_file(bytecode: &Path, config: Option<&Path>, args: Vec<String>) -> minipy::Result<()> {
    let mut interp = engine(config, None, script_argv(bytecode, args))?;
    let code = std::fs::read(bytecode)?;
    interp.run(code, Vec::new(), main_globals())?;
    Ok(())
}

fn compile_file(
    source: &Path,
    output: &Path,
    bootstrap: Option<PathBuf>,
    config: Option<&Path>,
) -> minipy::Result<()> {
    let mut interp = engine(config, bootstrap, Vec::new())?;
    load_compiler(&mut interp)?;
    let text = std::fs::read(source)?;
    let code = interp.compile(&text, &source.display().to_string())?;
    std::fs::write(output, &code)?;
    println!("✓ {} -> {} ({} bytes)", source.display(), output.display(), code.len());
    Ok(())
}

fn disasm_file(path: &Path, json: bool) -> minipy::Result<()> {
    let code = std::fs::read(path)?;
    let items = disassemble(&code);
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!("{}", render(&items));
    }
    Ok(())
}
