//! LVM - CLI
//!
//! Command-line interface to run Lisp sources, instruction listings, or an
//! interactive session.

mod repl;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lvm_core::ast::render_tree;
use lvm_core::bytecode::listing;
use lvm_core::reader::{parse_tokens, tokenize};
use lvm_core::{ExecMode, FunctionTable, LvmConfig, Session, VirtualMachine};

#[derive(Parser, Debug)]
#[command(name = "lvm")]
#[command(about = "Compile and run a small Lisp on a stack virtual machine")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, global = true)]
    verbose: bool,

    /// Maximum operand stack depth
    #[arg(long = "max-stack", global = true)]
    max_stack: Option<usize>,

    /// Maximum call depth
    #[arg(long = "max-depth", global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a source file
    Run {
        file: PathBuf,

        /// Compile and run one top-level expression at a time
        #[arg(long)]
        incremental: bool,

        /// Write the token listing to this file
        #[arg(long = "dump-tokens")]
        dump_tokens: Option<PathBuf>,

        /// Write the parsed expressions to this file
        #[arg(long = "dump-ast")]
        dump_ast: Option<PathBuf>,

        /// Write the generated instruction listing to this file
        #[arg(long = "dump-ir")]
        dump_ir: Option<PathBuf>,
    },
    /// Run a textual instruction listing
    Exec { file: PathBuf },
    /// Start an interactive session
    Repl,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,lvm_core=debug,lvm=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = LvmConfig::new();
    if let Some(n) = cli.max_stack {
        config.max_stack_size = n;
    }
    if let Some(n) = cli.max_depth {
        config.max_call_depth = n;
    }

    let ok = match cli.command {
        Command::Run {
            file,
            incremental,
            dump_tokens,
            dump_ast,
            dump_ir,
        } => {
            let dumps = Dumps {
                tokens: dump_tokens,
                ast: dump_ast,
                ir: dump_ir,
            };
            let mode = if incremental { ExecMode::Incremental } else { ExecMode::Batch };
            run_file(&file, mode, &dumps, config)
        }
        Command::Exec { file } => exec_file(&file, config),
        Command::Repl => match repl::run(config) {
            Ok(()) => true,
            Err(e) => {
                error!("repl failed: {}", e);
                false
            }
        },
    };

    if !ok {
        process::exit(1);
    }
}

struct Dumps {
    tokens: Option<PathBuf>,
    ast: Option<PathBuf>,
    ir: Option<PathBuf>,
}

fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            error!("failed to read {}: {}", path.display(), e);
            None
        }
    }
}

fn write_artifact(path: &Path, contents: &str, what: &str) {
    match fs::write(path, contents) {
        Ok(()) => info!("{} written to {}", what, path.display()),
        Err(e) => error!("failed to write {} to {}: {}", what, path.display(), e),
    }
}

fn run_file(path: &Path, mode: ExecMode, dumps: &Dumps, config: LvmConfig) -> bool {
    let Some(source) = read_source(path) else {
        return false;
    };

    let exprs = match tokenize(&source).and_then(|tokens| {
        if let Some(out) = &dumps.tokens {
            let text: String = tokens.iter().map(|t| format!("{}\n", t)).collect();
            write_artifact(out, &text, "token listing");
        }
        parse_tokens(&tokens)
    }) {
        Ok(exprs) => exprs,
        Err(e) => {
            error!("{}", e);
            return false;
        }
    };

    if let Some(out) = &dumps.ast {
        let mut text = String::new();
        for expr in &exprs {
            text.push_str(&format!("{}\n{}\n", expr, render_tree(expr)));
        }
        write_artifact(out, &text, "syntax tree");
    }

    let mut session = Session::new(config);
    let result = session.run_exprs(&exprs, mode);
    for line in session.drain_output() {
        println!("{}", line);
    }

    if let Some(out) = &dumps.ir {
        write_artifact(out, &listing(session.history()), "instruction listing");
    }

    match result {
        Ok(()) => true,
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

fn exec_file(path: &Path, config: LvmConfig) -> bool {
    let Some(text) = read_source(path) else {
        return false;
    };

    let mut vm = VirtualMachine::new(config);
    if let Err(e) = vm.load(&text) {
        error!("invalid instruction listing: {}", e);
        return false;
    }

    let result = vm.run(&FunctionTable::new());
    for change in vm.drain_state_changes() {
        println!("{}", change);
    }

    match result {
        Ok(()) => true,
        Err(e) => {
            error!("runtime error: {}", e);
            false
        }
    }
}
