//! Low-Level Compiler Driver
//!
//! Reads the front end's raw IR program and the allocator's variable table
//! from JSON, emits stack machine assembly, and writes it to stdout or a
//! file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llc_codegen::generate_assembly_from_raw;
use llc_common::VariableTable;
use llc_ir::{decode_program, parse_raw_program};
use log::info;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "llc")]
#[command(about = "Stack machine assembly emitter")]
#[command(version)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit assembly for an IR program
    Emit {
        /// IR program: JSON array of tagged instructions
        #[arg(short, long)]
        program: PathBuf,

        /// Variable table: JSON array of allocated variables
        #[arg(long = "variables")]
        variables: PathBuf,

        /// Output assembly file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode an IR program and report its size
    Check {
        /// IR program: JSON array of tagged instructions
        #[arg(short, long)]
        program: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let result = match cli.command {
        Commands::Emit { program, variables, output } => {
            emit_command(&program, &variables, output.as_deref())
        }
        Commands::Check { program } => check_command(&program),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Translate program and variable table text into assembly text
fn emit_program(program_text: &str, variables_text: &str) -> Result<String> {
    let raw = parse_raw_program(program_text).context("failed to parse IR program")?;
    let store: VariableTable =
        serde_json::from_str(variables_text).context("failed to parse variable table")?;
    info!("Loaded {} IR instructions and {} variables", raw.len(), store.len());

    let asm = generate_assembly_from_raw(&raw, &store)?;
    Ok(asm)
}

/// Assembly text is always terminated by a newline
fn write_assembly(out: &mut impl Write, asm: &str) -> io::Result<()> {
    writeln!(out, "{}", asm)
}

fn emit_command(program: &Path, variables: &Path, output: Option<&Path>) -> Result<()> {
    let asm = emit_program(&read(program)?, &read(variables)?)?;

    match output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_assembly(&mut file, &asm)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Assembly written to: {}", path.display());
        }
        None => write_assembly(&mut io::stdout().lock(), &asm)?,
    }
    Ok(())
}

fn check_command(program: &Path) -> Result<()> {
    let raw = parse_raw_program(&read(program)?).context("failed to parse IR program")?;
    let decoded = decode_program(&raw)?;
    println!("{}: {} instructions", program.display(), decoded.len());
    Ok(())
}
