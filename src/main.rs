use anyhow::Context;
use clap::{Parser, Subcommand};
use lafun::printer::{display_code_block, display_document};
use lafun::resolver::Resolution;
use lafun::{compile, compile_document, CompileError};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compile fun programs and literate fun documents to JavaScript.
#[derive(Parser)]
#[command(name = "lafun", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a fun source file.
    Fun {
        /// Source file, `-` for stdin.
        input: PathBuf,
        /// Where to write the JavaScript, `-` for stdout.
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
        /// Print the resolved syntax tree to stderr.
        #[arg(long)]
        ast: bool,
    },
    /// Compile the code embedded in a literate document.
    Doc {
        /// Document, `-` for stdin.
        input: PathBuf,
        /// Where to write the JavaScript, `-` for stdout.
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
        /// Also write the document, with its cross-references resolved, to this file.
        #[arg(long, value_name = "FILE")]
        latex: Option<PathBuf>,
        /// List every definition and reference site on stderr.
        #[arg(long)]
        sites: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

/// Logs go to stderr. Set `RUST_LOG=lafun=debug` (or `trace`) to follow the compiler's progress.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<(), anyhow::Error> {
    match cli.command {
        Command::Fun { input, output, ast } => {
            let source = read_input(&input)?;
            let compiled = compile(&source).map_err(|e| diagnostic(&input, &source, e))?;
            if ast {
                eprint!("{}", display_code_block(&compiled.program)?);
            }
            write_output(&output, &compiled.code)?;
        }
        Command::Doc {
            input,
            output,
            latex,
            sites,
        } => {
            let source = read_input(&input)?;
            let compiled =
                compile_document(&source).map_err(|e| diagnostic(&input, &source, e))?;
            for warning in &compiled.warnings {
                let (line, column) = warning.range.line_col(&source);
                eprintln!(
                    "{}:{line}:{column}: warning: {warning}",
                    display_name(&input)
                );
            }
            if sites {
                print_sites(&input, &source, &compiled.resolution);
            }
            if let Some(latex) = latex {
                write_output(&latex, &display_document(&compiled.document)?)?;
            }
            write_output(&output, &compiled.code)?;
        }
    }
    Ok(())
}

fn diagnostic(input: &Path, source: &str, error: CompileError) -> anyhow::Error {
    match error.range() {
        Some(range) => {
            let (line, column) = range.line_col(source);
            anyhow::anyhow!("{}:{line}:{column}: {error}", display_name(input))
        }
        None => anyhow::anyhow!("{}: {error}", display_name(input)),
    }
}

fn print_sites(input: &Path, source: &str, resolution: &Resolution) {
    let sites = [
        ("definition", &resolution.definitions),
        ("reference", &resolution.references),
    ];
    for (kind, identifiers) in sites {
        for identifier in identifiers {
            let (line, column) = identifier.range.line_col(source);
            eprintln!(
                "{}:{line}:{column}: {kind} of `{}` (id {})",
                display_name(input),
                identifier.name,
                identifier.id
            );
        }
    }
}

fn display_name(path: &Path) -> String {
    if is_standard_stream(path) {
        "<stdin>".to_owned()
    } else {
        path.display().to_string()
    }
}

fn is_standard_stream(path: &Path) -> bool {
    path == Path::new("-")
}

fn read_input(path: &Path) -> Result<String, anyhow::Error> {
    if is_standard_stream(path) {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read `{}`", path.display()))
}

fn write_output(path: &Path, contents: &str) -> Result<(), anyhow::Error> {
    if is_standard_stream(path) {
        std::io::stdout()
            .write_all(contents.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write `{}`", path.display()))
}
