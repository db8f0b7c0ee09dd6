use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use quill::ast_printer::AstPrinter;
use quill::error::QuillError;
use quill::parser::Parser;
use quill::scanner::Scanner;
use quill::session::Session;

#[derive(ClapParser, Debug)]
#[command(version, about = "Quill language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to quill.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit the token stream as JSON instead of the text form
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints each statement's tree
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a Quill program
    Run {
        filename: Option<PathBuf>,

        /// Treat reads of undefined variables as runtime errors
        #[arg(long)]
        strict: bool,
    },
}

/// Memory-maps a script file read-only.
fn map_source(filename: &PathBuf) -> quill::error::Result<Mmap> {
    info!("Mapping file: {:?}", filename);

    let file = File::open(filename)?;

    // SAFETY: the mapping is read-only and lives only for this invocation.
    let mmap = unsafe { Mmap::map(&file)? };

    info!("Mapped {} bytes from {:?}", mmap.len(), filename);

    Ok(mmap)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("quill.log").context("Failed to create quill.log")?;

    // Configure env_logger to write to file with module path and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'quill::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("quill::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to quill.log");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");

                let mmap = map_source(&filename)?;
                let source: &str = std::str::from_utf8(&mmap).map_err(QuillError::from)?;

                let (tokens, errors) = Scanner::new(source).scan_tokens();

                if json {
                    println!("{}", serde_json::to_string_pretty(&tokens)?);
                } else {
                    for token in &tokens {
                        debug!("Scanned token: {}", token);

                        println!("{}", token);
                    }
                }

                for error in &errors {
                    eprintln!("{}", error);
                }

                if !errors.is_empty() {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Tokenization completed successfully");
            }
            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");

                let mmap = map_source(&filename)?;
                let source: &str = std::str::from_utf8(&mmap).map_err(QuillError::from)?;

                let (tokens, mut errors) = Scanner::new(source).scan_tokens();
                let (statements, parse_errors) = Parser::new(&tokens).parse();
                errors.extend(parse_errors);

                for stmt in statements.iter().flatten() {
                    println!("{}", AstPrinter::print_stmt(stmt));
                }

                for error in &errors {
                    eprintln!("{}", error);
                }

                if !errors.is_empty() {
                    debug!("Parse failed, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Parse subcommand completed");
            }
            None => {
                info!("No filepath provided for Parse");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename, strict } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                let mmap = map_source(&filename)?;
                let source: &str = std::str::from_utf8(&mmap).map_err(QuillError::from)?;

                let mut session = Session::with_strict_variables(strict);
                let report = session.run(source);

                for line in &report.printed {
                    println!("{}", line);
                }

                for error in &report.errors {
                    eprintln!("{}", error);
                }

                if let Some(failure) = &report.failure {
                    debug!("Runtime failure: {}", failure);

                    eprintln!("{}", failure);
                    std::process::exit(70);
                }

                if !report.errors.is_empty() {
                    debug!("Run had scan/parse errors, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Program executed successfully");
            }

            None => {
                info!("No filepath provided for Run");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },
    }

    Ok(())
}
