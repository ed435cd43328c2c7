//! Marlog CLI
//!
//! Command-line front end for the logging pipeline

use clap::{Parser, Subcommand};
use marlog_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "marlog")]
#[command(about = "Marlog - Structured application logging", long_about = None)]
struct Cli {
    /// Print pipeline diagnostics to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write one log record
    Emit(commands::emit::EmitArgs),
    /// Run the error reporting walkthrough
    Demo(commands::demo::DemoArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        init(Profile::Development);
    } else {
        init(Profile::Production);
    }

    let result = match cli.command {
        Commands::Emit(args) => commands::emit::execute(args),
        Commands::Demo(args) => commands::demo::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
