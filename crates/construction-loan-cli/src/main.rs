mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::construction_loan::{CalculateArgs, DrawsArgs, ValidateArgs};

/// Construction loan feasibility calculations
#[derive(Parser)]
#[command(
    name = "cloan",
    version,
    about = "Construction loan feasibility calculations",
    long_about = "A CLI for sizing and stress-testing construction loans with decimal \
                  precision. Builds draw schedules, accrues interest on the drawn balance, \
                  aggregates fees, computes LTC/LTV, margin and ROI, and grades the \
                  project's risk. Set RUST_LOG=debug to trace each stage."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full feasibility analysis on a loan scenario
    Calculate(CalculateArgs),
    /// Check a loan scenario and list every input problem
    Validate(ValidateArgs),
    /// Build the draw schedule alone
    Draws(DrawsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::construction_loan::run_calculate(args),
        Commands::Validate(args) => commands::construction_loan::run_validate(args),
        Commands::Draws(args) => commands::construction_loan::run_draws(args),
        Commands::Version => {
            println!("cloan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
