pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use log::debug;
use serde_json::Value;

/// Send a command result to the formatter chosen with `--output`.
pub fn format_output(format: &OutputFormat, value: &Value) {
    debug!("rendering output as {:?}", format);
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}
