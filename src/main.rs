//! # pdupe CLI
//!
//! Command-line interface for the photo fingerprint comparer.
//!
//! ## Usage
//! ```bash
//! pdupe ~/Photos
//! pdupe ~/Photos --metric stddev --threshold 12 --verbose
//! pdupe ~/Photos --reference ~/Photos/original.jpg --output json
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    pdupe::init_tracing();

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {}", console::style("error:").red().bold(), error);
            ExitCode::FAILURE
        }
    }
}
