//! Subcommand implementations.

pub(crate) mod check;
pub(crate) mod process;
pub(crate) mod validate;

use std::path::Path;

use praxis_core::Value;

use crate::{report_error, OutputFormat};

/// Read and parse a JSON file, exiting with status 1 on failure.
pub(crate) fn read_json_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> Value {
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            std::process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            std::process::exit(1);
        }
    }
}
