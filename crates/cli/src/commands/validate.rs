use std::path::Path;
use std::process;

use super::read_json_or_exit;
use crate::{config, report_error, OutputFormat};

pub(crate) fn cmd_validate(doc_path: &Path, schema_path: &Path, output: OutputFormat, quiet: bool) {
    let schema = match config::read_schema(schema_path) {
        Ok(s) => s,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let doc = read_json_or_exit(doc_path, output, quiet);

    let errors = schema.validate(&doc);

    if errors.is_empty() {
        if !quiet {
            match output {
                OutputFormat::Text => println!("valid"),
                OutputFormat::Json => println!("{}", serde_json::json!({ "valid": true })),
            }
        }
        return;
    }

    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("invalid");
                for err in &errors {
                    eprintln!("  - {}", err);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": false,
                "errors": errors,
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
    process::exit(1);
}
