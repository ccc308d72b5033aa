use std::path::Path;
use std::process;

use praxis_core::Value;

use super::read_json_or_exit;
use crate::OutputFormat;

/// Evaluate one rule and print the outcome with the resulting document.
pub(crate) fn cmd_check(rule: &str, data: Option<&Path>, output: OutputFormat, quiet: bool) {
    let mut doc = match data {
        Some(path) => read_json_or_exit(path, output, quiet),
        None => Value::object(),
    };

    let outcome = praxis_eval::evaluate_str(rule, &mut doc);

    match output {
        OutputFormat::Text => {
            println!("{}", if outcome.passed { "passed" } else { "failed" });
            if !quiet {
                println!("details: {}", outcome.details);
                if let Some(e) = &outcome.error {
                    println!("error: {}", e);
                }
                let pretty = serde_json::to_string_pretty(&doc)
                    .unwrap_or_else(|e| format!("serialization error: {}", e));
                println!("{}", pretty);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "rule": rule,
                "passed": outcome.passed,
                "details": outcome.details,
                "error": outcome.error.as_ref().map(ToString::to_string),
                "document": doc,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }

    if !outcome.passed {
        process::exit(1);
    }
}
