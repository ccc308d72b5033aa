use std::path::Path;
use std::process;

use praxis_eval::ProcessError;

use crate::config;
use crate::{report_error, EngineArgs, OutputFormat};

/// JSON body describing a processing failure.
///
/// Schema failures carry their violations; policy failures carry the
/// per-policy results.
pub(crate) fn error_body(e: &ProcessError) -> serde_json::Value {
    let mut body = serde_json::json!({
        "error": e.to_string(),
        "kind": e.kind(),
    });
    let extra = match e {
        ProcessError::RequestValidation(errors) | ProcessError::ResponseValidation(errors) => {
            Some(("violations", serde_json::to_value(errors)))
        }
        ProcessError::PolicyFailure(report) => Some(("results", serde_json::to_value(&report.results))),
        ProcessError::MalformedRequest(_) => None,
    };
    if let Some((key, Ok(value))) = extra {
        body[key] = value;
    }
    body
}

pub(crate) fn cmd_process(request_path: &Path, args: &EngineArgs, output: OutputFormat, quiet: bool) {
    let engine = match config::load_config(args)
        .and_then(|c| config::build_engine(&config::engine_settings(&c, args)))
    {
        Ok(e) => e,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let body = match std::fs::read(request_path) {
        Ok(b) => b,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", request_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    match engine.process_request(&body) {
        Ok(response) => {
            let pretty = serde_json::to_string_pretty(&response)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        Err(e) => {
            match output {
                OutputFormat::Text => report_error(&e.to_string(), output, quiet),
                OutputFormat::Json => {
                    if !quiet {
                        eprintln!(
                            "{}",
                            serde_json::to_string_pretty(&error_body(&e)).unwrap_or_default()
                        );
                    }
                }
            }
            process::exit(1);
        }
    }
}
