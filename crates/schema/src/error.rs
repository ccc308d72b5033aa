use std::fmt;

use serde::Serialize;

/// One schema violation.
///
/// `path` locates the offending value (`""` for the document root,
/// `cliente.email`, `items[2]`, `itens.items[0].sku`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors loading a schema source.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The root of a schema must be an object or a boolean.
    #[error("schema root must be an object or boolean, found {found}")]
    InvalidRoot { found: &'static str },
}
