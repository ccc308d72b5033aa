//! praxis-schema: JSON-Schema (draft-07 subset) validation of documents.
//!
//! Supported keywords: `type`, `required`, `properties`,
//! `additionalProperties`, `items`, `additionalItems`, `minItems`,
//! `maxItems`, `enum`, `minimum`, `maximum`, `pattern` and `format`
//! (`date-time` only). Boolean schemas are accepted wherever a sub-schema
//! is. Validation is exhaustive: every violation is returned.

pub mod error;
mod keywords;
pub mod schema;
mod validate;

pub use error::{SchemaError, ValidationError};
pub use schema::Schema;

use praxis_core::Value;

/// Validate `doc` against `schema`.
pub fn validate(doc: &Value, schema: &Schema) -> Vec<ValidationError> {
    schema.validate(doc)
}

/// Render violations the way error messages carry them.
pub fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
