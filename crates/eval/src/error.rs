use praxis_core::{ParseError, PathError};
use praxis_schema::{join_errors, ValidationError};

use crate::report::FailureReport;

/// Failure while evaluating a single rule.
///
/// Stored in the rule's result, so it is `Clone`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Path(#[from] PathError),

    /// An operand could not be interpreted as a number.
    #[error("coercion error: {message}")]
    Coercion { message: String },

    #[error("division by zero in '{expression}'")]
    DivisionByZero { expression: String },

    #[error("'{path}' is not an array")]
    NotASequence { path: String },
}

/// Why a policy did not pass. Rendered into the failure report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("policy '{name}' is not defined")]
    NotDefined { name: String },

    #[error("error executing rule '{rule}': {source}. Details: {details}")]
    RuleFailed {
        rule: String,
        source: RuleError,
        details: String,
    },

    #[error("rule condition not met: '{rule}'. Details: {details}")]
    ConditionNotMet { rule: String, details: String },
}

/// Errors from [`crate::Engine::process_request`].
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to deserialize request: {0}")]
    MalformedRequest(String),

    #[error("request data schema validation failed: {}", join_errors(.0))]
    RequestValidation(Vec<ValidationError>),

    #[error("{0}")]
    PolicyFailure(FailureReport),

    #[error("response data schema validation failed: {}", join_errors(.0))]
    ResponseValidation(Vec<ValidationError>),
}

impl ProcessError {
    /// Stable machine-readable name of the failure stage.
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::MalformedRequest(_) => "malformed_request",
            ProcessError::RequestValidation(_) => "request_validation",
            ProcessError::PolicyFailure(_) => "policy_failure",
            ProcessError::ResponseValidation(_) => "response_validation",
        }
    }
}

/// Errors loading policy sources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid policy YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid policy JSON: {0}")]
    Json(#[from] serde_json::Error),
}
