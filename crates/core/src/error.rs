use serde::{Deserialize, Serialize};

/// A rule string that does not match any recognized rule form.
///
/// `position` is the byte offset into the rule text where the problem was
/// detected (the end of the text for truncated rules).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("parse error at offset {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        ParseError {
            position,
            message: message.into(),
        }
    }
}

/// Errors raised while parsing a path or walking a document with one.
///
/// Every variant names the offending path (or path prefix) so the failure
/// can be located without re-running the rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("path '{path}' must start with '$.'")]
    MissingRoot { path: String },

    #[error("path '{path}' contains an empty segment")]
    EmptySegment { path: String },

    #[error("malformed bracket syntax in segment '{segment}' of path '{path}'")]
    MalformedBracket { path: String, segment: String },

    #[error("invalid array index '{index}' in path '{path}'")]
    InvalidIndex { path: String, index: String },

    #[error("index {index} out of bounds for '{path}' (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("'{path}' is not an object")]
    NotAnObject { path: String },

    #[error("'{path}' is not an array")]
    NotAnArray { path: String },

    #[error("invalid path: '{path}' does not exist")]
    MissingKey { path: String },

    #[error("cannot descend into scalar value at '{path}'")]
    ScalarCollision { path: String },
}
