//! praxis-core: document model, paths and the rule language.
//!
//! # Public API
//!
//! - [`Value`] -- dynamically-typed document node
//! - [`Path`], [`path::get`], [`path::set`], [`path::resolve`] -- `$.` path
//!   navigation and mutation
//! - [`parse_rule`] -- rule text to [`Rule`] AST
//! - [`ParseError`], [`PathError`] -- error types

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{AggregateFn, ArithExpr, ArithOp, CompareOp, Operand, Rule};
pub use error::{ParseError, PathError};
pub use parser::parse_rule;
pub use path::{Path, Segment};
pub use value::{Map, Value};
