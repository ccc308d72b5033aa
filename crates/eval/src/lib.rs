//! praxis-eval: rule evaluation, policy execution and request processing.
//!
//! Rules are parsed by `praxis-core` and evaluated here against a single
//! mutable document. Policies group rules; the [`Engine`] runs a request
//! through its optional request schema, the requested policies and its
//! optional response schema.
//!
//! ```text
//! raw JSON -> Request -> [request schema] -> policies -> [response schema] -> Response
//! ```

pub mod aggregate;
pub mod coerce;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod policy;
pub mod report;

pub use engine::{Engine, Request, RequestContext, Response};
pub use error::{LoadError, PolicyError, ProcessError, RuleError};
pub use evaluate::{evaluate, evaluate_str, RuleOutcome};
pub use policy::{
    CompiledRule, Policy, PolicyExecutionResult, PolicyRegistry, RuleExecutionResult, RuleStatus,
};
pub use report::FailureReport;
