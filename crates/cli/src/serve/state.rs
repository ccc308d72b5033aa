//! Application state shared across request handlers.

use std::time::Duration;

use praxis_eval::Engine;

pub(crate) struct AppState {
    /// Read-only after startup; handlers share it without locking.
    pub(crate) engine: Engine,
    /// Budget for one `POST /process` call.
    pub(crate) request_timeout: Duration,
}
