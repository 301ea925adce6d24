//! Observability module
//!
//! Logging setup shared by the CLI and the integration tests.

pub mod logging;

pub use logging::{LogFormat, init_logging};
