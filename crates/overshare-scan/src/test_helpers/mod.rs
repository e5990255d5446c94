//! Test helpers for controller unit tests
//!
//! A scripted `AnalysisBackend` plus fixtures, so the state machine can be
//! exercised without an HTTP server.

pub mod fixtures;
pub mod mock_backend;

pub use fixtures::*;
pub use mock_backend::*;
