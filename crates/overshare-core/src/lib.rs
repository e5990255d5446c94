//! Overshare Core Library
//!
//! This crate provides the scan session model, pipeline phases, error types,
//! configuration, GPS coordinate conversion, and the derived-view projector
//! shared by the API client, the scan controller, and the CLI.

pub mod backend;
pub mod config;
pub mod error;
pub mod geo;
pub mod handles;
pub mod models;
pub mod phase;
pub mod session;
pub mod view;

// Re-export commonly used types
pub use backend::{AnalysisBackend, BinaryBody};
pub use config::{ClientConfig, SafeSharePolicy};
pub use error::{ErrorMetadata, InvalidCoordinate, LogLevel, ScanError, TransportError};
pub use geo::GeoPoint;
pub use handles::{BlobHandle, HandleRegistry};
pub use phase::{FailurePolicy, Phase, PhaseKind};
pub use session::{EnrichmentStatus, Generation, InFlight, PhaseError, ScanSession};
pub use view::ViewState;
