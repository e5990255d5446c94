//! Data models for the scan pipeline
//!
//! Each sub-module mirrors one backend analysis: metadata extraction, risk
//! scoring, privacy-content detection, vision description, and the request
//! shapes for the user-triggered image transformations.

mod actions;
mod metadata;
mod privacy;
mod risk;
mod source;
mod vision;

// Re-export all models for convenient imports
pub use actions::*;
pub use metadata::*;
pub use privacy::*;
pub use risk::*;
pub use source::*;
pub use vision::*;
