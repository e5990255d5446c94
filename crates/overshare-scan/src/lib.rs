//! Overshare scan orchestration
//!
//! `ScanController` owns the current `ScanSession`, sequences the automatic
//! metadata, risk and content pipeline, and runs the user-triggered image
//! actions against any `AnalysisBackend`.

pub mod controller;

#[cfg(test)]
mod test_helpers;

pub use controller::ScanController;
