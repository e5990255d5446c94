//! Scan session model
//!
//! `ScanSession` is the single authoritative record of one uploaded image's
//! analysis lifecycle. It is owned by the controller; readers receive clones.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ErrorMetadata, ScanError};
use crate::handles::BlobHandle;
use crate::models::{
    BlurRequest, MetadataMap, PrivacyContent, RemovalMode, RiskAnalysis, SourceFile,
    VisionResult,
};
use crate::phase::{Phase, PhaseKind};

/// Monotonically increasing session identifier used to drop stale responses.
pub type Generation = u64;

/// Outcome of a best-effort enrichment phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Not attempted yet in this scan cycle.
    #[default]
    Pending,
    Available,
    /// The call failed; the field is absent but that says nothing about safety.
    Unavailable,
}

/// Loading flags for the user-triggered actions, one per action.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InFlight {
    pub vision: bool,
    pub removal: bool,
    pub blur: bool,
    pub blur_preview: bool,
    pub privacy_filter: bool,
}

impl InFlight {
    pub fn get(&self, kind: PhaseKind) -> bool {
        match kind {
            PhaseKind::Vision => self.vision,
            PhaseKind::Removal => self.removal,
            PhaseKind::Blur => self.blur,
            PhaseKind::BlurPreview => self.blur_preview,
            PhaseKind::PrivacyFilter => self.privacy_filter,
            PhaseKind::Metadata | PhaseKind::Risk | PhaseKind::Content => false,
        }
    }

    pub fn set(&mut self, kind: PhaseKind, value: bool) {
        match kind {
            PhaseKind::Vision => self.vision = value,
            PhaseKind::Removal => self.removal = value,
            PhaseKind::Blur => self.blur = value,
            PhaseKind::BlurPreview => self.blur_preview = value,
            PhaseKind::PrivacyFilter => self.privacy_filter = value,
            PhaseKind::Metadata | PhaseKind::Risk | PhaseKind::Content => {}
        }
    }

    pub fn any(&self) -> bool {
        self.vision || self.removal || self.blur || self.blur_preview || self.privacy_filter
    }

    pub fn active(&self) -> Vec<PhaseKind> {
        [
            PhaseKind::Vision,
            PhaseKind::Removal,
            PhaseKind::Blur,
            PhaseKind::BlurPreview,
            PhaseKind::PrivacyFilter,
        ]
        .into_iter()
        .filter(|k| self.get(*k))
        .collect()
    }
}

/// Last failure recorded on the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseError {
    pub phase: PhaseKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub code: &'static str,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
    pub occurred_at: DateTime<Utc>,
}

impl PhaseError {
    pub fn from_scan_error(phase: PhaseKind, err: &ScanError) -> Self {
        let status = match err {
            ScanError::Transport { source, .. } => source.status,
            _ => None,
        };
        Self {
            phase,
            message: err.client_message(),
            status,
            code: err.error_code(),
            retryable: err.is_recoverable(),
            suggestion: err.suggested_action(),
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanImage {
    pub handle: BlobHandle,
    pub mode: RemovalMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlurredImage {
    pub handle: BlobHandle,
    pub request: BlurRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanSession {
    pub generation: Generation,
    pub source_file: SourceFile,
    pub preview_handle: Option<BlobHandle>,
    pub started_at: DateTime<Utc>,
    pub phase: Phase,
    pub metadata: Option<MetadataMap>,
    pub risk_analysis: Option<RiskAnalysis>,
    pub risk_status: EnrichmentStatus,
    pub privacy_content: Option<PrivacyContent>,
    pub content_status: EnrichmentStatus,
    pub vision_result: Option<VisionResult>,
    pub clean_image: Option<CleanImage>,
    pub blurred_image: Option<BlurredImage>,
    pub filtered_image: Option<BlobHandle>,
    pub blur_preview: Option<String>,
    pub in_flight: InFlight,
    pub error: Option<PhaseError>,
}

impl ScanSession {
    /// A fresh session in `Uploading` with every derived field absent.
    pub fn new(
        generation: Generation,
        source_file: SourceFile,
        preview_handle: Option<BlobHandle>,
    ) -> Self {
        Self {
            generation,
            source_file,
            preview_handle,
            started_at: Utc::now(),
            phase: Phase::Uploading,
            metadata: None,
            risk_analysis: None,
            risk_status: EnrichmentStatus::Pending,
            privacy_content: None,
            content_status: EnrichmentStatus::Pending,
            vision_result: None,
            clean_image: None,
            blurred_image: None,
            filtered_image: None,
            blur_preview: None,
            in_flight: InFlight::default(),
            error: None,
        }
    }

    /// Running automatic phase plus every in-flight user action.
    pub fn active_phases(&self) -> Vec<PhaseKind> {
        let automatic = match self.phase {
            Phase::Scanning => Some(PhaseKind::Metadata),
            Phase::Analyzing => Some(PhaseKind::Risk),
            Phase::DetectingContent => Some(PhaseKind::Content),
            _ => None,
        };
        automatic.into_iter().chain(self.in_flight.active()).collect()
    }

    /// Every handle the session currently owns.
    pub fn live_handles(&self) -> Vec<&BlobHandle> {
        self.preview_handle
            .iter()
            .chain(self.clean_image.as_ref().map(|c| &c.handle))
            .chain(self.blurred_image.as_ref().map(|b| &b.handle))
            .chain(self.filtered_image.iter())
            .collect()
    }

    pub fn record_error(&mut self, phase: PhaseKind, err: &ScanError) {
        self.error = Some(PhaseError::from_scan_error(phase, err));
    }

    /// Clear the banner if it belongs to `phase`; a successful retry of one
    /// action should not hide another action's failure.
    pub fn clear_error_for(&mut self, phase: PhaseKind) {
        if self.error.as_ref().is_some_and(|e| e.phase == phase) {
            self.error = None;
        }
    }
}
