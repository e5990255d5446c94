//! Derived view flags
//!
//! Pure functions over a `ScanSession`. Presentation reads these instead of
//! keeping its own booleans, so the flags can never drift from the session.
//! Nothing here mutates the session or performs I/O.

use serde::Serialize;

use crate::config::SafeSharePolicy;
use crate::geo::GeoPoint;
use crate::handles::BlobHandle;
use crate::models::{gps_info, RiskLevel};
use crate::phase::{Phase, PhaseKind};
use crate::session::{EnrichmentStatus, InFlight, PhaseError, ScanSession};

/// `metadata.GPSInfo` is present.
pub fn is_location_exposed(session: &ScanSession) -> bool {
    session.metadata.as_ref().and_then(gps_info).is_some()
}

/// Decimal coordinates for the map, or `None` when GPS data is absent or
/// malformed. Malformed data only hides the map.
pub fn location(session: &ScanSession) -> Option<GeoPoint> {
    let gps = session.metadata.as_ref().and_then(gps_info)?;
    GeoPoint::from_gps_info(gps).ok()
}

/// Highest severity across the risk analysis and detected items.
///
/// `None` means neither enrichment is available, which is not the same as
/// `Some(RiskLevel::None)`.
pub fn overall_risk_label(session: &ScanSession) -> Option<RiskLevel> {
    let from_risk = session.risk_analysis.as_ref().map(|r| r.overall_risk);
    let from_items = session
        .privacy_content
        .as_ref()
        .map(|p| p.max_item_severity());

    match (from_risk, from_items) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or_default().max(b.unwrap_or_default())),
    }
}

/// Safe only when both enrichments ran, the combined label is `none` or `low`,
/// no GPS position is embedded, and the policy finds nothing to veto.
pub fn is_safe_to_share(session: &ScanSession, policy: SafeSharePolicy) -> bool {
    if session.risk_analysis.is_none() || session.privacy_content.is_none() {
        return false;
    }
    if is_location_exposed(session) {
        return false;
    }

    let vetoed = session
        .privacy_content
        .as_ref()
        .is_some_and(|content| match policy {
            SafeSharePolicy::NoLicensePlate => content.has_license_plate(),
            SafeSharePolicy::NoHighSeverity => content.has_high_severity_item(),
        });

    !vetoed && overall_risk_label(session).is_some_and(|label| label.is_acceptable())
}

pub fn metadata_item_count(session: &ScanSession) -> usize {
    session.metadata.as_ref().map_or(0, |m| m.len())
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBanner {
    pub phase: PhaseKind,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
}

impl From<&PhaseError> for ErrorBanner {
    fn from(err: &PhaseError) -> Self {
        Self {
            phase: err.phase,
            message: err.message.clone(),
            retryable: err.retryable,
            suggestion: err.suggestion,
        }
    }
}

/// Everything the presentation layer needs to render one frame.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub phase: Phase,
    pub file_name: Option<String>,
    pub can_start_scan: bool,
    pub can_retry: bool,
    pub is_scanning: bool,
    pub actions_enabled: bool,
    pub loading: InFlight,
    pub metadata_item_count: usize,
    pub location_exposed: bool,
    pub show_map: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
    pub risk_status: EnrichmentStatus,
    pub content_status: EnrichmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_risk: Option<RiskLevel>,
    pub safe_to_share: bool,
    pub show_warning_banner: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBanner>,
    pub downloads: Vec<BlobHandle>,
}

impl ViewState {
    /// The view before any file is selected.
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            file_name: None,
            can_start_scan: false,
            can_retry: false,
            is_scanning: false,
            actions_enabled: false,
            loading: InFlight::default(),
            metadata_item_count: 0,
            location_exposed: false,
            show_map: false,
            location: None,
            map_url: None,
            risk_status: EnrichmentStatus::Pending,
            content_status: EnrichmentStatus::Pending,
            overall_risk: None,
            safe_to_share: false,
            show_warning_banner: false,
            error: None,
            downloads: Vec::new(),
        }
    }
}

/// Project the whole view; `None` session means `Idle`.
pub fn project(session: Option<&ScanSession>, policy: SafeSharePolicy) -> ViewState {
    let Some(session) = session else {
        return ViewState::idle();
    };

    let location = location(session);
    let location_exposed = is_location_exposed(session);
    let overall_risk = overall_risk_label(session);
    let high_risk = overall_risk.is_some_and(|l| l >= RiskLevel::Medium);

    let downloads = session
        .clean_image
        .iter()
        .map(|c| c.handle.clone())
        .chain(session.blurred_image.iter().map(|b| b.handle.clone()))
        .chain(session.filtered_image.iter().cloned())
        .collect();

    ViewState {
        phase: session.phase,
        file_name: Some(session.source_file.file_name.clone()),
        can_start_scan: session.phase.can_start_scan(),
        can_retry: session.phase == Phase::Failed(PhaseKind::Metadata),
        is_scanning: session.phase.is_in_flight(),
        actions_enabled: session.phase == Phase::Ready,
        loading: session.in_flight,
        metadata_item_count: metadata_item_count(session),
        location_exposed,
        show_map: location.is_some(),
        map_url: location.map(|p| p.map_url()),
        location,
        risk_status: session.risk_status,
        content_status: session.content_status,
        overall_risk,
        safe_to_share: is_safe_to_share(session, policy),
        show_warning_banner: location_exposed || high_risk,
        error: session.error.as_ref().map(ErrorBanner::from),
        downloads,
    }
}
