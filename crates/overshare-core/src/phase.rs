//! Pipeline phases and the transition table that governs them

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// One discrete step of the scan pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Metadata,
    Risk,
    Content,
    Vision,
    Removal,
    Blur,
    BlurPreview,
    PrivacyFilter,
}

/// What happens to the scan cycle when a phase fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Blocks every dependent phase; the session enters `Failed`.
    Mandatory,
    /// Logged and skipped; the pipeline proceeds with the field absent.
    BestEffort,
    /// Scoped to the single action; earlier results are kept.
    UserScoped,
}

impl PhaseKind {
    /// Phases run automatically after `start_scan`, in order.
    pub const AUTOMATIC: [PhaseKind; 3] =
        [PhaseKind::Metadata, PhaseKind::Risk, PhaseKind::Content];

    pub fn policy(&self) -> FailurePolicy {
        match self {
            PhaseKind::Metadata => FailurePolicy::Mandatory,
            PhaseKind::Risk | PhaseKind::Content => FailurePolicy::BestEffort,
            PhaseKind::Vision
            | PhaseKind::Removal
            | PhaseKind::Blur
            | PhaseKind::BlurPreview
            | PhaseKind::PrivacyFilter => FailurePolicy::UserScoped,
        }
    }

    pub fn is_user_triggered(&self) -> bool {
        self.policy() == FailurePolicy::UserScoped
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Metadata => "metadata",
            PhaseKind::Risk => "risk",
            PhaseKind::Content => "content",
            PhaseKind::Vision => "vision",
            PhaseKind::Removal => "removal",
            PhaseKind::Blur => "blur",
            PhaseKind::BlurPreview => "blur_preview",
            PhaseKind::PrivacyFilter => "privacy_filter",
        }
    }
}

impl Display for PhaseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a session in the automatic pipeline.
///
/// User-triggered work does not move this value: it is tracked through
/// per-action in-flight flags while the session stays `Ready`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "phase", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Scanning,
    Analyzing,
    DetectingContent,
    Ready,
    Failed(PhaseKind),
}

impl Phase {
    /// The automatic phase that runs `kind`, if any.
    pub fn running(kind: PhaseKind) -> Option<Phase> {
        match kind {
            PhaseKind::Metadata => Some(Phase::Scanning),
            PhaseKind::Risk => Some(Phase::Analyzing),
            PhaseKind::Content => Some(Phase::DetectingContent),
            _ => None,
        }
    }

    /// Where the automatic pipeline goes once `kind` settles, whether it
    /// succeeded or failed best-effort.
    pub fn after(kind: PhaseKind) -> Option<Phase> {
        match kind {
            PhaseKind::Metadata => Some(Phase::Analyzing),
            PhaseKind::Risk => Some(Phase::DetectingContent),
            PhaseKind::Content => Some(Phase::Ready),
            _ => None,
        }
    }

    /// Rank along the automatic pipeline, used to assert forward-only movement.
    pub fn ordinal(&self) -> u8 {
        match self {
            Phase::Idle => 0,
            Phase::Uploading => 1,
            Phase::Scanning => 2,
            Phase::Failed(_) => 2,
            Phase::Analyzing => 3,
            Phase::DetectingContent => 4,
            Phase::Ready => 5,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Phase::Scanning | Phase::Analyzing | Phase::DetectingContent
        )
    }

    /// A metadata scan may start from here (first attempt or retry).
    pub fn can_start_scan(&self) -> bool {
        matches!(self, Phase::Uploading | Phase::Failed(PhaseKind::Metadata))
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Uploading => write!(f, "uploading"),
            Phase::Scanning => write!(f, "scanning"),
            Phase::Analyzing => write!(f, "analyzing"),
            Phase::DetectingContent => write!(f, "detecting_content"),
            Phase::Ready => write!(f, "ready"),
            Phase::Failed(kind) => write!(f, "failed({})", kind),
        }
    }
}
