//! Scripted backend for controller tests
//!
//! Responses are queued per phase; an empty queue yields a benign default.
//! A gate parks a call until the test releases it, which lets tests select
//! a new file while a response is still outstanding.

use async_trait::async_trait;
use overshare_core::models::{
    BlurRequest, MetadataMap, PrivacyContent, RemovalMode, RiskAnalysis, RiskLevel,
    SourceFile, VisionMode, VisionResult,
};
use overshare_core::{AnalysisBackend, BinaryBody, PhaseKind, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::fixtures::{binary, no_privacy_content, risk};

#[derive(Debug, Clone)]
pub enum MockResponse {
    Metadata(MetadataMap),
    Risk(RiskAnalysis),
    Content(PrivacyContent),
    Vision(VisionResult),
    Binary(BinaryBody),
    Preview(String),
}

/// `entered` fires when the gated call starts; `release` lets it finish.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct MockBackend {
    responses: Mutex<HashMap<PhaseKind, VecDeque<Result<MockResponse, TransportError>>>>,
    calls: Mutex<HashMap<PhaseKind, usize>>,
    gates: Mutex<HashMap<PhaseKind, Gate>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, kind: PhaseKind, response: Result<MockResponse, TransportError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(response);
    }

    /// Park the next call for `kind` until `release` is notified.
    pub fn gate(&self, kind: PhaseKind) -> Gate {
        let gate = Gate::default();
        self.gates.lock().unwrap().insert(kind, gate.clone());
        gate
    }

    pub fn calls(&self, kind: PhaseKind) -> usize {
        self.calls.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    async fn respond(&self, kind: PhaseKind) -> Result<MockResponse, TransportError> {
        *self.calls.lock().unwrap().entry(kind).or_default() += 1;

        let gate = self.gates.lock().unwrap().remove(&kind);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&kind)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(default_response(kind)))
    }
}

fn default_response(kind: PhaseKind) -> MockResponse {
    match kind {
        PhaseKind::Metadata => MockResponse::Metadata(MetadataMap::new()),
        PhaseKind::Risk => MockResponse::Risk(risk(RiskLevel::Low)),
        PhaseKind::Content => MockResponse::Content(no_privacy_content()),
        PhaseKind::Vision => MockResponse::Vision(VisionResult {
            description: Some("A parked car".to_string()),
            objects: None,
            object_count: None,
        }),
        PhaseKind::BlurPreview => {
            MockResponse::Preview("data:image/jpeg;base64,AAAA".to_string())
        }
        PhaseKind::Removal | PhaseKind::Blur | PhaseKind::PrivacyFilter => {
            MockResponse::Binary(binary(b"image-bytes", None))
        }
    }
}

macro_rules! expect_response {
    ($result:expr, $variant:ident) => {
        match $result? {
            MockResponse::$variant(value) => Ok(value),
            other => panic!("unexpected mock response: {:?}", other),
        }
    };
}

#[async_trait]
impl AnalysisBackend for MockBackend {
    async fn scan_metadata(&self, _file: &SourceFile) -> Result<MetadataMap, TransportError> {
        expect_response!(self.respond(PhaseKind::Metadata).await, Metadata)
    }

    async fn analyze_risk(&self, _metadata: &MetadataMap) -> Result<RiskAnalysis, TransportError> {
        expect_response!(self.respond(PhaseKind::Risk).await, Risk)
    }

    async fn detect_privacy_content(
        &self,
        _file: &SourceFile,
    ) -> Result<PrivacyContent, TransportError> {
        expect_response!(self.respond(PhaseKind::Content).await, Content)
    }

    async fn analyze_vision(
        &self,
        _file: &SourceFile,
        _mode: VisionMode,
    ) -> Result<VisionResult, TransportError> {
        expect_response!(self.respond(PhaseKind::Vision).await, Vision)
    }

    async fn remove_metadata(
        &self,
        _file: &SourceFile,
        _mode: &RemovalMode,
    ) -> Result<BinaryBody, TransportError> {
        expect_response!(self.respond(PhaseKind::Removal).await, Binary)
    }

    async fn blur_content(
        &self,
        _file: &SourceFile,
        _request: &BlurRequest,
    ) -> Result<BinaryBody, TransportError> {
        expect_response!(self.respond(PhaseKind::Blur).await, Binary)
    }

    async fn blur_preview(
        &self,
        _file: &SourceFile,
        _request: &BlurRequest,
    ) -> Result<String, TransportError> {
        expect_response!(self.respond(PhaseKind::BlurPreview).await, Preview)
    }

    async fn privacy_filter(&self, _file: &SourceFile) -> Result<BinaryBody, TransportError> {
        expect_response!(self.respond(PhaseKind::PrivacyFilter).await, Binary)
    }
}
