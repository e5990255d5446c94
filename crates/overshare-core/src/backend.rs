//! Analysis backend seam
//!
//! The controller talks to the backend only through this trait so it can be
//! driven by the HTTP client in production and by scripted mocks in tests.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::models::{
    BlurRequest, MetadataMap, PrivacyContent, RemovalMode, RiskAnalysis, SourceFile,
    VisionMode, VisionResult,
};

/// Opaque image bytes returned by a transformation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBody {
    pub bytes: Bytes,
    /// Filename from `Content-Disposition`, if the backend sent one.
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn scan_metadata(&self, file: &SourceFile) -> Result<MetadataMap, TransportError>;

    async fn analyze_risk(&self, metadata: &MetadataMap) -> Result<RiskAnalysis, TransportError>;

    async fn detect_privacy_content(
        &self,
        file: &SourceFile,
    ) -> Result<PrivacyContent, TransportError>;

    async fn analyze_vision(
        &self,
        file: &SourceFile,
        mode: VisionMode,
    ) -> Result<VisionResult, TransportError>;

    async fn remove_metadata(
        &self,
        file: &SourceFile,
        mode: &RemovalMode,
    ) -> Result<BinaryBody, TransportError>;

    async fn blur_content(
        &self,
        file: &SourceFile,
        request: &BlurRequest,
    ) -> Result<BinaryBody, TransportError>;

    /// Returns a `data:` URL of the blurred preview.
    async fn blur_preview(
        &self,
        file: &SourceFile,
        request: &BlurRequest,
    ) -> Result<String, TransportError>;

    async fn privacy_filter(&self, file: &SourceFile) -> Result<BinaryBody, TransportError>;
}
