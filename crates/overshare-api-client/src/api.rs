//! Typed endpoint methods.
//!
//! Each method builds the payload for one backend route and decodes its
//! response envelope. Together they implement `AnalysisBackend`.

use async_trait::async_trait;
use overshare_core::models::{
    BlurRequest, BlurTarget, MetadataMap, PrivacyContent, RemovalMode, RiskAnalysis,
    SourceFile, VisionMode, VisionResult,
};
use overshare_core::{AnalysisBackend, BinaryBody, TransportError};
use serde::Deserialize;

use crate::{ApiClient, Endpoint, Payload};

/// Multipart field carrying each field name for selective removal.
pub const METADATA_TYPES_FIELD: &str = "metadata_types[]";

#[derive(Debug, Deserialize)]
struct RiskEnvelope {
    risk_analysis: RiskAnalysis,
}

#[derive(Debug, Deserialize)]
struct PrivacyEnvelope {
    privacy_analysis: PrivacyContent,
}

#[derive(Debug, Deserialize)]
struct PreviewEnvelope {
    preview: String,
}

/// Form fields for blur and blur-preview requests.
pub fn blur_fields(request: &BlurRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("content_type".to_string(), request.target.as_str().to_string()),
        ("intensity".to_string(), request.intensity.as_str().to_string()),
    ];

    if let BlurTarget::Custom(region) = request.target {
        fields.extend([
            ("x".to_string(), region.x.to_string()),
            ("y".to_string(), region.y.to_string()),
            ("width".to_string(), region.width.to_string()),
            ("height".to_string(), region.height.to_string()),
        ]);
    }

    fields
}

#[async_trait]
impl AnalysisBackend for ApiClient {
    async fn scan_metadata(&self, file: &SourceFile) -> Result<MetadataMap, TransportError> {
        self.call(Endpoint::MetadataScan, Payload::file(file))
            .await?
            .into_json()
    }

    async fn analyze_risk(&self, metadata: &MetadataMap) -> Result<RiskAnalysis, TransportError> {
        let body = serde_json::Value::Object(metadata.clone());
        let envelope: RiskEnvelope = self
            .call(Endpoint::MetadataAnalyze, Payload::Json(body))
            .await?
            .into_json()?;
        Ok(envelope.risk_analysis)
    }

    async fn detect_privacy_content(
        &self,
        file: &SourceFile,
    ) -> Result<PrivacyContent, TransportError> {
        let envelope: PrivacyEnvelope = self
            .call(Endpoint::PrivacyContentDetect, Payload::file(file))
            .await?
            .into_json()?;
        Ok(envelope.privacy_analysis)
    }

    async fn analyze_vision(
        &self,
        file: &SourceFile,
        mode: VisionMode,
    ) -> Result<VisionResult, TransportError> {
        self.call(Endpoint::Vision(mode), Payload::file(file))
            .await?
            .into_json()
    }

    async fn remove_metadata(
        &self,
        file: &SourceFile,
        mode: &RemovalMode,
    ) -> Result<BinaryBody, TransportError> {
        let (endpoint, payload) = match mode {
            RemovalMode::All => (Endpoint::RemoveAllMetadata, Payload::file(file)),
            RemovalMode::Selective(fields) => {
                let fields = fields
                    .iter()
                    .map(|f| (METADATA_TYPES_FIELD.to_string(), f.clone()))
                    .collect();
                (
                    Endpoint::RemoveSelectiveMetadata,
                    Payload::file_with_fields(file, fields),
                )
            }
        };

        self.call(endpoint, payload).await?.into_binary()
    }

    async fn blur_content(
        &self,
        file: &SourceFile,
        request: &BlurRequest,
    ) -> Result<BinaryBody, TransportError> {
        self.call(
            Endpoint::BlurContent,
            Payload::file_with_fields(file, blur_fields(request)),
        )
        .await?
        .into_binary()
    }

    async fn blur_preview(
        &self,
        file: &SourceFile,
        request: &BlurRequest,
    ) -> Result<String, TransportError> {
        let envelope: PreviewEnvelope = self
            .call(
                Endpoint::BlurPreview,
                Payload::file_with_fields(file, blur_fields(request)),
            )
            .await?
            .into_json()?;
        Ok(envelope.preview)
    }

    async fn privacy_filter(&self, file: &SourceFile) -> Result<BinaryBody, TransportError> {
        self.call(Endpoint::PrivacyFilter, Payload::file(file))
            .await?
            .into_binary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use overshare_core::models::{BlurIntensity, BlurRegion, RiskLevel};
    use std::time::Duration;

    fn client(server: &mockito::Server) -> ApiClient {
        ApiClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    fn image() -> SourceFile {
        SourceFile::new("street.jpg", vec![0xFFu8, 0xD8])
    }

    #[test]
    fn test_blur_fields_include_region_only_for_custom() {
        let plate = BlurRequest::new(BlurTarget::LicensePlate, BlurIntensity::Heavy);
        assert_eq!(
            blur_fields(&plate),
            vec![
                ("content_type".to_string(), "license_plate".to_string()),
                ("intensity".to_string(), "heavy".to_string()),
            ]
        );

        let custom = BlurRequest::new(
            BlurTarget::Custom(BlurRegion {
                x: 10,
                y: 20,
                width: 30,
                height: 40,
            }),
            BlurIntensity::Light,
        );
        let fields = blur_fields(&custom);
        assert_eq!(fields.len(), 6);
        assert!(fields.contains(&("width".to_string(), "30".to_string())));
    }

    #[tokio::test]
    async fn test_analyze_risk_unwraps_envelope() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/metadata/analyze")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"risk_analysis": {
                    "overall_risk": "moderate",
                    "overall_description": "Location is exposed",
                    "risks": [{"type": "location", "severity": "high",
                               "description": "GPS", "recommendation": "Strip"}]
                }}"#,
            )
            .create_async()
            .await;

        let mut metadata = MetadataMap::new();
        metadata.insert("Make".into(), "Canon".into());
        let risk = client(&server).analyze_risk(&metadata).await.unwrap();

        assert_eq!(risk.overall_risk, RiskLevel::Medium);
        assert_eq!(risk.max_severity(), RiskLevel::High);
    }

    #[tokio::test]
    async fn test_detect_privacy_content_unwraps_envelope() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/privacy-content/detect")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true, "privacy_analysis": {
                    "sensitive_content_found": true,
                    "overall_risk": "high",
                    "detected_items": [{"type": "license_plate", "risk_level": "high"}]
                }, "note": ""}"#,
            )
            .create_async()
            .await;

        let content = client(&server).detect_privacy_content(&image()).await.unwrap();
        assert!(content.has_license_plate());
    }

    #[tokio::test]
    async fn test_selective_removal_sends_repeated_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/metadata-removal/remove-selective")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="metadata_types\[\]""#.into()),
                Matcher::Regex(r"\r\n\r\nGPSInfo\r\n".into()),
                Matcher::Regex(r"\r\n\r\nMake\r\n".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(vec![7u8; 8])
            .create_async()
            .await;

        let body = client(&server)
            .remove_metadata(
                &image(),
                &RemovalMode::Selective(vec!["GPSInfo".into(), "Make".into()]),
            )
            .await
            .unwrap();

        assert_eq!(body.bytes.len(), 8);
        assert_eq!(body.filename, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_vision_uses_mode_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/vision/objects")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true, "objects": [{"object": "car", "confidence": "high"}],
                    "object_count": 1, "note": ""}"#,
            )
            .create_async()
            .await;

        let result = client(&server)
            .analyze_vision(&image(), VisionMode::Objects)
            .await
            .unwrap();

        assert_eq!(result.object_count(), 1);
        assert!(result.description.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_blur_preview_returns_data_url() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/content-blur/blur-preview")
            .match_body(Matcher::Regex(r"\r\n\r\nface\r\n".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true, "preview": "data:image/jpeg;base64,AAAA",
                    "content_type": "face", "intensity": "medium"}"#,
            )
            .create_async()
            .await;

        let preview = client(&server)
            .blur_preview(
                &image(),
                &BlurRequest::new(BlurTarget::Face, BlurIntensity::Medium),
            )
            .await
            .unwrap();

        assert_eq!(preview, "data:image/jpeg;base64,AAAA");
    }

    #[tokio::test]
    async fn test_binary_endpoint_rejects_json_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/privacy/filter")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let err = client(&server).privacy_filter(&image()).await.unwrap_err();
        assert_eq!(err.status, None);
    }
}
