//! Test fixtures

use bytes::Bytes;
use overshare_core::models::{
    MetadataMap, PrivacyContent, RiskAnalysis, RiskLevel, SourceFile,
};
use overshare_core::BinaryBody;

pub fn jpeg(name: &str) -> SourceFile {
    SourceFile::new(name, vec![0xFFu8, 0xD8, 0xFF, 0xE0])
}

pub fn metadata(value: serde_json::Value) -> MetadataMap {
    value
        .as_object()
        .cloned()
        .expect("metadata fixture must be a JSON object")
}

pub fn risk(level: RiskLevel) -> RiskAnalysis {
    RiskAnalysis {
        overall_risk: level,
        overall_description: None,
        risks: vec![],
    }
}

pub fn no_privacy_content() -> PrivacyContent {
    PrivacyContent {
        sensitive_content_found: false,
        overall_risk: RiskLevel::None,
        summary: None,
        detected_items: vec![],
        recommendations: vec![],
    }
}

pub fn binary(bytes: &'static [u8], filename: Option<&str>) -> BinaryBody {
    BinaryBody {
        bytes: Bytes::from_static(bytes),
        filename: filename.map(str::to_string),
        content_type: Some("image/jpeg".to_string()),
    }
}
