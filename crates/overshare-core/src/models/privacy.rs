use serde::{Deserialize, Serialize};

use super::RiskLevel;

/// Detected item type the backend uses for vehicle registration plates.
pub const LICENSE_PLATE: &str = "license_plate";

/// A single privacy-sensitive item found in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
}

impl DetectedItem {
    pub fn is_license_plate(&self) -> bool {
        self.item_type.eq_ignore_ascii_case(LICENSE_PLATE)
    }
}

/// Result of `POST /privacy-content/detect` (the `privacy_analysis` envelope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyContent {
    #[serde(default)]
    pub sensitive_content_found: bool,
    #[serde(default)]
    pub overall_risk: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub detected_items: Vec<DetectedItem>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl PrivacyContent {
    /// Highest `risk_level` among detected items, `None` when nothing was found.
    pub fn max_item_severity(&self) -> RiskLevel {
        self.detected_items
            .iter()
            .map(|i| i.risk_level)
            .max()
            .unwrap_or_default()
    }

    pub fn has_license_plate(&self) -> bool {
        self.detected_items.iter().any(DetectedItem::is_license_plate)
    }

    pub fn has_high_severity_item(&self) -> bool {
        self.detected_items
            .iter()
            .any(|i| i.risk_level == RiskLevel::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(level: RiskLevel) -> DetectedItem {
        DetectedItem {
            item_type: LICENSE_PLATE.to_string(),
            risk_level: level,
            description: "Plate on parked car".to_string(),
            recommendation: "Blur the plate".to_string(),
        }
    }

    #[test]
    fn test_privacy_content_deserialization() {
        let json = serde_json::json!({
            "sensitive_content_found": true,
            "overall_risk": "high",
            "summary": "A vehicle plate is readable",
            "detected_items": [
                {"type": "license_plate", "risk_level": "high", "description": "plate", "recommendation": "blur"}
            ],
            "recommendations": ["Blur license plates before sharing"]
        });

        let content: PrivacyContent = serde_json::from_value(json).unwrap();
        assert!(content.sensitive_content_found);
        assert!(content.has_license_plate());
        assert!(content.has_high_severity_item());
        assert_eq!(content.recommendations.len(), 1);
    }

    #[test]
    fn test_max_item_severity_empty() {
        let content = PrivacyContent {
            sensitive_content_found: false,
            overall_risk: RiskLevel::Low,
            summary: None,
            detected_items: vec![],
            recommendations: vec![],
        };
        assert_eq!(content.max_item_severity(), RiskLevel::None);
        assert!(!content.has_license_plate());
    }

    #[test]
    fn test_max_item_severity_picks_highest() {
        let mut low = plate(RiskLevel::Low);
        low.item_type = "name".to_string();
        let content = PrivacyContent {
            sensitive_content_found: true,
            overall_risk: RiskLevel::Low,
            summary: None,
            detected_items: vec![low, plate(RiskLevel::Medium)],
            recommendations: vec![],
        };
        assert_eq!(content.max_item_severity(), RiskLevel::Medium);
        assert!(!content.has_high_severity_item());
    }
}
