use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Which vision endpoint to call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionMode {
    #[default]
    Comprehensive,
    Description,
    Objects,
}

impl VisionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisionMode::Comprehensive => "comprehensive",
            VisionMode::Description => "description",
            VisionMode::Objects => "objects",
        }
    }
}

impl Display for VisionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VisionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comprehensive" => Ok(VisionMode::Comprehensive),
            "description" => Ok(VisionMode::Description),
            "objects" => Ok(VisionMode::Objects),
            _ => Err(anyhow::anyhow!("Invalid vision mode: {}", s)),
        }
    }
}

/// Object confidence is a label (`"high"`) from the language model, or a
/// numeric score when a detector produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Score(f64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

/// Response of `POST /vision/{mode}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<DetectedObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_count: Option<usize>,
}

impl VisionResult {
    pub fn object_count(&self) -> usize {
        self.object_count
            .or_else(|| self.objects.as_ref().map(Vec::len))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_result_mixed_confidence() {
        let json = serde_json::json!({
            "success": true,
            "description": "A red car parked on a street",
            "objects": [
                {"object": "car", "confidence": "high"},
                {"object": "person", "confidence": 0.82},
                {"object": "tree"}
            ]
        });

        let result: VisionResult = serde_json::from_value(json).unwrap();
        let objects = result.objects.as_ref().unwrap();
        assert_eq!(objects[0].confidence, Some(Confidence::Label("high".into())));
        assert_eq!(objects[1].confidence, Some(Confidence::Score(0.82)));
        assert_eq!(objects[2].confidence, None);
        assert_eq!(result.object_count(), 3);
    }

    #[test]
    fn test_vision_mode_from_str() {
        assert_eq!(
            "Objects".parse::<VisionMode>().unwrap(),
            VisionMode::Objects
        );
        assert!("faces".parse::<VisionMode>().is_err());
    }
}
