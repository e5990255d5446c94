use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Severity scale shared by risk analysis and content detection.
///
/// Ordering is `None < Low < Medium < High`. The backend is not consistent
/// about its labels (`moderate` and `medium` both appear), so parsing is
/// lenient and never fails: anything unrecognized reads as `None`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// `none` and `low` are the levels a user may share without review.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, RiskLevel::None | RiskLevel::Low)
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "high" | "critical" | "severe" => RiskLevel::High,
            "medium" | "moderate" => RiskLevel::Medium,
            "low" | "minimal" => RiskLevel::Low,
            _ => RiskLevel::None,
        })
    }
}

impl From<String> for RiskLevel {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

/// One finding from the metadata risk analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskItem {
    #[serde(rename = "type", alias = "risk_type")]
    pub risk_type: String,
    #[serde(default)]
    pub severity: RiskLevel,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
}

/// Result of `POST /metadata/analyze` (the `risk_analysis` envelope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    #[serde(default)]
    pub overall_risk: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_description: Option<String>,
    #[serde(default)]
    pub risks: Vec<RiskItem>,
}

impl RiskAnalysis {
    /// Highest severity among the overall label and the individual findings.
    pub fn max_severity(&self) -> RiskLevel {
        self.risks
            .iter()
            .map(|r| r.severity)
            .fold(self.overall_risk, RiskLevel::max)
    }
}
