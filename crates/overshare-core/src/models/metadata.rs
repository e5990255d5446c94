//! Image metadata as returned by the scan endpoint

use serde::Serialize;
use serde_json::{Map, Value};

use super::RiskLevel;

/// Field name to value mapping produced by `POST /metadata/scan`.
///
/// Values are kept as raw JSON: the backend stringifies most EXIF tags but
/// nests GPS data as an object.
pub type MetadataMap = Map<String, Value>;

pub const GPS_INFO: &str = "GPSInfo";

/// A metadata field the user can choose to strip selectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensitiveField {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub risk: RiskLevel,
}

/// Fields offered for selective removal, highest risk first.
pub const SENSITIVE_FIELDS: &[SensitiveField] = &[
    SensitiveField {
        key: GPS_INFO,
        label: "GPS Location Data",
        description: "Exact coordinates where photo was taken",
        risk: RiskLevel::High,
    },
    SensitiveField {
        key: "DateTime",
        label: "Date & Time",
        description: "When the photo was taken",
        risk: RiskLevel::Medium,
    },
    SensitiveField {
        key: "DateTimeOriginal",
        label: "Original Date & Time",
        description: "Original capture timestamp",
        risk: RiskLevel::Medium,
    },
    SensitiveField {
        key: "Make",
        label: "Camera Make",
        description: "Camera manufacturer",
        risk: RiskLevel::Low,
    },
    SensitiveField {
        key: "Model",
        label: "Camera Model",
        description: "Camera model name",
        risk: RiskLevel::Low,
    },
    SensitiveField {
        key: "Software",
        label: "Software Used",
        description: "Software used to edit the image",
        risk: RiskLevel::Low,
    },
];

/// The `GPSInfo` entry, if the scan found one.
pub fn gps_info(metadata: &MetadataMap) -> Option<&Value> {
    metadata.get(GPS_INFO).filter(|v| !v.is_null())
}

/// Sensitive fields actually present in `metadata`, in catalog order.
pub fn present_sensitive_fields(metadata: &MetadataMap) -> Vec<&'static SensitiveField> {
    SENSITIVE_FIELDS
        .iter()
        .filter(|f| metadata.contains_key(f.key))
        .collect()
}
