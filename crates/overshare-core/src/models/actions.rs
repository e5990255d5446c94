//! Request shapes for the user-triggered image transformations

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// How metadata removal should treat the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "fields", rename_all = "snake_case")]
pub enum RemovalMode {
    All,
    /// Strip only the named fields. Must not be empty.
    Selective(Vec<String>),
}

impl RemovalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalMode::All => "all",
            RemovalMode::Selective(_) => "selective",
        }
    }

    /// Filename used when the backend omits `Content-Disposition`.
    pub fn default_filename(&self) -> &'static str {
        match self {
            RemovalMode::All => "clean_image.jpg",
            RemovalMode::Selective(_) => "selective_clean_image.jpg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlurRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// What the blur endpoint should look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum BlurTarget {
    LicensePlate,
    Text,
    Face,
    Custom(BlurRegion),
}

impl BlurTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlurTarget::LicensePlate => "license_plate",
            BlurTarget::Text => "text",
            BlurTarget::Face => "face",
            BlurTarget::Custom(_) => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BlurTarget::LicensePlate => "License Plate",
            BlurTarget::Text => "Text Content",
            BlurTarget::Face => "Faces",
            BlurTarget::Custom(_) => "Custom Region",
        }
    }
}

impl Display for BlurTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Parses the region-free targets; `custom` needs coordinates and is built
/// directly as `BlurTarget::Custom`.
impl FromStr for BlurTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "license_plate" => Ok(BlurTarget::LicensePlate),
            "text" => Ok(BlurTarget::Text),
            "face" => Ok(BlurTarget::Face),
            _ => Err(anyhow::anyhow!("Invalid blur content type: {}", s)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurIntensity {
    Light,
    Medium,
    #[default]
    Heavy,
}

impl BlurIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlurIntensity::Light => "light",
            BlurIntensity::Medium => "medium",
            BlurIntensity::Heavy => "heavy",
        }
    }
}

impl Display for BlurIntensity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BlurIntensity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(BlurIntensity::Light),
            "medium" => Ok(BlurIntensity::Medium),
            "heavy" => Ok(BlurIntensity::Heavy),
            _ => Err(anyhow::anyhow!("Invalid blur intensity: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlurRequest {
    pub target: BlurTarget,
    pub intensity: BlurIntensity,
}

impl BlurRequest {
    pub fn new(target: BlurTarget, intensity: BlurIntensity) -> Self {
        Self { target, intensity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_target_parsing() {
        assert_eq!(
            "license_plate".parse::<BlurTarget>().unwrap(),
            BlurTarget::LicensePlate
        );
        assert!("custom".parse::<BlurTarget>().is_err());
    }

    #[test]
    fn test_blur_intensity_default_is_heavy() {
        assert_eq!(BlurIntensity::default(), BlurIntensity::Heavy);
        assert_eq!("Light".parse::<BlurIntensity>().unwrap(), BlurIntensity::Light);
    }

    #[test]
    fn test_removal_mode_default_filenames() {
        assert_eq!(RemovalMode::All.default_filename(), "clean_image.jpg");
        assert_eq!(
            RemovalMode::Selective(vec!["GPSInfo".into()]).default_filename(),
            "selective_clean_image.jpg"
        );
    }
}
