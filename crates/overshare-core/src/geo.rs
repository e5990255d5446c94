//! GPS coordinate conversion
//!
//! EXIF stores latitude and longitude as degree/minute/second triples plus a
//! hemisphere letter. The map view needs signed decimal degrees.

use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

use crate::error::InvalidCoordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    fn sign(&self) -> f64 {
        match self {
            Hemisphere::North | Hemisphere::East => 1.0,
            Hemisphere::South | Hemisphere::West => -1.0,
        }
    }
}

impl FromStr for Hemisphere {
    type Err = InvalidCoordinate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Hemisphere::North),
            "S" => Ok(Hemisphere::South),
            "E" => Ok(Hemisphere::East),
            "W" => Ok(Hemisphere::West),
            other => Err(InvalidCoordinate(format!(
                "hemisphere reference must be N, S, E or W, got {:?}",
                other
            ))),
        }
    }
}

/// Signed decimal coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Read a `GPSInfo` object (`GPSLatitude`, `GPSLatitudeRef`,
    /// `GPSLongitude`, `GPSLongitudeRef`).
    pub fn from_gps_info(gps: &Value) -> Result<Self, InvalidCoordinate> {
        let lat = dms_components(gps.get("GPSLatitude"), "GPSLatitude")?;
        let lng = dms_components(gps.get("GPSLongitude"), "GPSLongitude")?;
        let lat_ref = reference(gps.get("GPSLatitudeRef"), "GPSLatitudeRef")?;
        let lng_ref = reference(gps.get("GPSLongitudeRef"), "GPSLongitudeRef")?;
        convert(&lat, lat_ref, &lng, lng_ref)
    }

    pub fn map_url(&self) -> String {
        format!(
            "https://www.openstreetmap.org/?mlat={}&mlon={}",
            self.lat, self.lng
        )
    }
}

/// `degrees + minutes/60 + seconds/3600`, negated for `S` and `W`.
///
/// Only the first three components are read; extra components are ignored.
pub fn dms_to_decimal(dms: &[f64], hemisphere: Hemisphere) -> Result<f64, InvalidCoordinate> {
    match dms {
        [degrees, minutes, seconds, ..] => {
            Ok(hemisphere.sign() * (degrees + minutes / 60.0 + seconds / 3600.0))
        }
        _ => Err(InvalidCoordinate(format!(
            "expected 3 components, got {}",
            dms.len()
        ))),
    }
}

/// Convert latitude and longitude DMS triples into a `GeoPoint`.
pub fn convert(
    lat_dms: &[f64],
    lat_ref: &str,
    lng_dms: &[f64],
    lng_ref: &str,
) -> Result<GeoPoint, InvalidCoordinate> {
    let lat = dms_to_decimal(lat_dms, lat_ref.parse()?)?;
    let lng = dms_to_decimal(lng_dms, lng_ref.parse()?)?;
    Ok(GeoPoint { lat, lng })
}

/// Parse a textual DMS triple such as `"37, 46, 2997/100"`.
pub fn parse_dms(text: &str) -> Result<Vec<f64>, InvalidCoordinate> {
    dms_components(Some(&Value::String(text.to_string())), "coordinate")
}

fn reference<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a str, InvalidCoordinate> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| InvalidCoordinate(format!("{} is missing", field)))
}

fn dms_components(value: Option<&Value>, field: &str) -> Result<Vec<f64>, InvalidCoordinate> {
    let parts = match value {
        Some(Value::Array(items)) => items.iter().map(component).collect::<Option<Vec<_>>>(),
        // exifread-style "[37, 46, 2997/100]"
        Some(Value::String(s)) => s
            .trim_matches(|c| c == '[' || c == ']' || c == '(' || c == ')')
            .split(',')
            .map(|p| rational(p.trim()))
            .collect::<Option<Vec<_>>>(),
        _ => None,
    };

    let parts = parts.ok_or_else(|| InvalidCoordinate(format!("{} is not numeric", field)))?;
    if parts.len() < 3 {
        return Err(InvalidCoordinate(format!(
            "{} has {} components, expected 3",
            field,
            parts.len()
        )));
    }
    Ok(parts)
}

/// A number, a numeric string, an `"n/d"` rational, or an `[n, d]` pair.
fn component(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => rational(s.trim()),
        Value::Array(pair) if pair.len() == 2 => {
            let num = pair[0].as_f64()?;
            let den = pair[1].as_f64()?;
            (den != 0.0).then(|| num / den)
        }
        _ => None,
    }
}

fn rational(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => s.parse().ok(),
    }
}
