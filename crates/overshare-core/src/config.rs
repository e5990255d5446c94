//! Configuration module
//!
//! Client configuration is read from the environment (and a `.env` file when
//! present). Every value has a default suitable for a local backend.

use std::env;
use std::str::FromStr;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const HTTP_TIMEOUT_SECS: u64 = 60;
const MAX_FILE_SIZE_MB: usize = 10;

/// Which rule decides whether an image is safe to share.
///
/// Both rules also require the overall risk label to be known and at most
/// `low`; they differ in which detected items veto sharing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SafeSharePolicy {
    /// Any detected license plate vetoes sharing.
    #[default]
    NoLicensePlate,
    /// Any high-severity detected item vetoes sharing.
    NoHighSeverity,
}

impl FromStr for SafeSharePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "license_plate" | "no_license_plate" => Ok(SafeSharePolicy::NoLicensePlate),
            "severity" | "no_high_severity" => Ok(SafeSharePolicy::NoHighSeverity),
            _ => Err(anyhow::anyhow!(
                "Invalid safe-share policy: {} (expected license_plate or severity)",
                s
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub http_timeout_secs: u64,
    pub safe_share_policy: SafeSharePolicy,
    pub max_file_size_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            safe_share_policy: SafeSharePolicy::default(),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
        }
    }
}

impl ClientConfig {
    /// Load from OVERSHARE_API_URL (or API_URL), OVERSHARE_HTTP_TIMEOUT_SECS,
    /// OVERSHARE_SAFE_SHARE_POLICY and OVERSHARE_MAX_FILE_SIZE_MB.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_url = env::var("OVERSHARE_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let http_timeout_secs = env::var("OVERSHARE_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .unwrap_or(HTTP_TIMEOUT_SECS);

        let safe_share_policy = match env::var("OVERSHARE_SAFE_SHARE_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => SafeSharePolicy::default(),
        };

        let max_file_size_mb = env::var("OVERSHARE_MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let config = Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            http_timeout_secs,
            safe_share_policy,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "OVERSHARE_API_URL must start with http:// or https://, got {}",
                self.api_url
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "OVERSHARE_HTTP_TIMEOUT_SECS must be greater than 0"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "OVERSHARE_MAX_FILE_SIZE_MB must be greater than 0"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_url, "http://127.0.0.1:5000");
        assert_eq!(config.max_file_size_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = ClientConfig {
            api_url: "localhost:5000".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ClientConfig {
            http_timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_safe_share_policy_parsing() {
        assert_eq!(
            "severity".parse::<SafeSharePolicy>().unwrap(),
            SafeSharePolicy::NoHighSeverity
        );
        assert_eq!(
            "LICENSE_PLATE".parse::<SafeSharePolicy>().unwrap(),
            SafeSharePolicy::NoLicensePlate
        );
        assert!("strict".parse::<SafeSharePolicy>().is_err());
    }
}
