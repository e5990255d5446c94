//! HTTP transport for the Overshare analysis backend.
//!
//! `ApiClient::call` is the single place that talks to the network: it sends
//! a multipart or JSON payload to a named endpoint and normalizes every
//! failure into a `TransportError`. Typed endpoint methods live in `api` and
//! implement `AnalysisBackend` for the scan controller.

pub mod api;

use anyhow::{Context, Result};
use overshare_core::models::{SourceFile, VisionMode};
use overshare_core::{BinaryBody, ClientConfig, TransportError};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Backend routes used by the scan pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    MetadataScan,
    MetadataAnalyze,
    PrivacyContentDetect,
    Vision(VisionMode),
    RemoveAllMetadata,
    RemoveSelectiveMetadata,
    BlurContent,
    BlurPreview,
    PrivacyFilter,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::MetadataScan => "/metadata/scan",
            Endpoint::MetadataAnalyze => "/metadata/analyze",
            Endpoint::PrivacyContentDetect => "/privacy-content/detect",
            Endpoint::Vision(VisionMode::Comprehensive) => "/vision/comprehensive",
            Endpoint::Vision(VisionMode::Description) => "/vision/description",
            Endpoint::Vision(VisionMode::Objects) => "/vision/objects",
            Endpoint::RemoveAllMetadata => "/metadata-removal/remove-all",
            Endpoint::RemoveSelectiveMetadata => "/metadata-removal/remove-selective",
            Endpoint::BlurContent => "/content-blur/blur-content",
            Endpoint::BlurPreview => "/content-blur/blur-preview",
            Endpoint::PrivacyFilter => "/privacy/filter",
        }
    }
}

/// Request body for `ApiClient::call`.
#[derive(Debug, Clone)]
pub enum Payload {
    /// The image as the `file` part plus string fields; names may repeat.
    Multipart {
        file: SourceFile,
        fields: Vec<(String, String)>,
    },
    Json(serde_json::Value),
}

impl Payload {
    pub fn file(file: &SourceFile) -> Self {
        Payload::Multipart {
            file: file.clone(),
            fields: Vec::new(),
        }
    }

    pub fn file_with_fields(file: &SourceFile, fields: Vec<(String, String)>) -> Self {
        Payload::Multipart {
            file: file.clone(),
            fields,
        }
    }

    fn into_form(file: SourceFile, fields: Vec<(String, String)>) -> Form {
        let part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
        fields
            .into_iter()
            .fold(Form::new().part("file", part), |form, (name, value)| {
                form.text(name, value)
            })
    }
}

/// Successful response, decoded by content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Binary(BinaryBody),
}

impl ResponseBody {
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, TransportError> {
        match self {
            ResponseBody::Json(value) => serde_json::from_value(value).map_err(|e| {
                TransportError::network(format!("Failed to parse response as JSON: {}", e))
            }),
            ResponseBody::Binary(_) => Err(TransportError::network(
                "Expected a JSON response but received binary data",
            )),
        }
    }

    pub fn into_binary(self) -> Result<BinaryBody, TransportError> {
        match self {
            ResponseBody::Binary(body) => Ok(body),
            ResponseBody::Json(_) => Err(TransportError::network(
                "Expected image data but received JSON",
            )),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the analysis backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// Create client from environment: OVERSHARE_API_URL (or API_URL).
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `payload` to `endpoint`. No retries.
    pub async fn call(
        &self,
        endpoint: Endpoint,
        payload: Payload,
    ) -> Result<ResponseBody, TransportError> {
        let url = self.build_url(endpoint.path());
        let request = match payload {
            Payload::Multipart { file, fields } => self
                .client
                .post(&url)
                .multipart(Payload::into_form(file, fields)),
            Payload::Json(body) => self.client.post(&url).json(&body),
        };

        tracing::debug!(endpoint = endpoint.path(), "Sending request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(endpoint = endpoint.path(), error = %e, "Request failed");
            TransportError::network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error = match response.json::<ErrorBody>().await {
                Ok(body) => TransportError::status(status.as_u16(), body.error),
                Err(_) => TransportError::unknown(status.as_u16()),
            };
            tracing::warn!(
                endpoint = endpoint.path(),
                status = status.as_u16(),
                error = %error.message,
                "Backend rejected request"
            );
            return Err(error);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"))
        {
            let value = response.json::<serde_json::Value>().await.map_err(|e| {
                TransportError::network(format!("Failed to parse response as JSON: {}", e))
            })?;
            return Ok(ResponseBody::Json(value));
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {}", e)))?;

        Ok(ResponseBody::Binary(BinaryBody {
            bytes,
            filename,
            content_type,
        }))
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Extract `filename=` from a `Content-Disposition` header, stripping quotes.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))
        .map(|name| name.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::Server) -> ApiClient {
        ApiClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    fn image() -> SourceFile {
        SourceFile::new("photo.jpg", vec![0xFFu8, 0xD8, 0xFF])
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition("attachment; filename=\"clean_photo.jpg\"").as_deref(),
            Some("clean_photo.jpg")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=blurred.png").as_deref(),
            Some("blurred.png")
        );
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_build_url_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/".into(), Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.build_url(Endpoint::MetadataScan.path()),
            "http://localhost:5000/metadata/scan"
        );
    }

    #[tokio::test]
    async fn test_call_returns_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/metadata/scan")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("multipart/form-data".into()),
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Make": "Canon"}"#)
            .create_async()
            .await;

        let body = client(&server)
            .call(Endpoint::MetadataScan, Payload::file(&image()))
            .await
            .unwrap();

        assert_eq!(body, ResponseBody::Json(serde_json::json!({"Make": "Canon"})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_surfaces_backend_error_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/privacy/filter")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "No file uploaded"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .call(Endpoint::PrivacyFilter, Payload::file(&image()))
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::status(400, "No file uploaded"));
    }

    #[tokio::test]
    async fn test_call_unreadable_error_body_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/metadata/scan")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let err = client(&server)
            .call(Endpoint::MetadataScan, Payload::file(&image()))
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(502));
        assert_eq!(err.message, TransportError::UNKNOWN_MESSAGE);
    }

    #[tokio::test]
    async fn test_call_network_failure_has_no_status() {
        // nothing listens on port 9 locally
        let client = ApiClient::new("http://127.0.0.1:9".into(), Duration::from_secs(2)).unwrap();
        let err = client
            .call(Endpoint::MetadataScan, Payload::file(&image()))
            .await
            .unwrap_err();

        assert_eq!(err.status, None);
    }

    #[tokio::test]
    async fn test_call_returns_binary_with_filename() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/metadata-removal/remove-all")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_header("content-disposition", "attachment; filename=\"clean_photo.jpg\"")
            .with_body(vec![1u8, 2, 3])
            .create_async()
            .await;

        let body = client(&server)
            .call(Endpoint::RemoveAllMetadata, Payload::file(&image()))
            .await
            .unwrap()
            .into_binary()
            .unwrap();

        assert_eq!(body.bytes.as_ref(), &[1u8, 2, 3]);
        assert_eq!(body.filename.as_deref(), Some("clean_photo.jpg"));
        assert_eq!(body.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_call_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/metadata/analyze")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(serde_json::json!({"Make": "Canon"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"risk_analysis": {"overall_risk": "low", "risks": []}}"#)
            .create_async()
            .await;

        client(&server)
            .call(
                Endpoint::MetadataAnalyze,
                Payload::Json(serde_json::json!({"Make": "Canon"})),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
