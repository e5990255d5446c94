use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use overshare_core::models::{BlurRegion, BlurTarget};
use std::future::Future;
use std::path::{Path, PathBuf};

/// Await `fut` only when an action was requested.
pub async fn run_if<F: Future>(fut: Option<F>) -> Option<F::Output> {
    match fut {
        Some(fut) => Some(fut.await),
        None => None,
    }
}

/// Parse `x,y,width,height`.
pub fn parse_region(s: &str) -> Result<BlurRegion> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid region: {}", s))?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(BlurRegion {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => Err(anyhow::anyhow!(
            "Invalid region: {} (expected x,y,width,height)",
            s
        )),
    }
}

/// Blur target from a content type name. `custom` without a region covers
/// the top-left 100x100 pixels.
pub fn blur_target(kind: &str, region: Option<BlurRegion>) -> Result<BlurTarget> {
    if kind.eq_ignore_ascii_case("custom") {
        return Ok(BlurTarget::Custom(region.unwrap_or(BlurRegion {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        })));
    }
    if region.is_some() {
        return Err(anyhow::anyhow!(
            "--region only applies to the custom content type"
        ));
    }
    kind.parse()
}

/// Bytes of a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let (_, payload) = url
        .split_once(";base64,")
        .context("Preview is not a base64 data URL")?;
    STANDARD
        .decode(payload.trim())
        .context("Failed to decode preview data")
}

/// Where to write a result file. Only the final path component of `name` is
/// used, so a backend-supplied filename cannot escape `dir`.
pub fn output_path(dir: &Path, name: Option<&str>, fallback: &str) -> PathBuf {
    let file_name = name
        .and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback);
    dir.join(file_name)
}


/// Initialize tracing for the CLI binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
