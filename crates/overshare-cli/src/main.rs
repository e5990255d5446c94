//! Overshare CLI: scan an image for privacy exposure.
//!
//! Set OVERSHARE_API_URL (or API_URL) to point at the analysis backend.

use anyhow::Context;
use clap::{Parser, Subcommand};
use overshare_api_client::ApiClient;
use overshare_cli::{
    blur_target, decode_data_url, init_tracing, output_path, parse_region, run_if,
};
use overshare_core::geo;
use overshare_core::models::{
    present_sensitive_fields, BlurIntensity, BlurRequest, RemovalMode, SensitiveField,
    SourceFile, VisionMode, VisionResult, SENSITIVE_FIELDS,
};
use overshare_core::{BlobHandle, ClientConfig, SafeSharePolicy, ScanError, ViewState};
use overshare_scan::ScanController;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "overshare", about = "Scan images for privacy exposure")]
struct Cli {
    /// Analysis backend base URL
    #[arg(long, env = "OVERSHARE_API_URL", global = true)]
    api_url: Option<String>,
    /// Request timeout in seconds
    #[arg(long, env = "OVERSHARE_HTTP_TIMEOUT_SECS", global = true)]
    timeout: Option<u64>,
    /// Safe-share rule: license_plate or severity
    #[arg(long, env = "OVERSHARE_SAFE_SHARE_POLICY", global = true)]
    policy: Option<SafeSharePolicy>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an image, then optionally run privacy actions on it
    Scan {
        /// Path to the image
        file: PathBuf,
        /// Run vision analysis: comprehensive, description, objects
        #[arg(long)]
        vision: Option<VisionMode>,
        /// Strip all metadata
        #[arg(long, conflicts_with = "remove")]
        remove_all: bool,
        /// Strip only these metadata fields (comma separated)
        #[arg(long, value_delimiter = ',')]
        remove: Vec<String>,
        /// Blur content: license_plate, text, face, custom
        #[arg(long)]
        blur: Option<String>,
        /// Blur intensity: light, medium, heavy
        #[arg(long, default_value = "heavy")]
        intensity: BlurIntensity,
        /// Custom blur region as x,y,width,height
        #[arg(long)]
        region: Option<String>,
        /// Fetch a blur preview for the --blur content type
        #[arg(long, requires = "blur")]
        preview: bool,
        /// Remove text through the backend privacy filter
        #[arg(long)]
        filter: bool,
        /// Directory for result images
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Convert a DMS coordinate pair to decimal degrees
    Coords {
        /// Latitude as "deg, min, sec"
        lat: String,
        /// N or S
        lat_ref: String,
        /// Longitude as "deg, min, sec"
        lng: String,
        /// E or W
        lng_ref: String,
    },
    /// List the metadata fields offered for selective removal
    Fields,
}

#[derive(Serialize)]
struct ScanReport {
    view: ViewState,
    sensitive_fields: Vec<&'static SensitiveField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vision: Option<VisionResult>,
    written: Vec<PathBuf>,
    errors: Vec<String>,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Invalid configuration")?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(timeout) = cli.timeout {
        config.http_timeout_secs = timeout;
    }
    if let Some(policy) = cli.policy {
        config.safe_share_policy = policy;
    }
    config.validate()?;
    Ok(config)
}

async fn write_handle(
    controller: &ScanController<ApiClient>,
    handle: &BlobHandle,
    out_dir: &Path,
    fallback: &str,
) -> anyhow::Result<PathBuf> {
    let bytes = controller
        .resolve(handle)
        .await
        .context("Result image is no longer available")?;
    let path = output_path(out_dir, handle.filename.as_deref(), fallback);
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), size = bytes.len(), "Wrote result image");
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Fields => print_json(&SENSITIVE_FIELDS)?,
        Commands::Coords {
            lat,
            lat_ref,
            lng,
            lng_ref,
        } => {
            let point = geo::convert(
                &geo::parse_dms(lat)?,
                lat_ref,
                &geo::parse_dms(lng)?,
                lng_ref,
            )?;
            print_json(&serde_json::json!({
                "lat": point.lat,
                "lng": point.lng,
                "map_url": point.map_url(),
            }))?;
        }
        Commands::Scan {
            file,
            vision,
            remove_all,
            remove,
            blur,
            intensity,
            region,
            preview,
            filter,
            out_dir,
        } => {
            let config = load_config(&cli)?;
            let client = ApiClient::from_config(&config).context(
                "Failed to create API client. Set OVERSHARE_API_URL (or API_URL)",
            )?;

            let region = region.as_deref().map(parse_region).transpose()?;
            let blur_request = blur
                .as_deref()
                .map(|kind| blur_target(kind, region))
                .transpose()?
                .map(|target| BlurRequest::new(target, *intensity));
            let removal = if *remove_all {
                Some(RemovalMode::All)
            } else if !remove.is_empty() {
                Some(RemovalMode::Selective(remove.clone()))
            } else {
                None
            };

            let controller = ScanController::new(Arc::new(client), config);
            controller.select_file(SourceFile::from_path(file)?).await?;

            if let Err(err) = controller.start_scan().await {
                print_json(&controller.view().await)?;
                return Err(err).context("Metadata scan failed");
            }

            let (vision_result, removed, blurred, previewed, filtered) = tokio::join!(
                run_if(vision.map(|mode| controller.analyze_vision(mode))),
                run_if(removal.map(|mode| controller.remove_metadata(mode))),
                run_if(blur_request.map(|req| controller.blur_content(req))),
                run_if(
                    blur_request
                        .filter(|_| *preview)
                        .map(|req| controller.preview_blur(req))
                ),
                run_if(filter.then(|| controller.apply_privacy_filter())),
            );

            let mut errors: Vec<String> = Vec::new();
            let mut written = Vec::new();
            let source_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image.jpg")
                .to_string();

            let mut record = |result: Option<Result<BlobHandle, ScanError>>| match result {
                Some(Ok(handle)) => Some(handle),
                Some(Err(err)) => {
                    errors.push(err.to_string());
                    None
                }
                None => None,
            };
            let handles = [
                (record(removed), "clean_image.jpg".to_string()),
                (record(blurred), format!("blurred_{}", source_name)),
                (record(filtered), format!("processed_{}", source_name)),
            ];

            for (handle, fallback) in handles.iter() {
                if let Some(handle) = handle {
                    written.push(write_handle(&controller, handle, out_dir, fallback).await?);
                }
            }

            let vision_result = match vision_result {
                Some(Ok(result)) => Some(result),
                Some(Err(err)) => {
                    errors.push(err.to_string());
                    None
                }
                None => None,
            };

            match previewed {
                Some(Ok(data_url)) => {
                    let path = out_dir.join(format!("preview_{}", source_name));
                    tokio::fs::write(&path, decode_data_url(&data_url)?)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    written.push(path);
                }
                Some(Err(err)) => errors.push(err.to_string()),
                None => {}
            }

            let sensitive_fields = controller
                .snapshot()
                .await
                .and_then(|session| session.metadata)
                .map(|metadata| present_sensitive_fields(&metadata))
                .unwrap_or_default();

            print_json(&ScanReport {
                view: controller.view().await,
                sensitive_fields,
                vision: vision_result,
                written,
                errors,
            })?;
        }
    }

    Ok(())
}
