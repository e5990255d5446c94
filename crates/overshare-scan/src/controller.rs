//! Scan orchestration: select, metadata, risk, content, ready, plus the
//! user-triggered actions that run once the session is `Ready`.
//!
//! All session state lives behind one async mutex. The lock is taken only at
//! transition points and is never held while a backend call is awaited;
//! every response is applied through `apply_current`, which drops it when the
//! session it was issued for has since been replaced.

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Mutex;

use overshare_core::error::{ErrorMetadata, LogLevel, ScanError};
use overshare_core::models::{
    gps_info, BlurRequest, BlurTarget, RemovalMode, SourceFile, VisionMode, VisionResult,
};
use overshare_core::session::{BlurredImage, CleanImage, EnrichmentStatus};
use overshare_core::view::{self, ViewState};
use overshare_core::{
    AnalysisBackend, BinaryBody, BlobHandle, ClientConfig, GeoPoint, Generation, HandleRegistry,
    Phase, PhaseKind, ScanSession,
};

#[derive(Debug, Default)]
struct ControllerState {
    /// `None` is the `Idle` state.
    session: Option<ScanSession>,
    generation: Generation,
    handles: HandleRegistry,
}

impl ControllerState {
    /// Drop the current session and every handle it owns.
    fn discard(&mut self) -> Generation {
        let revoked = self.handles.revoke_all();
        if let Some(old) = self.session.take() {
            tracing::debug!(
                generation = old.generation,
                revoked_handles = revoked,
                "Discarded scan session"
            );
        }
        self.generation += 1;
        self.generation
    }
}

/// Drives one `ScanSession` at a time against an `AnalysisBackend`.
pub struct ScanController<B: AnalysisBackend> {
    backend: Arc<B>,
    config: Arc<ClientConfig>,
    state: Arc<Mutex<ControllerState>>,
}

impl<B: AnalysisBackend> Clone for ScanController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: AnalysisBackend> ScanController<B> {
    pub fn new(backend: Arc<B>, config: ClientConfig) -> Self {
        Self {
            backend,
            config: Arc::new(config),
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace any current session with a fresh one for `file`.
    pub async fn select_file(&self, file: SourceFile) -> Result<Generation, ScanError> {
        if file.is_empty() {
            return Err(ScanError::validation("Selected file is empty"));
        }
        if file.len() > self.config.max_file_size_bytes {
            return Err(ScanError::validation(format!(
                "File size {} exceeds the {} byte limit",
                file.len(),
                self.config.max_file_size_bytes
            )));
        }

        let mut state = self.state.lock().await;
        let generation = state.discard();
        let preview = state.handles.create(
            file.bytes.clone(),
            Some(file.file_name.clone()),
            file.content_type.clone(),
        );

        tracing::info!(
            generation = generation,
            file_name = %file.file_name,
            size = file.len(),
            "Selected file"
        );

        state.session = Some(ScanSession::new(generation, file, Some(preview)));
        Ok(generation)
    }

    /// Return to `Idle`; late responses for the old session are dropped.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        let generation = state.discard();
        tracing::info!(generation = generation, "Scan cancelled");
    }

    /// Run the automatic pipeline from `Uploading` (or after a failed scan).
    pub async fn start_scan(&self) -> Result<(), ScanError> {
        let (generation, file) = self.begin_pipeline(Phase::can_start_scan).await?;
        self.run_pipeline(generation, file).await
    }

    /// Re-run the pipeline after the metadata scan failed.
    pub async fn retry(&self) -> Result<(), ScanError> {
        let (generation, file) = self
            .begin_pipeline(|phase| *phase == Phase::Failed(PhaseKind::Metadata))
            .await?;
        tracing::info!(generation = generation, "Retrying metadata scan");
        self.run_pipeline(generation, file).await
    }

    async fn begin_pipeline(
        &self,
        allowed: impl Fn(&Phase) -> bool,
    ) -> Result<(Generation, SourceFile), ScanError> {
        let mut state = self.state.lock().await;
        let session = state.session.as_mut().ok_or(ScanError::NoSession)?;

        if !allowed(&session.phase) {
            return Err(ScanError::InvalidTransition {
                action: PhaseKind::Metadata,
                phase: session.phase,
            });
        }

        session.phase = Phase::Scanning;
        session.error = None;
        session.metadata = None;
        session.risk_analysis = None;
        session.risk_status = EnrichmentStatus::Pending;
        session.privacy_content = None;
        session.content_status = EnrichmentStatus::Pending;

        Ok((session.generation, session.source_file.clone()))
    }

    async fn run_pipeline(&self, generation: Generation, file: SourceFile) -> Result<(), ScanError> {
        tracing::info!(generation = generation, file_name = %file.file_name, "Scanning metadata");
        let scanned = self.backend.scan_metadata(&file).await;

        let metadata = self
            .apply_current(generation, PhaseKind::Metadata, |session, _| match scanned {
                Ok(metadata) => {
                    session.metadata = Some(metadata.clone());
                    advance(session, PhaseKind::Metadata);
                    Ok(metadata)
                }
                Err(source) => {
                    let err = ScanError::transport(PhaseKind::Metadata, source);
                    session.record_error(PhaseKind::Metadata, &err);
                    session.phase = Phase::Failed(PhaseKind::Metadata);
                    Err(err)
                }
            })
            .await?
            .map_err(log_scan_error)?;

        tracing::info!(
            generation = generation,
            fields = metadata.len(),
            "Metadata extracted, analyzing risk"
        );
        // unreadable GPS only hides the map
        if let Some(Err(err)) = gps_info(&metadata).map(GeoPoint::from_gps_info) {
            log_scan_error(ScanError::from(err));
        }
        let risk = self.backend.analyze_risk(&metadata).await;

        self.apply_current(generation, PhaseKind::Risk, |session, _| {
            match risk {
                Ok(analysis) => {
                    session.risk_analysis = Some(analysis);
                    session.risk_status = EnrichmentStatus::Available;
                }
                Err(e) => {
                    tracing::warn!(generation = generation, error = %e, "Risk analysis unavailable");
                    session.risk_status = EnrichmentStatus::Unavailable;
                }
            }
            advance(session, PhaseKind::Risk);
        })
        .await?;

        tracing::info!(generation = generation, "Detecting privacy-sensitive content");
        let content = self.backend.detect_privacy_content(&file).await;

        self.apply_current(generation, PhaseKind::Content, |session, _| {
            match content {
                Ok(content) => {
                    session.privacy_content = Some(content);
                    session.content_status = EnrichmentStatus::Available;
                }
                Err(e) => {
                    tracing::warn!(generation = generation, error = %e, "Privacy content detection unavailable");
                    session.content_status = EnrichmentStatus::Unavailable;
                }
            }
            advance(session, PhaseKind::Content);
        })
        .await?;

        tracing::info!(generation = generation, "Scan complete");
        Ok(())
    }

    pub async fn analyze_vision(&self, mode: VisionMode) -> Result<VisionResult, ScanError> {
        let kind = PhaseKind::Vision;
        let (generation, file) = self.begin_action(kind).await?;

        tracing::info!(generation = generation, mode = %mode, "Running vision analysis");
        let result = self.backend.analyze_vision(&file, mode).await;

        self.finish_action(generation, kind, result, |session, _, vision| {
            session.vision_result = Some(vision.clone());
            vision
        })
        .await
    }

    /// Strip metadata; the previous clean image handle is revoked on success.
    pub async fn remove_metadata(&self, mode: RemovalMode) -> Result<BlobHandle, ScanError> {
        if matches!(&mode, RemovalMode::Selective(fields) if fields.is_empty()) {
            return Err(ScanError::validation(
                "Select at least one metadata field to remove",
            ));
        }

        let kind = PhaseKind::Removal;
        let (generation, file) = self.begin_action(kind).await?;

        tracing::info!(generation = generation, mode = mode.as_str(), "Removing metadata");
        let result = self.backend.remove_metadata(&file, &mode).await;

        self.finish_action(generation, kind, result, |session, handles, body| {
            let fallback = mode.default_filename().to_string();
            let handle = store_binary(handles, body, fallback, &session.source_file);
            let previous = session.clean_image.replace(CleanImage {
                handle: handle.clone(),
                mode,
            });
            handles.revoke_opt(previous.as_ref().map(|c| &c.handle));
            handle
        })
        .await
    }

    /// Blur detected content; never touches the clean image.
    pub async fn blur_content(&self, request: BlurRequest) -> Result<BlobHandle, ScanError> {
        let kind = PhaseKind::Blur;
        let (generation, file) = self.begin_action(kind).await?;

        tracing::info!(
            generation = generation,
            content_type = request.target.as_str(),
            intensity = %request.intensity,
            "Blurring content"
        );
        let result = self.backend.blur_content(&file, &request).await;

        self.finish_action(generation, kind, result, |session, handles, body| {
            let fallback = format!("blurred_{}", session.source_file.file_name);
            let handle = store_binary(handles, body, fallback, &session.source_file);
            let previous = session.blurred_image.replace(BlurredImage {
                handle: handle.clone(),
                request,
            });
            handles.revoke_opt(previous.as_ref().map(|b| &b.handle));
            handle
        })
        .await
    }

    /// Fetch a data URL preview of a blur. Custom regions cannot be previewed.
    pub async fn preview_blur(&self, request: BlurRequest) -> Result<String, ScanError> {
        if matches!(request.target, BlurTarget::Custom(_)) {
            return Err(ScanError::validation(
                "Custom regions cannot be previewed",
            ));
        }

        let kind = PhaseKind::BlurPreview;
        let (generation, file) = self.begin_action(kind).await?;

        tracing::info!(generation = generation, content_type = request.target.as_str(), "Previewing blur");
        let result = self.backend.blur_preview(&file, &request).await;

        self.finish_action(generation, kind, result, |session, _, preview| {
            session.blur_preview = Some(preview.clone());
            preview
        })
        .await
    }

    /// Run the backend's text privacy filter over the image.
    pub async fn apply_privacy_filter(&self) -> Result<BlobHandle, ScanError> {
        let kind = PhaseKind::PrivacyFilter;
        let (generation, file) = self.begin_action(kind).await?;

        tracing::info!(generation = generation, "Applying privacy filter");
        let result = self.backend.privacy_filter(&file).await;

        self.finish_action(generation, kind, result, |session, handles, body| {
            let fallback = format!("processed_{}", session.source_file.file_name);
            let handle = store_binary(handles, body, fallback, &session.source_file);
            let previous = session.filtered_image.replace(handle.clone());
            handles.revoke_opt(previous.as_ref());
            handle
        })
        .await
    }

    async fn begin_action(&self, kind: PhaseKind) -> Result<(Generation, SourceFile), ScanError> {
        let mut state = self.state.lock().await;
        let session = state.session.as_mut().ok_or(ScanError::NoSession)?;

        if session.phase != Phase::Ready {
            return Err(ScanError::InvalidTransition {
                action: kind,
                phase: session.phase,
            });
        }
        if session.in_flight.get(kind) {
            return Err(ScanError::AlreadyInFlight(kind));
        }

        session.in_flight.set(kind, true);
        session.clear_error_for(kind);
        Ok((session.generation, session.source_file.clone()))
    }

    /// Clear the action's flag, then store `result` or record the failure.
    async fn finish_action<T, R>(
        &self,
        generation: Generation,
        kind: PhaseKind,
        result: Result<T, overshare_core::TransportError>,
        on_success: impl FnOnce(&mut ScanSession, &mut HandleRegistry, T) -> R,
    ) -> Result<R, ScanError> {
        self.apply_current(generation, kind, |session, handles| {
            session.in_flight.set(kind, false);
            match result {
                Ok(value) => {
                    tracing::info!(generation = generation, phase = %kind, "Action complete");
                    Ok(on_success(session, handles, value))
                }
                Err(source) => {
                    let err = ScanError::transport(kind, source);
                    session.record_error(kind, &err);
                    Err(err)
                }
            }
        })
        .await?
        .map_err(log_scan_error)
    }

    /// Apply `f` only if `generation` is still the live session.
    async fn apply_current<R>(
        &self,
        generation: Generation,
        kind: PhaseKind,
        f: impl FnOnce(&mut ScanSession, &mut HandleRegistry) -> R,
    ) -> Result<R, ScanError> {
        let mut state = self.state.lock().await;
        let ControllerState {
            session, handles, ..
        } = &mut *state;

        match session {
            Some(session) if session.generation == generation => Ok(f(session, handles)),
            _ => {
                tracing::debug!(generation = generation, phase = %kind, "Discarding stale response");
                Err(ScanError::Superseded(kind))
            }
        }
    }

    /// Clone of the current session, `None` when idle.
    pub async fn snapshot(&self) -> Option<ScanSession> {
        self.state.lock().await.session.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.state
            .lock()
            .await
            .session
            .as_ref()
            .map_or(Phase::Idle, |s| s.phase)
    }

    pub async fn generation(&self) -> Generation {
        self.state.lock().await.generation
    }

    /// Project the current session with the configured safe-share policy.
    pub async fn view(&self) -> ViewState {
        let state = self.state.lock().await;
        view::project(state.session.as_ref(), self.config.safe_share_policy)
    }

    /// Bytes behind a live handle.
    pub async fn resolve(&self, handle: &BlobHandle) -> Option<Bytes> {
        self.state.lock().await.handles.resolve(handle)
    }

    pub async fn live_handle_count(&self) -> usize {
        self.state.lock().await.handles.live_count()
    }
}

/// Move to the pipeline phase that follows `kind`.
fn advance(session: &mut ScanSession, kind: PhaseKind) {
    if let Some(next) = Phase::after(kind) {
        session.phase = next;
    }
}

fn store_binary(
    handles: &mut HandleRegistry,
    body: BinaryBody,
    fallback_name: String,
    source: &SourceFile,
) -> BlobHandle {
    let content_type = body.content_type.or_else(|| source.content_type.clone());
    handles.create(
        body.bytes,
        Some(body.filename.unwrap_or(fallback_name)),
        content_type,
    )
}

fn log_scan_error(error: ScanError) -> ScanError {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code = code, "Scan step failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code = code, "Scan step failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code = code, "Scan step failed");
        }
    }
    error
}
