// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CaptureStateMachine — one document at a time, from camera or file to a
// saved record.
//
//   Idle ──start_camera──▶ CameraLive ──capture──▶ Preprocessing
//   Idle ──select_file(image)──▶ Preprocessing ──▶ Extracting ──▶ ReviewExtracted
//   Idle ──select_file(doc)──▶ ReviewExtracted
//   ReviewExtracted ──confirm──▶ Saving ──ok──▶ Idle | BatchContinuing
//                                       └─err─▶ ReviewExtracted
//   ReviewExtracted ──skip (batch)──▶ BatchContinuing
//   any ──cancel──▶ Idle
//
// The session mutex is never held across an `.await`. Each suspension point
// re-checks the session generation afterwards and gives up with
// `Superseded` if the user has moved on.

use std::sync::{Mutex, MutexGuard, PoisonError};

use belegwerk_bridge::CameraResourceManager;
use belegwerk_bridge::traits::NativeCamera;
use belegwerk_core::config::{AppConfig, CaptureConfig};
use belegwerk_core::error::{BelegwerkError, Result};
use belegwerk_core::human_errors::humanize_error;
use belegwerk_core::types::{
    CaptureState, DocumentDomain, MediaAsset, MediaKind, MediaOrigin, RecordId, RecordStatus,
    TargetPeriod,
};
use belegwerk_document::intake::{self, SelectedFile};
use belegwerk_document::{CompressedImage, ImagePreprocessor};
use belegwerk_extract::{EncodedImage, ExtractionClient, RecognitionService};
use belegwerk_store::RecordStore;
use belegwerk_store::integrity::hash_bytes;
use tracing::{debug, info, instrument, warn};

use crate::editor::{ConfirmationEditor, DraftField, EditOutcome};
use crate::session::{CaptureSession, ExtractionNote, SessionSnapshot};

/// Orchestrates camera, preprocessing, extraction, review and save for a
/// single capture session.
pub struct CaptureStateMachine<C: NativeCamera, R: RecognitionService, S: RecordStore> {
    camera: CameraResourceManager<C>,
    extractor: ExtractionClient<R>,
    store: S,
    preprocessor: ImagePreprocessor,
    capture: CaptureConfig,
    default_status: RecordStatus,
    session: Mutex<CaptureSession>,
}

impl<C: NativeCamera, R: RecognitionService, S: RecordStore> CaptureStateMachine<C, R, S> {
    pub fn new(camera: C, recognizer: R, store: S, config: &AppConfig) -> Result<Self> {
        config.capture.validate()?;
        Ok(Self {
            camera: CameraResourceManager::new(camera),
            extractor: ExtractionClient::new(recognizer, config.domain),
            store,
            preprocessor: ImagePreprocessor::new(config.capture.max_width, config.capture.quality),
            capture: config.capture.clone(),
            default_status: config.default_status,
            session: Mutex::new(CaptureSession::new()),
        })
    }

    pub fn camera(&self) -> &CameraResourceManager<C> {
        &self.camera
    }

    pub fn recognizer(&self) -> &R {
        self.extractor.service()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn capture_config(&self) -> &CaptureConfig {
        &self.capture
    }

    pub fn domain(&self) -> DocumentDomain {
        self.extractor.domain()
    }

    fn lock(&self) -> MutexGuard<'_, CaptureSession> {
        self.session.lock().expect("capture session lock poisoned")
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn state(&self) -> CaptureState {
        self.lock().state
    }

    /// In batch mode a successful save ends in `BatchContinuing` instead of
    /// `Idle`, and `skip` is allowed.
    pub fn set_batch_mode(&self, enabled: bool) {
        self.lock().batch_mode = enabled;
    }

    pub fn batch_mode(&self) -> bool {
        self.lock().batch_mode
    }

    // -- Acquisition ---------------------------------------------------------

    /// Open the camera. A second call while live or still acquiring is
    /// refused; the device is never asked for two streams.
    #[instrument(skip(self))]
    pub async fn start_camera(&self) -> Result<()> {
        const ACTION: &str = "start the camera";
        let generation = {
            let mut s = self.lock();
            if s.acquiring.is_some() {
                return Err(BelegwerkError::InvalidTransition {
                    state: s.state,
                    action: "start the camera again before it has opened",
                });
            }
            match s.state {
                CaptureState::Idle | CaptureState::BatchContinuing => {}
                state if state.is_in_flight() => return Err(BelegwerkError::Busy(state)),
                state => return Err(BelegwerkError::InvalidTransition { state, action: ACTION }),
            }
            let generation = s.next_generation();
            s.acquiring = Some(generation);
            generation
        };

        let acquired = self.camera.acquire(&self.capture.camera).await;

        let mut s = self.lock();
        s.acquiring = None;
        if s.generation != generation {
            if let Ok(handle) = &acquired {
                self.camera.release(handle);
            }
            warn!(generation, current = s.generation, "camera start abandoned");
            return Err(BelegwerkError::Superseded);
        }

        match acquired {
            Ok(handle) => {
                s.stream = Some(handle);
                transition(&mut s, CaptureState::CameraLive);
                Ok(())
            }
            Err(camera_err) => {
                let err = BelegwerkError::from(camera_err);
                s.help_available = humanize_error(&err).help_available;
                s.last_error = Some(err.to_string());
                transition(&mut s, CaptureState::Idle);
                Err(err)
            }
        }
    }

    /// Snapshot the live frame, release the camera, then preprocess and
    /// extract.
    #[instrument(skip(self))]
    pub async fn capture(&self) -> Result<()> {
        const ACTION: &str = "capture";
        let (generation, frame) = {
            let mut s = self.lock();
            match s.state {
                CaptureState::CameraLive => {}
                state if state.is_in_flight() => return Err(BelegwerkError::Busy(state)),
                state => return Err(BelegwerkError::InvalidTransition { state, action: ACTION }),
            }
            let handle = s.stream.take().ok_or(BelegwerkError::InvalidTransition {
                state: s.state,
                action: ACTION,
            })?;

            let frame = self.camera.capture_frame(&handle);
            self.camera.release(&handle);
            match frame {
                Ok(frame) => {
                    transition(&mut s, CaptureState::Preprocessing);
                    (s.generation, frame)
                }
                Err(camera_err) => {
                    let err = BelegwerkError::from(camera_err);
                    s.last_error = Some(err.to_string());
                    transition(&mut s, CaptureState::Idle);
                    return Err(err);
                }
            }
        };

        let preprocessor = self.preprocessor;
        let compressed =
            match tokio::task::spawn_blocking(move || preprocessor.compress_frame(frame)).await {
                Ok(Ok(compressed)) => Some(compressed),
                Ok(Err(err)) => {
                    warn!(error = %err, "captured frame could not be encoded");
                    None
                }
                Err(err) => {
                    warn!(error = %err, "frame encoding task failed");
                    None
                }
            };

        match compressed {
            Some(compressed) => {
                let media = MediaAsset::new(
                    compressed.bytes.clone(),
                    compressed.mime.clone(),
                    MediaOrigin::Camera,
                );
                self.extract(generation, media, EncodedImage::new(compressed.bytes, compressed.mime))
                    .await
            }
            None => {
                let mut s = self.lock();
                ensure_current(&s, generation, "frame encoding")?;
                // Nothing to send; extraction fails without a call.
                transition(&mut s, CaptureState::Extracting);
                s.editor = Some(self.empty_editor());
                s.extraction = ExtractionNote::Failed("captured frame could not be encoded".into());
                transition(&mut s, CaptureState::ReviewExtracted);
                Ok(())
            }
        }
    }

    /// Take a picked file. Images are preprocessed and extracted; other
    /// documents go straight to review with an empty draft.
    ///
    /// The file is checked against the type whitelist and size ceiling before
    /// anything else changes. A live camera is released first.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub async fn select_file(&self, file: SelectedFile) -> Result<()> {
        const ACTION: &str = "select a file";
        let (generation, asset) = {
            let mut s = self.lock();
            match s.state {
                CaptureState::Idle | CaptureState::CameraLive | CaptureState::BatchContinuing => {}
                state if state.is_in_flight() => return Err(BelegwerkError::Busy(state)),
                state => return Err(BelegwerkError::InvalidTransition { state, action: ACTION }),
            }
            let asset = intake::preflight(file, self.domain(), self.capture.max_upload_bytes)?;

            if let Some(handle) = s.stream.take() {
                self.camera.release(&handle);
            }
            let generation = s.next_generation();

            if intake::media_kind(&asset.mime) == MediaKind::Document {
                info!(mime = %asset.mime, "document goes to manual entry");
                s.media = Some(asset);
                s.editor = Some(self.empty_editor());
                transition(&mut s, CaptureState::ReviewExtracted);
                return Ok(());
            }

            debug!(max_width = self.preprocessor.max_width(), "preprocessing picked image");
            transition(&mut s, CaptureState::Preprocessing);
            (generation, asset)
        };

        let preprocessor = self.preprocessor;
        let (bytes, mime) = (asset.bytes.clone(), asset.mime.clone());
        let compressed = tokio::task::spawn_blocking(move || preprocessor.compress(&bytes, &mime))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "preprocessing task failed, using original bytes");
                CompressedImage {
                    bytes: asset.bytes.clone(),
                    mime: asset.mime.clone(),
                    width: None,
                    height: None,
                    preprocessed: false,
                }
            });

        self.extract(generation, asset, EncodedImage::new(compressed.bytes, compressed.mime))
            .await
    }

    async fn extract(&self, generation: u64, media: MediaAsset, image: EncodedImage) -> Result<()> {
        {
            let mut s = self.lock();
            ensure_current(&s, generation, "preprocessing")?;
            s.media = Some(media);
            transition(&mut s, CaptureState::Extracting);
        }

        let outcome = self.extractor.extract(&image).await;

        let mut s = self.lock();
        ensure_current(&s, generation, "extraction")?;
        s.extraction = ExtractionNote::from(&outcome);
        s.editor = Some(ConfirmationEditor::new(
            outcome.into_result(self.domain()),
            TargetPeriod::current(),
            self.default_status,
        ));
        transition(&mut s, CaptureState::ReviewExtracted);
        Ok(())
    }

    fn empty_editor(&self) -> ConfirmationEditor {
        ConfirmationEditor::empty(self.domain(), TargetPeriod::current(), self.default_status)
    }

    // -- Review ---------------------------------------------------------------

    pub fn edit(&self, field: DraftField, value: &str) -> Result<EditOutcome> {
        let mut s = self.lock();
        review_editor(&mut s, "edit the draft")?.edit(field, value)
    }

    pub fn set_period(&self, period: TargetPeriod) -> Result<()> {
        let mut s = self.lock();
        review_editor(&mut s, "change the period")?.set_period(period);
        Ok(())
    }

    pub fn set_status(&self, status: RecordStatus) -> Result<()> {
        let mut s = self.lock();
        review_editor(&mut s, "change the status")?.set_status(status);
        Ok(())
    }

    /// Save the draft. The original is uploaded first on a best-effort basis;
    /// if the save itself fails the draft stays in review for a retry.
    #[instrument(skip(self))]
    pub async fn confirm(&self) -> Result<RecordId> {
        let (generation, mut record, media) = {
            let mut s = self.lock();
            let editor = review_editor(&mut s, "save")?;
            let record = editor.clone().commit()?;
            s.last_error = None;
            transition(&mut s, CaptureState::Saving);
            (s.generation, record, s.media.clone())
        };

        if let Some(media) = &media {
            record.media_hash = Some(hash_bytes(&media.bytes));
            if self.capture.upload_originals {
                match self.store.upload_original(media).await {
                    Ok(url) => record.original_url = url,
                    Err(err) => warn!(error = %err, "original upload failed, saving without it"),
                }
                ensure_current(&self.lock(), generation, "upload")?;
            }
        }

        let saved = self.store.insert(&record).await;

        let mut s = self.lock();
        ensure_current(&s, generation, "save")?;
        match saved {
            Ok(id) => {
                info!(record_id = %id, "record saved");
                s.editor = None;
                s.media = None;
                s.extraction = ExtractionNote::NotAttempted;
                let next = if s.batch_mode {
                    CaptureState::BatchContinuing
                } else {
                    CaptureState::Idle
                };
                transition(&mut s, next);
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "save failed, draft kept for retry");
                s.last_error = Some(err.to_string());
                transition(&mut s, CaptureState::ReviewExtracted);
                Err(err)
            }
        }
    }

    /// Drop the current document without saving. Batch mode only.
    pub fn skip(&self) -> Result<()> {
        const ACTION: &str = "skip";
        let mut s = self.lock();
        match s.state {
            CaptureState::ReviewExtracted if s.batch_mode => {}
            state if state.is_in_flight() => return Err(BelegwerkError::Busy(state)),
            state => return Err(BelegwerkError::InvalidTransition { state, action: ACTION }),
        }
        if let Some(handle) = s.stream.take() {
            self.camera.release(&handle);
        }
        s.next_generation();
        transition(&mut s, CaptureState::BatchContinuing);
        info!("document skipped");
        Ok(())
    }

    /// Return to `Idle` from any state, releasing the camera. In-flight
    /// extraction or save calls are not aborted; their results are discarded
    /// when they arrive.
    pub fn cancel(&self) {
        let mut s = self.lock();
        if let Some(handle) = s.stream.take() {
            self.camera.release(&handle);
        }
        let generation = s.next_generation();
        transition(&mut s, CaptureState::Idle);
        info!(generation, "capture cancelled");
    }

    /// Leave `BatchContinuing` and wait in `Idle` for the next user action.
    pub fn resume(&self) -> Result<()> {
        let mut s = self.lock();
        match s.state {
            CaptureState::BatchContinuing => {
                transition(&mut s, CaptureState::Idle);
                Ok(())
            }
            CaptureState::Idle => Ok(()),
            state => Err(BelegwerkError::InvalidTransition {
                state,
                action: "resume",
            }),
        }
    }
}

impl<C: NativeCamera, R: RecognitionService, S: RecordStore> Drop for CaptureStateMachine<C, R, S> {
    fn drop(&mut self) {
        let session = self.session.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = session.stream.take() {
            self.camera.release(&handle);
        }
    }
}

fn transition(session: &mut CaptureSession, to: CaptureState) {
    debug!(from = %session.state, %to, generation = session.generation, "state transition");
    session.state = to;
}

/// Fail with `Superseded` if the session has started a new generation since
/// `generation` was taken.
fn ensure_current(session: &CaptureSession, generation: u64, stage: &'static str) -> Result<()> {
    if session.generation == generation {
        Ok(())
    } else {
        warn!(stage, generation, current = session.generation, "discarding stale result");
        Err(BelegwerkError::Superseded)
    }
}

fn review_editor<'a>(
    session: &'a mut CaptureSession,
    action: &'static str,
) -> Result<&'a mut ConfirmationEditor> {
    let state = session.state;
    match state {
        CaptureState::ReviewExtracted => {}
        state if state.is_in_flight() => return Err(BelegwerkError::Busy(state)),
        state => return Err(BelegwerkError::InvalidTransition { state, action }),
    }
    session
        .editor
        .as_mut()
        .ok_or(BelegwerkError::InvalidTransition { state, action })
}
