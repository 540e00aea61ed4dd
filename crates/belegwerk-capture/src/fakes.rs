// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scriptable collaborators for capture tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use belegwerk_bridge::MockCamera;
use belegwerk_bridge::traits::{DeviceError, NativeCamera, StreamToken};
use belegwerk_core::config::AppConfig;
use belegwerk_core::error::{BelegwerkError, Result};
use belegwerk_core::types::{CameraConstraints, MediaAsset, NewRecord, RawImage, RecordId};
use belegwerk_document::SelectedFile;
use belegwerk_extract::{EncodedImage, RecognitionResponse, RecognitionService};
use belegwerk_store::RecordStore;
use tokio::sync::Notify;

use crate::machine::CaptureStateMachine;

/// Replies from a queue. `None` entries simulate a transport failure; an
/// empty queue answers with an unsuccessful response.
#[derive(Default)]
pub struct ScriptedRecognizer {
    replies: RefCell<VecDeque<Option<RecognitionResponse>>>,
    calls: Cell<u32>,
    last_image: RefCell<Option<EncodedImage>>,
    gate: Option<Rc<Notify>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, response: RecognitionResponse) -> Self {
        self.replies.borrow_mut().push_back(Some(response));
        self
    }

    pub fn transport_failure(self) -> Self {
        self.replies.borrow_mut().push_back(None);
        self
    }

    /// Hold every call until `gate` is notified.
    pub fn gated(mut self, gate: Rc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn last_image(&self) -> Option<EncodedImage> {
        self.last_image.borrow().clone()
    }
}

impl RecognitionService for ScriptedRecognizer {
    async fn recognize(&self, image: &EncodedImage) -> Result<RecognitionResponse> {
        self.calls.set(self.calls.get() + 1);
        *self.last_image.borrow_mut() = Some(image.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.replies.borrow_mut().pop_front();
        match next {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(BelegwerkError::Extraction("connection reset".into())),
            None => Ok(RecognitionResponse::failed("nothing recognised")),
        }
    }
}

/// Records kept in memory, with switchable failures and optional gates that
/// hold uploads or inserts until notified.
#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<Vec<NewRecord>>,
    failing_inserts: Cell<u32>,
    failing_uploads: Cell<bool>,
    uploads: Cell<u32>,
    insert_calls: Cell<u32>,
    upload_gate: RefCell<Option<Rc<Notify>>>,
    insert_gate: RefCell<Option<Rc<Notify>>>,
}

impl MemoryStore {
    pub fn fail_next_insert(&self) {
        self.failing_inserts.set(self.failing_inserts.get() + 1);
    }

    pub fn fail_uploads(&self) {
        self.failing_uploads.set(true);
    }

    pub fn hold_uploads(&self, gate: Rc<Notify>) {
        *self.upload_gate.borrow_mut() = Some(gate);
    }

    pub fn hold_inserts(&self, gate: Rc<Notify>) {
        *self.insert_gate.borrow_mut() = Some(gate);
    }

    /// Number of `insert` calls that have begun.
    pub fn insert_calls(&self) -> u32 {
        self.insert_calls.get()
    }

    pub fn inserted(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn uploads(&self) -> u32 {
        self.uploads.get()
    }

    pub fn records(&self) -> Vec<NewRecord> {
        self.records.borrow().clone()
    }
}

impl RecordStore for MemoryStore {
    async fn insert(&self, record: &NewRecord) -> Result<RecordId> {
        self.insert_calls.set(self.insert_calls.get() + 1);
        let gate = self.insert_gate.borrow().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing_inserts.get() > 0 {
            self.failing_inserts.set(self.failing_inserts.get() - 1);
            return Err(BelegwerkError::Persistence("database is locked".into()));
        }
        self.records.borrow_mut().push(record.clone());
        Ok(RecordId::new())
    }

    async fn upload_original(&self, media: &MediaAsset) -> Result<Option<String>> {
        self.uploads.set(self.uploads.get() + 1);
        let gate = self.upload_gate.borrow().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing_uploads.get() {
            return Err(BelegwerkError::Upload("bucket unavailable".into()));
        }
        Ok(Some(format!(
            "memory://originals/{}-{}",
            self.uploads.get(),
            media.size()
        )))
    }
}

/// A camera whose `open_stream` waits for a notification, so a session can
/// be cancelled mid-acquisition.
pub struct GatedCamera {
    inner: MockCamera,
    gate: Rc<Notify>,
    started: Cell<u32>,
}

impl GatedCamera {
    pub fn new(inner: MockCamera, gate: Rc<Notify>) -> Self {
        Self {
            inner,
            gate,
            started: Cell::new(0),
        }
    }

    pub fn inner(&self) -> &MockCamera {
        &self.inner
    }

    /// Number of `open_stream` calls that have begun.
    pub fn started(&self) -> u32 {
        self.started.get()
    }
}

impl NativeCamera for GatedCamera {
    async fn open_stream(
        &self,
        constraints: &CameraConstraints,
    ) -> std::result::Result<StreamToken, DeviceError> {
        self.started.set(self.started.get() + 1);
        self.gate.notified().await;
        self.inner.open_stream(constraints).await
    }

    fn grab_frame(&self, stream: StreamToken) -> std::result::Result<RawImage, DeviceError> {
        self.inner.grab_frame(stream)
    }

    fn stop_stream(&self, stream: StreamToken) {
        self.inner.stop_stream(stream);
    }
}

pub fn config() -> AppConfig {
    AppConfig::default()
}

pub fn machine<C: NativeCamera>(
    camera: C,
    recognizer: ScriptedRecognizer,
) -> CaptureStateMachine<C, ScriptedRecognizer, MemoryStore> {
    CaptureStateMachine::new(camera, recognizer, MemoryStore::default(), &config())
        .expect("default config is valid")
}

pub fn pdf(name: &str) -> SelectedFile {
    SelectedFile::new(name, b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n".to_vec())
}

pub fn png(name: &str, width: u32, height: u32) -> SelectedFile {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 180, 160, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    SelectedFile::new(name, out.into_inner())
}

/// Poll `condition` until it holds, yielding to the runtime in between.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
