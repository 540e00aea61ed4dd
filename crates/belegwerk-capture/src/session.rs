// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session data and the read-only snapshot handed to callers.

use belegwerk_bridge::StreamHandle;
use belegwerk_core::types::{CaptureState, MediaAsset};
use belegwerk_extract::ExtractionOutcome;

use crate::editor::{ConfirmationEditor, Draft};

/// How the current draft came about. Presentation only: every variant leads
/// to the same review step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionNote {
    /// Non-image document, or nothing captured yet.
    NotAttempted,
    Complete,
    Partial,
    Failed(String),
}

impl From<&ExtractionOutcome> for ExtractionNote {
    fn from(outcome: &ExtractionOutcome) -> Self {
        match outcome {
            ExtractionOutcome::Success(_) => Self::Complete,
            ExtractionOutcome::PartialSuccess(_) => Self::Partial,
            ExtractionOutcome::Failure(reason) => Self::Failed(reason.clone()),
        }
    }
}

/// Point-in-time view of a capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: CaptureState,
    pub generation: u64,
    pub draft: Option<Draft>,
    pub extraction: ExtractionNote,
    pub can_commit: bool,
    /// Offer camera troubleshooting help.
    pub help_available: bool,
    pub last_error: Option<String>,
    pub stream_open: bool,
    pub batch_mode: bool,
}

/// One document's journey. Owned by the state machine; the camera stream
/// lives here and nowhere else.
pub(crate) struct CaptureSession {
    pub state: CaptureState,
    /// Bumped on every new document and every cancel. Completions carrying an
    /// older value are discarded.
    pub generation: u64,
    /// Generation of an in-flight camera acquisition, if any. Survives
    /// `cancel`; only the acquisition itself clears it.
    pub acquiring: Option<u64>,
    pub stream: Option<StreamHandle>,
    pub media: Option<MediaAsset>,
    pub editor: Option<ConfirmationEditor>,
    pub extraction: ExtractionNote,
    pub help_available: bool,
    pub last_error: Option<String>,
    pub batch_mode: bool,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            generation: 0,
            acquiring: None,
            stream: None,
            media: None,
            editor: None,
            extraction: ExtractionNote::NotAttempted,
            help_available: false,
            last_error: None,
            batch_mode: false,
        }
    }

    /// Start a new generation, dropping the previous document. A pending
    /// camera acquisition stays marked until it resolves.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.media = None;
        self.editor = None;
        self.extraction = ExtractionNote::NotAttempted;
        self.help_available = false;
        self.last_error = None;
        self.generation
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            generation: self.generation,
            draft: self.editor.as_ref().map(|e| e.draft().clone()),
            extraction: self.extraction.clone(),
            can_commit: self.editor.as_ref().is_some_and(ConfirmationEditor::can_commit),
            help_available: self.help_available,
            last_error: self.last_error.clone(),
            stream_open: self.stream.as_ref().is_some_and(StreamHandle::is_open),
            batch_mode: self.batch_mode,
        }
    }
}
