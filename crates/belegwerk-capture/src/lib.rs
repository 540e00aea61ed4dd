// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// belegwerk-capture — The per-document capture lifecycle and batch sessions.
//
// `CaptureStateMachine` drives one document at a time from camera or file
// through preprocessing, extraction and review to a saved record.
// `BatchController` loops it for many documents in one sitting.

pub mod batch;
pub mod editor;
pub mod machine;
pub mod session;

#[cfg(test)]
mod fakes;

pub use batch::{BatchController, BatchSessionState, BatchSummary};
pub use editor::{ConfirmationEditor, Draft, DraftField, EditOutcome};
pub use machine::CaptureStateMachine;
pub use session::{ExtractionNote, SessionSnapshot};
