// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// BatchController — many documents in one sitting.
//
// Wraps a CaptureStateMachine in batch mode and counts saved documents.
// Skipped or cancelled documents are never counted.

use std::cell::Cell;

use belegwerk_bridge::traits::NativeCamera;
use belegwerk_core::error::Result;
use belegwerk_core::types::{CaptureState, RecordId};
use belegwerk_extract::RecognitionService;
use belegwerk_store::RecordStore;
use tracing::{info, warn};

use crate::machine::CaptureStateMachine;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSessionState {
    pub active: bool,
    pub processed_count: u32,
}

/// What a finished batch achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed_count: u32,
}

pub struct BatchController<C: NativeCamera, R: RecognitionService, S: RecordStore> {
    machine: CaptureStateMachine<C, R, S>,
    state: Cell<BatchSessionState>,
}

impl<C: NativeCamera, R: RecognitionService, S: RecordStore> BatchController<C, R, S> {
    pub fn new(machine: CaptureStateMachine<C, R, S>) -> Self {
        Self {
            machine,
            state: Cell::new(BatchSessionState::default()),
        }
    }

    pub fn machine(&self) -> &CaptureStateMachine<C, R, S> {
        &self.machine
    }

    pub fn state(&self) -> BatchSessionState {
        self.state.get()
    }

    /// Begin counting. Any previous count is discarded.
    pub fn start(&mut self) {
        self.state.set(BatchSessionState {
            active: true,
            processed_count: 0,
        });
        self.machine.set_batch_mode(true);
        info!("batch started");
    }

    /// Save the current document and move on to the next one.
    ///
    /// The record id is returned even if continuing fails; the failure shows
    /// up in the machine's snapshot instead. A save overtaken by `cancel` or a
    /// new document is not counted.
    pub async fn confirm(&self) -> Result<RecordId> {
        let id = self.machine.confirm().await?;
        let mut state = self.state.get();
        if state.active {
            state.processed_count += 1;
            self.state.set(state);
            info!(processed = state.processed_count, "batch document saved");
        }
        self.continue_batch().await;
        Ok(id)
    }

    /// Discard the current document and move on.
    pub async fn skip(&self) -> Result<()> {
        self.machine.skip()?;
        self.continue_batch().await;
        Ok(())
    }

    /// Leave `BatchContinuing`: reopen the camera when `auto_restart` is set,
    /// otherwise wait in `Idle` for the user.
    pub async fn next(&self) -> Result<()> {
        if self.machine.state() != CaptureState::BatchContinuing {
            return Ok(());
        }
        if self.machine.capture_config().auto_restart {
            self.machine.start_camera().await
        } else {
            self.machine.resume()
        }
    }

    async fn continue_batch(&self) {
        if let Err(err) = self.next().await {
            warn!(error = %err, "could not continue batch");
        }
    }

    /// End the batch, releasing the camera and resetting the count.
    pub fn finish(&mut self) -> BatchSummary {
        self.machine.cancel();
        self.machine.set_batch_mode(false);
        let summary = BatchSummary {
            processed_count: self.state.get().processed_count,
        };
        info!(processed = summary.processed_count, "batch finished");
        self.state.set(BatchSessionState::default());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use belegwerk_bridge::MockCamera;
    use belegwerk_core::types::{ExtractionResult, RecordStatus};
    use belegwerk_extract::RecognitionResponse;
    use serde_json::json;

    use std::rc::Rc;

    use belegwerk_core::error::BelegwerkError;
    use tokio::sync::Notify;

    use crate::editor::{ConfirmationEditor, DraftField};
    use crate::fakes::{MemoryStore, ScriptedRecognizer, config, machine, pdf, wait_until};

    #[tokio::test]
    async fn camera_receipt_in_a_batch() {
        let camera = MockCamera::new(1600, 1200);
        let recognizer = ScriptedRecognizer::new().reply(RecognitionResponse::ok(
            json!({ "transaction_type": "receipt", "amount": 150.0 }),
        ));
        let mut batch = BatchController::new(machine(camera.clone(), recognizer));
        batch.start();
        assert_eq!(batch.state().processed_count, 0);

        batch.machine().start_camera().await.expect("start");
        batch.machine().capture().await.expect("capture");
        let snap = batch.machine().snapshot();
        let draft = snap.draft.expect("draft");
        let ExtractionResult::Financial(fields) = &draft.fields else {
            panic!("financial draft expected");
        };
        assert_eq!(fields.amount, Some(150.0));
        assert_eq!(draft.status, RecordStatus::Completed);
        let editor = ConfirmationEditor::new(draft.fields.clone(), draft.period, draft.status);
        assert_eq!(editor.display(DraftField::Amount), "150.00");

        let sent = batch.machine().recognizer().last_image().expect("image sent");
        let decoded = image::load_from_memory(&sent.bytes).expect("decode sent image");
        assert!(decoded.width() <= 1200);

        batch.confirm().await.expect("confirm");
        assert_eq!(batch.state().processed_count, 1);
        assert_eq!(batch.machine().state(), CaptureState::Idle);
        assert!(!camera.is_active());

        let records = batch.machine().store().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Completed);
    }

    #[tokio::test]
    async fn saves_are_counted_and_skips_are_not() {
        let mut batch =
            BatchController::new(machine(MockCamera::default(), ScriptedRecognizer::new()));
        batch.start();

        for n in 0..3 {
            batch
                .machine()
                .select_file(pdf(&format!("slip-{n}.pdf")))
                .await
                .expect("select");
            batch
                .machine()
                .edit(DraftField::TransactionType, "payment")
                .expect("edit");
            batch.confirm().await.expect("confirm");
        }

        batch.machine().select_file(pdf("junk.pdf")).await.expect("select");
        batch.skip().await.expect("skip");
        assert_eq!(batch.machine().state(), CaptureState::Idle);

        assert_eq!(batch.state().processed_count, 3);
        assert_eq!(batch.machine().store().inserted(), 3);

        let summary = batch.finish();
        assert_eq!(summary.processed_count, 3);
        assert_eq!(batch.state(), BatchSessionState::default());
        assert!(!batch.machine().batch_mode());
    }

    #[tokio::test]
    async fn failed_save_is_not_counted() {
        let mut batch =
            BatchController::new(machine(MockCamera::default(), ScriptedRecognizer::new()));
        batch.start();
        batch.machine().select_file(pdf("a.pdf")).await.expect("select");
        batch
            .machine()
            .edit(DraftField::TransactionType, "receipt")
            .expect("edit");

        batch.machine().store().fail_next_insert();
        assert!(batch.confirm().await.is_err());
        assert_eq!(batch.state().processed_count, 0);
        assert_eq!(batch.machine().state(), CaptureState::ReviewExtracted);

        batch.confirm().await.expect("retry");
        assert_eq!(batch.state().processed_count, 1);
    }

    #[tokio::test]
    async fn superseded_save_is_not_counted() {
        let gate = Rc::new(Notify::new());
        let mut batch =
            BatchController::new(machine(MockCamera::default(), ScriptedRecognizer::new()));
        batch.start();
        batch.machine().store().hold_inserts(gate.clone());
        batch.machine().select_file(pdf("a.pdf")).await.expect("select");
        batch
            .machine()
            .edit(DraftField::TransactionType, "receipt")
            .expect("edit");

        let (stale, ()) = tokio::join!(batch.confirm(), async {
            wait_until(|| batch.machine().store().insert_calls() == 1).await;
            batch.machine().cancel();
            batch.machine().select_file(pdf("b.pdf")).await.expect("new document");
            gate.notify_one();
        });
        assert!(matches!(stale, Err(BelegwerkError::Superseded)));
        assert_eq!(batch.state().processed_count, 0);

        let snap = batch.machine().snapshot();
        assert_eq!(snap.state, CaptureState::ReviewExtracted);
        assert!(snap.draft.expect("draft").fields.is_empty());

        assert_eq!(batch.finish().processed_count, 0);
    }

    #[tokio::test]
    async fn auto_restart_reopens_the_camera() {
        let mut cfg = config();
        cfg.capture.auto_restart = true;
        let camera = MockCamera::new(64, 48);
        let m = CaptureStateMachine::new(
            camera.clone(),
            ScriptedRecognizer::new(),
            MemoryStore::default(),
            &cfg,
        )
        .expect("machine");
        let mut batch = BatchController::new(m);
        batch.start();

        batch.machine().select_file(pdf("a.pdf")).await.expect("select");
        batch
            .machine()
            .edit(DraftField::TransactionType, "receipt")
            .expect("edit");
        batch.confirm().await.expect("confirm");

        assert_eq!(batch.machine().state(), CaptureState::CameraLive);
        assert!(camera.is_active());

        batch.finish();
        assert!(!camera.is_active());
        assert_eq!(batch.machine().state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn finishing_mid_document_discards_it() {
        let mut batch =
            BatchController::new(machine(MockCamera::default(), ScriptedRecognizer::new()));
        batch.start();
        batch.machine().select_file(pdf("a.pdf")).await.expect("select");

        let summary = batch.finish();
        assert_eq!(summary.processed_count, 0);
        assert!(batch.machine().snapshot().draft.is_none());
        assert_eq!(batch.machine().store().inserted(), 0);
    }
}
