// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistence seam used by the capture pipeline.

use std::future::Future;

use belegwerk_core::error::Result;
use belegwerk_core::types::{MediaAsset, NewRecord, RecordId};
use tracing::instrument;

use crate::media::MediaArchive;
use crate::records::SqliteRecordStore;

/// Receives committed records and their originals.
pub trait RecordStore {
    /// Persist a committed record.
    fn insert(&self, record: &NewRecord) -> impl Future<Output = Result<RecordId>>;

    /// Keep the original media and return where it can be found, or `None`
    /// if this store does not keep originals. Callers treat an error here as
    /// non-fatal: the record is saved without the original.
    fn upload_original(&self, media: &MediaAsset) -> impl Future<Output = Result<Option<String>>>;
}

/// SQLite records plus an optional on-disk media archive.
pub struct LocalStore {
    records: SqliteRecordStore,
    media: Option<MediaArchive>,
}

impl LocalStore {
    pub fn new(records: SqliteRecordStore, media: Option<MediaArchive>) -> Self {
        Self { records, media }
    }

    pub fn records(&self) -> &SqliteRecordStore {
        &self.records
    }

    pub fn media(&self) -> Option<&MediaArchive> {
        self.media.as_ref()
    }
}

impl RecordStore for LocalStore {
    async fn insert(&self, record: &NewRecord) -> Result<RecordId> {
        self.records.insert(record)
    }

    #[instrument(skip_all, fields(mime = %media.mime, bytes = media.size()))]
    async fn upload_original(&self, media: &MediaAsset) -> Result<Option<String>> {
        match &self.media {
            Some(archive) => Ok(Some(archive.store(&media.bytes, &media.mime)?.url)),
            None => Ok(None),
        }
    }
}
