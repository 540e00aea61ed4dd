// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// belegwerk-store — Where confirmed records and their original media end up.
//
// The capture pipeline only sees the `RecordStore` trait. `LocalStore` is the
// reference implementation: records in SQLite, originals in a
// content-addressed directory.

pub mod integrity;
pub mod media;
pub mod records;
pub mod store;

pub use media::{MediaArchive, StoredMedia};
pub use records::{SqliteRecordStore, StoredRecord};
pub use store::{LocalStore, RecordStore};
