// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-addressed archive for original media. Files are named by their
// SHA-256, so the same photo uploaded twice is written once.

use std::fs;
use std::path::{Path, PathBuf};

use belegwerk_core::error::Result;
use tracing::{debug, info, instrument};

use crate::integrity::{hash_bytes, verify_hash};

/// Where an original ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub hash: String,
    pub path: PathBuf,
    pub url: String,
}

/// Directory of originals keyed by content hash.
#[derive(Debug, Clone)]
pub struct MediaArchive {
    root: PathBuf,
}

impl MediaArchive {
    /// Open the archive at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        let root = fs::canonicalize(root.as_ref())?;
        debug!(root = %root.display(), "media archive opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` unless an identical file already exists.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn store(&self, bytes: &[u8], mime: &str) -> Result<StoredMedia> {
        let hash = hash_bytes(bytes);
        let path = self.path_for(&hash, mime);
        if path.exists() {
            debug!(%hash, "original already archived");
        } else {
            // A truncated file must never appear under its final name.
            let partial = path.with_extension("partial");
            fs::write(&partial, bytes)?;
            fs::rename(&partial, &path)?;
            info!(%hash, path = %path.display(), "original archived");
        }

        Ok(StoredMedia {
            url: format!("file://{}", path.display()),
            hash,
            path,
        })
    }

    /// Read an archived original back, checking it against its hash.
    pub fn load(&self, hash: &str, mime: &str) -> Result<Vec<u8>> {
        let bytes = fs::read(self.path_for(hash, mime))?;
        verify_hash(&bytes, hash)?;
        Ok(bytes)
    }

    fn path_for(&self, hash: &str, mime: &str) -> PathBuf {
        self.root.join(format!("{hash}.{}", extension_for(mime)))
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use belegwerk_core::error::BelegwerkError;

    #[test]
    fn identical_media_is_written_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = MediaArchive::open(dir.path().join("originals")).expect("open");

        let first = archive.store(b"photo bytes", "image/jpeg").expect("store");
        let second = archive.store(b"photo bytes", "image/jpeg").expect("store again");
        assert_eq!(first, second);
        assert!(first.url.starts_with("file://"));
        assert!(first.path.ends_with(format!("{}.jpg", first.hash)));

        let files = fs::read_dir(archive.root()).expect("read_dir").count();
        assert_eq!(files, 1);
        assert_eq!(archive.load(&first.hash, "image/jpeg").expect("load"), b"photo bytes");
    }

    #[test]
    fn tampered_media_fails_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = MediaArchive::open(dir.path()).expect("open");
        let stored = archive.store(b"%PDF-1.7", "application/pdf").expect("store");

        fs::write(&stored.path, b"%PDF-1.7 edited").expect("tamper");
        assert!(matches!(
            archive.load(&stored.hash, "application/pdf"),
            Err(BelegwerkError::IntegrityMismatch { .. })
        ));
    }
}
