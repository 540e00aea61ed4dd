// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File intake — MIME whitelist and size ceiling, checked before any state
// transition so a rejected file never touches the capture session.

use belegwerk_core::error::BelegwerkError;
use belegwerk_core::types::{DocumentDomain, MediaAsset, MediaKind, MediaOrigin};
use tracing::{debug, instrument};

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
const PDF: &str = "application/pdf";
const OFFICE_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// A file chosen by the user, before validation.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    /// Declared MIME type, if the picker supplied one.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// MIME types a domain accepts from the file picker.
pub fn accepted_mime_types(domain: DocumentDomain) -> Vec<&'static str> {
    let mut types: Vec<&'static str> = IMAGE_TYPES.to_vec();
    types.push(PDF);
    if domain == DocumentDomain::Billing {
        types.extend_from_slice(OFFICE_TYPES);
    }
    types
}

/// Infer a MIME type from a file name's extension.
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "pdf" => Some(PDF),
        "doc" => Some(OFFICE_TYPES[0]),
        "docx" => Some(OFFICE_TYPES[1]),
        "xls" => Some(OFFICE_TYPES[2]),
        "xlsx" => Some(OFFICE_TYPES[3]),
        _ => None,
    }
}

/// Images are preprocessed and recognised; everything else is entered by hand.
pub fn media_kind(mime: &str) -> MediaKind {
    if mime.starts_with("image/") {
        MediaKind::Image
    } else {
        MediaKind::Document
    }
}

/// Validate a picked file and turn it into a [`MediaAsset`].
#[instrument(skip(file), fields(name = %file.name, size = file.bytes.len()))]
pub fn preflight(
    file: SelectedFile,
    domain: DocumentDomain,
    max_bytes: usize,
) -> Result<MediaAsset, BelegwerkError> {
    if file.bytes.is_empty() {
        return Err(BelegwerkError::EmptyFile);
    }
    if file.bytes.len() > max_bytes {
        return Err(BelegwerkError::FileTooLarge {
            size: file.bytes.len(),
            limit: max_bytes,
        });
    }

    let mime = resolve_mime(&file)?;
    if !accepted_mime_types(domain).contains(&mime.as_str()) {
        return Err(BelegwerkError::UnsupportedDocument(mime));
    }

    debug!(%mime, "file accepted");
    Ok(MediaAsset::new(file.bytes, mime, MediaOrigin::File).with_name(file.name))
}

fn resolve_mime(file: &SelectedFile) -> Result<String, BelegwerkError> {
    let declared = file
        .mime
        .as_deref()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty() && m != "application/octet-stream");

    match declared.as_deref() {
        Some("image/jpg") => Ok("image/jpeg".to_owned()),
        Some(mime) => Ok(mime.to_owned()),
        None => mime_from_extension(&file.name)
            .map(str::to_owned)
            .ok_or_else(|| BelegwerkError::UnsupportedDocument(file.name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 10 * 1024 * 1024;

    #[test]
    fn images_and_pdf_are_accepted_for_financial() {
        let asset = preflight(
            SelectedFile::new("receipt.JPG", vec![1, 2, 3]),
            DocumentDomain::Financial,
            LIMIT,
        )
        .expect("accepted");
        assert_eq!(asset.mime, "image/jpeg");
        assert_eq!(asset.origin, MediaOrigin::File);
        assert_eq!(asset.name.as_deref(), Some("receipt.JPG"));

        let pdf = preflight(
            SelectedFile::new("invoice.pdf", vec![b'%'; 4]),
            DocumentDomain::Financial,
            LIMIT,
        )
        .expect("accepted");
        assert_eq!(media_kind(&pdf.mime), MediaKind::Document);
    }

    #[test]
    fn office_documents_only_in_billing() {
        let sheet = || SelectedFile::new("prices.xlsx", vec![0; 16]);
        assert!(matches!(
            preflight(sheet(), DocumentDomain::Financial, LIMIT),
            Err(BelegwerkError::UnsupportedDocument(_))
        ));
        let asset = preflight(sheet(), DocumentDomain::Billing, LIMIT).expect("billing accepts excel");
        assert_eq!(media_kind(&asset.mime), MediaKind::Document);
    }

    #[test]
    fn oversized_files_are_rejected_before_type_checks() {
        let file = SelectedFile::new("huge.exe", vec![0; LIMIT + 1]);
        match preflight(file, DocumentDomain::Financial, LIMIT) {
            Err(BelegwerkError::FileTooLarge { size, limit }) => {
                assert_eq!(size, LIMIT + 1);
                assert_eq!(limit, LIMIT);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn declared_mime_wins_over_extension() {
        let file = SelectedFile::new("scan", vec![1]).with_mime("image/jpg");
        let asset = preflight(file, DocumentDomain::Financial, LIMIT).expect("accepted");
        assert_eq!(asset.mime, "image/jpeg");

        let generic = SelectedFile::new("scan.png", vec![1]).with_mime("application/octet-stream");
        let asset = preflight(generic, DocumentDomain::Financial, LIMIT).expect("accepted");
        assert_eq!(asset.mime, "image/png");
    }

    #[test]
    fn empty_and_unknown_files_are_rejected() {
        assert!(matches!(
            preflight(SelectedFile::new("a.png", vec![]), DocumentDomain::Financial, LIMIT),
            Err(BelegwerkError::EmptyFile)
        ));
        assert!(matches!(
            preflight(SelectedFile::new("notes.txt", vec![1]), DocumentDomain::Billing, LIMIT),
            Err(BelegwerkError::UnsupportedDocument(_))
        ));
    }
}
