// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Belegwerk capture pipeline.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which family of documents a session captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentDomain {
    /// Receipts, payment slips and invoices.
    Financial,
    /// Clinic billing and price sheets.
    Billing,
}

impl DocumentDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Billing => "billing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "financial" => Some(Self::Financial),
            "billing" => Some(Self::Billing),
            _ => None,
        }
    }
}

/// Where a media asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaOrigin {
    Camera,
    File,
}

/// Whether a media asset goes through preprocessing and recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    /// PDF, Word, Excel. Entered manually, never sent for recognition.
    Document,
}

/// Raw or preprocessed bytes captured during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub origin: MediaOrigin,
    /// Original file name, if the asset was picked from storage.
    pub name: Option<String>,
}

impl MediaAsset {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, origin: MediaOrigin) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            origin,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A still frame grabbed from a live camera stream, RGBA8 at native resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Preferred side of the device for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed at the document.
    Environment,
    User,
    Any,
}

/// Camera constraints. Every field is a hint, never a hard requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
}

impl CameraConstraints {
    /// The loosest constraints a device can be asked for.
    pub fn relaxed() -> Self {
        Self {
            facing: FacingMode::Any,
            ideal_width: None,
            ideal_height: None,
        }
    }
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: Some(1920),
            ideal_height: Some(1080),
        }
    }
}

/// States of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureState {
    Idle,
    CameraLive,
    Preprocessing,
    Extracting,
    ReviewExtracted,
    Saving,
    BatchContinuing,
}

impl CaptureState {
    /// States in which a document is being worked on and new input is refused.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Preprocessing | Self::Extracting | Self::Saving)
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CameraLive => "camera live",
            Self::Preprocessing => "preprocessing",
            Self::Extracting => "extracting",
            Self::ReviewExtracted => "reviewing",
            Self::Saving => "saving",
            Self::BatchContinuing => "continuing batch",
        };
        f.write_str(name)
    }
}

/// Direction of a financial transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Receipt,
    Payment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Payment => "payment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "receipt" => Some(Self::Receipt),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }
}

/// Fields recognised on receipts, invoices and payment slips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialFields {
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub vendor_name: Option<String>,
    pub document_number: Option<String>,
    pub date: Option<String>,
    pub raw_text: Option<String>,
}

/// Fields recognised on clinic billing sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingFields {
    pub clinic_name: Option<String>,
    pub patient_name: Option<String>,
    pub service_name: Option<String>,
    pub service_value: Option<f64>,
}

/// Advisory field set returned by recognition, one variant per domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum ExtractionResult {
    Financial(FinancialFields),
    Billing(BillingFields),
}

impl ExtractionResult {
    /// All-null result for the given domain.
    pub fn empty(domain: DocumentDomain) -> Self {
        match domain {
            DocumentDomain::Financial => Self::Financial(FinancialFields::default()),
            DocumentDomain::Billing => Self::Billing(BillingFields::default()),
        }
    }

    pub fn domain(&self) -> DocumentDomain {
        match self {
            Self::Financial(_) => DocumentDomain::Financial,
            Self::Billing(_) => DocumentDomain::Billing,
        }
    }

    /// Whether every field is null.
    pub fn is_empty(&self) -> bool {
        *self == Self::empty(self.domain())
    }

    /// Whether the key fields a reviewer needs are all present.
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Financial(f) => {
                f.transaction_type.is_some() && f.amount.is_some() && f.date.is_some()
            }
            Self::Billing(b) => {
                b.clinic_name.is_some()
                    && b.patient_name.is_some()
                    && b.service_name.is_some()
                    && b.service_value.is_some()
            }
        }
    }
}

/// Month a record is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetPeriod {
    pub year: i32,
    pub month: u32,
}

impl TargetPeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The current UTC month.
    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(value: &str) -> Option<Self> {
        let (year, month) = value.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }
}

impl std::fmt::Display for TargetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Workflow status stored with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Completed,
    Pending,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Immutable record handed to the persistence collaborator on commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub fields: ExtractionResult,
    pub period: TargetPeriod,
    pub status: RecordStatus,
    /// Where the original media was uploaded, if it was.
    pub original_url: Option<String>,
    /// SHA-256 of the committed media, if any.
    pub media_hash: Option<String>,
}
