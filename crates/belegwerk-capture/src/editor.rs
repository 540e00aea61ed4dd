// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ConfirmationEditor — the mutable draft between extraction and commit.

use belegwerk_core::error::{BelegwerkError, Result};
use belegwerk_core::types::{
    DocumentDomain, ExtractionResult, NewRecord, RecordStatus, TargetPeriod, TransactionType,
};
use belegwerk_extract::normalize::parse_decimal;
use tracing::debug;

/// Every editable field across both document families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    TransactionType,
    Amount,
    Description,
    VendorName,
    DocumentNumber,
    Date,
    RawText,
    ClinicName,
    PatientName,
    ServiceName,
    ServiceValue,
}

const FINANCIAL_FIELDS: &[DraftField] = &[
    DraftField::TransactionType,
    DraftField::Amount,
    DraftField::Description,
    DraftField::VendorName,
    DraftField::DocumentNumber,
    DraftField::Date,
    DraftField::RawText,
];

const BILLING_FIELDS: &[DraftField] = &[
    DraftField::ClinicName,
    DraftField::PatientName,
    DraftField::ServiceName,
    DraftField::ServiceValue,
];

impl DraftField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransactionType => "transaction_type",
            Self::Amount => "amount",
            Self::Description => "description",
            Self::VendorName => "vendor_name",
            Self::DocumentNumber => "document_number",
            Self::Date => "date",
            Self::RawText => "raw_text",
            Self::ClinicName => "clinic_name",
            Self::PatientName => "patient_name",
            Self::ServiceName => "service_name",
            Self::ServiceValue => "service_value",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        FINANCIAL_FIELDS
            .iter()
            .chain(BILLING_FIELDS)
            .copied()
            .find(|field| field.name() == name.trim())
    }

    pub fn domain(&self) -> DocumentDomain {
        if BILLING_FIELDS.contains(self) {
            DocumentDomain::Billing
        } else {
            DocumentDomain::Financial
        }
    }

    pub fn for_domain(domain: DocumentDomain) -> &'static [DraftField] {
        match domain {
            DocumentDomain::Financial => FINANCIAL_FIELDS,
            DocumentDomain::Billing => BILLING_FIELDS,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Amount | Self::ServiceValue)
    }
}

/// How an edit was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Stored,
    /// The value was not a number and `0` was stored instead.
    Coerced,
}

/// Extracted fields plus the workflow metadata saved with them.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub fields: ExtractionResult,
    pub period: TargetPeriod,
    pub status: RecordStatus,
}

/// Holds and validates a [`Draft`].
#[derive(Debug, Clone)]
pub struct ConfirmationEditor {
    draft: Draft,
}

impl ConfirmationEditor {
    pub fn new(fields: ExtractionResult, period: TargetPeriod, status: RecordStatus) -> Self {
        Self {
            draft: Draft {
                fields,
                period,
                status,
            },
        }
    }

    /// All-null draft for manual entry.
    pub fn empty(domain: DocumentDomain, period: TargetPeriod, status: RecordStatus) -> Self {
        Self::new(ExtractionResult::empty(domain), period, status)
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn domain(&self) -> DocumentDomain {
        self.draft.fields.domain()
    }

    /// Set `field` from user input.
    ///
    /// Text is stored as typed; an empty value clears the field. Numbers
    /// accept either decimal separator, and anything unparsable is stored as
    /// `0` and reported as [`EditOutcome::Coerced`].
    pub fn edit(&mut self, field: DraftField, value: &str) -> Result<EditOutcome> {
        let domain = self.domain();
        let cleared = value.trim().is_empty();
        let text = (!cleared).then(|| value.to_owned());
        let (number, outcome) = if cleared || !field.is_numeric() {
            (None, EditOutcome::Stored)
        } else {
            match parse_decimal(value) {
                Some(parsed) => (Some(parsed), EditOutcome::Stored),
                None => (Some(0.0), EditOutcome::Coerced),
            }
        };

        match (&mut self.draft.fields, field) {
            (ExtractionResult::Financial(f), DraftField::TransactionType) => {
                f.transaction_type = if cleared {
                    None
                } else {
                    Some(TransactionType::parse(value).ok_or_else(|| {
                        BelegwerkError::Validation(format!(
                            "transaction type must be receipt or payment, got {value:?}"
                        ))
                    })?)
                };
            }
            (ExtractionResult::Financial(f), DraftField::Amount) => f.amount = number,
            (ExtractionResult::Financial(f), DraftField::Description) => f.description = text,
            (ExtractionResult::Financial(f), DraftField::VendorName) => f.vendor_name = text,
            (ExtractionResult::Financial(f), DraftField::DocumentNumber) => f.document_number = text,
            (ExtractionResult::Financial(f), DraftField::Date) => f.date = text,
            (ExtractionResult::Financial(f), DraftField::RawText) => f.raw_text = text,
            (ExtractionResult::Billing(b), DraftField::ClinicName) => b.clinic_name = text,
            (ExtractionResult::Billing(b), DraftField::PatientName) => b.patient_name = text,
            (ExtractionResult::Billing(b), DraftField::ServiceName) => b.service_name = text,
            (ExtractionResult::Billing(b), DraftField::ServiceValue) => b.service_value = number,
            _ => {
                return Err(BelegwerkError::FieldNotApplicable {
                    field: field.name(),
                    domain: domain.as_str(),
                });
            }
        }

        debug!(field = field.name(), ?outcome, "draft edited");
        Ok(outcome)
    }

    /// Value of `field` as shown in a form. Numbers get two decimals; nulls
    /// and fields of the other domain are empty.
    pub fn display(&self, field: DraftField) -> String {
        fn text(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }
        fn money(value: Option<f64>) -> String {
            value.map(|v| format!("{v:.2}")).unwrap_or_default()
        }

        match (&self.draft.fields, field) {
            (ExtractionResult::Financial(f), DraftField::TransactionType) => f
                .transaction_type
                .map(|t| t.as_str().to_owned())
                .unwrap_or_default(),
            (ExtractionResult::Financial(f), DraftField::Amount) => money(f.amount),
            (ExtractionResult::Financial(f), DraftField::Description) => text(&f.description),
            (ExtractionResult::Financial(f), DraftField::VendorName) => text(&f.vendor_name),
            (ExtractionResult::Financial(f), DraftField::DocumentNumber) => text(&f.document_number),
            (ExtractionResult::Financial(f), DraftField::Date) => text(&f.date),
            (ExtractionResult::Financial(f), DraftField::RawText) => text(&f.raw_text),
            (ExtractionResult::Billing(b), DraftField::ClinicName) => text(&b.clinic_name),
            (ExtractionResult::Billing(b), DraftField::PatientName) => text(&b.patient_name),
            (ExtractionResult::Billing(b), DraftField::ServiceName) => text(&b.service_name),
            (ExtractionResult::Billing(b), DraftField::ServiceValue) => money(b.service_value),
            _ => String::new(),
        }
    }

    pub fn set_period(&mut self, period: TargetPeriod) {
        self.draft.period = period;
    }

    pub fn set_status(&mut self, status: RecordStatus) {
        self.draft.status = status;
    }

    /// The field that must be filled before the draft can be committed.
    pub fn required_field(&self) -> DraftField {
        match self.domain() {
            DocumentDomain::Financial => DraftField::TransactionType,
            DocumentDomain::Billing => DraftField::PatientName,
        }
    }

    pub fn can_commit(&self) -> bool {
        match &self.draft.fields {
            ExtractionResult::Financial(f) => f.transaction_type.is_some(),
            ExtractionResult::Billing(b) => b
                .patient_name
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty()),
        }
    }

    /// Hand the draft over as an immutable record.
    pub fn commit(self) -> Result<NewRecord> {
        if !self.can_commit() {
            return Err(BelegwerkError::MissingRequiredField(self.required_field().name()));
        }
        Ok(NewRecord {
            fields: self.draft.fields,
            period: self.draft.period,
            status: self.draft.status,
            original_url: None,
            media_hash: None,
        })
    }
}
