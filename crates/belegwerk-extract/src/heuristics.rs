// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text heuristics for receipts — pull amount, date, document number, vendor
// and transaction type out of plain OCR text. Used by the on-device
// recogniser; results are advisory like any other extraction.

use std::sync::LazyLock;

use belegwerk_core::types::{FinancialFields, TransactionType};
use chrono::NaiveDate;
use regex::Regex;

use crate::normalize::parse_decimal;

static TOTAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:total|amount\s+due|valor|summe|betrag)\b[^0-9\-]*(-?[0-9][0-9.,]*)")
        .expect("invalid total regex")
});

static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}(?:[.,][0-9]{3})*[.,][0-9]{2}\b").expect("invalid money regex")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{4})-([0-9]{2})-([0-9]{2})\b").expect("invalid ISO date regex")
});

static DAY_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{1,2})[./]([0-9]{1,2})[./]([0-9]{2,4})\b").expect("invalid date regex")
});

static DOCUMENT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:invoice|receipt|recibo|cupom|document|doc|nota|rechnung)\s*(?:no\.?|nr\.?|number|n[º°o]\.?|#)\s*:?\s*([A-Z0-9][A-Z0-9/\-]*)",
    )
    .expect("invalid document number regex")
});

/// Best-effort field extraction from receipt text. `raw_text` is always set
/// when the input has any non-blank content.
pub fn parse_financial_text(text: &str) -> FinancialFields {
    let trimmed = text.trim();
    FinancialFields {
        transaction_type: transaction_type(trimmed),
        amount: amount(trimmed),
        description: None,
        vendor_name: vendor(trimmed),
        document_number: DOCUMENT_NUMBER
            .captures(trimmed)
            .map(|caps| caps[1].to_owned()),
        date: date(trimmed),
        raw_text: (!trimmed.is_empty()).then(|| trimmed.to_owned()),
    }
}

/// Amount on a "total" line if one exists, otherwise the largest money-shaped
/// number in the text.
fn amount(text: &str) -> Option<f64> {
    let labelled = TOTAL_LINE
        .captures_iter(text)
        .filter_map(|caps| parse_decimal(&caps[1]))
        .last();
    labelled.or_else(|| {
        MONEY
            .find_iter(text)
            .filter_map(|m| parse_decimal(m.as_str()))
            .fold(None, |best: Option<f64>, value| {
                Some(best.map_or(value, |b| b.max(value)))
            })
    })
}

/// First date found, as `YYYY-MM-DD`. Slash and dot dates are read day first.
fn date(text: &str) -> Option<String> {
    if let Some(caps) = ISO_DATE.captures(text) {
        let parsed = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        if let Some(date) = parsed {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }

    DAY_FIRST_DATE.captures_iter(text).find_map(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let mut year: i32 = caps[3].parse().ok()?;
        if caps[3].len() == 2 {
            year += 2000;
        } else if caps[3].len() != 4 {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
    })
}

/// Receipts usually open with the merchant's name.
fn vendor(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| {
            let letters = line.chars().filter(|c| c.is_alphabetic()).count();
            let digits = line.chars().filter(|c| c.is_ascii_digit()).count();
            letters >= 3 && letters > digits
        })
        .map(str::to_owned)
}

fn transaction_type(text: &str) -> Option<TransactionType> {
    let lower = text.to_lowercase();
    const PAYMENT: &[&str] = &["payment", "paid to", "pagamento", "zahlung"];
    const RECEIPT: &[&str] = &["receipt", "recibo", "cupom", "quittung", "kassenbon"];
    if PAYMENT.iter().any(|word| lower.contains(word)) {
        Some(TransactionType::Payment)
    } else if RECEIPT.iter().any(|word| lower.contains(word)) {
        Some(TransactionType::Receipt)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str = "\
        PADARIA CENTRAL LTDA
        Rua das Flores 12
        RECIBO nº 00421
        14/03/2026 08:12
        Pão francês      3,50
        Café             6,00
        TOTAL R$        150,00
    ";

    #[test]
    fn parses_a_typical_receipt() {
        let fields = parse_financial_text(RECEIPT);
        assert_eq!(fields.vendor_name.as_deref(), Some("PADARIA CENTRAL LTDA"));
        assert_eq!(fields.amount, Some(150.0));
        assert_eq!(fields.date.as_deref(), Some("2026-03-14"));
        assert_eq!(fields.document_number.as_deref(), Some("00421"));
        assert_eq!(fields.transaction_type, Some(TransactionType::Receipt));
        assert!(fields.raw_text.is_some());
    }

    #[test]
    fn falls_back_to_largest_amount() {
        let fields = parse_financial_text("Shop\nitem 4.99\nitem 12.50\n2026-01-31");
        assert_eq!(fields.amount, Some(12.5));
        assert_eq!(fields.date.as_deref(), Some("2026-01-31"));
        assert_eq!(fields.transaction_type, None);
    }

    #[test]
    fn payment_wording_wins() {
        let fields = parse_financial_text("Comprovante de pagamento\nValor: 1.234,56");
        assert_eq!(fields.transaction_type, Some(TransactionType::Payment));
        assert_eq!(fields.amount, Some(1234.56));
    }

    #[test]
    fn blank_text_yields_nothing() {
        assert_eq!(parse_financial_text("   \n "), FinancialFields::default());
    }

    #[test]
    fn impossible_dates_are_skipped() {
        assert_eq!(date("31/02/2026 then 01/03/26"), Some("2026-03-01".into()));
    }
}
