// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lenient conversion of recognition payloads into typed extraction results.
//
// Numbers may arrive as JSON numbers or as strings in either decimal
// convention ("150.00", "150,00", "1.234,56"). Strings are trimmed and empty
// strings count as null. Keys are accepted in snake_case or camelCase.

use belegwerk_core::types::{
    BillingFields, DocumentDomain, ExtractionResult, FinancialFields, TransactionType,
};
use serde_json::{Map, Value};

/// Build a typed result for `domain` from a `data` object.
///
/// `raw_text` is the response's top-level text and is used only when the
/// object carries none of its own.
pub fn normalize(domain: DocumentDomain, data: &Map<String, Value>, raw_text: Option<&str>) -> ExtractionResult {
    match domain {
        DocumentDomain::Financial => ExtractionResult::Financial(FinancialFields {
            transaction_type: text(data, &["transaction_type", "transactionType"])
                .as_deref()
                .and_then(TransactionType::parse),
            amount: number(data, &["amount", "total"]),
            description: text(data, &["description"]),
            vendor_name: text(data, &["vendor_name", "vendorName", "vendor"]),
            document_number: text(data, &["document_number", "documentNumber"]),
            date: text(data, &["date"]),
            raw_text: text(data, &["raw_text", "rawText"]).or_else(|| clean(raw_text)),
        }),
        DocumentDomain::Billing => ExtractionResult::Billing(BillingFields {
            clinic_name: text(data, &["clinic_name", "clinicName"]),
            patient_name: text(data, &["patient_name", "patientName"]),
            service_name: text(data, &["service_name", "serviceName"]),
            service_value: number(data, &["service_value", "serviceValue"]),
        }),
    }
}

/// Parse a decimal written with either `.` or `,` as the separator.
///
/// Currency symbols and whitespace are ignored. When both separators appear,
/// the last one is the decimal point. A lone comma followed by one or two
/// digits is a decimal comma; otherwise it groups thousands.
pub fn parse_decimal(input: &str) -> Option<f64> {
    let kept: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_dot = kept.rfind('.');
    let last_comma = kept.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => kept.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => kept.replace(',', ""),
        (None, Some(comma)) => {
            let decimals = kept.len() - comma - 1;
            if kept.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                kept.replace(',', ".")
            } else {
                kept.replace(',', "")
            }
        }
        (Some(_), None) if kept.matches('.').count() > 1 => kept.replace('.', ""),
        _ => kept,
    };

    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn lookup<'a>(data: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| data.get(*key))
        .find(|value| !value.is_null())
}

fn text(data: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(data, keys)? {
        Value::String(s) => clean(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(data: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    match lookup(data, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn decimals_in_both_conventions() {
        assert_eq!(parse_decimal("150.00"), Some(150.0));
        assert_eq!(parse_decimal("150,00"), Some(150.0));
        assert_eq!(parse_decimal("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("$1,234.56"), Some(1234.56));
        assert_eq!(parse_decimal("1,234"), Some(1234.0));
        assert_eq!(parse_decimal("1.234.567"), Some(1_234_567.0));
        assert_eq!(parse_decimal("-12,5"), Some(-12.5));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn financial_fields_are_coerced_leniently() {
        let data = object(json!({
            "transaction_type": "Receipt",
            "amount": "150,00",
            "vendorName": "  Padaria Central  ",
            "description": "",
            "document_number": 4711,
            "date": null
        }));
        let ExtractionResult::Financial(f) = normalize(DocumentDomain::Financial, &data, Some("raw")) else {
            panic!("expected financial result");
        };
        assert_eq!(f.transaction_type, Some(TransactionType::Receipt));
        assert_eq!(f.amount, Some(150.0));
        assert_eq!(f.vendor_name.as_deref(), Some("Padaria Central"));
        assert_eq!(f.description, None);
        assert_eq!(f.document_number.as_deref(), Some("4711"));
        assert_eq!(f.date, None);
        assert_eq!(f.raw_text.as_deref(), Some("raw"));
    }

    #[test]
    fn unknown_transaction_type_becomes_null() {
        let data = object(json!({ "transaction_type": "refund", "amount": true }));
        let ExtractionResult::Financial(f) = normalize(DocumentDomain::Financial, &data, None) else {
            panic!("expected financial result");
        };
        assert_eq!(f.transaction_type, None);
        assert_eq!(f.amount, None);
    }

    #[test]
    fn billing_fields() {
        let data = object(json!({
            "clinic_name": "Clínica Sol",
            "patientName": "Ana Souza",
            "service_name": "Consulta",
            "service_value": 200
        }));
        let result = normalize(DocumentDomain::Billing, &data, None);
        assert!(result.is_complete());
        let ExtractionResult::Billing(b) = result else {
            panic!("expected billing result");
        };
        assert_eq!(b.patient_name.as_deref(), Some("Ana Souza"));
        assert_eq!(b.service_value, Some(200.0));
    }
}
