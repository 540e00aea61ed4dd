// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ExtractionClient — calls the recognition service and classifies the answer.
//
// Extraction never blocks the workflow: every outcome, including failure,
// leads to review. Success and partial success differ only in how the draft
// is presented.

use belegwerk_core::types::{DocumentDomain, ExtractionResult};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::normalize::normalize;
use crate::service::{EncodedImage, RecognitionService};

/// Result of one extraction call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// All key fields were recognised.
    Success(ExtractionResult),
    /// Some key fields are missing.
    PartialSuccess(ExtractionResult),
    Failure(String),
}

impl ExtractionOutcome {
    /// The recognised fields, or an all-null result for `domain` on failure.
    pub fn into_result(self, domain: DocumentDomain) -> ExtractionResult {
        match self {
            Self::Success(result) | Self::PartialSuccess(result) => result,
            Self::Failure(_) => ExtractionResult::empty(domain),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Domain-aware adapter over a [`RecognitionService`].
pub struct ExtractionClient<S> {
    service: S,
    domain: DocumentDomain,
}

impl<S: RecognitionService> ExtractionClient<S> {
    pub fn new(service: S, domain: DocumentDomain) -> Self {
        Self { service, domain }
    }

    pub fn domain(&self) -> DocumentDomain {
        self.domain
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Recognise `image`. Never returns an error; failures are an outcome.
    #[instrument(skip_all, fields(domain = self.domain.as_str(), bytes = image.bytes.len()))]
    pub async fn extract(&self, image: &EncodedImage) -> ExtractionOutcome {
        if !image.mime.starts_with("image/") {
            warn!(mime = %image.mime, "refusing to send a non-image for recognition");
            return ExtractionOutcome::Failure(format!("not an image: {}", image.mime));
        }

        let response = match self.service.recognize(image).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "recognition transport failed");
                return ExtractionOutcome::Failure(err.to_string());
            }
        };

        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "recognition service reported failure".to_owned());
            info!(%reason, "recognition unsuccessful");
            return ExtractionOutcome::Failure(reason);
        }

        let Some(Value::Object(data)) = response.data else {
            info!("recognition returned no field data");
            return ExtractionOutcome::Failure("no field data in response".to_owned());
        };

        let result = normalize(self.domain, &data, response.raw_text.as_deref());
        if result.is_complete() {
            info!("extraction complete");
            ExtractionOutcome::Success(result)
        } else {
            info!("extraction partial");
            ExtractionOutcome::PartialSuccess(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use belegwerk_core::error::{BelegwerkError, Result};
    use belegwerk_core::types::{FinancialFields, TransactionType};
    use serde_json::json;

    use crate::service::RecognitionResponse;

    struct Canned {
        reply: Option<RecognitionResponse>,
        calls: Cell<u32>,
    }

    impl Canned {
        fn new(reply: Option<RecognitionResponse>) -> Self {
            Self {
                reply,
                calls: Cell::new(0),
            }
        }
    }

    impl RecognitionService for Canned {
        async fn recognize(&self, _image: &EncodedImage) -> Result<RecognitionResponse> {
            self.calls.set(self.calls.get() + 1);
            self.reply
                .clone()
                .ok_or_else(|| BelegwerkError::Extraction("connection reset".into()))
        }
    }

    fn jpeg() -> EncodedImage {
        EncodedImage::new(vec![0xff, 0xd8], "image/jpeg")
    }

    #[tokio::test]
    async fn key_fields_present_is_success() {
        let client = ExtractionClient::new(
            Canned::new(Some(RecognitionResponse::ok(json!({
                "transaction_type": "receipt",
                "amount": 150.0,
                "date": "2026-03-14"
            })))),
            DocumentDomain::Financial,
        );
        let outcome = client.extract(&jpeg()).await;
        let ExtractionOutcome::Success(ExtractionResult::Financial(f)) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(f.transaction_type, Some(TransactionType::Receipt));
    }

    #[tokio::test]
    async fn missing_key_fields_is_partial() {
        let client = ExtractionClient::new(
            Canned::new(Some(RecognitionResponse::ok(json!({
                "transaction_type": "receipt",
                "amount": 150.0
            })))),
            DocumentDomain::Financial,
        );
        assert!(matches!(
            client.extract(&jpeg()).await,
            ExtractionOutcome::PartialSuccess(_)
        ));
    }

    #[tokio::test]
    async fn failures_yield_an_empty_result() {
        for reply in [
            None,
            Some(RecognitionResponse::failed("low confidence")),
            Some(RecognitionResponse {
                success: true,
                data: Some(json!("not an object")),
                ..Default::default()
            }),
        ] {
            let client = ExtractionClient::new(Canned::new(reply), DocumentDomain::Financial);
            let outcome = client.extract(&jpeg()).await;
            assert!(outcome.is_failure(), "{outcome:?}");
            assert_eq!(
                outcome.into_result(DocumentDomain::Financial),
                ExtractionResult::Financial(FinancialFields::default())
            );
        }
    }

    #[tokio::test]
    async fn non_images_are_never_sent() {
        let client = ExtractionClient::new(Canned::new(None), DocumentDomain::Billing);
        let outcome = client
            .extract(&EncodedImage::new(vec![b'%'], "application/pdf"))
            .await;
        assert!(outcome.is_failure());
        assert_eq!(client.service().calls.get(), 0);
    }
}
