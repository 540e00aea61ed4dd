// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition service seam and wire types.
//
// The service is opaque and best-effort: every response field may be absent,
// and callers must treat a missing field as normal rather than exceptional.

use std::future::Future;

use belegwerk_core::config::RecognitionConfig;
use belegwerk_core::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::http::HttpRecognitionService;

/// An encoded image ready to be sent for recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }
}

/// Request body: `{ "imageBase64": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionRequest {
    pub image_base64: String,
}

/// Response body. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecognitionResponse {
    pub success: bool,
    /// Domain fields, shape varies with the document family.
    pub data: Option<Value>,
    pub raw_text: Option<String>,
    pub error: Option<String>,
}

impl RecognitionResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Anything that can turn an image into a [`RecognitionResponse`].
///
/// `Err` means the transport failed; a service-reported failure is an `Ok`
/// response with `success == false`.
pub trait RecognitionService {
    fn recognize(&self, image: &EncodedImage) -> impl Future<Output = Result<RecognitionResponse>>;
}

/// Recognition backend chosen from configuration.
pub enum ConfiguredService {
    Http(HttpRecognitionService),
    #[cfg(feature = "ocr")]
    Local(crate::local::LocalOcrService),
    /// No backend configured; every document goes to manual entry.
    Disabled,
}

impl ConfiguredService {
    /// HTTP when an endpoint is configured, otherwise the on-device engine
    /// (with the `ocr` feature and models available), otherwise disabled.
    pub fn from_config(config: &RecognitionConfig) -> Result<Self> {
        if config.endpoint.is_some() {
            return Ok(Self::Http(HttpRecognitionService::from_config(config)?));
        }

        #[cfg(feature = "ocr")]
        {
            match crate::local::LocalOcrService::with_defaults() {
                Ok(local) => return Ok(Self::Local(local)),
                Err(err) => tracing::warn!(error = %err, "on-device OCR unavailable"),
            }
        }

        info!("no recognition endpoint configured, extraction disabled");
        Ok(Self::Disabled)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            #[cfg(feature = "ocr")]
            Self::Local(_) => "local-ocr",
            Self::Disabled => "disabled",
        }
    }
}

impl RecognitionService for ConfiguredService {
    async fn recognize(&self, image: &EncodedImage) -> Result<RecognitionResponse> {
        match self {
            Self::Http(service) => service.recognize(image).await,
            #[cfg(feature = "ocr")]
            Self::Local(service) => service.recognize(image).await,
            Self::Disabled => Ok(RecognitionResponse::failed(
                "no recognition service configured",
            )),
        }
    }
}
