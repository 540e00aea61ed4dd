// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// belegwerk-extract — Talks to the recognition service and turns its
// best-effort, partially-null answers into typed extraction results.

pub mod client;
pub mod heuristics;
pub mod http;
#[cfg(feature = "ocr")]
pub mod local;
pub mod normalize;
pub mod service;

pub use client::{ExtractionClient, ExtractionOutcome};
pub use http::HttpRecognitionService;
pub use service::{
    ConfiguredService, EncodedImage, RecognitionRequest, RecognitionResponse, RecognitionService,
};

#[cfg(feature = "ocr")]
pub use local::LocalOcrService;
