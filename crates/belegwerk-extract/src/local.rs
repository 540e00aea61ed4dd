// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-device recognition using the `ocrs` engine.
//
// Produces the same wire response as the remote service: plain text from
// OCR, then the receipt heuristics for structured fields. Only compiled with
// the `ocr` feature.
//
// The engine needs `text-detection.rten` and `text-recognition.rten`, by
// default from `$XDG_CACHE_HOME/ocrs` (running `ocrs-cli` once downloads
// them there).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use belegwerk_core::error::{BelegwerkError, Result};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::heuristics::parse_financial_text;
use crate::service::{EncodedImage, RecognitionResponse, RecognitionService};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Offline [`RecognitionService`] backed by `ocrs`.
pub struct LocalOcrService {
    engine: Arc<OcrEngine>,
}

impl LocalOcrService {
    /// Load both models from `dir`.
    ///
    /// Debug builds of `ocrs`/`rten` are very slow; build them in release.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let detection_model = load_model(&dir.join(DETECTION_MODEL_FILENAME))?;
        let recognition_model = load_model(&dir.join(RECOGNITION_MODEL_FILENAME))?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| BelegwerkError::Extraction(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine ready");
        Ok(Self {
            engine: Arc::new(engine),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::from_model_dir(default_model_dir())
    }
}

/// Decode and recognise. CPU-bound; run it off the async runtime.
fn read_text(engine: &OcrEngine, bytes: &[u8]) -> Result<String> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|err| BelegwerkError::ImageError(format!("cannot decode image for OCR: {err}")))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
        BelegwerkError::Extraction(format!("failed to create image source ({width}x{height}): {err}"))
    })?;
    let input = engine
        .prepare_input(source)
        .map_err(|err| BelegwerkError::Extraction(format!("OCR preprocessing failed: {err}")))?;
    let text = engine
        .get_text(&input)
        .map_err(|err| BelegwerkError::Extraction(format!("OCR text recognition failed: {err}")))?;

    debug!(lines = text.lines().count(), chars = text.len(), "OCR complete");
    Ok(text)
}

fn load_model(path: &Path) -> Result<Model> {
    if !path.exists() {
        return Err(BelegwerkError::Config(format!(
            "OCR model not found at {}",
            path.display()
        )));
    }
    Model::load_file(path).map_err(|err| {
        BelegwerkError::Config(format!("failed to load OCR model from {}: {err}", path.display()))
    })
}

impl RecognitionService for LocalOcrService {
    async fn recognize(&self, image: &EncodedImage) -> Result<RecognitionResponse> {
        let engine = Arc::clone(&self.engine);
        let bytes = image.bytes.clone();
        let text = match tokio::task::spawn_blocking(move || read_text(&engine, &bytes)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => return Ok(RecognitionResponse::failed(err.to_string())),
            Err(err) => {
                return Ok(RecognitionResponse::failed(format!("OCR task failed: {err}")));
            }
        };
        if text.trim().is_empty() {
            return Ok(RecognitionResponse::failed("no text found"));
        }

        let fields = parse_financial_text(&text);
        Ok(RecognitionResponse {
            success: true,
            data: Some(serde_json::to_value(&fields)?),
            raw_text: Some(text),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_models_are_a_config_error() {
        let dir = std::env::temp_dir().join("belegwerk-no-such-models");
        let err = LocalOcrService::from_model_dir(&dir)
            .err()
            .expect("models absent");
        assert!(matches!(err, BelegwerkError::Config(_)));
    }

    fn bare_engine() -> LocalOcrService {
        let engine = OcrEngine::new(OcrEngineParams::default()).expect("engine without models");
        LocalOcrService {
            engine: Arc::new(engine),
        }
    }

    #[tokio::test]
    async fn ocr_failures_become_unsuccessful_responses() {
        let service = bare_engine();

        let garbage = EncodedImage::new(vec![0xde, 0xad, 0xbe, 0xef], "image/jpeg");
        let response = service.recognize(&garbage).await.expect("response");
        assert!(!response.success);
        assert!(response.error.expect("reason").contains("cannot decode"));

        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbImage::from_pixel(16, 16, image::Rgb([255, 255, 255]))
            .write_to(&mut png, image::ImageFormat::Png)
            .expect("encode png");
        let blank = EncodedImage::new(png.into_inner(), "image/png");
        let response = service.recognize(&blank).await.expect("response");
        assert!(!response.success);
    }
}
