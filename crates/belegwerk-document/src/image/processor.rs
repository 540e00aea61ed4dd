// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image preprocessor — bound the payload sent to the recognition service by
// downscaling wide images and re-encoding them as JPEG. Pure and in-process;
// identical input gives identical output on a given platform.

use image::{DynamicImage, RgbaImage};
use belegwerk_core::error::BelegwerkError;
use belegwerk_core::types::RawImage;
use tracing::{debug, info, instrument, warn};

/// MIME type of every successfully preprocessed image.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// Output of [`ImagePreprocessor::compress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    /// Output dimensions; `None` when decoding failed and the input was kept.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// False when the original bytes were passed through unchanged.
    pub preprocessed: bool,
}

/// Downscale-and-recompress settings.
///
/// ```ignore
/// let out = ImagePreprocessor::new(1200, 0.7).compress(&photo_bytes, "image/png");
/// assert!(out.width.unwrap_or(0) <= 1200);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    max_width: u32,
    quality: f32,
}

impl ImagePreprocessor {
    /// `quality` is clamped into `[0, 1]` and `max_width` to at least 1.
    pub fn new(max_width: u32, quality: f32) -> Self {
        Self {
            max_width: max_width.max(1),
            quality: quality.clamp(0.0, 1.0),
        }
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    /// Compress encoded image bytes.
    ///
    /// Decode failures are not errors: the original bytes come back unchanged
    /// with `preprocessed == false`.
    #[instrument(skip(self, data), fields(data_len = data.len(), max_width = self.max_width))]
    pub fn compress(&self, data: &[u8], mime: &str) -> CompressedImage {
        let decoded = match image::load_from_memory(data) {
            Ok(img) => img,
            Err(err) => {
                warn!(error = %err, "image decode failed, using original bytes");
                return passthrough(data, mime);
            }
        };

        match self.fit_and_encode(decoded) {
            Ok(out) => out,
            Err(err) => {
                warn!(error = %err, "image re-encode failed, using original bytes");
                passthrough(data, mime)
            }
        }
    }

    /// Compress a frame grabbed from the camera.
    ///
    /// A frame has no encoded original to fall back to, so a malformed pixel
    /// buffer is an error.
    #[instrument(skip_all, fields(width = frame.width, height = frame.height))]
    pub fn compress_frame(&self, frame: RawImage) -> Result<CompressedImage, BelegwerkError> {
        let (width, height) = (frame.width, frame.height);
        let rgba = RgbaImage::from_raw(width, height, frame.rgba).ok_or_else(|| {
            BelegwerkError::ImageError(format!(
                "frame buffer does not match {width}x{height} RGBA"
            ))
        })?;
        self.fit_and_encode(DynamicImage::ImageRgba8(rgba))
    }

    fn fit_and_encode(&self, img: DynamicImage) -> Result<CompressedImage, BelegwerkError> {
        let (from_w, from_h) = (img.width(), img.height());
        let img = if from_w > self.max_width {
            let (to_w, to_h) = scaled_dimensions(from_w, from_h, self.max_width);
            info!(from_w, from_h, to_w, to_h, "Downscaling image");
            img.resize_exact(to_w, to_h, image::imageops::FilterType::Lanczos3)
        } else {
            img
        };

        let bytes = to_jpeg_bytes(&img, jpeg_quality(self.quality))?;
        debug!(
            width = img.width(),
            height = img.height(),
            bytes = bytes.len(),
            "Image recompressed"
        );
        Ok(CompressedImage {
            bytes,
            mime: OUTPUT_MIME.to_owned(),
            width: Some(img.width()),
            height: Some(img.height()),
            preprocessed: true,
        })
    }
}

/// Dimensions after fitting `width` into `max_width`, preserving aspect ratio.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
    (max_width, scaled.max(1))
}

/// Map a `[0, 1]` quality onto the encoder's 1–100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

fn passthrough(data: &[u8], mime: &str) -> CompressedImage {
    CompressedImage {
        bytes: data.to_vec(),
        mime: mime.to_owned(),
        width: None,
        height: None,
        preprocessed: false,
    }
}

fn to_jpeg_bytes(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BelegwerkError> {
    let mut buffer = Vec::new();
    let rgb = img.to_rgb8();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder).map_err(|err| {
        BelegwerkError::ImageError(format!("JPEG encoding failed: {}", err))
    })?;
    Ok(buffer)
}
