// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::error::{BelegwerkError, Result};
use crate::types::{CameraConstraints, DocumentDomain, RecordStatus};

/// Files larger than this are rejected before any processing.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Which document family new sessions capture.
    pub domain: DocumentDomain,
    /// Capture and preprocessing settings.
    pub capture: CaptureConfig,
    /// Recognition service settings.
    pub recognition: RecognitionConfig,
    /// Status given to newly committed records.
    pub default_status: RecordStatus,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            domain: DocumentDomain::Financial,
            capture: CaptureConfig::default(),
            recognition: RecognitionConfig::default(),
            default_status: RecordStatus::Completed,
        }
    }
}

/// Settings for the capture pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Images wider than this are scaled down before upload.
    pub max_width: u32,
    /// Lossy re-encode quality in `[0, 1]`.
    pub quality: f32,
    /// Ceiling for picked files, in bytes.
    pub max_upload_bytes: usize,
    /// Reopen the camera automatically after each batch step.
    ///
    /// Desktop-class camera access allows this; mobile camera APIs generally
    /// refuse silent reactivation, so it defaults to off.
    pub auto_restart: bool,
    /// Upload the original media alongside each record.
    pub upload_originals: bool,
    /// Camera hints used when opening a stream.
    pub camera: CameraConstraints,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_width: 1200,
            quality: 0.7,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            auto_restart: false,
            upload_originals: true,
            camera: CameraConstraints::default(),
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(BelegwerkError::Config("max_width must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(BelegwerkError::Config(format!(
                "quality must be within [0, 1], got {}",
                self.quality
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(BelegwerkError::Config(
                "max_upload_bytes must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for the external recognition service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// HTTP endpoint accepting `{ "imageBase64": ... }`. `None` disables recognition.
    pub endpoint: Option<String>,
    /// Bearer token sent with each request.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
        }
    }
}
