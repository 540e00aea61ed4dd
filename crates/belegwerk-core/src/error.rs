// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Belegwerk.

use thiserror::Error;

use crate::types::CaptureState;

/// Camera acquisition failures, derived from the device's error name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device found")]
    DeviceNotFound,

    #[error("camera cannot satisfy the requested constraints")]
    ConstraintUnsatisfiable,

    #[error("camera error: {0}")]
    Unknown(String),
}

impl CameraError {
    /// Map a device error name (`getUserMedia`-style) onto the taxonomy.
    pub fn from_device_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                Self::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" => Self::DeviceNotFound,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                Self::ConstraintUnsatisfiable
            }
            _ => Self::Unknown(if message.is_empty() {
                name.to_owned()
            } else {
                message.to_owned()
            }),
        }
    }
}

/// Top-level error type for all Belegwerk operations.
#[derive(Debug, Error)]
pub enum BelegwerkError {
    // -- Device resources --
    #[error(transparent)]
    Camera(#[from] CameraError),

    // -- Intake / preprocessing --
    #[error("file is too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: usize, limit: usize },

    #[error("file is empty")]
    EmptyFile,

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Recognition --
    #[error("extraction failed: {0}")]
    Extraction(String),

    // -- Review / validation --
    #[error("required field missing: {0}")]
    MissingRequiredField(&'static str),

    #[error("invalid value: {0}")]
    Validation(String),

    #[error("field {field} does not apply to {domain} documents")]
    FieldNotApplicable {
        field: &'static str,
        domain: &'static str,
    },

    // -- Workflow --
    #[error("a document is already in flight (state {0})")]
    Busy(CaptureState),

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: CaptureState,
        action: &'static str,
    },

    #[error("session moved on before the operation completed")]
    Superseded,

    // -- Storage / persistence --
    #[error("save failed: {0}")]
    Persistence(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("media integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Configuration / platform --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Coarse error classes used to decide how the pipeline recovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Camera unavailable or denied. Session returns to idle.
    Resource,
    /// Image could not be decoded or re-encoded.
    Preprocess,
    /// Recognition service failed or returned nothing usable.
    Extraction,
    /// Draft cannot be committed as it stands.
    Validation,
    /// Save or upload failed; the draft is kept for a retry.
    Persistence,
    /// File rejected before processing.
    Input,
    /// Action not allowed in the current state, or a stale completion.
    Workflow,
    /// Configuration, platform or serialization problems.
    Internal,
}

impl BelegwerkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Camera(_) | Self::PlatformUnavailable => ErrorKind::Resource,
            Self::ImageError(_) => ErrorKind::Preprocess,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::MissingRequiredField(_)
            | Self::Validation(_)
            | Self::FieldNotApplicable { .. } => ErrorKind::Validation,
            Self::Persistence(_)
            | Self::Upload(_)
            | Self::Database(_)
            | Self::IntegrityMismatch { .. }
            | Self::Io(_) => ErrorKind::Persistence,
            Self::FileTooLarge { .. } | Self::EmptyFile | Self::UnsupportedDocument(_) => {
                ErrorKind::Input
            }
            Self::Busy(_) | Self::InvalidTransition { .. } | Self::Superseded => {
                ErrorKind::Workflow
            }
            Self::Serialization(_) | Self::Config(_) => ErrorKind::Internal,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BelegwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_names_map_to_camera_errors() {
        assert_eq!(
            CameraError::from_device_name("NotAllowedError", "denied"),
            CameraError::PermissionDenied
        );
        assert_eq!(
            CameraError::from_device_name("DevicesNotFoundError", ""),
            CameraError::DeviceNotFound
        );
        assert_eq!(
            CameraError::from_device_name("OverconstrainedError", "width"),
            CameraError::ConstraintUnsatisfiable
        );
        assert_eq!(
            CameraError::from_device_name("NotReadableError", "in use by another app"),
            CameraError::Unknown("in use by another app".into())
        );
        assert_eq!(
            CameraError::from_device_name("AbortError", ""),
            CameraError::Unknown("AbortError".into())
        );
    }

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            BelegwerkError::from(CameraError::PermissionDenied).kind(),
            ErrorKind::Resource
        );
        assert_eq!(
            BelegwerkError::MissingRequiredField("transaction_type").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            BelegwerkError::Persistence("timeout".into()).kind(),
            ErrorKind::Persistence
        );
        assert_eq!(
            BelegwerkError::FileTooLarge { size: 11, limit: 10 }.kind(),
            ErrorKind::Input
        );
        assert_eq!(
            BelegwerkError::Busy(CaptureState::Extracting).kind(),
            ErrorKind::Workflow
        );
    }
}
