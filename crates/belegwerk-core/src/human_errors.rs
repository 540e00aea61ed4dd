// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the capture screens.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives presentation; `help_available` tells the UI to offer the
// camera troubleshooting guide.

use crate::error::{BelegwerkError, CameraError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy service. Trying again usually works.
    Transient,
    /// User must do something (grant permission, fill a field, pick another file).
    ActionRequired,
    /// Cannot be fixed by retrying: wrong format, missing hardware.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same action can succeed.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
    /// Offer the contextual camera help.
    pub help_available: bool,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, retriable: bool, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
            severity,
            help_available: false,
        }
    }

    fn with_help(mut self) -> Self {
        self.help_available = true;
        self
    }
}

/// Convert a `BelegwerkError` into a `HumanError`.
pub fn humanize_error(err: &BelegwerkError) -> HumanError {
    match err {
        BelegwerkError::Camera(camera) => humanize_camera_error(camera),

        BelegwerkError::PlatformUnavailable => HumanError::new(
            "This feature isn't available on your device.",
            "You can still add documents by choosing a file.",
            false,
            Severity::Permanent,
        ),

        BelegwerkError::FileTooLarge { limit, .. } => HumanError::new(
            "This file is too big.",
            format!(
                "Files can be at most {} MB. Try a smaller photo or a compressed PDF.",
                limit / (1024 * 1024)
            ),
            false,
            Severity::ActionRequired,
        ),

        BelegwerkError::EmptyFile => HumanError::new(
            "This file is empty.",
            "Choose the file again, or take a photo instead.",
            false,
            Severity::ActionRequired,
        ),

        BelegwerkError::UnsupportedDocument(detail) => HumanError::new(
            "This type of file isn't supported.",
            format!("Use a JPEG, PNG or WebP photo, or a PDF. (File type: {detail})"),
            false,
            Severity::Permanent,
        ),

        BelegwerkError::ImageError(_) => HumanError::new(
            "There's a problem with this image.",
            "The photo may be damaged. Try taking it again.",
            true,
            Severity::Transient,
        ),

        BelegwerkError::Extraction(_) => HumanError::new(
            "We couldn't read this document automatically.",
            "Please fill in the fields yourself. Nothing has been lost.",
            true,
            Severity::Transient,
        ),

        BelegwerkError::MissingRequiredField(field) => HumanError::new(
            "Some information is still missing.",
            format!("Fill in the {} field before saving.", field.replace('_', " ")),
            false,
            Severity::ActionRequired,
        ),

        BelegwerkError::Validation(detail) => HumanError::new(
            "That value doesn't look right.",
            format!("Check the value and try again. ({detail})"),
            false,
            Severity::ActionRequired,
        ),

        BelegwerkError::FieldNotApplicable { .. } => HumanError::new(
            "That field isn't used for this kind of document.",
            "Switch document type if you picked the wrong one.",
            false,
            Severity::Permanent,
        ),

        BelegwerkError::Busy(_) => HumanError::new(
            "Still working on the previous document.",
            "Wait a moment for it to finish, then try again.",
            true,
            Severity::Transient,
        ),

        BelegwerkError::InvalidTransition { .. } | BelegwerkError::Superseded => HumanError::new(
            "That action isn't possible right now.",
            "Go back to the start and try again.",
            false,
            Severity::ActionRequired,
        ),

        BelegwerkError::Persistence(detail) | BelegwerkError::Database(detail) => HumanError::new(
            "The document couldn't be saved.",
            format!("Your entries are still here. Try saving again. ({detail})"),
            true,
            Severity::Transient,
        ),

        BelegwerkError::IntegrityMismatch { .. } => HumanError::new(
            "A stored original doesn't match its fingerprint.",
            "The file may have been changed on disk. Capture the document again.",
            false,
            Severity::Permanent,
        ),

        BelegwerkError::Upload(_) => HumanError::new(
            "The original photo couldn't be uploaded.",
            "The record was saved without it. You can attach it later.",
            true,
            Severity::Transient,
        ),

        BelegwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError::new(
                    "The file couldn't be found.",
                    "It may have been moved or deleted. Try choosing the file again.",
                    false,
                    Severity::ActionRequired,
                )
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError::new(
                    "The app doesn't have permission to read that file.",
                    "Check the file permissions, or copy the file somewhere else first.",
                    false,
                    Severity::ActionRequired,
                )
            } else {
                HumanError::new(
                    "There was a problem reading or writing a file.",
                    "Try again. If this keeps happening, your device's storage may be full.",
                    true,
                    Severity::Transient,
                )
            }
        }

        BelegwerkError::Serialization(_) | BelegwerkError::Config(_) => HumanError::new(
            "The app had an internal data problem.",
            "Try again. If this keeps happening, reset the settings.",
            false,
            Severity::Permanent,
        ),
    }
}

fn humanize_camera_error(err: &CameraError) -> HumanError {
    match err {
        CameraError::PermissionDenied => HumanError::new(
            "The app isn't allowed to use the camera.",
            "Allow camera access in your browser or system settings, then try again.",
            false,
            Severity::ActionRequired,
        )
        .with_help(),
        CameraError::DeviceNotFound => HumanError::new(
            "No camera was found.",
            "Connect a camera, or choose a file instead.",
            false,
            Severity::Permanent,
        )
        .with_help(),
        CameraError::ConstraintUnsatisfiable => HumanError::new(
            "The camera couldn't start with these settings.",
            "Try again, or choose a file instead.",
            true,
            Severity::Transient,
        ),
        CameraError::Unknown(detail) => HumanError::new(
            "The camera didn't start.",
            format!("Close other apps that may be using the camera and try again. ({detail})"),
            true,
            Severity::Transient,
        ),
    }
}
