// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use std::future::Future;

use belegwerk_core::error::{CameraError, Result};
use belegwerk_core::types::{CameraConstraints, RawImage};
use thiserror::Error;

/// Opaque identifier a device assigns to an open stream.
pub type StreamToken = u64;

/// Error reported by a camera device, named the way `getUserMedia` names them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct DeviceError {
    pub name: String,
    pub message: String,
}

impl DeviceError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<DeviceError> for CameraError {
    fn from(err: DeviceError) -> Self {
        CameraError::from_device_name(&err.name, &err.message)
    }
}

/// Unified bridge that groups the native capabilities the pipeline needs.
pub trait PlatformBridge: NativeCamera + NativeFilePicker {
    /// Human-readable platform name (e.g. "iOS 17", "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Live camera access.
///
/// Implementations turn the hardware indicator on while any stream is open.
pub trait NativeCamera {
    /// Open a video stream. Waits for the permission prompt and device start-up.
    fn open_stream(
        &self,
        constraints: &CameraConstraints,
    ) -> impl Future<Output = std::result::Result<StreamToken, DeviceError>>;

    /// Copy the current frame of an open stream at its native resolution.
    fn grab_frame(&self, stream: StreamToken) -> std::result::Result<RawImage, DeviceError>;

    /// Stop a stream. Stopping an unknown or stopped stream is a no-op.
    fn stop_stream(&self, stream: StreamToken);
}

/// Pick files from the device storage.
pub trait NativeFilePicker {
    /// Show a file picker filtered to the given MIME types.
    /// Returns the file path chosen, or None if cancelled.
    fn pick_file(&self, mime_types: &[&str]) -> Result<Option<String>>;

    /// Read the bytes of a previously picked file.
    fn read_picked_file(&self, path: &str) -> Result<Vec<u8>>;
}
