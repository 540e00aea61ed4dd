// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where no camera backend is wired in.

use belegwerk_core::error::{BelegwerkError, Result};
use belegwerk_core::types::{CameraConstraints, RawImage};

use crate::traits::*;

/// Bridge returned on platforms without a native camera backend.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeCamera for StubBridge {
    async fn open_stream(
        &self,
        _constraints: &CameraConstraints,
    ) -> std::result::Result<StreamToken, DeviceError> {
        tracing::warn!("NativeCamera::open_stream called on stub bridge");
        Err(DeviceError::new(
            "NotFoundError",
            "no camera backend on this platform",
        ))
    }

    fn grab_frame(&self, _stream: StreamToken) -> std::result::Result<RawImage, DeviceError> {
        Err(DeviceError::new("InvalidStateError", "no open stream"))
    }

    fn stop_stream(&self, _stream: StreamToken) {}
}

impl NativeFilePicker for StubBridge {
    fn pick_file(&self, _mime_types: &[&str]) -> Result<Option<String>> {
        tracing::warn!("NativeFilePicker::pick_file called on stub bridge");
        Err(BelegwerkError::PlatformUnavailable)
    }

    fn read_picked_file(&self, path: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }
}
