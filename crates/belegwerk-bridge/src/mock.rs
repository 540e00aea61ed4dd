// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory camera used by tests and the `--mock` CLI mode.
//
// Frames are a synthetic gradient at the configured resolution. Open failures
// can be scripted so permission and constraint paths can be exercised.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use belegwerk_core::types::{CameraConstraints, RawImage};

use crate::traits::{DeviceError, NativeCamera, StreamToken};

#[derive(Debug, Default)]
struct MockState {
    next_token: StreamToken,
    open: HashSet<StreamToken>,
    scripted_failures: VecDeque<DeviceError>,
    opened: u32,
    stopped: u32,
    requested: Vec<CameraConstraints>,
}

/// Shared-handle mock camera. Clones observe the same device.
#[derive(Debug, Clone)]
pub struct MockCamera {
    width: u32,
    height: u32,
    state: Arc<Mutex<MockState>>,
}

impl MockCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Make the next `open_stream` call fail with `name`.
    pub fn fail_next_open(&self, name: &str, message: &str) {
        self.lock().scripted_failures.push_back(DeviceError::new(name, message));
    }

    /// Whether the hardware indicator would be lit.
    pub fn is_active(&self) -> bool {
        !self.lock().open.is_empty()
    }

    pub fn open_count(&self) -> u32 {
        self.lock().opened
    }

    pub fn stop_count(&self) -> u32 {
        self.lock().stopped
    }

    /// Constraints of every open attempt, in order.
    pub fn requested_constraints(&self) -> Vec<CameraConstraints> {
        self.lock().requested.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock camera lock poisoned")
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl NativeCamera for MockCamera {
    async fn open_stream(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<StreamToken, DeviceError> {
        let mut state = self.lock();
        state.requested.push(constraints.clone());
        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        state.next_token += 1;
        let token = state.next_token;
        state.open.insert(token);
        state.opened += 1;
        Ok(token)
    }

    fn grab_frame(&self, stream: StreamToken) -> Result<RawImage, DeviceError> {
        if !self.lock().open.contains(&stream) {
            return Err(DeviceError::new("InvalidStateError", "stream is not open"));
        }
        let (width, height) = (self.width, self.height);
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[
                    (x * 255 / width.max(1)) as u8,
                    (y * 255 / height.max(1)) as u8,
                    128,
                    255,
                ]);
            }
        }
        Ok(RawImage {
            width,
            height,
            rgba,
        })
    }

    fn stop_stream(&self, stream: StreamToken) {
        let mut state = self.lock();
        if state.open.remove(&stream) {
            state.stopped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_have_native_resolution() {
        let camera = MockCamera::new(64, 48);
        let token = camera
            .open_stream(&CameraConstraints::default())
            .await
            .expect("open");
        assert!(camera.is_active());

        let frame = camera.grab_frame(token).expect("frame");
        assert_eq!((frame.width, frame.height), (64, 48));
        assert_eq!(frame.rgba.len(), 64 * 48 * 4);

        camera.stop_stream(token);
        camera.stop_stream(token);
        assert!(!camera.is_active());
        assert_eq!(camera.stop_count(), 1);
        assert!(camera.grab_frame(token).is_err());
    }

    #[tokio::test]
    async fn scripted_failure_applies_once() {
        let camera = MockCamera::new(8, 8);
        camera.fail_next_open("NotAllowedError", "denied");
        assert!(camera.open_stream(&CameraConstraints::default()).await.is_err());
        assert!(camera.open_stream(&CameraConstraints::default()).await.is_ok());
        assert_eq!(camera.open_count(), 1);
    }
}
