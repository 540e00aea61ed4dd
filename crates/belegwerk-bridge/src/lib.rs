// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Belegwerk — Native platform bridge abstractions.
//!
//! Defines the device-level traits the capture pipeline talks to, the
//! [`CameraResourceManager`] that owns camera stream lifecycles, a stub bridge
//! for desktop/CI builds, and an in-memory mock camera for tests and headless
//! demos.

pub mod camera;
pub mod mock;
pub mod stub;
pub mod traits;

pub use camera::{CameraResourceManager, StreamHandle};
pub use mock::MockCamera;

/// Returns the bridge implementation for the running platform.
///
/// Desktop and CI builds get the stub: the camera reports `DeviceNotFound` and
/// picked files are read straight from disk.
pub fn platform_bridge() -> stub::StubBridge {
    stub::StubBridge
}
