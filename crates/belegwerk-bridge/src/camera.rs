// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camera stream lifecycle — acquire, snapshot, release.
//
// The manager hands out move-only `StreamHandle`s so a stream has exactly one
// owner. Release is idempotent; the acquire/release counters let callers
// check that no stream outlives its session.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use belegwerk_core::error::CameraError;
use belegwerk_core::types::{CameraConstraints, RawImage};
use tracing::{debug, info, instrument, warn};

use crate::traits::{NativeCamera, StreamToken};

/// An open camera stream. Not `Clone`: whoever holds it owns the stream.
#[derive(Debug)]
pub struct StreamHandle {
    token: StreamToken,
    open: AtomicBool,
}

impl StreamHandle {
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Acquires and releases streams on a [`NativeCamera`].
pub struct CameraResourceManager<D> {
    device: D,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl<D: NativeCamera> CameraResourceManager<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Borrow the underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Open a stream. Constraints are hints: if the device cannot satisfy
    /// them, one more attempt is made with [`CameraConstraints::relaxed`].
    #[instrument(skip_all, fields(facing = ?constraints.facing))]
    pub async fn acquire(&self, constraints: &CameraConstraints) -> Result<StreamHandle, CameraError> {
        let relaxed = CameraConstraints::relaxed();
        let token = match self.device.open_stream(constraints).await {
            Ok(token) => token,
            Err(err) => {
                let mapped = CameraError::from(err);
                if mapped != CameraError::ConstraintUnsatisfiable || *constraints == relaxed {
                    warn!(error = %mapped, "camera acquisition failed");
                    return Err(mapped);
                }
                info!("constraints unsatisfiable, retrying with relaxed constraints");
                self.device.open_stream(&relaxed).await.map_err(|err| {
                    let mapped = CameraError::from(err);
                    warn!(error = %mapped, "camera acquisition failed with relaxed constraints");
                    mapped
                })?
            }
        };

        self.acquired.fetch_add(1, Ordering::SeqCst);
        info!(stream = token, "camera stream opened");
        Ok(StreamHandle {
            token,
            open: AtomicBool::new(true),
        })
    }

    /// Snapshot the current frame. Never suspends.
    pub fn capture_frame(&self, handle: &StreamHandle) -> Result<RawImage, CameraError> {
        if !handle.is_open() {
            return Err(CameraError::Unknown("stream already released".into()));
        }
        let frame = self.device.grab_frame(handle.token)?;
        debug!(
            stream = handle.token,
            width = frame.width,
            height = frame.height,
            "frame captured"
        );
        Ok(frame)
    }

    /// Stop the stream. Safe to call any number of times.
    pub fn release(&self, handle: &StreamHandle) {
        if handle.open.swap(false, Ordering::SeqCst) {
            self.device.stop_stream(handle.token);
            self.released.fetch_add(1, Ordering::SeqCst);
            info!(stream = handle.token, "camera stream released");
        }
    }

    /// Streams acquired and not yet released.
    pub fn open_streams(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst) - self.released.load(Ordering::SeqCst)
    }

    pub fn acquired_count(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }
}
