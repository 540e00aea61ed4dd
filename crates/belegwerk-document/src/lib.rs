// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// belegwerk-document — Document intake for the Belegwerk capture pipeline.
//
// Provides image preprocessing (downscale + lossy re-encode to bound upload
// size) and file intake checks (MIME whitelist, size ceiling).

pub mod image;
pub mod intake;

pub use self::image::processor::{CompressedImage, ImagePreprocessor};
pub use intake::SelectedFile;
