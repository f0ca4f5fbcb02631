// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// imagechooser-module: the picker adapter.
//
// Launches the platform image picker on request, waits for the activity
// result the host forwards back, resolves the chosen item's path, name, size,
// and pixel bounds, and completes the caller's handle exactly once.

pub mod media;
pub mod module;
pub mod pending;

#[cfg(test)]
pub(crate) mod test_support;

pub use media::bounds::{ImageBounds, read_bounds};
pub use media::resolver::MetadataResolver;
pub use module::ImageChooserModule;
pub use pending::PickHandle;
