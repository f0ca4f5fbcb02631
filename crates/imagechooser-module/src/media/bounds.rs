// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Header-only image bounds. Reads just enough of the container to learn the
// pixel geometry; no pixel buffer is ever allocated, so multi-hundred-megapixel
// photos cost the same as thumbnails.

use std::path::Path;

use image::ImageReader;
use tracing::{debug, instrument};

use imagechooser_core::error::{ChooserError, Result};

/// Pixel geometry of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

/// Read width and height from the image header at `path`.
///
/// The format is sniffed from the file's magic bytes, not its extension.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_bounds(path: impl AsRef<Path>) -> Result<ImageBounds> {
    let path = path.as_ref();

    let reader = ImageReader::open(path)?.with_guessed_format()?;
    if reader.format().is_none() {
        return Err(ChooserError::Decode(format!(
            "{}: unrecognised image format",
            path.display()
        )));
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| ChooserError::Decode(format!("{}: {err}", path.display())))?;

    debug!(width, height, "Image bounds read");
    Ok(ImageBounds { width, height })
}
