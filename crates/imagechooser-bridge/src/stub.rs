// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Every trait method returns `PlatformUnavailable`. Real implementations live
// in the `android` and `desktop` modules.

use imagechooser_core::error::{ChooserError, Result};

use crate::traits::*;

/// No-op bridge returned on non-mobile platforms.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeImagePicker for StubBridge {
    fn launch_image_picker(&self, _intent: &PickerIntent) -> Result<()> {
        tracing::warn!("NativeImagePicker::launch_image_picker called on stub bridge");
        Err(ChooserError::PlatformUnavailable)
    }
}

impl NativeMediaStore for StubBridge {
    fn query<'a>(
        &'a self,
        _uri: &str,
        _projection: &[MediaColumn],
    ) -> Result<Option<Box<dyn MediaCursor + 'a>>> {
        Err(ChooserError::PlatformUnavailable)
    }
}
