// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image chooser native platform bridge abstractions.
//
// This crate defines the traits for the collaborators the chooser module
// talks to (picker launcher, media store) and the platform dispatch logic
// that selects an implementation for the target operating system.

pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(feature = "desktop-picker")]
pub mod desktop;

#[cfg(not(target_os = "android"))]
pub mod stub;

pub use traits::{
    MediaColumn, MediaCursor, NativeImagePicker, NativeMediaStore, PickerIntent, PlatformBridge,
};

/// Retrieves the bridge implementation for the target operating system.
///
/// RETURNS: A boxed trait object (`dyn PlatformBridge`) that abstracts away
/// the underlying native SDK details. Desktop builds get the stub; use
/// `desktop::DesktopBridge` directly for an interactive picker.
pub fn platform_bridge() -> Box<dyn PlatformBridge> {
    #[cfg(target_os = "android")]
    {
        // Android: Uses `jni-rs` to invoke methods on the JVM/ART.
        Box::new(android::AndroidBridge::new())
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: Uses a mock implementation to allow non-native builds.
        Box::new(stub::StubBridge)
    }
}

#[cfg(all(test, not(target_os = "android")))]
mod tests {
    use super::*;

    #[test]
    fn host_builds_get_the_stub() {
        let bridge = platform_bridge();
        assert_eq!(bridge.platform_name(), "Desktop (stub)");
    }
}
