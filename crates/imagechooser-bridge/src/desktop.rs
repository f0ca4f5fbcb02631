// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge backed by the native file dialog (`rfd`).
//
// The dialog blocks, so it runs on its own thread and reports back the same
// way Android does: as an `ActivityResult` carrying the request code. The
// receiving half of the channel belongs to whoever drives the chooser module.
//
// macOS only allows native dialogs on the main thread, so there the
// interactive dialog is unavailable and only `preselected` works.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use url::Url;

use imagechooser_core::error::{ChooserError, Result};
use imagechooser_core::{ActivityResult, ResultCode};

use crate::traits::*;

/// Extensions offered for `image/*`.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

/// Bridge that presents a native open-file dialog and posts its outcome as
/// an activity result.
pub struct DesktopBridge {
    results: UnboundedSender<ActivityResult>,
    /// Answer every launch with this file instead of opening a dialog.
    preselected: Option<PathBuf>,
}

impl DesktopBridge {
    /// Create the bridge and the channel on which picker outcomes arrive.
    pub fn new() -> (Self, UnboundedReceiver<ActivityResult>) {
        let (tx, rx) = unbounded_channel();
        (
            Self {
                results: tx,
                preselected: None,
            },
            rx,
        )
    }

    /// Headless variant: every launch immediately "picks" `path`.
    pub fn preselected(path: impl Into<PathBuf>) -> (Self, UnboundedReceiver<ActivityResult>) {
        let path = path.into();
        let (mut bridge, rx) = Self::new();
        bridge.preselected = Some(std::path::absolute(&path).unwrap_or(path));
        (bridge, rx)
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        "Desktop"
    }
}

impl NativeImagePicker for DesktopBridge {
    fn launch_image_picker(&self, intent: &PickerIntent) -> Result<()> {
        let results = self.results.clone();
        let request_code = intent.request_code;

        if let Some(path) = &self.preselected {
            tracing::info!(%request_code, path = %path.display(), "Desktop: using preselected file");
            return results
                .send(ActivityResult {
                    request_code,
                    result_code: ResultCode::Ok,
                    data: file_locator(path),
                })
                .map_err(|_| ChooserError::Launch("picker result receiver is gone".into()));
        }

        if cfg!(target_os = "macos") {
            tracing::warn!(%request_code, "Desktop: file dialog needs the main thread on macOS");
            return Err(ChooserError::Launch(
                "file dialog is not available off the main thread on macOS".into(),
            ));
        }

        let title = intent.chooser_title.clone();
        let extensions = extensions_for(&intent.mime_type);

        tracing::info!(%request_code, ?extensions, "Desktop: opening file dialog");

        std::thread::Builder::new()
            .name("imagechooser-dialog".into())
            .spawn(move || {
                let picked = rfd::FileDialog::new()
                    .set_title(&title)
                    .add_filter("Images", extensions.as_slice())
                    .pick_file();

                let event = match picked {
                    Some(path) => ActivityResult {
                        request_code,
                        result_code: ResultCode::Ok,
                        data: file_locator(&path),
                    },
                    None => ActivityResult {
                        request_code,
                        result_code: ResultCode::Canceled,
                        data: None,
                    },
                };

                if results.send(event).is_err() {
                    tracing::warn!("Desktop: picker result dropped, receiver is gone");
                }
            })
            .map_err(|e| ChooserError::Launch(format!("failed to spawn dialog thread: {e}")))?;

        Ok(())
    }
}

impl NativeMediaStore for DesktopBridge {
    /// The desktop picker only ever yields `file://` locators, so there is no
    /// media store behind it.
    fn query<'a>(
        &'a self,
        _uri: &str,
        _projection: &[MediaColumn],
    ) -> Result<Option<Box<dyn MediaCursor + 'a>>> {
        Err(ChooserError::PlatformUnavailable)
    }
}

/// Map a MIME filter onto file-dialog extensions.
fn extensions_for(mime_type: &str) -> Vec<&'static str> {
    match mime_type {
        "image/png" => vec!["png"],
        "image/jpeg" | "image/jpg" => vec!["jpg", "jpeg"],
        "image/gif" => vec!["gif"],
        "image/webp" => vec!["webp"],
        "image/bmp" => vec!["bmp"],
        "image/tiff" => vec!["tif", "tiff"],
        _ => IMAGE_EXTENSIONS.to_vec(),
    }
}

/// `file://` locator for a picked path, falling back to the bare path.
fn file_locator(path: &Path) -> Option<String> {
    match Url::from_file_path(path) {
        Ok(url) => Some(url.to_string()),
        Err(()) => Some(path.to_string_lossy().into_owned()),
    }
}
