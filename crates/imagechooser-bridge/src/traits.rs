// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native collaborators of the
// image chooser: the picker launcher and the media metadata store.

use imagechooser_core::RequestCode;
use imagechooser_core::error::Result;

/// Unified bridge that groups all native capabilities the chooser needs.
pub trait PlatformBridge: NativeImagePicker + NativeMediaStore + Send + Sync {
    /// Human-readable platform name (e.g. "Android", "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Everything the platform needs to present the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerIntent {
    pub request_code: RequestCode,
    /// MIME filter, e.g. `image/*`.
    pub mime_type: String,
    /// Title shown on the system chooser.
    pub chooser_title: String,
}

/// Launch the system image picker.
pub trait NativeImagePicker {
    /// Present the picker. Returns once the UI has been dispatched; the
    /// selection arrives later as an activity result carrying
    /// `intent.request_code`.
    fn launch_image_picker(&self, intent: &PickerIntent) -> Result<()>;
}

/// Columns of the platform media store the chooser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaColumn {
    /// Absolute filesystem path (`MediaStore.MediaColumns.DATA`).
    Data,
    /// Human-readable file name (`OpenableColumns.DISPLAY_NAME`).
    DisplayName,
    /// Size in bytes (`OpenableColumns.SIZE`).
    Size,
}

impl MediaColumn {
    /// Column name as understood by the content provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "_data",
            Self::DisplayName => "_display_name",
            Self::Size => "_size",
        }
    }
}

/// A result set returned by [`NativeMediaStore::query`].
///
/// Implementations release the underlying platform cursor when dropped, so
/// a cursor is closed on every exit path of the code that holds it.
pub trait MediaCursor {
    /// Move to the first row. Returns `false` when the result set is empty.
    fn move_to_first(&mut self) -> Result<bool>;

    /// Read a text column of the current row. `None` for SQL NULL.
    fn get_string(&mut self, column: MediaColumn) -> Result<Option<String>>;

    /// Read an integer column of the current row. `None` for SQL NULL.
    fn get_long(&mut self, column: MediaColumn) -> Result<Option<i64>>;
}

/// Query the platform's content metadata store.
pub trait NativeMediaStore {
    /// Query `uri` for the given columns. An empty projection asks for all
    /// columns. Returns `Ok(None)` when the provider hands back no cursor.
    fn query<'a>(
        &'a self,
        uri: &str,
        projection: &[MediaColumn],
    ) -> Result<Option<Box<dyn MediaCursor + 'a>>>;
}
