// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the image chooser.
//
// The `Display` text of each variant is the rejection message handed back to
// the host, so the wording of the picker variants must not change.

use thiserror::Error;

/// Top-level error type for all image chooser operations.
#[derive(Debug, Error)]
pub enum ChooserError {
    // -- Picker outcomes --
    #[error("Image picker was cancelled")]
    Cancelled,

    #[error("Failed to pick image")]
    NoSelection,

    #[error("Failed resolve image path")]
    UnresolvedPath,

    #[error("Image picker request was superseded by a new request")]
    Superseded,

    #[error("Image picker is already open")]
    Busy,

    #[error("Image picker returned unexpected result code {0}")]
    UnexpectedResult(i32),

    /// The platform could not present the picker. Carries the platform's
    /// own description verbatim.
    #[error("{0}")]
    Launch(String),

    #[error("image chooser module was dropped before the picker returned")]
    ModuleDropped,

    // -- Metadata --
    #[error("failed to read image bounds: {0}")]
    Decode(String),

    #[error("media store query failed: {0}")]
    MediaStore(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl ChooserError {
    /// Stable machine-readable code for hosts whose promise rejection takes
    /// a code alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cancelled => "E_PICKER_CANCELLED",
            Self::NoSelection => "E_NO_IMAGE_DATA_FOUND",
            Self::UnresolvedPath => "E_FAILED_TO_RESOLVE_PATH",
            Self::Superseded => "E_PICKER_SUPERSEDED",
            Self::Busy => "E_PICKER_BUSY",
            Self::UnexpectedResult(_) => "E_UNEXPECTED_RESULT",
            Self::Launch(_) => "E_FAILED_TO_SHOW_PICKER",
            Self::ModuleDropped => "E_MODULE_DROPPED",
            Self::Decode(_) => "E_DECODE",
            Self::MediaStore(_) => "E_MEDIA_STORE",
            Self::Io(_) => "E_IO",
            Self::Serialization(_) => "E_SERIALIZATION",
            Self::Bridge(_) => "E_BRIDGE",
            Self::PlatformUnavailable => "E_PLATFORM_UNAVAILABLE",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ChooserError>;
