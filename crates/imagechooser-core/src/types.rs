// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the image chooser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Correlation tag passed to `startActivityForResult` and echoed back in
/// the activity result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestCode(pub i32);

impl RequestCode {
    /// Request code used for the image picker unless configured otherwise.
    pub const PICK_IMAGE: Self = Self(3500);
}

impl std::fmt::Display for RequestCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome status reported by the platform when the picker activity finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    /// `Activity.RESULT_OK` (-1).
    Ok,
    /// `Activity.RESULT_CANCELED` (0).
    Canceled,
    /// Any other value, e.g. `RESULT_FIRST_USER` and above.
    Other(i32),
}

impl ResultCode {
    pub const RAW_OK: i32 = -1;
    pub const RAW_CANCELED: i32 = 0;

    pub fn raw(self) -> i32 {
        match self {
            Self::Ok => Self::RAW_OK,
            Self::Canceled => Self::RAW_CANCELED,
            Self::Other(code) => code,
        }
    }
}

impl From<i32> for ResultCode {
    fn from(raw: i32) -> Self {
        match raw {
            Self::RAW_OK => Self::Ok,
            Self::RAW_CANCELED => Self::Canceled,
            other => Self::Other(other),
        }
    }
}

/// The "activity finished" event delivered by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityResult {
    pub request_code: RequestCode,
    pub result_code: ResultCode,
    /// Raw content locator of the chosen item (`Intent.getData()`), if any.
    pub data: Option<String>,
}

impl ActivityResult {
    /// Build an event from the raw integers the platform hands over.
    pub fn from_raw(request_code: i32, result_code: i32, data: Option<String>) -> Self {
        Self {
            request_code: RequestCode(request_code),
            result_code: ResultCode::from(result_code),
            data,
        }
    }
}

/// Identifies the image chosen by the user.
///
/// Classified once from the raw locator: `file://` URIs and bare absolute
/// paths point straight at the filesystem, anything else (`content://`,
/// provider-specific schemes) is a record in the platform's media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentReference {
    DirectPath { path: PathBuf, locator: String },
    Indirect { locator: String },
}

impl ContentReference {
    /// Classify a raw locator. Returns `None` for an empty locator.
    ///
    /// Surrounding whitespace is ignored for classification only; the
    /// locator itself is kept exactly as received.
    pub fn parse(locator: &str) -> Option<Self> {
        let trimmed = locator.trim();
        if trimmed.is_empty() {
            return None;
        }
        let raw = locator.to_owned();

        if trimmed.starts_with('/') {
            return Some(Self::DirectPath {
                path: PathBuf::from(trimmed),
                locator: raw,
            });
        }

        match Url::parse(trimmed) {
            Ok(url) if url.scheme() == "file" => {
                // Hosts other than `localhost` cannot be mapped onto a local
                // path by `to_file_path`; use the URL path on its own.
                let path = url.to_file_path().unwrap_or_else(|()| decoded_url_path(&url));
                Some(Self::DirectPath { path, locator: raw })
            }
            _ => Some(Self::Indirect { locator: raw }),
        }
    }

    /// The locator string as received from the platform.
    pub fn locator(&self) -> &str {
        match self {
            Self::DirectPath { locator, .. } | Self::Indirect { locator } => locator,
        }
    }

    /// Filesystem path, for direct references only.
    pub fn direct_path(&self) -> Option<&Path> {
        match self {
            Self::DirectPath { path, .. } => Some(path),
            Self::Indirect { .. } => None,
        }
    }

    /// Final, percent-decoded path segment of the locator.
    pub fn last_segment(&self) -> Option<String> {
        match self {
            Self::DirectPath { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            Self::Indirect { locator } => {
                let raw = match Url::parse(locator) {
                    Ok(url) => url
                        .path_segments()
                        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                        .map(str::to_owned),
                    Err(_) => locator
                        .split('/')
                        .filter(|s| !s.is_empty())
                        .last()
                        .map(str::to_owned),
                }?;
                let decoded = urlencoding::decode(&raw)
                    .map(|cow| cow.into_owned())
                    .unwrap_or(raw);
                Some(decoded)
            }
        }
    }
}

fn decoded_url_path(url: &Url) -> PathBuf {
    let raw = url.path();
    urlencoding::decode(raw)
        .map(|cow| PathBuf::from(cow.as_ref()))
        .unwrap_or_else(|_| PathBuf::from(raw))
}

impl std::fmt::Display for ContentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.locator())
    }
}

/// Metadata for the image the user picked.
///
/// Serialises to the object shape the host expects:
/// `{ "height", "width", "size", "name", "uri" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSelection {
    pub height: u32,
    pub width: u32,
    /// Size in bytes; 0 when the platform could not report it.
    pub size: u64,
    /// Display name.
    pub name: String,
    /// Locator of the selected image, as delivered by the picker.
    pub uri: String,
}

impl ImageSelection {
    /// JSON form handed to the host's promise.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
