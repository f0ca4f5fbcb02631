// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content reference resolution: filesystem path, display name, byte size.
//
// Direct references are answered from the path itself and the filesystem.
// Indirect references go through the platform media store; each lookup
// recovers locally from an empty or failing query.

use std::path::PathBuf;

use tracing::{debug, warn};

use imagechooser_bridge::{MediaColumn, NativeMediaStore};
use imagechooser_core::ContentReference;
use imagechooser_core::error::Result;

/// Resolves metadata for a [`ContentReference`] against a media store.
pub struct MetadataResolver<'a, S: NativeMediaStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: NativeMediaStore + ?Sized> MetadataResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Filesystem path backing the reference, or `None` when the media store
    /// has no usable record for it.
    pub fn resolve_path(&self, reference: &ContentReference) -> Option<PathBuf> {
        if let Some(path) = reference.direct_path() {
            return Some(path.to_path_buf());
        }

        let locator = reference.locator();
        match self.first_string(locator, MediaColumn::Data) {
            Ok(Some(path)) if !path.is_empty() => Some(PathBuf::from(path)),
            Ok(_) => {
                debug!(locator, "No storage path recorded for content reference");
                None
            }
            Err(err) => {
                warn!(locator, error = %err, "Path lookup failed");
                None
            }
        }
    }

    /// Display name, falling back to the locator's trailing segment.
    pub fn resolve_name(&self, reference: &ContentReference) -> String {
        let fallback = || {
            reference
                .last_segment()
                .unwrap_or_else(|| reference.locator().to_owned())
        };

        match reference {
            ContentReference::DirectPath { .. } => fallback(),
            ContentReference::Indirect { locator } => {
                match self.first_string(locator, MediaColumn::DisplayName) {
                    Ok(Some(name)) if !name.is_empty() => name,
                    Ok(_) => fallback(),
                    Err(err) => {
                        warn!(locator, error = %err, "Display name lookup failed, using trailing segment");
                        fallback()
                    }
                }
            }
        }
    }

    /// Size in bytes; 0 when it cannot be determined.
    pub fn resolve_size(&self, reference: &ContentReference) -> u64 {
        match reference {
            ContentReference::DirectPath { path, .. } => match std::fs::metadata(path) {
                Ok(meta) => meta.len(),
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "Cannot stat picked file");
                    0
                }
            },
            ContentReference::Indirect { locator } => {
                match self.first_long(locator, MediaColumn::Size) {
                    Ok(Some(size)) => u64::try_from(size).unwrap_or(0),
                    Ok(None) => 0,
                    Err(err) => {
                        warn!(locator, error = %err, "Size lookup failed, reporting 0");
                        0
                    }
                }
            }
        }
    }

    // -- Queries --------------------------------------------------------------
    // The cursor is dropped, and so closed, on every return path below.

    fn first_string(&self, locator: &str, column: MediaColumn) -> Result<Option<String>> {
        let Some(mut cursor) = self.store.query(locator, &[column])? else {
            return Ok(None);
        };
        if !cursor.move_to_first()? {
            return Ok(None);
        }
        cursor.get_string(column)
    }

    fn first_long(&self, locator: &str, column: MediaColumn) -> Result<Option<i64>> {
        let Some(mut cursor) = self.store.query(locator, &[column])? else {
            return Ok(None);
        };
        if !cursor.move_to_first()? {
            return Ok(None);
        }
        cursor.get_long(column)
    }
}
