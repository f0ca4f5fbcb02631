// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chooser configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::RequestCode;

/// What to do when `pick_image` is called while a previous pick is still
/// awaiting its activity result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersedePolicy {
    /// Reject the outstanding request with `Superseded` and start the new one.
    #[default]
    RejectPrevious,
    /// Keep the outstanding request and reject the new one with `Busy`.
    RefuseNew,
}

/// Settings for the image chooser module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChooserConfig {
    /// Request code passed to `startActivityForResult` and matched against
    /// incoming activity results.
    pub request_code: RequestCode,
    /// MIME filter for the picker intent.
    pub mime_type: String,
    /// Title of the system chooser dialog.
    pub chooser_title: String,
    pub supersede_policy: SupersedePolicy,
}

impl Default for ChooserConfig {
    fn default() -> Self {
        Self {
            request_code: RequestCode::PICK_IMAGE,
            mime_type: "image/*".into(),
            chooser_title: "Pick an image".into(),
            supersede_policy: SupersedePolicy::default(),
        }
    }
}

impl ChooserConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file written as JSON.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }
}
