//! Portfolio configuration.
//!
//! Options are read from a JSON document. Every field is optional:
//!
//! ```json
//! {
//!   "term_policy": { "calendar_months": 12 },
//!   "limits": { "max_quantity": "1000000000", "whole_units": true },
//!   "reconcile": { "value_tolerance": "0.01", "split_ratios": ["2", "5", "10"] }
//! }
//! ```

use std::path::{Path, PathBuf};

use lotbook_core::TermPolicy;
use lotbook_ledger::Limits;
use lotbook_reconcile::ReconcileOptions;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Name of the options file looked up under the user's config directory.
pub const OPTIONS_FILE: &str = "options.json";

/// Settings for a [`Portfolio`](crate::Portfolio).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// How holding periods are classified.
    pub term_policy: TermPolicy,
    /// Bounds checked when a trade is submitted.
    pub limits: Limits,
    /// Tolerances used against tax reports.
    pub reconcile: ReconcileOptions,
}

impl Options {
    /// Parse options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read options from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// `<config dir>/lotbook/options.json`, if the platform has a config
    /// directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lotbook").join(OPTIONS_FILE))
    }

    /// Load from [`Options::default_path`] when that file exists, otherwise
    /// fall back to the defaults.
    pub fn load_default() -> Result<Self, Error> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }
}
