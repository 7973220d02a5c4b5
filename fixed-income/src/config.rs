//! Pricing configuration.
//!
//! Groups the solver and schedule policies into one TOML document:
//!
//! ```toml
//! [schedule]
//! long_stub_threshold = 1.5
//!
//! [bootstrap]
//! accuracy = 1e-12
//! max_discount = 1.5
//!
//! [yield_solver]
//! guess = 0.03
//! ```
//!
//! Every table and field is optional; missing ones take their defaults.

use ql_bootstrap::BootstrapConfig;
use ql_cashflows::YieldSolverConfig;
use ql_time::SchedulePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to load a [`PricingConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("reading {path}: {source}")]
    Io {
        /// The file requested.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid TOML or has fields of the wrong type.
    #[error("parsing pricing config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Schedule, bootstrap, and yield-solver settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Stub classification and month-end handling.
    pub schedule: SchedulePolicy,
    /// Curve bootstrap solver.
    pub bootstrap: BootstrapConfig,
    /// Price-to-yield solver.
    pub yield_solver: YieldSolverConfig,
}

impl PricingConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded pricing config");
        Ok(config)
    }
}
