//! Engine and report configuration
//!
//! Configuration is read from a TOML file (`planvar.toml` by default). Every
//! section and key is optional; anything left out falls back to the defaults
//! below.
//!
//! ```toml
//! [engine]
//! division_policy = "sentinel"
//!
//! [thresholds]
//! major_pct = 15
//! efficiency_band = 0.2
//! projection_factor = 0.5
//!
//! [report]
//! title = "Warehouse construction"
//! currency = "RUB"
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the metrics engine does when a ratio's denominator is zero
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroDivisionPolicy {
    /// Fail the whole batch with `AnalysisError::DivisionByZero`
    #[default]
    Reject,
    /// Record the metric as undefined (`None`) and keep going
    Sentinel,
}

/// Rule thresholds for the recommendation engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Deviation percent above which a delay/overrun is major
    pub major_pct: Decimal,
    /// Half-width of the "normal" efficiency band
    pub efficiency_band: Decimal,
    /// Factor applied to a deviation for the projected effect text
    pub projection_factor: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            major_pct: Decimal::TEN,
            efficiency_band: Decimal::new(1, 1),
            projection_factor: Decimal::new(5, 1),
        }
    }
}

/// Everything the two engines need
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub division_policy: ZeroDivisionPolicy,
    #[serde(skip)]
    pub thresholds: Thresholds,
}

impl EngineConfig {
    pub fn sentinel() -> Self {
        Self {
            division_policy: ZeroDivisionPolicy::Sentinel,
            ..Default::default()
        }
    }
}

/// Report presentation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Report title; the input file stem is used when absent
    pub title: Option<String>,
    /// Currency label for budget columns
    pub currency: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: None,
            currency: "RUB".into(),
        }
    }
}

/// Top-level configuration file
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub thresholds: Thresholds,
    pub report: ReportConfig,
}

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid threshold: {0}")]
    Threshold(String),
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(input)?;
        config.check()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Engine settings with the configured thresholds folded in
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            division_policy: self.engine.division_policy,
            thresholds: self.thresholds.clone(),
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.thresholds.major_pct < Decimal::ZERO {
            return Err(ConfigError::Threshold(format!(
                "major_pct must be non-negative, got {}",
                self.thresholds.major_pct
            )));
        }
        if self.thresholds.efficiency_band < Decimal::ZERO {
            return Err(ConfigError::Threshold(format!(
                "efficiency_band must be non-negative, got {}",
                self.thresholds.efficiency_band
            )));
        }
        Ok(())
    }
}
