//! Analysis settings: built-in defaults, optionally overridden by a TOML file

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_HIGH_VALUE_THRESHOLD;
use crate::data::{LoadOptions, DEFAULT_DROP_COLUMNS};

const DEFAULT_INPUT: &str = "European_Bank.csv";

/// Settings for one analysis run
///
/// Every field is optional in the file; missing ones keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Source dataset
    pub input: PathBuf,
    /// Field separator of the source file
    pub delimiter: char,
    /// Columns discarded on load when present
    pub drop_columns: Vec<String>,
    /// Balance above which a customer counts as high value
    pub high_value_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            delimiter: ',',
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|c| c.to_string()).collect(),
            high_value_threshold: DEFAULT_HIGH_VALUE_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    /// Read settings from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if !self.high_value_threshold.is_finite() {
            anyhow::bail!("high_value_threshold must be a finite number");
        }
        Ok(())
    }

    /// Loader options derived from these settings
    pub fn load_options(&self) -> crate::Result<LoadOptions> {
        let options = LoadOptions::default()
            .with_delimiter(self.delimiter)?
            .with_drop_columns(self.drop_columns.iter().cloned());
        Ok(options)
    }
}
