//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::AnalysisConfig;
use crate::filter::{FilterSet, ALL};

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Console summary
    Text,
    /// JSON payload for a dashboard front-end
    Json,
}

/// Churn statistics for bank customers, broken down by segment
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the input CSV file (overrides the config file)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Only include customers from this country
    #[arg(long, default_value = ALL)]
    pub country: String,

    /// Only include this age group: Young, MiddleAge, Senior or Elderly
    #[arg(long, default_value = ALL)]
    pub age_group: String,

    /// Only include this gender
    #[arg(long, default_value = ALL)]
    pub gender: String,

    /// Only include Active or Inactive members
    #[arg(long, default_value = ALL)]
    pub activity: String,

    /// Balance above which a customer counts as high value (overrides the config file)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Filters selected on the command line; "All" leaves a filter unset
    pub fn filter_set(&self) -> crate::Result<FilterSet> {
        let filters =
            FilterSet::from_choices(&self.country, &self.age_group, &self.gender, &self.activity)?;
        Ok(filters)
    }

    /// Settings from the config file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> crate::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() {
                anyhow::bail!("Invalid threshold value: {}", threshold);
            }
            config.high_value_threshold = threshold;
        }
        Ok(config)
    }
}
