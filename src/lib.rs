//! churnscope: segmented churn statistics for bank customer datasets
//!
//! The pipeline loads a customer CSV once, derives age, balance and activity
//! segments for every record, then answers filtered group-by queries over
//! that immutable snapshot.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod report;
pub mod segment;

// Re-export public items for easier access
pub use aggregate::{
    aggregate, high_value_split, partition_high_value, ChurnSummary, GroupKey, HighValueSplit,
    SegmentAggregate,
};
pub use cli::Args;
pub use config::AnalysisConfig;
pub use data::{load, CustomerRecord, CustomerTable, LoadOptions};
pub use error::{DataLoadError, UnknownSegment};
pub use filter::{filter, FilterSet};
pub use report::AnalysisReport;
pub use segment::{annotate, ActivityStatus, AgeGroup, AnnotatedRecord, BalanceSegment};

/// Common result type used by the application layers
pub type Result<T> = anyhow::Result<T>;
