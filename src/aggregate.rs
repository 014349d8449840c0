//! Per-segment churn statistics
//!
//! Every function here is total: an empty input yields zero counts and a
//! churn rate of 0, never NaN.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::segment::{ActivityStatus, AnnotatedRecord};

/// Default balance above which a customer counts as high value
pub const DEFAULT_HIGH_VALUE_THRESHOLD: f64 = 100_000.0;

/// Column an aggregation groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    Geography,
    AgeGroup,
    Gender,
    BalanceSegment,
    ActivityStatus,
}

impl GroupKey {
    /// The grouping value of one record
    pub fn value_of<'a>(&self, record: &'a AnnotatedRecord) -> &'a str {
        match self {
            GroupKey::Geography => &record.record.geography,
            GroupKey::AgeGroup => record.age_group.label(),
            GroupKey::Gender => &record.record.gender,
            GroupKey::BalanceSegment => record.balance_segment.label(),
            GroupKey::ActivityStatus => record.activity.label(),
        }
    }
}

/// Percentage of `churned` within `total`, 0 when `total` is 0
pub fn churn_rate(churned: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        churned as f64 / total as f64 * 100.0
    }
}

/// Churn statistics of one segment value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAggregate {
    pub segment_value: String,
    pub total: usize,
    pub churned: usize,
    pub churn_rate_pct: f64,
}

impl SegmentAggregate {
    fn new(segment_value: &str) -> Self {
        Self {
            segment_value: segment_value.to_string(),
            total: 0,
            churned: 0,
            churn_rate_pct: 0.0,
        }
    }

    pub fn retained(&self) -> usize {
        self.total - self.churned
    }
}

/// Group records by `key` and count totals and churn per group.
///
/// Groups appear in order of first appearance; sort on the caller side when
/// a display order matters.
pub fn aggregate<'a, I>(records: I, key: GroupKey) -> Vec<SegmentAggregate>
where
    I: IntoIterator<Item = &'a AnnotatedRecord>,
{
    let mut groups: Vec<SegmentAggregate> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for record in records {
        let value = key.value_of(record);
        let slot = *index.entry(value).or_insert_with(|| {
            groups.push(SegmentAggregate::new(value));
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.total += 1;
        if record.exited() {
            group.churned += 1;
        }
    }

    for group in &mut groups {
        group.churn_rate_pct = churn_rate(group.churned, group.total);
    }
    groups
}

/// Sort aggregates by churn rate, highest first; ties keep their order
pub fn sort_by_churn_rate(aggregates: &mut [SegmentAggregate]) {
    aggregates.sort_by(|a, b| b.churn_rate_pct.total_cmp(&a.churn_rate_pct));
}

/// Group with the highest churn rate; on a tie the alphabetically first
/// segment value wins, whatever the input order
pub fn highest_churn(aggregates: &[SegmentAggregate]) -> Option<&SegmentAggregate> {
    aggregates.iter().max_by(|a, b| {
        a.churn_rate_pct
            .total_cmp(&b.churn_rate_pct)
            .then_with(|| b.segment_value.cmp(&a.segment_value))
    })
}

/// Headline counts over a set of records
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChurnSummary {
    pub total: usize,
    pub churned: usize,
    pub retained: usize,
    pub churn_rate_pct: f64,
    pub retention_rate_pct: f64,
}

impl ChurnSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AnnotatedRecord>,
    {
        let (total, churned) = count(records);
        let churn_rate_pct = churn_rate(churned, total);
        Self {
            total,
            churned,
            retained: total - churned,
            churn_rate_pct,
            retention_rate_pct: if total == 0 { 0.0 } else { 100.0 - churn_rate_pct },
        }
    }
}

fn count<'a, I>(records: I) -> (usize, usize)
where
    I: IntoIterator<Item = &'a AnnotatedRecord>,
{
    records.into_iter().fold((0, 0), |(total, churned), record| {
        (total + 1, churned + usize::from(record.exited()))
    })
}

/// Size and churn of one side of a partition
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartitionStats {
    pub total: usize,
    pub churned: usize,
    pub churn_rate_pct: f64,
}

impl PartitionStats {
    fn from_counts(total: usize, churned: usize) -> Self {
        Self {
            total,
            churned,
            churn_rate_pct: churn_rate(churned, total),
        }
    }
}

/// High-value versus regular customers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighValueSplit {
    pub threshold: f64,
    /// Balance strictly above the threshold
    pub high_value: PartitionStats,
    /// Balance at or below the threshold
    pub regular: PartitionStats,
    /// Summed balance of churned high-value customers
    pub balance_at_risk: f64,
}

/// Split records into (balance > threshold, balance <= threshold)
pub fn partition_high_value<'a, I>(
    records: I,
    threshold: f64,
) -> (Vec<&'a AnnotatedRecord>, Vec<&'a AnnotatedRecord>)
where
    I: IntoIterator<Item = &'a AnnotatedRecord>,
{
    records
        .into_iter()
        .partition(|record| record.balance() > threshold)
}

/// Churn of high-value and regular customers plus the balance at risk
pub fn high_value_split<'a, I>(records: I, threshold: f64) -> HighValueSplit
where
    I: IntoIterator<Item = &'a AnnotatedRecord>,
{
    let (high, regular) = partition_high_value(records, threshold);

    let (high_total, high_churned) = count(high.iter().copied());
    let (regular_total, regular_churned) = count(regular.iter().copied());
    let balance_at_risk: f64 = high
        .iter()
        .filter(|record| record.exited())
        .map(|record| record.balance())
        .sum();

    HighValueSplit {
        threshold,
        high_value: PartitionStats::from_counts(high_total, high_churned),
        regular: PartitionStats::from_counts(regular_total, regular_churned),
        balance_at_risk,
    }
}

/// Churn rates of active and inactive members
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityGap {
    pub active_rate_pct: f64,
    pub inactive_rate_pct: f64,
    /// Absolute difference in percentage points
    pub difference_pp: f64,
}

pub fn activity_gap<'a, I>(records: I) -> ActivityGap
where
    I: IntoIterator<Item = &'a AnnotatedRecord>,
{
    let mut active = (0, 0);
    let mut inactive = (0, 0);
    for record in records {
        let side = match record.activity {
            ActivityStatus::Active => &mut active,
            ActivityStatus::Inactive => &mut inactive,
        };
        side.0 += 1;
        side.1 += usize::from(record.exited());
    }

    let active_rate_pct = churn_rate(active.1, active.0);
    let inactive_rate_pct = churn_rate(inactive.1, inactive.0);
    ActivityGap {
        active_rate_pct,
        inactive_rate_pct,
        difference_pp: (inactive_rate_pct - active_rate_pct).abs(),
    }
}

/// Mean balance of retained and churned customers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceByOutcome {
    pub retained_mean: f64,
    pub churned_mean: f64,
}

pub fn balance_by_outcome<'a, I>(records: I) -> BalanceByOutcome
where
    I: IntoIterator<Item = &'a AnnotatedRecord>,
{
    let mut retained = (0usize, 0.0f64);
    let mut churned = (0usize, 0.0f64);
    for record in records {
        let side = if record.exited() { &mut churned } else { &mut retained };
        side.0 += 1;
        side.1 += record.balance();
    }

    let mean = |(n, sum): (usize, f64)| if n == 0 { 0.0 } else { sum / n as f64 };
    BalanceByOutcome {
        retained_mean: mean(retained),
        churned_mean: mean(churned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CustomerRecord;
    use crate::segment::annotate;

    fn records(rows: &[(&str, &str, i64, f64, bool, bool)]) -> Vec<AnnotatedRecord> {
        annotate(rows.iter().map(
            |&(geography, gender, age, balance, active, exited)| CustomerRecord {
                geography: geography.to_string(),
                gender: gender.to_string(),
                age,
                balance,
                is_active_member: active,
                exited,
            },
        ))
    }

    fn scenario() -> Vec<AnnotatedRecord> {
        records(&[
            ("Germany", "Male", 25, 0.0, true, false),
            ("France", "Female", 50, 120_000.0, false, true),
            ("Germany", "Female", 70, 60_000.0, false, true),
        ])
    }

    #[test]
    fn test_aggregate_by_geography() {
        let data = scenario();
        let groups = aggregate(&data, GroupKey::Geography);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].segment_value, "Germany");
        assert_eq!((groups[0].total, groups[0].churned), (2, 1));
        assert_eq!(groups[0].churn_rate_pct, 50.0);
        assert_eq!(groups[1].segment_value, "France");
        assert_eq!((groups[1].total, groups[1].churned), (1, 1));
        assert_eq!(groups[1].churn_rate_pct, 100.0);
    }

    #[test]
    fn test_aggregate_totals_sum_to_input() {
        let data = scenario();
        for key in [
            GroupKey::Geography,
            GroupKey::AgeGroup,
            GroupKey::Gender,
            GroupKey::BalanceSegment,
            GroupKey::ActivityStatus,
        ] {
            let groups = aggregate(&data, key);
            assert_eq!(groups.iter().map(|g| g.total).sum::<usize>(), data.len());
            for group in &groups {
                assert!(group.churned <= group.total);
                assert!((0.0..=100.0).contains(&group.churn_rate_pct));
            }
        }
    }

    #[test]
    fn test_aggregate_uses_segment_labels() {
        let data = scenario();
        let groups = aggregate(&data, GroupKey::BalanceSegment);
        let labels: Vec<&str> = groups.iter().map(|g| g.segment_value.as_str()).collect();
        assert_eq!(labels, ["Zero", "High", "Medium"]);
    }

    #[test]
    fn test_empty_input() {
        let data: Vec<AnnotatedRecord> = Vec::new();

        assert!(aggregate(&data, GroupKey::Gender).is_empty());

        let split = high_value_split(&data, DEFAULT_HIGH_VALUE_THRESHOLD);
        assert_eq!(split.high_value, PartitionStats::default());
        assert_eq!(split.regular, PartitionStats::default());
        assert_eq!(split.balance_at_risk, 0.0);

        let summary = ChurnSummary::from_records(&data);
        assert_eq!(summary, ChurnSummary::default());
        assert_eq!(activity_gap(&data), ActivityGap::default());
        assert_eq!(balance_by_outcome(&data), BalanceByOutcome::default());
    }

    #[test]
    fn test_churn_rate_zero_denominator() {
        assert_eq!(churn_rate(0, 0), 0.0);
        assert_eq!(churn_rate(1, 4), 25.0);
    }

    #[test]
    fn test_high_value_split() {
        let data = scenario();
        let split = high_value_split(&data, 100_000.0);

        assert_eq!(split.high_value.total, 1);
        assert_eq!(split.high_value.churn_rate_pct, 100.0);
        assert_eq!(split.balance_at_risk, 120_000.0);
        assert_eq!(split.regular.total, 2);
        assert_eq!(split.regular.churn_rate_pct, 50.0);
    }

    #[test]
    fn test_high_value_threshold_is_strict() {
        let data = records(&[
            ("Spain", "Male", 40, 100_000.0, true, true),
            ("Spain", "Male", 40, 100_000.01, true, true),
        ]);
        let (high, regular) = partition_high_value(&data, 100_000.0);

        assert_eq!(high.len(), 1);
        assert_eq!(regular.len(), 1);
        assert_eq!(regular[0].balance(), 100_000.0);
    }

    #[test]
    fn test_summary() {
        let data = scenario();
        let summary = ChurnSummary::from_records(&data);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.churned, 2);
        assert_eq!(summary.retained, 1);
        assert!((summary.churn_rate_pct - 200.0 / 3.0).abs() < 1e-9);
        assert!((summary.retention_rate_pct - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_activity_gap() {
        let data = records(&[
            ("France", "Male", 30, 0.0, true, false),
            ("France", "Male", 30, 0.0, true, true),
            ("France", "Male", 30, 0.0, false, true),
            ("France", "Male", 30, 0.0, false, true),
        ]);
        let gap = activity_gap(&data);

        assert_eq!(gap.active_rate_pct, 50.0);
        assert_eq!(gap.inactive_rate_pct, 100.0);
        assert_eq!(gap.difference_pp, 50.0);
    }

    #[test]
    fn test_balance_by_outcome() {
        let data = scenario();
        let means = balance_by_outcome(&data);

        assert_eq!(means.retained_mean, 0.0);
        assert_eq!(means.churned_mean, 90_000.0);
    }

    #[test]
    fn test_highest_churn_and_sort() {
        let data = records(&[
            ("France", "Male", 30, 0.0, true, false),
            ("Germany", "Male", 30, 0.0, true, true),
            ("Spain", "Male", 30, 0.0, true, true),
        ]);
        let mut groups = aggregate(&data, GroupKey::Geography);

        assert_eq!(highest_churn(&groups).unwrap().segment_value, "Germany");
        assert!(highest_churn(&[]).is_none());

        sort_by_churn_rate(&mut groups);
        let order: Vec<&str> = groups.iter().map(|g| g.segment_value.as_str()).collect();
        assert_eq!(order, ["Germany", "Spain", "France"]);
    }

    #[test]
    fn test_highest_churn_tie_prefers_alphabetical_order() {
        let data = records(&[
            ("Spain", "Male", 30, 0.0, true, true),
            ("Germany", "Male", 30, 0.0, true, true),
            ("France", "Male", 30, 0.0, true, false),
        ]);
        let groups = aggregate(&data, GroupKey::Geography);
        assert_eq!(groups[0].segment_value, "Spain");

        assert_eq!(highest_churn(&groups).unwrap().segment_value, "Germany");
    }

    #[test]
    fn test_aggregate_accepts_filtered_views() {
        let data = scenario();
        let view: Vec<&AnnotatedRecord> = data.iter().filter(|r| r.exited()).collect();
        let groups = aggregate(view.iter().copied(), GroupKey::Gender);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].segment_value, "Female");
        assert_eq!(groups[0].total, 2);
    }
}
