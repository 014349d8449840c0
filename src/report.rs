//! Report assembly and rendering for the console and dashboard consumers

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{
    activity_gap, aggregate, balance_by_outcome, high_value_split, highest_churn, ActivityGap,
    BalanceByOutcome, ChurnSummary, GroupKey, HighValueSplit, SegmentAggregate,
};
use crate::filter::{filter, FilterSet};
use crate::segment::AnnotatedRecord;

const RULE_WIDTH: usize = 70;

/// Every statistic for one filtered view of the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub filters: FilterSet,
    pub summary: ChurnSummary,
    pub by_geography: Vec<SegmentAggregate>,
    pub by_age_group: Vec<SegmentAggregate>,
    pub by_gender: Vec<SegmentAggregate>,
    pub by_balance_segment: Vec<SegmentAggregate>,
    pub by_activity: Vec<SegmentAggregate>,
    pub activity_gap: ActivityGap,
    pub balance_by_outcome: BalanceByOutcome,
    pub high_value: HighValueSplit,
    /// Country with the highest churn rate, absent for an empty view
    pub highest_churn_country: Option<SegmentAggregate>,
}

impl AnalysisReport {
    /// Filter `records` and compute every statistic over the result
    pub fn build(records: &[AnnotatedRecord], filters: &FilterSet, threshold: f64) -> Self {
        let view = filter(records, filters);
        debug!(
            admitted = view.len(),
            total = records.len(),
            "applied filters"
        );

        let by = |key| aggregate(view.iter().copied(), key);
        let by_geography = by(GroupKey::Geography);
        let highest_churn_country = highest_churn(&by_geography).cloned();

        Self {
            filters: filters.clone(),
            summary: ChurnSummary::from_records(view.iter().copied()),
            by_age_group: by(GroupKey::AgeGroup),
            by_gender: by(GroupKey::Gender),
            by_balance_segment: by(GroupKey::BalanceSegment),
            by_activity: by(GroupKey::ActivityStatus),
            activity_gap: activity_gap(view.iter().copied()),
            balance_by_outcome: balance_by_outcome(view.iter().copied()),
            high_value: high_value_split(view.iter().copied(), threshold),
            by_geography,
            highest_churn_country,
        }
    }

    /// Pretty JSON payload for a chart front-end
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Console summary of the report
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        let s = &self.summary;

        writeln!(f, "{rule}\nOVERALL CHURN\n{rule}")?;
        writeln!(f, "{}", describe_filters(&self.filters))?;
        writeln!(
            f,
            "Total: {} | Churned: {} | Retained: {} | Rate: {:.2}%\n",
            format_count(s.total),
            format_count(s.churned),
            format_count(s.retained),
            s.churn_rate_pct
        )?;

        write_table(f, &rule, "CHURN BY COUNTRY", &self.by_geography)?;
        write_table(f, &rule, "CHURN BY AGE GROUP", &self.by_age_group)?;
        write_table(f, &rule, "CHURN BY GENDER", &self.by_gender)?;
        write_table(f, &rule, "CHURN BY BALANCE SEGMENT", &self.by_balance_segment)?;

        let gap = &self.activity_gap;
        writeln!(f, "{rule}\nACTIVITY STATUS IMPACT\n{rule}")?;
        writeln!(f, "Active: {:.2}%", gap.active_rate_pct)?;
        writeln!(f, "Inactive: {:.2}%", gap.inactive_rate_pct)?;
        writeln!(f, "Difference: {:.2}pp\n", gap.difference_pp)?;

        let means = &self.balance_by_outcome;
        writeln!(f, "{rule}\nAVERAGE BALANCE BY OUTCOME\n{rule}")?;
        writeln!(f, "Retained: {}", format_currency(means.retained_mean))?;
        writeln!(f, "Churned: {}\n", format_currency(means.churned_mean))?;

        let hv = &self.high_value;
        writeln!(f, "{rule}\nHIGH-VALUE CUSTOMER RISK\n{rule}")?;
        writeln!(
            f,
            "High-value customers (> {}): {}",
            format_currency(hv.threshold),
            format_count(hv.high_value.total)
        )?;
        writeln!(f, "Their churn rate: {:.2}%", hv.high_value.churn_rate_pct)?;
        writeln!(
            f,
            "Regular customers: {} | churn rate: {:.2}%",
            format_count(hv.regular.total),
            hv.regular.churn_rate_pct
        )?;
        writeln!(f, "Balance at risk: {}\n", format_currency(hv.balance_at_risk))?;

        writeln!(f, "{rule}\nKEY INSIGHTS\n{rule}")?;
        writeln!(f, "1. Overall churn: {:.1}%", s.churn_rate_pct)?;
        match &self.highest_churn_country {
            Some(top) => writeln!(
                f,
                "2. Highest churn country: {} ({:.1}%)",
                top.segment_value, top.churn_rate_pct
            )?,
            None => writeln!(f, "2. Highest churn country: n/a")?,
        }
        writeln!(f, "3. {}", describe_activity_gap(gap))?;
        writeln!(
            f,
            "4. {} at risk from high-value customers",
            format_currency(hv.balance_at_risk)
        )
    }
}

fn describe_activity_gap(gap: &ActivityGap) -> String {
    if gap.inactive_rate_pct > gap.active_rate_pct {
        format!("Inactive members churn {:.1}pp more than active ones", gap.difference_pp)
    } else if gap.active_rate_pct > gap.inactive_rate_pct {
        format!("Active members churn {:.1}pp more than inactive ones", gap.difference_pp)
    } else {
        "Active and inactive members churn at the same rate".to_string()
    }
}

fn describe_filters(filters: &FilterSet) -> String {
    if filters.is_unconstrained() {
        return "Filters: none".to_string();
    }
    let mut parts = Vec::new();
    if let Some(g) = &filters.geography {
        parts.push(format!("country={g}"));
    }
    if let Some(a) = filters.age_group {
        parts.push(format!("age group={}", a.display_name()));
    }
    if let Some(g) = &filters.gender {
        parts.push(format!("gender={g}"));
    }
    if let Some(a) = filters.activity {
        parts.push(format!("activity={}", a.display_name()));
    }
    format!("Filters: {}", parts.join(", "))
}

fn write_table(
    f: &mut fmt::Formatter<'_>,
    rule: &str,
    title: &str,
    rows: &[SegmentAggregate],
) -> fmt::Result {
    writeln!(f, "{rule}\n{title}\n{rule}")?;
    if rows.is_empty() {
        return writeln!(f, "(no customers)\n");
    }
    writeln!(f, "{:<20} {:>10} {:>10} {:>9}", "Segment", "Total", "Churned", "Rate")?;
    for row in rows {
        writeln!(
            f,
            "{:<20} {:>10} {:>10} {:>8.2}%",
            row.segment_value,
            format_count(row.total),
            format_count(row.churned),
            row.churn_rate_pct
        )?;
    }
    writeln!(f)
}

/// Integer with comma thousands separators, e.g. `10,000`
pub fn format_count(value: usize) -> String {
    group_thousands(&value.to_string())
}

/// Euro amount rounded to whole units, e.g. `€1,234,568`
pub fn format_currency(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let sign = if value < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{sign}€{}", group_thousands(&rounded))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CustomerRecord;
    use crate::segment::{annotate, AgeGroup};

    fn scenario() -> Vec<AnnotatedRecord> {
        let rows = [
            ("Germany", "Male", 25, 0.0, true, false),
            ("France", "Female", 50, 120_000.0, false, true),
            ("Germany", "Female", 70, 60_000.0, false, true),
        ];
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

    #[test]
    fn test_build_report() {
        let data = scenario();
        let report = AnalysisReport::build(&data, &FilterSet::all(), 100_000.0);

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.by_geography.len(), 2);
        assert_eq!(report.high_value.balance_at_risk, 120_000.0);
        assert_eq!(
            report.highest_churn_country.as_ref().unwrap().segment_value,
            "France"
        );
        assert_eq!(report.activity_gap.inactive_rate_pct, 100.0);
    }

    #[test]
    fn test_build_report_with_filters() {
        let data = scenario();
        let filters = FilterSet::all().with_age_group(AgeGroup::Young);
        let report = AnalysisReport::build(&data, &filters, 100_000.0);

        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.churned, 0);
        assert_eq!(report.high_value.high_value.total, 0);
    }

    #[test]
    fn test_empty_view_report() {
        let data = scenario();
        let filters = FilterSet::all().with_geography("Atlantis");
        let report = AnalysisReport::build(&data, &filters, 100_000.0);

        assert_eq!(report.summary, ChurnSummary::default());
        assert!(report.by_geography.is_empty());
        assert!(report.highest_churn_country.is_none());

        let text = report.render_text();
        assert!(text.contains("(no customers)"));
        assert!(text.contains("Highest churn country: n/a"));
        assert!(text.contains("Filters: country=Atlantis"));
    }

    #[test]
    fn test_render_text() {
        let data = scenario();
        let report = AnalysisReport::build(&data, &FilterSet::all(), 100_000.0);
        let text = report.render_text();

        assert!(text.contains("Total: 3 | Churned: 2 | Retained: 1 | Rate: 66.67%"));
        assert!(text.contains("Balance at risk: €120,000"));
        assert!(text.contains("Highest churn country: France (100.0%)"));
        assert!(text.contains("Filters: none"));
    }

    #[test]
    fn test_display_matches_render_text() {
        let data = scenario();
        let report = AnalysisReport::build(&data, &FilterSet::all(), 100_000.0);

        assert_eq!(format!("{report}"), report.render_text());
        assert!(report
            .render_text()
            .contains("Inactive members churn 100.0pp more than active ones"));
    }

    #[test]
    fn test_activity_insight_follows_sign() {
        let active_churns_more = ActivityGap {
            active_rate_pct: 40.0,
            inactive_rate_pct: 10.0,
            difference_pp: 30.0,
        };
        assert_eq!(
            describe_activity_gap(&active_churns_more),
            "Active members churn 30.0pp more than inactive ones"
        );

        let inactive_churns_more = ActivityGap {
            active_rate_pct: 10.0,
            inactive_rate_pct: 25.5,
            difference_pp: 15.5,
        };
        assert_eq!(
            describe_activity_gap(&inactive_churns_more),
            "Inactive members churn 15.5pp more than active ones"
        );

        assert_eq!(
            describe_activity_gap(&ActivityGap::default()),
            "Active and inactive members churn at the same rate"
        );
    }

    #[test]
    fn test_json_payload() {
        let data = scenario();
        let report = AnalysisReport::build(&data, &FilterSet::all(), 100_000.0);
        let json = report.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total"], 3);
        assert_eq!(value["by_geography"][0]["segment_value"], "Germany");
        assert_eq!(value["high_value"]["balance_at_risk"], 120_000.0);

        let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.filters, report.filters);
        assert_eq!(parsed.by_gender.len(), report.by_gender.len());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(10_000), "10,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_currency(185_588_094.63), "€185,588,095");
        assert_eq!(format_currency(0.0), "€0");
        assert_eq!(format_currency(-1500.0), "-€1,500");
    }
}
