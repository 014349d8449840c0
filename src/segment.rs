//! Derived categorical segments over customer records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::CustomerRecord;
use crate::error::UnknownSegment;

/// Age band of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    Young,
    MiddleAge,
    Senior,
    Elderly,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Young,
        AgeGroup::MiddleAge,
        AgeGroup::Senior,
        AgeGroup::Elderly,
    ];

    /// Map an age onto its band. Lower bounds are inclusive, so every age,
    /// negative ones included, lands in exactly one band.
    pub fn from_age(age: i64) -> Self {
        if age < 30 {
            AgeGroup::Young
        } else if age < 45 {
            AgeGroup::MiddleAge
        } else if age < 60 {
            AgeGroup::Senior
        } else {
            AgeGroup::Elderly
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Young => "Young",
            AgeGroup::MiddleAge => "MiddleAge",
            AgeGroup::Senior => "Senior",
            AgeGroup::Elderly => "Elderly",
        }
    }

    /// Human readable name with the band bounds
    pub fn display_name(self) -> &'static str {
        match self {
            AgeGroup::Young => "Young (<30)",
            AgeGroup::MiddleAge => "Middle Age (30-45)",
            AgeGroup::Senior => "Senior (45-60)",
            AgeGroup::Elderly => "Elderly (60+)",
        }
    }
}

/// Account balance tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BalanceSegment {
    Zero,
    Low,
    Medium,
    High,
}

impl BalanceSegment {
    pub const ALL: [BalanceSegment; 4] = [
        BalanceSegment::Zero,
        BalanceSegment::Low,
        BalanceSegment::Medium,
        BalanceSegment::High,
    ];

    /// Map a balance onto its tier. An exact zero is checked before the
    /// ranges, so `0.0` is `Zero` and never `Low`.
    pub fn from_balance(balance: f64) -> Self {
        if balance == 0.0 {
            BalanceSegment::Zero
        } else if balance < 50_000.0 {
            BalanceSegment::Low
        } else if balance < 100_000.0 {
            BalanceSegment::Medium
        } else {
            BalanceSegment::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BalanceSegment::Zero => "Zero",
            BalanceSegment::Low => "Low",
            BalanceSegment::Medium => "Medium",
            BalanceSegment::High => "High",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BalanceSegment::Zero => "Zero Balance",
            BalanceSegment::Low => "Low (<50k)",
            BalanceSegment::Medium => "Medium (50k-100k)",
            BalanceSegment::High => "High (100k+)",
        }
    }
}

/// Membership activity of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActivityStatus {
    Active,
    Inactive,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 2] = [ActivityStatus::Active, ActivityStatus::Inactive];

    pub fn from_flag(is_active_member: bool) -> Self {
        if is_active_member {
            ActivityStatus::Active
        } else {
            ActivityStatus::Inactive
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityStatus::Active => "Active",
            ActivityStatus::Inactive => "Inactive",
        }
    }

    pub fn display_name(self) -> &'static str {
        self.label()
    }
}

/// Labels compare case-insensitively and ignore spaces, so both
/// "MiddleAge" and "middle age" name the same band
fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_label<T: Copy>(
    kind: &'static str,
    value: &str,
    all: &[T],
    label: fn(T) -> &'static str,
) -> Result<T, UnknownSegment> {
    let wanted = normalize(value);
    all.iter()
        .copied()
        .find(|candidate| normalize(label(*candidate)) == wanted)
        .ok_or_else(|| UnknownSegment {
            kind,
            value: value.to_string(),
        })
}

impl FromStr for AgeGroup {
    type Err = UnknownSegment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("age group", s, &AgeGroup::ALL, AgeGroup::label)
    }
}

impl FromStr for BalanceSegment {
    type Err = UnknownSegment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("balance segment", s, &BalanceSegment::ALL, BalanceSegment::label)
    }
}

impl FromStr for ActivityStatus {
    type Err = UnknownSegment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("activity status", s, &ActivityStatus::ALL, ActivityStatus::label)
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for BalanceSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A customer record together with its three derived segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    pub record: CustomerRecord,
    pub age_group: AgeGroup,
    pub balance_segment: BalanceSegment,
    pub activity: ActivityStatus,
}

impl AnnotatedRecord {
    pub fn new(record: CustomerRecord) -> Self {
        Self {
            age_group: AgeGroup::from_age(record.age),
            balance_segment: BalanceSegment::from_balance(record.balance),
            activity: ActivityStatus::from_flag(record.is_active_member),
            record,
        }
    }

    pub fn exited(&self) -> bool {
        self.record.exited
    }

    pub fn balance(&self) -> f64 {
        self.record.balance
    }
}

/// Derive the segment labels for every record, keeping input order
pub fn annotate<I>(records: I) -> Vec<AnnotatedRecord>
where
    I: IntoIterator<Item = CustomerRecord>,
{
    records.into_iter().map(AnnotatedRecord::new).collect()
}
