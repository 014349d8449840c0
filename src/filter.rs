//! Equality filters over annotated records

use serde::{Deserialize, Serialize};

use crate::error::UnknownSegment;
use crate::segment::{ActivityStatus, AgeGroup, AnnotatedRecord};

/// Choice value meaning "no constraint"
pub const ALL: &str = "All";

/// Optional equality predicates combined with AND.
///
/// An unset field places no constraint on the records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    pub geography: Option<String>,
    pub age_group: Option<AgeGroup>,
    pub gender: Option<String>,
    pub activity: Option<ActivityStatus>,
}

impl FilterSet {
    /// Filter set that admits every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from selection strings where `"All"` (any case) or an
    /// empty string leaves that predicate unset
    pub fn from_choices(
        geography: &str,
        age_group: &str,
        gender: &str,
        activity: &str,
    ) -> Result<Self, UnknownSegment> {
        Ok(Self {
            geography: choice(geography).map(str::to_string),
            age_group: choice(age_group).map(str::parse::<AgeGroup>).transpose()?,
            gender: choice(gender).map(str::to_string),
            activity: choice(activity).map(str::parse::<ActivityStatus>).transpose()?,
        })
    }

    pub fn with_geography(mut self, geography: impl Into<String>) -> Self {
        self.geography = Some(geography.into());
        self
    }

    pub fn with_age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_group = Some(age_group);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_activity(mut self, activity: ActivityStatus) -> Self {
        self.activity = Some(activity);
        self
    }

    /// True when no predicate is set
    pub fn is_unconstrained(&self) -> bool {
        self.geography.is_none()
            && self.age_group.is_none()
            && self.gender.is_none()
            && self.activity.is_none()
    }

    /// Check one record against every set predicate
    pub fn matches(&self, record: &AnnotatedRecord) -> bool {
        self.geography
            .as_deref()
            .map_or(true, |g| record.record.geography == g)
            && self.age_group.map_or(true, |a| record.age_group == a)
            && self
                .gender
                .as_deref()
                .map_or(true, |g| record.record.gender == g)
            && self.activity.map_or(true, |a| record.activity == a)
    }
}

fn choice(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
        None
    } else {
        Some(value)
    }
}

/// Keep the records admitted by `filters`, in input order.
///
/// An empty result is a valid outcome.
pub fn filter<'a>(records: &'a [AnnotatedRecord], filters: &FilterSet) -> Vec<&'a AnnotatedRecord> {
    records.iter().filter(|r| filters.matches(r)).collect()
}
