// src/period.rs

use chrono::NaiveDate;
use std::{fmt, ops::RangeInclusive};

/// One monthly report: identifies a source document and is the join key
/// between the country and sector tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Returns `None` unless `month` is in 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Every period in `years`, nested year-then-month. This is the iteration
    /// order of the whole run.
    pub fn range(years: RangeInclusive<i32>) -> Vec<Period> {
        years
            .flat_map(|year| (1..=12).map(move |month| Period { year, month }))
            .collect()
    }

    /// First calendar day of the period.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
