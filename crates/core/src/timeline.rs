//! Client-side date bucketing for charts.
//!
//! The backend sends UTC instants; grouping happens in the viewer's time
//! zone so a dream logged at 23:30 local time lands on the right day.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use crate::analytics::DatedCount;
use crate::dream::Dream;
use crate::types::{parse_timestamp, Timestamp};

/// Number of dreams recorded in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    /// `YYYY-MM`.
    pub month: String,
    pub count: u32,
}

/// Number of dreams recorded on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub day: NaiveDate,
    pub count: u32,
}

/// Bucket instants by local month, ascending.
pub fn bucket_by_month<Tz: TimeZone>(
    instants: impl IntoIterator<Item = (Timestamp, u32)>,
    tz: &Tz,
) -> Vec<MonthBucket>
where
    Tz::Offset: fmt::Display,
{
    let mut months: BTreeMap<String, u32> = BTreeMap::new();
    for (instant, count) in instants {
        let key = instant.with_timezone(tz).format("%Y-%m").to_string();
        *months.entry(key).or_default() += count;
    }
    months
        .into_iter()
        .map(|(month, count)| MonthBucket { month, count })
        .collect()
}

/// Bucket instants by local calendar day, ascending.
pub fn bucket_by_day<Tz: TimeZone>(
    instants: impl IntoIterator<Item = (Timestamp, u32)>,
    tz: &Tz,
) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for (instant, count) in instants {
        *days.entry(instant.with_timezone(tz).date_naive()).or_default() += count;
    }
    days.into_iter()
        .map(|(day, count)| DayBucket { day, count })
        .collect()
}

/// Monthly timeline for the journal view.
pub fn dreams_by_month<Tz: TimeZone>(dreams: &[Dream], tz: &Tz) -> Vec<MonthBucket>
where
    Tz::Offset: fmt::Display,
{
    bucket_by_month(dreams.iter().map(|d| (d.created_at, 1)), tz)
}

/// Parse analytics date entries, skipping any the backend sent malformed.
pub fn parse_dated(entries: &[DatedCount]) -> Vec<(Timestamp, u32)> {
    entries
        .iter()
        .filter_map(|e| parse_timestamp(&e.created_at).map(|ts| (ts, e.count)))
        .collect()
}
