use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};

use crate::core::models::MessageSummary;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Recency bucket for the message list. Buckets are relative to local
/// midnight of "today", not a rolling 24h window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyGroup {
    Today,
    PastWeek,
    PastMonth,
    Older,
}

impl RecencyGroup {
    pub fn label(self) -> &'static str {
        match self {
            RecencyGroup::Today => "Today",
            RecencyGroup::PastWeek => "Past week",
            RecencyGroup::PastMonth => "Past month",
            RecencyGroup::Older => "Older",
        }
    }
}

impl std::fmt::Display for RecencyGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A list row: the group label is present only when the group differs from
/// the previous row's (separator semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedRow {
    pub separator: Option<RecencyGroup>,
    pub index: usize,
}

/// Local midnight of the day containing `now`, as Unix milliseconds.
fn day_start_ms(now: DateTime<Local>) -> i64 {
    Local
        .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
        .single()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| now.timestamp_millis())
}

/// Classify a message timestamp (Unix ms) against local midnight.
pub fn classify(timestamp_ms: i64, now: DateTime<Local>) -> RecencyGroup {
    let today_start = day_start_ms(now);
    if timestamp_ms >= today_start {
        RecencyGroup::Today
    } else if timestamp_ms >= today_start - 7 * DAY_MS {
        RecencyGroup::PastWeek
    } else if timestamp_ms >= today_start - 30 * DAY_MS {
        RecencyGroup::PastMonth
    } else {
        RecencyGroup::Older
    }
}

/// Assign group separators over an already-sorted (newest first) list.
pub fn group_rows(messages: &[MessageSummary], now: DateTime<Local>) -> Vec<GroupedRow> {
    let mut rows = Vec::with_capacity(messages.len());
    let mut last_group = None;
    for (index, msg) in messages.iter().enumerate() {
        let group = classify(msg.timestamp, now);
        let separator = if Some(group) != last_group {
            Some(group)
        } else {
            None
        };
        last_group = Some(group);
        rows.push(GroupedRow { separator, index });
    }
    rows
}

/// Whole days until a `YYYY-MM-DD` deadline, counted in local calendar days.
/// Negative means overdue, zero means due today. Anything that is not a date
/// (empty, or the backend's "no deadline" marker) yields `None`.
pub fn days_left(deadline: &str, now: DateTime<Local>) -> Option<i64> {
    let target = NaiveDate::parse_from_str(deadline.trim(), "%Y-%m-%d").ok()?;
    Some((target - now.date_naive()).num_days())
}
