use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::analytics::numeric::{bucket_start, parse_timestamp};
use crate::market_data::types::Alert;

pub const BUCKET_MINUTES: i64 = 15;

/// Most recent non-empty buckets kept for display.
pub const MAX_BUCKETS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineBucket {
    pub start: DateTime<Utc>,
    pub count: usize,
    /// count / max count across the retained window, in `(0, 1]`.
    pub height: f64,
}

/// Alert counts per 15-minute bucket, oldest first.
/// Input order does not matter; unparseable timestamps are skipped.
pub fn bucket_alerts(alerts: &[Alert]) -> Vec<TimelineBucket> {
    let mut counts: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    for ts in alerts.iter().filter_map(|alert| parse_timestamp(&alert.ts)) {
        *counts.entry(bucket_start(ts, BUCKET_MINUTES)).or_default() += 1;
    }

    let skip = counts.len().saturating_sub(MAX_BUCKETS);
    let retained: Vec<(DateTime<Utc>, usize)> = counts.into_iter().skip(skip).collect();
    let max_count = retained.iter().map(|(_, count)| *count).max().unwrap_or(0);

    retained
        .into_iter()
        .map(|(start, count)| TimelineBucket {
            start,
            count,
            height: count as f64 / max_count as f64,
        })
        .collect()
}
