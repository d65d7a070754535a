use serde::Serialize;
use tracing::debug;

use crate::models::{ActivityDay, ActivityHour};

pub const HOURS_PER_DAY: usize = 24;
pub const DAYS_PER_WEEK: usize = 7;

/// Dense activity histograms plus their maxima for intensity scaling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub hourly: Vec<ActivityHour>,
    pub daily: Vec<ActivityDay>,
    pub max_hourly: u64,
    pub max_daily: u64,
}

/// Spread sparse `(bucket, count)` pairs over `0..N`. Keys outside the domain
/// are dropped; a key reported more than once accumulates.
fn densify<const N: usize>(buckets: &[(i64, u64)]) -> [u64; N] {
    let mut dense = [0u64; N];
    for &(key, count) in buckets {
        match usize::try_from(key).ok().filter(|k| *k < N) {
            Some(slot) => dense[slot] = dense[slot].saturating_add(count),
            None => debug!("dropping out-of-range activity bucket {}", key),
        }
    }
    dense
}

pub fn densify_hours(buckets: &[(i64, u64)]) -> Vec<ActivityHour> {
    densify::<HOURS_PER_DAY>(buckets)
        .into_iter()
        .enumerate()
        .map(|(hour, tx_count)| ActivityHour {
            hour: hour as u8,
            tx_count,
        })
        .collect()
}

pub fn densify_days(buckets: &[(i64, u64)]) -> Vec<ActivityDay> {
    densify::<DAYS_PER_WEEK>(buckets)
        .into_iter()
        .enumerate()
        .map(|(day, tx_count)| ActivityDay {
            day: day as u8,
            tx_count,
        })
        .collect()
}

/// Largest count, never below 1.
pub fn max_count(counts: impl IntoIterator<Item = u64>) -> u64 {
    counts.into_iter().max().unwrap_or(0).max(1)
}

pub fn summarize(hourly: &[(i64, u64)], daily: &[(i64, u64)]) -> ActivitySummary {
    let hourly = densify_hours(hourly);
    let daily = densify_days(daily);
    ActivitySummary {
        max_hourly: max_count(hourly.iter().map(|h| h.tx_count)),
        max_daily: max_count(daily.iter().map(|d| d.tx_count)),
        hourly,
        daily,
    }
}
