use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Direction, Transaction};
use crate::parser::timestamp_secs;
use crate::units::{parse_ether, widen, U512};

/// Date groups shown per page.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Send,
    Receive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionFilters {
    #[serde(default, rename = "type")]
    pub tx_type: Option<TypeFilter>,
    #[serde(default, rename = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(default, rename = "dateTo")]
    pub date_to: Option<String>,
    #[serde(default, rename = "minAmount")]
    pub min_amount: Option<String>,
}

/// Midnight UTC of a `YYYY-MM-DD` date (or any full timestamp form the parser
/// understands), in epoch seconds. Malformed input yields `None`.
fn date_boundary(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }
    timestamp_secs(raw)
}

/// Apply the type, date-range and minimum-amount predicates in that order.
/// Unparseable dates or amounts leave that side of the filter unset.
pub fn filter_transactions(txs: &[Transaction], filters: &TransactionFilters) -> Vec<Transaction> {
    let wanted = match filters.tx_type.unwrap_or_default() {
        TypeFilter::All => None,
        TypeFilter::Send => Some(Direction::Send),
        TypeFilter::Receive => Some(Direction::Receive),
    };
    let from = filters.date_from.as_deref().and_then(date_boundary);
    let to = filters.date_to.as_deref().and_then(date_boundary);
    let min_wei = filters
        .min_amount
        .as_deref()
        .and_then(parse_ether)
        .unwrap_or(U512::ZERO);

    txs.iter()
        .filter(|tx| wanted.map_or(true, |d| tx.direction == d))
        .filter(|tx| {
            let ts = tx.timestamp_secs();
            let after = from.map_or(true, |f| ts.is_some_and(|t| t >= f));
            let before = to.map_or(true, |t| ts.is_some_and(|s| s <= t));
            after && before
        })
        .filter(|tx| widen(tx.value_wei()) >= min_wei)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    /// Display label, e.g. `January 5, 2024`.
    pub date: String,
    #[serde(skip)]
    pub day: NaiveDate,
    pub transactions: Vec<Transaction>,
}

/// Group by UTC calendar date, most recent date first. Order within a group
/// follows the input order.
pub fn group_by_date(txs: &[Transaction]) -> Vec<DateGroup> {
    let mut groups: BTreeMap<NaiveDate, Vec<Transaction>> = BTreeMap::new();
    for tx in txs {
        let Some(day) = tx
            .timestamp_secs()
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .map(|dt| dt.date_naive())
        else {
            continue;
        };
        groups.entry(day).or_default().push(tx.clone());
    }

    groups
        .into_iter()
        .rev()
        .map(|(day, transactions)| DateGroup {
            date: day.format("%B %-d, %Y").to_string(),
            day,
            transactions,
        })
        .collect()
}

pub fn total_pages(items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    items.div_ceil(page_size)
}

/// 1-indexed slice of `items`. Out-of-range pages come back empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if page == 0 || start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page_size).min(items.len());
    items[start..end].to_vec()
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionHistory {
    pub groups: Vec<DateGroup>,
    pub page: usize,
    pub total_pages: usize,
    pub total_filtered: usize,
    pub total: usize,
}

/// Filter, group and paginate in one pass over a fetched snapshot.
pub fn build_history(
    txs: &[Transaction],
    filters: &TransactionFilters,
    page: usize,
) -> TransactionHistory {
    let filtered = filter_transactions(txs, filters);
    let grouped = group_by_date(&filtered);
    TransactionHistory {
        groups: paginate(&grouped, page, PAGE_SIZE),
        page,
        total_pages: total_pages(grouped.len(), PAGE_SIZE),
        total_filtered: filtered.len(),
        total: txs.len(),
    }
}
