use clap::ValueEnum;
use serde::Deserialize;

use crate::models::{Counterparty, CounterpartyRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Count,
    Volume,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Normalize pre-aggregated rows into a ranking ordered by `sort_by`/`order`.
/// The sort is stable; ENS names and contract detection are not resolved.
pub fn rank_counterparties(
    rows: Vec<CounterpartyRow>,
    sort_by: SortBy,
    order: SortOrder,
) -> Vec<Counterparty> {
    let mut rows = rows;
    rows.sort_by(|a, b| {
        let ord = match sort_by {
            SortBy::Count => a.interaction_count.cmp(&b.interaction_count),
            SortBy::Volume => a.total_value.cmp(&b.total_value),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    rows.into_iter()
        .map(|row| Counterparty {
            address: row.counterparty.to_ascii_lowercase(),
            interaction_count: row.interaction_count,
            total_value: row.total_value.to_string(),
            ens_name: None,
            is_contract: false,
        })
        .collect()
}
