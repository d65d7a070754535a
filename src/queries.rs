//! SQL templates for the warehouse. Every builder takes an address that has
//! already been through [`crate::address::checked_address`], so interpolating
//! it is safe.

use crate::counterparties::SortBy;

/// History view fetches a wider window so client-side filters have something to work on.
pub const HISTORY_TRANSACTION_LIMIT: usize = 1000;
pub const TRANSFER_LIMIT: usize = 1000;
pub const DEFAULT_TRANSACTION_LIMIT: usize = 50;
pub const DEFAULT_COUNTERPARTY_LIMIT: usize = 10;
pub const ACTIVITY_WINDOW_DAYS: u32 = 30;

pub fn transactions(address: &str, limit: usize) -> String {
    format!(
        "SELECT transaction_hash, block_number, block_timestamp, from_address, to_address, \
         value, gas_used, gas_price \
         FROM base.transactions \
         WHERE from_address = '{address}' OR to_address = '{address}' \
         ORDER BY block_number DESC \
         LIMIT {limit}"
    )
}

pub fn token_transfers(address: &str) -> String {
    format!(
        "SELECT transaction_hash, block_timestamp, contract_address, from_address, to_address, value \
         FROM base.transfers \
         WHERE from_address = '{address}' OR to_address = '{address}' \
         ORDER BY block_timestamp DESC \
         LIMIT {TRANSFER_LIMIT}"
    )
}

pub fn native_balance(address: &str) -> String {
    format!(
        "SELECT \
         SUM(CASE WHEN to_address = '{address}' THEN CAST(value AS UInt256) ELSE 0 END) - \
         SUM(CASE WHEN from_address = '{address}' THEN CAST(value AS UInt256) ELSE 0 END) as balance \
         FROM base.transactions \
         WHERE from_address = '{address}' OR to_address = '{address}'"
    )
}

pub fn hourly_activity(address: &str) -> String {
    format!(
        "SELECT toHour(block_timestamp) as hour, count(*) as tx_count \
         FROM base.transactions \
         WHERE (from_address = '{address}' OR to_address = '{address}') \
         AND block_timestamp >= now() - INTERVAL {ACTIVITY_WINDOW_DAYS} DAY \
         GROUP BY hour \
         ORDER BY hour"
    )
}

/// Day buckets run Monday = 0 .. Sunday = 6 (`toDayOfWeek` is ISO, 1-based).
pub fn daily_activity(address: &str) -> String {
    format!(
        "SELECT toDayOfWeek(block_timestamp) - 1 as day, count(*) as tx_count \
         FROM base.transactions \
         WHERE (from_address = '{address}' OR to_address = '{address}') \
         AND block_timestamp >= now() - INTERVAL {ACTIVITY_WINDOW_DAYS} DAY \
         GROUP BY day \
         ORDER BY day"
    )
}

pub fn counterparties(address: &str, limit: usize, sort_by: SortBy) -> String {
    let order_column = match sort_by {
        SortBy::Count => "interaction_count",
        SortBy::Volume => "total_value",
    };
    format!(
        "SELECT \
         CASE WHEN from_address = '{address}' THEN to_address ELSE from_address END as counterparty, \
         count(*) as interaction_count, \
         sum(CAST(value AS UInt256)) as total_value \
         FROM base.transactions \
         WHERE from_address = '{address}' OR to_address = '{address}' \
         GROUP BY counterparty \
         ORDER BY {order_column} DESC \
         LIMIT {limit}"
    )
}
