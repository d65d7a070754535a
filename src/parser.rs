// src/parser.rs
//
// Loosely-typed warehouse rows come in as `serde_json::Value`; everything past
// this module works on typed records. Malformed fields are skipped or
// defaulted here, never propagated as errors.
use alloy::primitives::{I256, U256};
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

use crate::models::{CounterpartyRow, Direction, TokenTransfer, Transaction};

fn text(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn address(row: &Value, key: &str) -> Option<String> {
    text(row, key)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_lowercase())
}

/// Non-negative integer amount. Accepts decimal strings and JSON numbers.
pub fn amount(value: &Value) -> Option<U256> {
    match value {
        Value::String(s) => U256::from_str_radix(s.trim(), 10).ok(),
        Value::Number(n) => match n.as_u64() {
            Some(v) => Some(U256::from(v)),
            None => {
                let f = n.as_f64()?;
                // integral floats only; upstream already lost precision if we get here
                if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u128::MAX as f64 {
                    Some(U256::from(f as u128))
                } else {
                    None
                }
            }
        },
        _ => None,
    }
}

fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Epoch seconds from either a numeric string or a warehouse datetime string.
pub fn timestamp_secs(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Some(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Decode a transaction row relative to `queried` (already normalized).
pub fn decode_transaction(row: &Value, queried: &str) -> Option<Transaction> {
    let transaction_hash = text(row, "transaction_hash").filter(|s| !s.is_empty())?;
    let from_address = address(row, "from_address")?;
    let block_timestamp = timestamp_secs(&text(row, "block_timestamp")?)?.to_string();

    let direction = if from_address == queried {
        Direction::Send
    } else {
        Direction::Receive
    };

    Some(Transaction {
        transaction_hash,
        block_number: row.get("block_number").and_then(count).unwrap_or(0),
        block_timestamp,
        from_address,
        to_address: address(row, "to_address").unwrap_or_default(),
        value: row
            .get("value")
            .and_then(amount)
            .unwrap_or(U256::ZERO)
            .to_string(),
        gas_used: row
            .get("gas_used")
            .and_then(amount)
            .unwrap_or(U256::ZERO)
            .to_string(),
        gas_price: row
            .get("gas_price")
            .and_then(amount)
            .unwrap_or(U256::ZERO)
            .to_string(),
        direction,
    })
}

/// Decode a token transfer row. A missing contract address is kept as `None`
/// so the aggregator can decide to skip it.
pub fn decode_transfer(row: &Value) -> Option<TokenTransfer> {
    Some(TokenTransfer {
        transaction_hash: text(row, "transaction_hash").unwrap_or_default(),
        block_timestamp: text(row, "block_timestamp").unwrap_or_default(),
        contract_address: address(row, "contract_address"),
        from_address: address(row, "from_address").unwrap_or_default(),
        to_address: address(row, "to_address").unwrap_or_default(),
        value: row.get("value").and_then(amount).unwrap_or(U256::ZERO),
    })
}

/// `(bucket, tx_count)` from a grouped activity row; `key` is `hour` or `day`.
pub fn decode_bucket(row: &Value, key: &str) -> Option<(i64, u64)> {
    let bucket = row.get(key).and_then(integer)?;
    let tx_count = row.get("tx_count").and_then(count).unwrap_or(0);
    Some((bucket, tx_count))
}

pub fn decode_counterparty(row: &Value) -> Option<CounterpartyRow> {
    Some(CounterpartyRow {
        counterparty: address(row, "counterparty").unwrap_or_default(),
        interaction_count: row.get("interaction_count").and_then(count).unwrap_or(0),
        total_value: row.get("total_value").and_then(amount).unwrap_or(U256::ZERO),
    })
}

/// Net native balance from the first row's `balance` column; may be negative.
pub fn decode_native_balance(rows: &[Value]) -> I256 {
    let Some(raw) = rows.first().and_then(|row| row.get("balance")) else {
        return I256::ZERO;
    };
    let digits = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return I256::ZERO,
    };
    I256::from_dec_str(&digits).unwrap_or(I256::ZERO)
}

/// Decode every row with `decode`, dropping the ones it rejects.
pub fn decode_rows<T>(kind: &str, rows: &[Value], decode: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    let decoded: Vec<T> = rows.iter().filter_map(decode).collect();
    let skipped = rows.len() - decoded.len();
    if skipped > 0 {
        debug!("skipped {} malformed {} rows", skipped, kind);
    }
    decoded
}
