// src/models.rs
use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::units::U512;

/// Sentinel contract address used for the chain's base currency.
pub const NATIVE_CONTRACT: &str = "native";

/// Fractional digits assumed for token amounts unless told otherwise.
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Send,
    Receive,
}

/// A native-currency transaction touching the queried address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_hash: String,
    pub block_number: u64,
    pub block_timestamp: String, // seconds since epoch
    pub from_address: String,
    pub to_address: String,
    pub value: String, // wei, decimal
    pub gas_used: String,
    pub gas_price: String,
    #[serde(rename = "type")]
    pub direction: Direction,
}

impl Transaction {
    pub fn timestamp_secs(&self) -> Option<i64> {
        self.block_timestamp.parse().ok()
    }

    pub fn value_wei(&self) -> U256 {
        U256::from_str_radix(&self.value, 10).unwrap_or(U256::ZERO)
    }
}

/// A token transfer event; aggregation input only.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTransfer {
    pub transaction_hash: String,
    pub block_timestamp: String,
    pub contract_address: Option<String>,
    pub from_address: String,
    pub to_address: String,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBalance {
    pub contract_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub balance: String,
    #[serde(rename = "balanceFormatted")]
    pub balance_formatted: String,
    #[serde(rename = "usdValue", skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<Decimal>,
    pub decimals: u8,
    #[serde(rename = "isNative")]
    pub is_native: bool,
}

impl TokenBalance {
    pub fn raw_balance(&self) -> U512 {
        U512::from_str_radix(&self.balance, 10).unwrap_or(U512::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityHour {
    pub hour: u8,
    pub tx_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub day: u8,
    pub tx_count: u64,
}

/// One pre-aggregated counterparty row as the warehouse returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterpartyRow {
    pub counterparty: String,
    pub interaction_count: u64,
    pub total_value: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Counterparty {
    pub address: String,
    pub interaction_count: u64,
    pub total_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ens_name: Option<String>,
    #[serde(rename = "isContract")]
    pub is_contract: bool,
}

/// Identity extracted from a validated quick-auth token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickAuthUser {
    pub fid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "pfpUrl", skip_serializing_if = "Option::is_none")]
    pub pfp_url: Option<String>,
}
