use std::sync::Arc;
use tracing::info;

use crate::activity::{self, ActivitySummary};
use crate::address::checked_address;
use crate::aggregator::aggregate_token_balances;
use crate::counterparties::{rank_counterparties, SortBy, SortOrder};
use crate::error::InspectorResult;
use crate::executor::QueryExecutor;
use crate::history::{build_history, TransactionFilters, TransactionHistory};
use crate::models::{Counterparty, TokenBalance, Transaction};
use crate::parser;
use crate::queries;

/// Runs the templated queries for one address and folds the rows into view models.
///
/// Every method validates the address first and fails fast without touching
/// the executor. Methods that need several queries issue them concurrently and
/// fail if any of them fails.
#[derive(Clone)]
pub struct WalletInspector {
    executor: Arc<dyn QueryExecutor>,
}

impl WalletInspector {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    pub async fn transactions(&self, address: &str, limit: usize) -> InspectorResult<Vec<Transaction>> {
        let address = checked_address(address)?;
        let rows = self
            .executor
            .execute(&queries::transactions(&address, limit), Some(address.as_str()))
            .await?;
        Ok(parser::decode_rows("transaction", &rows, |row| {
            parser::decode_transaction(row, &address)
        }))
    }

    pub async fn transaction_history(
        &self,
        address: &str,
        filters: &TransactionFilters,
        page: usize,
    ) -> InspectorResult<TransactionHistory> {
        let txs = self
            .transactions(address, queries::HISTORY_TRANSACTION_LIMIT)
            .await?;
        let history = build_history(&txs, filters, page);
        info!(
            "History for {}: {} of {} transactions, page {}/{}",
            address, history.total_filtered, history.total, history.page, history.total_pages
        );
        Ok(history)
    }

    pub async fn token_holdings(&self, address: &str) -> InspectorResult<Vec<TokenBalance>> {
        let address = checked_address(address)?;
        let transfers_sql = queries::token_transfers(&address);
        let native_sql = queries::native_balance(&address);

        let (transfer_rows, native_rows) = tokio::try_join!(
            self.executor.execute(&transfers_sql, Some(address.as_str())),
            self.executor.execute(&native_sql, Some(address.as_str())),
        )?;

        let transfers = parser::decode_rows("transfer", &transfer_rows, parser::decode_transfer);
        let native = parser::decode_native_balance(&native_rows);
        let balances = aggregate_token_balances(&address, &transfers, native);

        info!(
            "Aggregated {} transfers for {} → {} holdings",
            transfers.len(),
            address,
            balances.len()
        );
        Ok(balances)
    }

    pub async fn activity(&self, address: &str) -> InspectorResult<ActivitySummary> {
        let address = checked_address(address)?;
        let hourly_sql = queries::hourly_activity(&address);
        let daily_sql = queries::daily_activity(&address);

        let (hourly_rows, daily_rows) = tokio::try_join!(
            self.executor.execute(&hourly_sql, Some(address.as_str())),
            self.executor.execute(&daily_sql, Some(address.as_str())),
        )?;

        let hourly = parser::decode_rows("hourly activity", &hourly_rows, |row| {
            parser::decode_bucket(row, "hour")
        });
        let daily = parser::decode_rows("daily activity", &daily_rows, |row| {
            parser::decode_bucket(row, "day")
        });
        Ok(activity::summarize(&hourly, &daily))
    }

    pub async fn counterparties(
        &self,
        address: &str,
        limit: usize,
        sort_by: SortBy,
        order: SortOrder,
    ) -> InspectorResult<Vec<Counterparty>> {
        let address = checked_address(address)?;
        let rows = self
            .executor
            .execute(&queries::counterparties(&address, limit, sort_by), Some(address.as_str()))
            .await?;
        let rows = parser::decode_rows("counterparty", &rows, parser::decode_counterparty);
        Ok(rank_counterparties(rows, sort_by, order))
    }
}
