use clap::{Parser, Subcommand};

use wallet_inspector::counterparties::{SortBy, SortOrder};
use wallet_inspector::history::TypeFilter;

#[derive(Parser, Debug)]
#[command(name = "wallet-inspector", version, about = "Wallet activity inspector over a blockchain data warehouse")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API (auth validation, query proxy, wallet views)
    Serve {
        /// Override bind address, e.g. 0.0.0.0:3000
        #[arg(long)]
        addr: Option<String>,
    },
    /// Transaction history grouped by day
    Transactions {
        address: String,
        #[arg(long = "type", value_enum)]
        tx_type: Option<TypeFilter>,
        /// YYYY-MM-DD
        #[arg(long)]
        date_from: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date_to: Option<String>,
        /// Minimum value in ETH, e.g. 0.5
        #[arg(long)]
        min_amount: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Token holdings derived from transfers plus native balance
    Tokens { address: String },
    /// Hour-of-day and day-of-week activity for the last 30 days
    Activity { address: String },
    /// Most frequent or highest-volume counterparties
    Counterparties {
        address: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = SortBy::Count)]
        sort_by: SortBy,
        #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,
    },
    /// Validate a quick-auth token and resolve the user's primary address
    ValidateToken { token: String },
    /// Read addresses from stdin as they are typed and print holdings once input settles
    Watch,
}
