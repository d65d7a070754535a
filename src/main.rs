mod cli;

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

use wallet_inspector::api::{self, AppState};
use wallet_inspector::auth::resolve_primary_address;
use wallet_inspector::cache::CachedExecutor;
use wallet_inspector::config::{self, Config};
use wallet_inspector::debounce::{AddressDebouncer, AddressEvent, DEFAULT_DELAY};
use wallet_inspector::history::TransactionFilters;
use wallet_inspector::inspector::WalletInspector;
use wallet_inspector::proxy::ProxyClient;
use wallet_inspector::warehouse::WarehouseClient;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut cfg = config::load()?;

    match cli.command {
        Commands::Serve { addr } => {
            if let Some(addr) = addr {
                let (host, port) = addr
                    .rsplit_once(':')
                    .ok_or_else(|| eyre::eyre!("--addr must be host:port, got {}", addr))?;
                cfg.bind_addr = host.to_string();
                cfg.port = port.parse()?;
            }
            serve(cfg).await?;
        }
        Commands::Transactions {
            address,
            tx_type,
            date_from,
            date_to,
            min_amount,
            page,
        } => {
            let filters = TransactionFilters {
                tx_type,
                date_from,
                date_to,
                min_amount,
            };
            let history = client_inspector(&cfg)?
                .transaction_history(&address, &filters, page.max(1))
                .await?;
            print_json(&history)?;
        }
        Commands::Tokens { address } => {
            let balances = client_inspector(&cfg)?.token_holdings(&address).await?;
            print_json(&balances)?;
        }
        Commands::Activity { address } => {
            let summary = client_inspector(&cfg)?.activity(&address).await?;
            print_json(&summary)?;
        }
        Commands::Counterparties {
            address,
            limit,
            sort_by,
            order,
        } => {
            let ranked = client_inspector(&cfg)?
                .counterparties(&address, limit, sort_by, order)
                .await?;
            print_json(&ranked)?;
        }
        Commands::ValidateToken { token } => {
            let proxy = ProxyClient::new(&cfg.proxy_url, cfg.query_timeout)?;
            let user = proxy.validate_token(&token).await?;
            let http = reqwest::Client::builder().timeout(cfg.query_timeout).build()?;
            let address = resolve_primary_address(&http, &cfg.farcaster_api_url, user.fid).await;
            print_json(&json!({ "user": user, "address": address }))?;
        }
        Commands::Watch => watch(client_inspector(&cfg)?).await?,
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Warehouse-backed inspector behind the response cache; what the server uses.
fn server_inspector(cfg: &Config) -> eyre::Result<WalletInspector> {
    let warehouse = WarehouseClient::new(cfg)?;
    let cached = CachedExecutor::new(warehouse, cfg.cache_ttl);
    Ok(WalletInspector::new(Arc::new(cached)))
}

/// Proxy-backed inspector: raw rows come from a running server, folds run locally.
fn client_inspector(cfg: &Config) -> eyre::Result<WalletInspector> {
    let proxy = ProxyClient::new(&cfg.proxy_url, cfg.query_timeout)?;
    let cached = CachedExecutor::new(proxy, cfg.cache_ttl);
    Ok(WalletInspector::new(Arc::new(cached)))
}

async fn serve(cfg: Config) -> eyre::Result<()> {
    info!("Wallet Inspector starting...");
    let state = AppState {
        inspector: server_inspector(&cfg)?,
    };

    tokio::select! {
        res = api::serve(&cfg, state) => match res {
            Ok(()) => info!("API exited cleanly"),
            Err(e) => error!("API error: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Wallet Inspector stopped.");
    Ok(())
}

async fn watch(inspector: WalletInspector) -> eyre::Result<()> {
    let (mut debouncer, mut events) = AddressDebouncer::new(DEFAULT_DELAY);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => debouncer.push(&line),
                None => break,
            },
            Some(event) = events.recv() => handle_event(&inspector, event).await,
        }
    }

    // stdin closed; let the last pending validation land
    if let Ok(Some(event)) = tokio::time::timeout(DEFAULT_DELAY * 2, events.recv()).await {
        handle_event(&inspector, event).await;
    }
    Ok(())
}

async fn handle_event(inspector: &WalletInspector, event: AddressEvent) {
    match event {
        AddressEvent::Accepted(address) => match inspector.token_holdings(&address).await {
            Ok(balances) => {
                if let Err(e) = print_json(&json!({ "address": address, "balances": balances })) {
                    warn!("failed to print holdings: {}", e);
                }
            }
            // re-entering the same address retries
            Err(e) => warn!("holdings for {} failed: {}", address, e),
        },
        AddressEvent::Rejected(reason) => warn!("{}", reason),
        AddressEvent::Cleared => {}
    }
}
