use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::activity::ActivitySummary;
use crate::address::{is_valid_address, normalize_address};
use crate::auth;
use crate::config::Config;
use crate::counterparties::{SortBy, SortOrder};
use crate::error::{ErrorBody, InspectorError, InspectorResult};
use crate::history::{TransactionFilters, TransactionHistory, TypeFilter};
use crate::inspector::WalletInspector;
use crate::models::{Counterparty, TokenBalance, Transaction};
use crate::queries::{
    DEFAULT_COUNTERPARTY_LIMIT, DEFAULT_TRANSACTION_LIMIT, HISTORY_TRANSACTION_LIMIT,
};

const MAX_COUNTERPARTY_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub inspector: WalletInspector,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(rename = "type")]
    pub tx_type: Option<TypeFilter>,
    #[serde(rename = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(rename = "dateTo")]
    pub date_to: Option<String>,
    #[serde(rename = "minAmount")]
    pub min_amount: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CounterpartyParams {
    pub limit: Option<usize>,
    pub sort_by: Option<SortBy>,
    pub order: Option<SortOrder>,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Wallet Inspector API running" }))
        .route("/health", get(health))
        .route("/api/auth/validate", post(validate_token))
        .route("/api/query", post(run_query))
        .route("/api/wallet/:address/transactions", get(wallet_transactions))
        .route("/api/wallet/:address/recent", get(wallet_recent))
        .route("/api/wallet/:address/tokens", get(wallet_tokens))
        .route("/api/wallet/:address/activity", get(wallet_activity))
        .route("/api/wallet/:address/counterparties", get(wallet_counterparties))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(cfg: &Config, state: AppState) -> eyre::Result<()> {
    let app = app_router(state);
    let addr = cfg.listen_addr();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on http://{}", addr);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn validate_token(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let token = payload
        .ok()
        .and_then(|Json(body)| body.get("token").and_then(Value::as_str).map(str::to_string))
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        let body = ErrorBody {
            error: "Token is required".to_string(),
            message: None,
        };
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    };

    match auth::validate_token(&token, Utc::now().timestamp()) {
        Ok(user) => Json(json!({ "success": true, "user": user })).into_response(),
        Err(e) => {
            warn!("Token validation error: {}", e);
            e.into_response()
        }
    }
}

async fn run_query(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> InspectorResult<Json<Value>> {
    let body = payload.map(|Json(body)| body).unwrap_or(Value::Null);

    let sql = body
        .get("sql")
        .and_then(Value::as_str)
        .filter(|sql| !sql.trim().is_empty())
        .ok_or_else(|| InspectorError::Validation("SQL query is required".to_string()))?;

    let address = match body.get("address") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) if is_valid_address(s) => Some(normalize_address(s)),
        Some(_) => {
            return Err(InspectorError::Validation(
                "Invalid Ethereum address format".to_string(),
            ))
        }
    };

    let rows = state
        .inspector
        .executor()
        .execute(sql, address.as_deref())
        .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> InspectorResult<T> {
    params.map(|Query(params)| params).map_err(|e| {
        InspectorError::Validation(format!("Invalid query parameters: {}", e.body_text()))
    })
}

async fn wallet_transactions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> InspectorResult<Json<TransactionHistory>> {
    let params = query_params(params)?;
    let filters = TransactionFilters {
        tx_type: params.tx_type,
        date_from: params.date_from,
        date_to: params.date_to,
        min_amount: params.min_amount,
    };
    let page = params.page.unwrap_or(1).max(1);
    let history = state
        .inspector
        .transaction_history(&address, &filters, page)
        .await?;
    Ok(Json(history))
}

async fn wallet_recent(
    State(state): State<AppState>,
    Path(address): Path<String>,
    params: Result<Query<RecentParams>, QueryRejection>,
) -> InspectorResult<Json<Value>> {
    let limit = query_params(params)?
        .limit
        .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
        .clamp(1, HISTORY_TRANSACTION_LIMIT);
    let transactions: Vec<Transaction> = state.inspector.transactions(&address, limit).await?;
    Ok(Json(json!({ "transactions": transactions })))
}

async fn wallet_tokens(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> InspectorResult<Json<Value>> {
    let balances: Vec<TokenBalance> = state.inspector.token_holdings(&address).await?;
    Ok(Json(json!({ "balances": balances })))
}

async fn wallet_activity(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> InspectorResult<Json<ActivitySummary>> {
    Ok(Json(state.inspector.activity(&address).await?))
}

async fn wallet_counterparties(
    State(state): State<AppState>,
    Path(address): Path<String>,
    params: Result<Query<CounterpartyParams>, QueryRejection>,
) -> InspectorResult<Json<Value>> {
    let params = query_params(params)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_COUNTERPARTY_LIMIT)
        .clamp(1, MAX_COUNTERPARTY_LIMIT);
    let counterparties: Vec<Counterparty> = state
        .inspector
        .counterparties(
            &address,
            limit,
            params.sort_by.unwrap_or_default(),
            params.order.unwrap_or_default(),
        )
        .await?;
    Ok(Json(json!({ "counterparties": counterparties })))
}
