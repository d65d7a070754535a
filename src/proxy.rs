use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use crate::error::{InspectorError, InspectorResult};
use crate::executor::{rows_from_payload, QueryExecutor};
use crate::models::QuickAuthUser;

/// Attempts per request: the first try plus one retry.
const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Deserialize)]
struct FailureBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidateBody {
    user: QuickAuthUser,
}

/// Client-side query executor that goes through the server's `/api/query` proxy.
#[derive(Clone)]
pub struct ProxyClient {
    http: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> InspectorResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post_once(&self, path: &str, body: &Value) -> InspectorResult<Value> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let failure: Option<FailureBody> = resp.json().await.ok();
        let message = failure
            .as_ref()
            .and_then(|f| f.message.clone().or_else(|| f.error.clone()))
            .unwrap_or_else(|| "Failed to execute query".to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED => InspectorError::Auth(message),
            s if s.is_client_error() => InspectorError::Validation(message),
            _ => InspectorError::UpstreamQuery(message),
        })
    }

    /// POST with a single retry. Caller-correctable failures are not retried.
    async fn post(&self, path: &str, body: Value) -> InspectorResult<Value> {
        let mut attempt = 1;
        loop {
            match self.post_once(path, &body).await {
                Err(InspectorError::UpstreamQuery(reason)) if attempt < MAX_ATTEMPTS => {
                    warn!("⚠️ {} failed (attempt {}): {}. Retrying...", path, attempt, reason);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    pub async fn validate_token(&self, token: &str) -> InspectorResult<QuickAuthUser> {
        let body = self
            .post_once("/api/auth/validate", &json!({ "token": token }))
            .await?;
        let parsed: ValidateBody = serde_json::from_value(body)?;
        Ok(parsed.user)
    }
}

#[async_trait]
impl QueryExecutor for ProxyClient {
    async fn execute(&self, sql: &str, address: Option<&str>) -> InspectorResult<Vec<Value>> {
        let body = self
            .post("/api/query", json!({ "sql": sql, "address": address }))
            .await?;
        Ok(rows_from_payload(body))
    }
}
