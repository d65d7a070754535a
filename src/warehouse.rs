// src/warehouse.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{CdpCredentials, Config};
use crate::error::{InspectorError, InspectorResult};
use crate::executor::{rows_from_payload, QueryExecutor};

const TOKEN_ISSUER: &str = "coinbase-cloud";
const TOKEN_AUDIENCE: &str = "https://api.cdp.coinbase.com";
const TOKEN_LIFETIME_SECS: i64 = 120;

const MISSING_CREDENTIALS: &str =
    "CDP API credentials not configured. Set CDP_API_KEY_NAME and CDP_API_SECRET.";

/// Signs short-lived ES256 bearer tokens for the warehouse API.
#[derive(Clone)]
pub struct TokenSigner {
    key_name: String,
    key: SigningKey,
}

impl TokenSigner {
    pub fn new(key_name: impl Into<String>, key: SigningKey) -> Self {
        Self {
            key_name: key_name.into(),
            key,
        }
    }

    /// Accepts PKCS#8 (`BEGIN PRIVATE KEY`) or SEC1 (`BEGIN EC PRIVATE KEY`) PEM,
    /// including secrets whose newlines were escaped as `\n`.
    pub fn from_credentials(creds: &CdpCredentials) -> InspectorResult<Self> {
        let pem = creds.secret.replace("\\n", "\n");
        let pem = pem.trim();

        let key = {
            use p256::pkcs8::DecodePrivateKey;
            SigningKey::from_pkcs8_pem(pem)
        }
        .or_else(|_| p256::SecretKey::from_sec1_pem(pem).map(SigningKey::from))
        .map_err(|e| InspectorError::Configuration(format!("CDP API secret is not a P-256 key: {}", e)))?;

        Ok(Self::new(creds.key_name.clone(), key))
    }

    pub fn bearer_token(&self, now: i64) -> InspectorResult<String> {
        let header = json!({ "alg": "ES256", "typ": "JWT" });
        let claims = json!({
            "sub": self.key_name,
            "iss": TOKEN_ISSUER,
            "nbf": now,
            "exp": now + TOKEN_LIFETIME_SECS,
            "aud": TOKEN_AUDIENCE,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature: Signature = self.key.sign(signing_input.as_bytes());

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}

/// Direct client for the warehouse SQL endpoint.
pub struct WarehouseClient {
    http: Client,
    url: String,
    signer: Result<TokenSigner, String>,
}

impl WarehouseClient {
    pub fn new(cfg: &Config) -> InspectorResult<Self> {
        let signer = match &cfg.credentials {
            Some(creds) => TokenSigner::from_credentials(creds).map_err(|e| e.to_string()),
            None => Err(MISSING_CREDENTIALS.to_string()),
        };
        if let Err(reason) = &signer {
            warn!("Warehouse queries will fail until credentials are fixed: {}", reason);
        }

        let http = Client::builder().timeout(cfg.query_timeout).build()?;
        Ok(Self {
            http,
            url: cfg.cdp_api_url.clone(),
            signer,
        })
    }

    pub fn with_signer(http: Client, url: impl Into<String>, signer: TokenSigner) -> Self {
        Self {
            http,
            url: url.into(),
            signer: Ok(signer),
        }
    }
}

#[async_trait]
impl QueryExecutor for WarehouseClient {
    async fn execute(&self, sql: &str, _address: Option<&str>) -> InspectorResult<Vec<Value>> {
        let signer = self
            .signer
            .as_ref()
            .map_err(|reason| InspectorError::Configuration(reason.clone()))?;
        let token = signer.bearer_token(Utc::now().timestamp())?;

        info!("📡 Sending warehouse query ({} bytes) → {}", sql.len(), self.url);

        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(token)
            .json(&json!({ "sql": sql }))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(InspectorError::UpstreamQuery(format!(
                "CDP API error: {} - {}",
                status.as_u16(),
                text
            )));
        }

        debug!("📩 Warehouse response: {} bytes", text.len());
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let payload: Value = serde_json::from_str(&text)?;
        Ok(rows_from_payload(payload))
    }
}
