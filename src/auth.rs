use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::address::{is_valid_address, normalize_address};
use crate::error::{InspectorError, InspectorResult};
use crate::models::QuickAuthUser;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    exp: Option<i64>,
}

fn fid_from(sub: &Value) -> Option<u64> {
    match sub {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode a quick-auth JWT and check its expiry against `now` (epoch seconds).
///
/// Only the payload is inspected. Signature verification belongs to the
/// identity provider's SDK.
pub fn validate_token(token: &str, now: i64) -> InspectorResult<QuickAuthUser> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(InspectorError::Auth("Invalid token format".to_string()));
    }

    let claims: Claims = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(|| InspectorError::Auth("Failed to decode token".to_string()))?;

    if claims.exp.is_some_and(|exp| exp < now) {
        return Err(InspectorError::Auth("Token expired".to_string()));
    }

    let fid = claims
        .sub
        .as_ref()
        .and_then(fid_from)
        .ok_or_else(|| InspectorError::Auth("Token has no fid subject".to_string()))?;

    Ok(QuickAuthUser {
        fid,
        username: None,
        display_name: None,
        pfp_url: None,
    })
}

/// Look up the user's primary Ethereum address. Any failure means "none";
/// the user can still type an address in.
pub async fn resolve_primary_address(http: &Client, api_base: &str, fid: u64) -> Option<String> {
    let url = format!(
        "{}/fc/primary-address?fid={}&protocol=ethereum",
        api_base.trim_end_matches('/'),
        fid
    );

    let resp = match http.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            debug!("primary address lookup for fid {} returned {}", fid, resp.status());
            return None;
        }
        Err(e) => {
            debug!("primary address lookup for fid {} failed: {}", fid, e);
            return None;
        }
    };

    let body: Value = resp.json().await.ok()?;
    let address = body
        .pointer("/result/address/address")
        .and_then(Value::as_str)?;

    is_valid_address(address).then(|| normalize_address(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(claims: Value) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"EdDSA"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    #[test]
    fn valid_token_yields_fid() {
        let token = token_with(json!({"sub": 977233, "exp": 2_000, "iss": "https://auth.farcaster.xyz"}));
        let user = validate_token(&token, 1_000).unwrap();
        assert_eq!(user.fid, 977233);
    }

    #[test]
    fn string_subjects_are_accepted() {
        let token = token_with(json!({"sub": "42"}));
        assert_eq!(validate_token(&token, 0).unwrap().fid, 42);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = token_with(json!({"sub": 1, "exp": 999}));
        let err = validate_token(&token, 1_000).unwrap_err();
        assert!(matches!(err, InspectorError::Auth(ref m) if m == "Token expired"));
    }

    #[test]
    fn malformed_tokens_are_auth_errors() {
        for token in ["", "a.b", "a.b.c.d", "a.%%%.c", "a.bm90LWpzb24.c"] {
            assert!(
                matches!(validate_token(token, 0), Err(InspectorError::Auth(_))),
                "{token:?} should be rejected"
            );
        }
    }

    #[test]
    fn missing_subject_is_rejected() {
        let token = token_with(json!({"exp": 5_000}));
        assert!(validate_token(&token, 0).is_err());
    }
}
