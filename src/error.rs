use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Message returned to callers whenever server credentials are missing or unusable.
pub const CONFIGURATION_MESSAGE: &str = "Server configuration error. Please contact support.";

#[derive(Error, Debug)]
pub enum InspectorError {
    /// Bad address or SQL shape; caller-correctable, never hits the network.
    #[error("{0}")]
    Validation(String),

    /// Missing, expired or malformed identity token.
    #[error("{0}")]
    Auth(String),

    /// The warehouse or the query proxy failed or answered with an unexpected shape.
    #[error("{0}")]
    UpstreamQuery(String),

    /// Server credentials are missing or unusable. The detail stays in the logs.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl InspectorError {
    pub fn status(&self) -> StatusCode {
        match self {
            InspectorError::Validation(_) => StatusCode::BAD_REQUEST,
            InspectorError::Auth(_) => StatusCode::UNAUTHORIZED,
            InspectorError::UpstreamQuery(_) | InspectorError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<reqwest::Error> for InspectorError {
    fn from(err: reqwest::Error) -> Self {
        InspectorError::UpstreamQuery(err.to_string())
    }
}

impl From<serde_json::Error> for InspectorError {
    fn from(err: serde_json::Error) -> Self {
        InspectorError::UpstreamQuery(format!("malformed upstream response: {}", err))
    }
}

/// Wire shape of every failed API call.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IntoResponse for InspectorError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            InspectorError::Configuration(detail) => {
                error!("configuration error: {}", detail);
                ErrorBody {
                    error: CONFIGURATION_MESSAGE.to_string(),
                    message: None,
                }
            }
            InspectorError::Auth(message) => ErrorBody {
                error: "Invalid token".to_string(),
                message: Some(message),
            },
            InspectorError::UpstreamQuery(message) => {
                error!("upstream query failed: {}", message);
                ErrorBody {
                    error: message,
                    message: None,
                }
            }
            InspectorError::Validation(message) => ErrorBody {
                error: message,
                message: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type InspectorResult<T> = Result<T, InspectorError>;
