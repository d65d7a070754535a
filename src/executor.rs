use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::InspectorResult;

/// Runs a SQL string (with optional address context) and hands back raw rows.
///
/// An empty or absent result set is `Ok(vec![])`, never an error.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, address: Option<&str>) -> InspectorResult<Vec<Value>>;
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    async fn execute(&self, sql: &str, address: Option<&str>) -> InspectorResult<Vec<Value>> {
        (**self).execute(sql, address).await
    }
}

/// Pull the row array out of an upstream payload: `{data: [...]}`, a bare
/// array, or nothing at all.
pub fn rows_from_payload(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(rows)) => rows,
            Some(Value::Null) => Vec::new(),
            Some(other) => vec![other],
            None => vec![Value::Object(obj)],
        },
        other => vec![other],
    }
}
