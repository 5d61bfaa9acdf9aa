/*
[INPUT]:  JSON-RPC method names and params
[OUTPUT]: Request/response envelopes for provider calls
[POS]:    RPC layer - wire-neutral request types
[UPDATE]: When request envelope fields change
*/

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, WalletError};

/// A provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            id: Value::String(Uuid::new_v4().to_string()),
            method: method.into(),
            params,
        }
    }

    /// Request without params
    pub fn method(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }

    /// Positional param at `index`
    pub fn param(&self, index: usize) -> Option<&Value> {
        match &self.params {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Deserialize the first positional param (or a by-name params object)
    pub fn first_param<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match &self.params {
            Value::Array(items) => items.first().cloned(),
            Value::Object(_) => Some(self.params.clone()),
            _ => None,
        }
        .ok_or_else(|| {
            WalletError::InvalidParams(format!("{} expects at least one param", self.method))
        })?;
        serde_json::from_value(value).map_err(|e| {
            WalletError::InvalidParams(format!("invalid params for {}: {e}", self.method))
        })
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(WalletError::Rpc {
                code: error.code,
                message: error.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
