/*
[INPUT]:  Requests nobody upstream answered, and the bound RPC target
[OUTPUT]: JSON-RPC results from the network
[POS]:    RPC layer - terminal network-forwarding handler
[UPDATE]: When changing transport options or response handling
*/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{Value, json};
use tracing::debug;

use crate::chain::ChainConfig;
use crate::error::{Result, WalletError};

use super::middleware::{Next, RpcMiddleware};
use super::types::{RpcRequest, RpcResponse};

/// HTTP settings for the network handler
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl HttpConfig {
    pub fn build_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()?)
    }
}

/// Forwards requests to one RPC target; never calls the next stage
#[derive(Debug, Clone)]
pub struct NetworkMiddleware {
    client: Client,
    rpc_target: Url,
}

impl NetworkMiddleware {
    pub fn new(client: Client, chain_config: &ChainConfig) -> Result<Self> {
        Ok(Self {
            client,
            rpc_target: chain_config.rpc_url()?,
        })
    }

    pub fn rpc_target(&self) -> &Url {
        &self.rpc_target
    }
}

#[async_trait]
impl RpcMiddleware for NetworkMiddleware {
    async fn handle(&self, request: RpcRequest, _next: Next<'_>) -> Result<Value> {
        debug!(method = %request.method, target = %self.rpc_target, "forwarding rpc request");

        let RpcRequest { id, method, params } = request;
        let params = if params.is_null() { json!([]) } else { params };
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.rpc_target.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WalletError::Rpc {
                code: i64::from(status.as_u16()),
                message,
            });
        }

        let envelope: RpcResponse = response.json().await?;
        envelope.into_result()
    }
}
