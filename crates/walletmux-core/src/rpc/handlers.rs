/*
[INPUT]:  Account, signing and chain-identity requests
[OUTPUT]: Locally answered results or backend-forwarded results
[POS]:    RPC layer - domain-specific handlers at the head of a pipeline
[UPDATE]: When adding wallet methods or namespaces
*/

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::chain::{ChainConfig, ChainNamespace};
use crate::error::Result;

use super::middleware::{Next, RpcMiddleware};
use super::types::RpcRequest;

const EIP155_ACCOUNT_METHODS: &[&str] = &["eth_accounts", "eth_requestAccounts"];
const EIP155_SIGNING_METHODS: &[&str] = &[
    "personal_sign",
    "eth_sign",
    "eth_signTypedData",
    "eth_signTypedData_v3",
    "eth_signTypedData_v4",
    "eth_signTransaction",
    "eth_sendTransaction",
];
const SOLANA_ACCOUNT_METHODS: &[&str] = &["getAccounts", "requestAccounts"];
const SOLANA_SIGNING_METHODS: &[&str] = &[
    "signMessage",
    "signTransaction",
    "signAllTransactions",
    "signAndSendTransaction",
];

/// Answers chain-identity queries from the chain the pipeline is bound to
#[derive(Debug, Clone)]
pub struct ChainIdMiddleware {
    namespace: ChainNamespace,
    chain_id: String,
    numeric_chain_id: u64,
}

impl ChainIdMiddleware {
    pub fn new(chain_config: &ChainConfig) -> Result<Self> {
        Ok(Self {
            namespace: chain_config.chain_namespace,
            chain_id: chain_config.chain_id.clone(),
            numeric_chain_id: chain_config.numeric_chain_id()?,
        })
    }
}

#[async_trait]
impl RpcMiddleware for ChainIdMiddleware {
    async fn handle(&self, request: RpcRequest, next: Next<'_>) -> Result<Value> {
        match (self.namespace, request.method.as_str()) {
            (ChainNamespace::Eip155, "eth_chainId") | (ChainNamespace::Solana, "solana_chainId") => {
                Ok(Value::String(self.chain_id.clone()))
            }
            (ChainNamespace::Eip155, "net_version") => {
                Ok(Value::String(self.numeric_chain_id.to_string()))
            }
            _ => next.run(request).await,
        }
    }
}

/// Backend operations behind the wallet handler
#[async_trait]
pub trait WalletHandlers: Send + Sync {
    async fn get_accounts(&self) -> Result<Vec<String>>;

    /// Perform a signing or transaction method on the backend
    async fn process_request(&self, request: RpcRequest) -> Result<Value>;
}

/// Routes account and signing methods to the wallet backend
pub struct WalletMiddleware {
    namespace: ChainNamespace,
    handlers: Arc<dyn WalletHandlers>,
}

impl WalletMiddleware {
    pub fn new(namespace: ChainNamespace, handlers: Arc<dyn WalletHandlers>) -> Self {
        Self {
            namespace,
            handlers,
        }
    }

    fn method_sets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        match self.namespace {
            ChainNamespace::Eip155 => (EIP155_ACCOUNT_METHODS, EIP155_SIGNING_METHODS),
            ChainNamespace::Solana => (SOLANA_ACCOUNT_METHODS, SOLANA_SIGNING_METHODS),
            ChainNamespace::Other => (&[], &[]),
        }
    }
}

#[async_trait]
impl RpcMiddleware for WalletMiddleware {
    async fn handle(&self, request: RpcRequest, next: Next<'_>) -> Result<Value> {
        let (account_methods, signing_methods) = self.method_sets();
        let method = request.method.as_str();

        if account_methods.contains(&method) {
            let accounts = self.handlers.get_accounts().await?;
            return Ok(serde_json::to_value(accounts)?);
        }
        if signing_methods.contains(&method) {
            return self.handlers.process_request(request).await;
        }
        next.run(request).await
    }
}
