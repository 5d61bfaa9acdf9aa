/*
[INPUT]:  Provider requests and an ordered list of handlers
[OUTPUT]: The first answer produced along the chain
[POS]:    RPC layer - middleware pipeline core
[UPDATE]: When changing handler chaining or pipeline construction
*/

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::chain::ChainConfig;
use crate::error::{Result, WalletError};

use super::types::RpcRequest;

/// Anything that can answer a provider request
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn request(&self, request: RpcRequest) -> Result<Value>;
}

/// One stage of a pipeline.
///
/// A stage answers the request itself, or hands a (possibly modified)
/// request to `next`.
#[async_trait]
pub trait RpcMiddleware: Send + Sync {
    async fn handle(&self, request: RpcRequest, next: Next<'_>) -> Result<Value>;
}

/// The remainder of the pipeline after the current stage
#[derive(Clone, Copy)]
pub struct Next<'a> {
    remaining: &'a [Arc<dyn RpcMiddleware>],
}

impl Next<'_> {
    pub async fn run(self, request: RpcRequest) -> Result<Value> {
        match self.remaining.split_first() {
            Some((stage, remaining)) => stage.handle(request, Next { remaining }).await,
            None => Err(WalletError::MethodNotFound(request.method)),
        }
    }
}

/// Ordered handler chain bound to one chain config.
///
/// Immutable once built; a chain change builds a fresh pipeline.
pub struct RpcPipeline {
    chain_config: ChainConfig,
    stages: Vec<Arc<dyn RpcMiddleware>>,
}

impl RpcPipeline {
    pub fn builder(chain_config: ChainConfig) -> PipelineBuilder {
        PipelineBuilder {
            chain_config,
            stages: Vec::new(),
        }
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[async_trait]
impl RequestHandler for RpcPipeline {
    async fn request(&self, request: RpcRequest) -> Result<Value> {
        Next {
            remaining: &self.stages,
        }
        .run(request)
        .await
    }
}

impl fmt::Debug for RpcPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcPipeline")
            .field("chain_id", &self.chain_config.chain_id)
            .field("stages", &self.stages.len())
            .finish()
    }
}

pub struct PipelineBuilder {
    chain_config: ChainConfig,
    stages: Vec<Arc<dyn RpcMiddleware>>,
}

impl PipelineBuilder {
    pub fn push(mut self, stage: impl RpcMiddleware + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn build(self) -> RpcPipeline {
        RpcPipeline {
            chain_config: self.chain_config,
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainNamespace, ChainRegistry, StaticChainRegistry};
    use serde_json::json;

    struct Answer(&'static str, Value);

    #[async_trait]
    impl RpcMiddleware for Answer {
        async fn handle(&self, request: RpcRequest, next: Next<'_>) -> Result<Value> {
            if request.method == self.0 {
                return Ok(self.1.clone());
            }
            next.run(request).await
        }
    }

    struct Rename(&'static str, &'static str);

    #[async_trait]
    impl RpcMiddleware for Rename {
        async fn handle(&self, mut request: RpcRequest, next: Next<'_>) -> Result<Value> {
            if request.method == self.0 {
                request.method = self.1.to_string();
            }
            next.run(request).await
        }
    }

    fn pipeline() -> RpcPipeline {
        let chain = StaticChainRegistry::new()
            .lookup(ChainNamespace::Eip155, "0x1")
            .unwrap();
        RpcPipeline::builder(chain)
            .push(Answer("first", json!(1)))
            .push(Rename("alias", "second"))
            .push(Answer("second", json!(2)))
            .build()
    }

    #[tokio::test]
    async fn test_short_circuit_and_forward() {
        let pipeline = pipeline();
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.request(RpcRequest::method("first")).await.unwrap(), json!(1));
        assert_eq!(pipeline.request(RpcRequest::method("second")).await.unwrap(), json!(2));
        assert_eq!(pipeline.request(RpcRequest::method("alias")).await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_unanswered_request_is_method_not_found() {
        let err = pipeline()
            .request(RpcRequest::method("eth_unknown"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::MethodNotFound(method) if method == "eth_unknown"));
    }
}
