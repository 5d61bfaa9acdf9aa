/*
[INPUT]:  Chain configs, registry lookups and freshly built pipelines
[OUTPUT]: Tracked chain/accounts state, committed pipelines, provider events
[POS]:    Provider layer - state shared by the pre-connection and adapter providers
[UPDATE]: When changing switch ordering or tracked provider state
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::chain::{ChainConfig, ChainNamespace, ChainRegistry, normalize_chain_id};
use crate::error::{Result, WalletError};
use crate::events::{EventEmitter, ProviderEvent};
use crate::rpc::{HttpConfig, RequestHandler, RpcPipeline, RpcRequest};
use crate::sync::lock;

use super::proxy::ProviderProxy;

struct CoreState {
    chain_config: ChainConfig,
    chain_id: Option<String>,
    accounts: Vec<String>,
    added_chains: HashMap<String, ChainConfig>,
    committed_ticket: u64,
    pipeline: Option<Arc<RpcPipeline>>,
}

/// Chain and pipeline bookkeeping for one provider.
///
/// Chain switches are ordered by ticket: a switch takes a ticket before its
/// first await and commits its pipeline afterwards only if no later ticket
/// has committed in the meantime. The switch issued last therefore decides
/// the final chain, whatever order the backend calls complete in.
pub(crate) struct ProviderCore {
    namespace: ChainNamespace,
    registry: Arc<dyn ChainRegistry>,
    client: Client,
    engine: ProviderProxy,
    events: EventEmitter<ProviderEvent>,
    tickets: AtomicU64,
    state: Mutex<CoreState>,
}

impl ProviderCore {
    pub(crate) fn new(
        chain_config: ChainConfig,
        registry: Arc<dyn ChainRegistry>,
        http: &HttpConfig,
    ) -> Result<Self> {
        chain_config.validate()?;
        Ok(Self {
            namespace: chain_config.chain_namespace,
            registry,
            client: http.build_client()?,
            engine: ProviderProxy::new(),
            events: EventEmitter::new(),
            tickets: AtomicU64::new(0),
            state: Mutex::new(CoreState {
                chain_config,
                chain_id: None,
                accounts: Vec::new(),
                added_chains: HashMap::new(),
                committed_ticket: 0,
                pipeline: None,
            }),
        })
    }

    pub(crate) fn namespace(&self) -> ChainNamespace {
        self.namespace
    }

    pub(crate) fn client(&self) -> Client {
        self.client.clone()
    }

    pub(crate) fn engine(&self) -> &ProviderProxy {
        &self.engine
    }

    pub(crate) fn events(&self) -> &EventEmitter<ProviderEvent> {
        &self.events
    }

    pub(crate) fn chain_config(&self) -> ChainConfig {
        lock(&self.state).chain_config.clone()
    }

    pub(crate) fn chain_id(&self) -> Option<String> {
        lock(&self.state).chain_id.clone()
    }

    pub(crate) fn accounts(&self) -> Vec<String> {
        lock(&self.state).accounts.clone()
    }

    pub(crate) fn set_accounts(&self, accounts: Vec<String>) {
        lock(&self.state).accounts = accounts;
    }

    pub(crate) fn issue_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Chain config for `chain_id`: chains added at runtime first, then the registry
    pub(crate) fn resolve_chain(&self, chain_id: &str) -> Result<ChainConfig> {
        let chain_id = normalize_chain_id(chain_id)?;
        if let Some(config) = lock(&self.state).added_chains.get(&chain_id) {
            return Ok(config.clone());
        }
        self.registry.lookup(self.namespace, &chain_id).ok_or_else(|| {
            WalletError::NotFound(format!(
                "chain {chain_id} is not configured for namespace {}",
                self.namespace
            ))
        })
    }

    /// Remember a chain so later switches can target it
    pub(crate) fn record_chain(&self, config: ChainConfig) -> Result<()> {
        if config.chain_namespace != self.namespace {
            return Err(WalletError::IncompatibleNamespace(format!(
                "cannot add {} chain {} to a {} provider",
                config.chain_namespace, config.chain_id, self.namespace
            )));
        }
        config.validate()?;
        debug!(chain_id = %config.chain_id, "recorded chain");
        lock(&self.state)
            .added_chains
            .insert(config.chain_id.clone(), config);
        Ok(())
    }

    /// Install `pipeline` as the current engine unless a later ticket already committed.
    ///
    /// Returns false when the commit was superseded.
    pub(crate) fn commit(
        &self,
        ticket: u64,
        pipeline: RpcPipeline,
        accounts: Option<Vec<String>>,
    ) -> bool {
        let mut state = lock(&self.state);
        if ticket < state.committed_ticket {
            debug!(
                ticket,
                committed = state.committed_ticket,
                chain_id = %pipeline.chain_config().chain_id,
                "chain switch superseded"
            );
            return false;
        }

        state.committed_ticket = ticket;
        state.chain_config = pipeline.chain_config().clone();
        if let Some(accounts) = accounts {
            state.accounts = accounts;
        }
        let pipeline = Arc::new(pipeline);
        state.pipeline = Some(pipeline.clone());
        self.engine.update_delegate(pipeline);
        true
    }

    /// Point the engine back at the last committed pipeline
    pub(crate) fn reattach(&self) {
        if let Some(pipeline) = lock(&self.state).pipeline.clone() {
            self.engine.update_delegate(pipeline);
        }
    }

    /// Resolve the chain id through the committed pipeline and announce it
    pub(crate) async fn lookup_network(&self) -> Result<String> {
        let (pipeline, configured) = {
            let state = lock(&self.state);
            (state.pipeline.clone(), state.chain_config.chain_id.clone())
        };
        let pipeline = pipeline
            .ok_or_else(|| WalletError::NotReady("provider engine is not set up".to_string()))?;

        let method = match self.namespace {
            ChainNamespace::Eip155 => Some("eth_chainId"),
            ChainNamespace::Solana => Some("solana_chainId"),
            ChainNamespace::Other => None,
        };
        let chain_id = match method {
            Some(method) => match pipeline.request(RpcRequest::method(method)).await? {
                Value::String(id) => normalize_chain_id(&id)?,
                other => {
                    return Err(WalletError::Rpc {
                        code: -32603,
                        message: format!("unexpected chain id response: {other}"),
                    });
                }
            },
            None => configured,
        };

        lock(&self.state).chain_id = Some(chain_id.clone());
        info!(chain_id = %chain_id, namespace = %self.namespace, "provider network resolved");
        self.events
            .emit(ProviderEvent::ChainChanged {
                chain_id: chain_id.clone(),
            })
            .await;
        self.events
            .emit(ProviderEvent::Connect {
                chain_id: chain_id.clone(),
            })
            .await;
        Ok(chain_id)
    }
}
