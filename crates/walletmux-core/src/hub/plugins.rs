/*
[INPUT]:  Registered plugins and connect/disconnect transitions of the hub
[OUTPUT]: Plugins bound to the connected adapter, fanned out concurrently
[POS]:    Hub layer - plugin binder
[UPDATE]: When changing the plugin contract or activation rules
*/

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, error, info};

use crate::adapter::AdapterNamespace;
use crate::chain::ChainNamespace;
use crate::error::{Result, WalletError};
use crate::sync::lock;

use super::orchestrator::Web3Hub;

/// Extension bound to the hub while a supported adapter is connected.
///
/// Returning [`WalletError::UnsupportedAdapter`] from any hook means "not for
/// this adapter"; the hub skips such plugins silently.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn namespace(&self) -> AdapterNamespace;

    /// Adapter names the plugin is activated for
    fn supported_adapters(&self) -> Vec<String>;

    async fn init_with_hub(&self, hub: &Web3Hub) -> Result<()>;

    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}

struct PluginBinding {
    plugin: Arc<dyn Plugin>,
    active: bool,
}

#[derive(Default)]
pub(crate) struct PluginRegistry {
    bindings: Mutex<Vec<PluginBinding>>,
}

impl PluginRegistry {
    pub(crate) fn register(&self, plugin: Arc<dyn Plugin>, chain: ChainNamespace) -> Result<()> {
        if !plugin.namespace().supports(chain) {
            return Err(WalletError::IncompatibleNamespace(format!(
                "plugin {} serves {} but the hub is configured for {chain}",
                plugin.name(),
                plugin.namespace()
            )));
        }
        let mut bindings = lock(&self.bindings);
        if bindings.iter().any(|b| b.plugin.name() == plugin.name()) {
            return Err(WalletError::DuplicateRegistration(format!(
                "plugin {} is already registered",
                plugin.name()
            )));
        }
        info!(plugin = %plugin.name(), "plugin registered");
        bindings.push(PluginBinding {
            plugin,
            active: false,
        });
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        lock(&self.bindings)
            .iter()
            .find(|b| b.plugin.name() == name)
            .map(|b| b.plugin.clone())
    }

    pub(crate) fn is_active(&self, name: &str) -> bool {
        lock(&self.bindings)
            .iter()
            .any(|b| b.plugin.name() == name && b.active)
    }

    fn snapshot(&self) -> Vec<Arc<dyn Plugin>> {
        lock(&self.bindings).iter().map(|b| b.plugin.clone()).collect()
    }

    fn set_active(&self, name: &str, active: bool) {
        if let Some(binding) = lock(&self.bindings)
            .iter_mut()
            .find(|b| b.plugin.name() == name)
        {
            binding.active = active;
        }
    }

    /// Bind every plugin that lists `adapter`; failures stay per plugin
    pub(crate) async fn activate(&self, hub: &Web3Hub, adapter: &str) {
        let candidates: Vec<Arc<dyn Plugin>> = self
            .snapshot()
            .into_iter()
            .filter(|plugin| plugin.supported_adapters().iter().any(|name| name == adapter))
            .collect();

        let results = join_all(candidates.iter().map(|plugin| async move {
            plugin.init_with_hub(hub).await?;
            plugin.connect().await
        }))
        .await;

        for (plugin, result) in candidates.iter().zip(results) {
            match result {
                Ok(()) => {
                    info!(plugin = %plugin.name(), adapter, "plugin activated");
                    self.set_active(plugin.name(), true);
                }
                Err(e) if e.is_unsupported_adapter() => {
                    debug!(plugin = %plugin.name(), adapter, "plugin skipped adapter");
                }
                Err(e) => error!(plugin = %plugin.name(), adapter, error = %e, "plugin activation failed"),
            }
        }
    }

    /// Disconnect every registered plugin; failures stay per plugin
    pub(crate) async fn deactivate_all(&self) {
        let plugins = self.snapshot();
        let results = join_all(plugins.iter().map(|plugin| plugin.disconnect())).await;

        for (plugin, result) in plugins.iter().zip(results) {
            self.set_active(plugin.name(), false);
            match result {
                Ok(()) => debug!(plugin = %plugin.name(), "plugin deactivated"),
                Err(e) if e.is_unsupported_adapter() => {}
                Err(e) => error!(plugin = %plugin.name(), error = %e, "plugin deactivation failed"),
            }
        }
    }
}
