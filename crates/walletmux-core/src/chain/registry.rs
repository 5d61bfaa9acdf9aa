/*
[INPUT]:  (namespace, chain id) lookups and partial chain configs
[OUTPUT]: Registry presets and fully resolved chain configs
[POS]:    Chain layer - static lookup store for chain defaults
[UPDATE]: When adding presets or changing default resolution
*/

use crate::error::{Result, WalletError};

use super::config::{ChainConfig, ChainConfigInput, ChainNamespace, NativeCurrency, normalize_chain_id};

/// Chain registry lookup collaborator
pub trait ChainRegistry: Send + Sync {
    /// Find the config for a chain; `chain_id` is canonical hex
    fn lookup(&self, namespace: ChainNamespace, chain_id: &str) -> Option<ChainConfig>;

    /// Chain used when a namespace is configured without a chain id
    fn default_chain_id(&self, namespace: ChainNamespace) -> Option<&str> {
        match namespace {
            ChainNamespace::Eip155 | ChainNamespace::Solana => Some("0x1"),
            ChainNamespace::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ChainPreset {
    namespace: ChainNamespace,
    chain_id: &'static str,
    display_name: &'static str,
    rpc_target: &'static str,
    currency_name: &'static str,
    symbol: &'static str,
    decimals: u8,
    block_explorer_url: &'static str,
    logo: &'static str,
}

impl ChainPreset {
    fn to_config(self) -> ChainConfig {
        ChainConfig {
            chain_namespace: self.namespace,
            chain_id: self.chain_id.to_string(),
            display_name: self.display_name.to_string(),
            rpc_target: self.rpc_target.to_string(),
            native_currency: NativeCurrency {
                name: self.currency_name.to_string(),
                symbol: self.symbol.to_string(),
                decimals: self.decimals,
            },
            block_explorer_url: Some(self.block_explorer_url.to_string()),
            logo: Some(self.logo.to_string()),
        }
    }
}

const PRESETS: &[ChainPreset] = &[
    ChainPreset {
        namespace: ChainNamespace::Eip155,
        chain_id: "0x1",
        display_name: "Ethereum Mainnet",
        rpc_target: "https://ethereum-rpc.publicnode.com",
        currency_name: "Ethereum",
        symbol: "ETH",
        decimals: 18,
        block_explorer_url: "https://etherscan.io",
        logo: "https://images.toruswallet.io/eth.svg",
    },
    ChainPreset {
        namespace: ChainNamespace::Eip155,
        chain_id: "0xaa36a7",
        display_name: "Sepolia Testnet",
        rpc_target: "https://ethereum-sepolia-rpc.publicnode.com",
        currency_name: "Ethereum",
        symbol: "ETH",
        decimals: 18,
        block_explorer_url: "https://sepolia.etherscan.io",
        logo: "https://images.toruswallet.io/eth.svg",
    },
    ChainPreset {
        namespace: ChainNamespace::Eip155,
        chain_id: "0x89",
        display_name: "Polygon Mainnet",
        rpc_target: "https://polygon-rpc.com",
        currency_name: "Polygon Ecosystem Token",
        symbol: "POL",
        decimals: 18,
        block_explorer_url: "https://polygonscan.com",
        logo: "https://images.toruswallet.io/polygon.svg",
    },
    ChainPreset {
        namespace: ChainNamespace::Eip155,
        chain_id: "0x38",
        display_name: "Binance SmartChain Mainnet",
        rpc_target: "https://bsc-rpc.publicnode.com",
        currency_name: "Binance SmartChain",
        symbol: "BNB",
        decimals: 18,
        block_explorer_url: "https://bscscan.com",
        logo: "https://images.toruswallet.io/bnb.png",
    },
    ChainPreset {
        namespace: ChainNamespace::Eip155,
        chain_id: "0xa4b1",
        display_name: "Arbitrum One",
        rpc_target: "https://arb1.arbitrum.io/rpc",
        currency_name: "Ethereum",
        symbol: "ETH",
        decimals: 18,
        block_explorer_url: "https://arbiscan.io",
        logo: "https://images.toruswallet.io/arbitrum.svg",
    },
    ChainPreset {
        namespace: ChainNamespace::Eip155,
        chain_id: "0xa",
        display_name: "Optimism",
        rpc_target: "https://mainnet.optimism.io",
        currency_name: "Ethereum",
        symbol: "ETH",
        decimals: 18,
        block_explorer_url: "https://optimistic.etherscan.io",
        logo: "https://images.toruswallet.io/optimism.svg",
    },
    ChainPreset {
        namespace: ChainNamespace::Eip155,
        chain_id: "0x2105",
        display_name: "Base Mainnet",
        rpc_target: "https://mainnet.base.org",
        currency_name: "Ethereum",
        symbol: "ETH",
        decimals: 18,
        block_explorer_url: "https://basescan.org",
        logo: "https://images.toruswallet.io/base.svg",
    },
    ChainPreset {
        namespace: ChainNamespace::Solana,
        chain_id: "0x1",
        display_name: "Solana Mainnet",
        rpc_target: "https://api.mainnet-beta.solana.com",
        currency_name: "Solana",
        symbol: "SOL",
        decimals: 9,
        block_explorer_url: "https://explorer.solana.com",
        logo: "https://images.toruswallet.io/solana.svg",
    },
    ChainPreset {
        namespace: ChainNamespace::Solana,
        chain_id: "0x2",
        display_name: "Solana Testnet",
        rpc_target: "https://api.testnet.solana.com",
        currency_name: "Solana",
        symbol: "SOL",
        decimals: 9,
        block_explorer_url: "https://explorer.solana.com?cluster=testnet",
        logo: "https://images.toruswallet.io/solana.svg",
    },
    ChainPreset {
        namespace: ChainNamespace::Solana,
        chain_id: "0x3",
        display_name: "Solana Devnet",
        rpc_target: "https://api.devnet.solana.com",
        currency_name: "Solana",
        symbol: "SOL",
        decimals: 9,
        block_explorer_url: "https://explorer.solana.com?cluster=devnet",
        logo: "https://images.toruswallet.io/solana.svg",
    },
];

/// Registry backed by the built-in presets
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticChainRegistry;

impl StaticChainRegistry {
    pub fn new() -> Self {
        Self
    }

    /// All presets of one namespace, in declaration order
    pub fn presets(&self, namespace: ChainNamespace) -> Vec<ChainConfig> {
        PRESETS
            .iter()
            .filter(|preset| preset.namespace == namespace)
            .map(|preset| preset.to_config())
            .collect()
    }
}

impl ChainRegistry for StaticChainRegistry {
    fn lookup(&self, namespace: ChainNamespace, chain_id: &str) -> Option<ChainConfig> {
        PRESETS
            .iter()
            .find(|preset| preset.namespace == namespace && preset.chain_id == chain_id)
            .map(|preset| preset.to_config())
    }
}

/// Fill a partial chain config from the registry.
///
/// Registry values are the base; every field the caller set overrides them.
pub fn resolve_chain_config(
    input: &ChainConfigInput,
    registry: &dyn ChainRegistry,
) -> Result<ChainConfig> {
    let namespace = input.chain_namespace.ok_or_else(|| {
        WalletError::InvalidParams("Please provide a valid chainNamespace in chainConfig".to_string())
    })?;

    let chain_id = match input.chain_id.as_deref() {
        Some(raw) => normalize_chain_id(raw)?,
        None => registry
            .default_chain_id(namespace)
            .map(str::to_string)
            .ok_or_else(|| {
                WalletError::InvalidParams(format!(
                    "chainId is required for namespace {namespace}"
                ))
            })?,
    };

    let base = registry.lookup(namespace, &chain_id);

    let display_name = input
        .display_name
        .clone()
        .or_else(|| base.as_ref().map(|b| b.display_name.clone()));
    let rpc_target = input
        .rpc_target
        .clone()
        .or_else(|| base.as_ref().map(|b| b.rpc_target.clone()));
    let native_currency = input
        .native_currency
        .clone()
        .or_else(|| base.as_ref().map(|b| b.native_currency.clone()));

    let (Some(display_name), Some(rpc_target), Some(native_currency)) =
        (display_name, rpc_target, native_currency)
    else {
        return Err(WalletError::InvalidParams(format!(
            "chain {chain_id} in {namespace} is not a known preset; displayName, rpcTarget and nativeCurrency are required"
        )));
    };

    let config = ChainConfig {
        chain_namespace: namespace,
        chain_id,
        display_name,
        rpc_target,
        native_currency,
        block_explorer_url: input
            .block_explorer_url
            .clone()
            .or_else(|| base.as_ref().and_then(|b| b.block_explorer_url.clone())),
        logo: input
            .logo
            .clone()
            .or_else(|| base.as_ref().and_then(|b| b.logo.clone())),
    };
    config.validate()?;
    Ok(config)
}
