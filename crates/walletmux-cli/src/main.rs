/*
[INPUT]:  CLI arguments, YAML configuration file
[OUTPUT]: Chain presets, pre-connection RPC results, cached adapter inspection
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, flags, or startup flow
*/

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use walletmux_core::chain::StaticChainRegistry;
use walletmux_core::{ChainNamespace, RequestHandler, RpcRequest, Web3Hub};

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "walletmux", version, about = "Wallet adapter hub operator tool")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print built-in chain presets
    Chains {
        #[arg(long, value_enum)]
        namespace: Option<NamespaceArg>,
    },
    /// Send a request through the hub's provider before any wallet connects
    Request {
        method: String,
        /// JSON array or object
        params: Option<String>,
        #[arg(long, value_name = "ID")]
        chain: Option<String>,
    },
    /// Inspect or clear the cached adapter
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CacheAction {
    Show,
    Clear,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum NamespaceArg {
    Eip155,
    Solana,
}

impl From<NamespaceArg> for ChainNamespace {
    fn from(arg: NamespaceArg) -> Self {
        match arg {
            NamespaceArg::Eip155 => ChainNamespace::Eip155,
            NamespaceArg::Solana => ChainNamespace::Solana,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = args
        .config_path
        .as_deref()
        .map(CliConfig::from_file)
        .transpose()?;

    let log_level = match &config {
        Some(config) if !config.hub.enable_logging => "error",
        _ => args.log_level.as_str(),
    };
    init_tracing(log_level)?;

    match args.command {
        Command::Chains { namespace } => print_chains(namespace),
        Command::Request {
            method,
            params,
            chain,
        } => {
            let config = require_config(config)?;
            send_request(&config, method, params, chain).await
        }
        Command::Cache { action } => {
            let config = require_config(config)?;
            run_cache(&config, action)
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn require_config(config: Option<CliConfig>) -> Result<CliConfig> {
    config.context("--config is required for this command")
}

fn build_hub(config: &CliConfig) -> Result<Web3Hub> {
    let storage = config.open_storage()?;
    Web3Hub::new(
        config.hub.clone(),
        storage,
        Arc::new(StaticChainRegistry::new()),
    )
    .context("create hub")
}

fn print_chains(namespace: Option<NamespaceArg>) -> Result<()> {
    let registry = StaticChainRegistry::new();
    let namespaces = match namespace {
        Some(namespace) => vec![ChainNamespace::from(namespace)],
        None => vec![ChainNamespace::Eip155, ChainNamespace::Solana],
    };
    let presets: Vec<_> = namespaces
        .into_iter()
        .flat_map(|namespace| registry.presets(namespace))
        .collect();
    println!("{}", serde_json::to_string_pretty(&presets)?);
    Ok(())
}

async fn send_request(
    config: &CliConfig,
    method: String,
    params: Option<String>,
    chain: Option<String>,
) -> Result<()> {
    let params = match params {
        Some(raw) => serde_json::from_str(&raw).context("params must be valid JSON")?,
        None => Value::Null,
    };

    let hub = build_hub(config)?;
    hub.init().await.context("initialize hub")?;
    if let Some(chain_id) = chain {
        hub.switch_chain(&chain_id)
            .await
            .with_context(|| format!("switch to chain {chain_id}"))?;
    }

    let proxy = hub.provider().context("hub has no provider")?;
    info!(method = %method, "sending request");
    let result = proxy
        .request(RpcRequest::new(method.clone(), params))
        .await
        .with_context(|| format!("request {method}"))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_cache(config: &CliConfig, action: CacheAction) -> Result<()> {
    let hub = build_hub(config)?;
    match action {
        CacheAction::Show => match hub.cached_adapter() {
            Some(name) => println!("{name}"),
            None => println!("no cached adapter"),
        },
        CacheAction::Clear => {
            hub.clear_cache();
            debug!("cached adapter cleared");
            println!("cache cleared");
        }
    }
    Ok(())
}
