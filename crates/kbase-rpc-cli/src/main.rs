//! Command line client for KBase JSON-RPC services
//!
//! ```text
//! kbase-rpc call --url https://ci.kbase.us/services/ws --dialect 1.1 \
//!     --method Workspace.ver
//! kbase-rpc resolve --discovery-url https://ci.kbase.us/services/service_wizard \
//!     --module RAST_SDK
//! kbase-rpc search-types --url https://ci.kbase.us/services/searchapi2/legacy \
//!     --text Prochlorococcus
//! ```
//!
//! The token comes from `--token`, then `KBASE_TOKEN` (or the older `TOKEN`),
//! then the config file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, info};

use kbase_rpc_client::prelude::*;
use kbase_rpc_client::services::search2::SearchTypesParams;

#[derive(Parser)]
#[command(name = "kbase-rpc")]
#[command(about = "Call KBase JSON-RPC services")]
struct Cli {
    /// YAML client configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Authorization token, sent verbatim
    #[arg(long, global = true)]
    token: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call one method and print its result
    Call(CallArgs),
    /// Look up where a dynamic service is running
    Resolve(ResolveArgs),
    /// Count matching objects per type through the Search2 legacy API
    SearchTypes(SearchTypesArgs),
}

#[derive(Args)]
struct CallArgs {
    /// Service endpoint
    #[arg(long)]
    url: String,

    /// JSON-RPC dialect: 1.1 or 2.0
    #[arg(long, default_value = "2.0")]
    dialect: Dialect,

    /// Fully qualified method, e.g. Workspace.ver
    #[arg(long)]
    method: String,

    /// Params as JSON
    #[arg(long)]
    params: Option<String>,
}

#[derive(Args)]
struct ResolveArgs {
    /// ServiceWizard endpoint
    #[arg(long)]
    discovery_url: String,

    /// Module name
    #[arg(long)]
    module: String,

    /// Release version or tag
    #[arg(long, default_value = "auto")]
    version: String,
}

#[derive(Args)]
struct SearchTypesArgs {
    /// Search2 legacy endpoint
    #[arg(long, default_value = "https://ci.kbase.us/services/searchapi2/legacy")]
    url: String,

    /// Full-text query
    #[arg(long)]
    text: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    let output = match cli.command {
        Commands::Call(args) => run_call(args, config).await?,
        Commands::Resolve(args) => run_resolve(args, config).await?,
        Commands::SearchTypes(args) => run_search_types(args, config).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ClientConfig::default(),
    }
    .with_env_token();

    if let Some(token) = &cli.token {
        config.authorization = Some(token.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeouts.request = Duration::from_millis(timeout_ms);
    }

    debug!(
        authorized = config.authorization.is_some(),
        timeout_ms = config.timeouts.request.as_millis(),
        "Client configuration loaded"
    );
    Ok(config)
}

async fn run_call(args: CallArgs, config: ClientConfig) -> Result<Value> {
    let params = args
        .params
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--params is not valid JSON")?;

    let client = RpcClient::builder(&args.url)
        .dialect(args.dialect)
        .config(config)
        .build()
        .context("Failed to create RPC client")?;

    info!(method = %args.method, dialect = %args.dialect, "Calling");
    client
        .call(&args.method, params, CallOptions::default())
        .await
        .with_context(|| format!("{} failed", args.method))
}

async fn run_resolve(args: ResolveArgs, config: ClientConfig) -> Result<Value> {
    let cache = Arc::new(ServiceCache::new(config.cache.clone())?);
    let client = RpcClient::builder(&args.discovery_url)
        .dialect(Dialect::V1_1)
        .config(config)
        .build()
        .context("Failed to create discovery client")?;

    let dynamic = DynamicServiceClient::new(&args.module, client, Dialect::V1_1, cache)?
        .with_version(args.version);

    info!(key = %dynamic.module_key(), "Resolving");
    let status = dynamic
        .resolve()
        .await
        .with_context(|| format!("Failed to resolve {}", args.module))?;
    Ok(serde_json::to_value(status)?)
}

async fn run_search_types(args: SearchTypesArgs, config: ClientConfig) -> Result<Value> {
    let client = RpcClient::builder(&args.url)
        .dialect(Dialect::V2_0)
        .config(config)
        .build()
        .context("Failed to create search client")?;
    let search = Search2LegacyClient::new(client)?;

    let result = search
        .search_types(&SearchTypesParams::full_text(&args.text))
        .await
        .context("search_types failed")?;
    Ok(serde_json::to_value(result)?)
}
