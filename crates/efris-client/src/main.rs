// ============================================
// File: crates/efris-client/src/main.rs
// ============================================
//! # EFRIS Client Entry Point
//!
//! ## Creation Reason
//! Command-line front end for the session key lifecycle and envelope
//! calls. Each command prints one `Outcome` JSON object on stdout and
//! exits non-zero on failure; logs go to stderr.
//!
//! ## Usage
//! ```bash
//! # Daily key rotation (cron)
//! efris refresh-key --config /etc/efris/client.toml
//!
//! # Envelope helpers
//! efris encrypt --payload '{"a":1}'
//! efris decrypt --content 96da4jqLYngT/Xmqbwk1xA==
//!
//! # Call an interface
//! efris send --interface T119 --payload @lookup.json
//!
//! # Check config and credential archive
//! efris validate
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every process starts with an empty key cache, so commands that need a
//!   key perform a handshake unless `--key` is given
//! - `RUST_LOG` overrides the configured log level
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use efris_common::{InterfaceCode, TenantId};
use efris_core::SessionKey;
use efris_client::{ClientConfig, GatewayService, KeyExchangeClient, Outcome, SessionKeyStore};
use efris_transport::{GatewayTransport, ReqwestTransport};

// ============================================
// CLI Definition
// ============================================

/// EFRIS session key and envelope client
#[derive(Parser, Debug)]
#[command(name = "efris")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "EFRIS_CONFIG", default_value = "/etc/efris/client.toml")]
    config: PathBuf,

    /// Taxpayer TIN (overrides [tenant].tin)
    #[arg(long, global = true)]
    tin: Option<String>,

    /// Device number (overrides [tenant].device_no)
    #[arg(long, global = true)]
    device_no: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the key exchange and cache the new session key
    RefreshKey,

    /// Encrypt and sign a JSON payload
    Encrypt {
        /// JSON text, or @path to read it from a file
        #[arg(short, long)]
        payload: String,

        /// Use this hex session key instead of running the key exchange
        #[arg(long)]
        key: Option<String>,
    },

    /// Decrypt gateway content
    Decrypt {
        /// Base64 content
        #[arg(long)]
        content: String,

        /// Content is gzip-compressed
        #[arg(long)]
        compressed: bool,

        /// Use this hex session key instead of running the key exchange
        #[arg(long)]
        key: Option<String>,
    },

    /// Send a JSON payload to a gateway interface
    Send {
        /// Interface code (e.g. T101, T109, T119)
        #[arg(short, long)]
        interface: InterfaceCode,

        /// JSON text, or @path to read it from a file
        #[arg(short, long, default_value = "{}")]
        payload: String,
    },

    /// Validate configuration and the credential archive
    Validate,
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            error!("{:#}", e);
            finish(Outcome::<()>::failure(format!("{e:#}")).to_json());
        }
    };
    init_logging(&config.logging.level);

    let result = match cli.command {
        Commands::RefreshKey => cmd_refresh_key(&config, &cli).await,
        Commands::Encrypt { ref payload, ref key } => {
            cmd_encrypt(&config, &cli, payload, key.as_deref()).await
        }
        Commands::Decrypt {
            ref content,
            compressed,
            ref key,
        } => cmd_decrypt(&config, &cli, content, compressed, key.as_deref()).await,
        Commands::Send {
            ref interface,
            ref payload,
        } => cmd_send(&config, &cli, interface.clone(), payload).await,
        Commands::Validate => Ok(cmd_validate(&config, &cli.config)),
    };

    let output = result.unwrap_or_else(|e| {
        error!("{:#}", e);
        Outcome::<()>::failure(format!("{e:#}")).to_json()
    });
    finish(output);
}

/// Prints the outcome and exits with its status.
fn finish(output: Value) -> ! {
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{output}"),
    }
    let ok = output.get("success").and_then(Value::as_bool).unwrap_or(false);
    std::process::exit(if ok { 0 } else { 1 });
}

// ============================================
// Commands
// ============================================

/// Forces a key exchange for the tenant.
async fn cmd_refresh_key(config: &ClientConfig, cli: &Cli) -> anyhow::Result<Value> {
    let tenant = tenant(config, cli)?;
    let service = build_service(config)?;

    info!(tenant = %tenant, "Refreshing session key");
    Ok(service.refresh_key(&tenant).await.to_json())
}

/// Encrypts and signs a payload.
async fn cmd_encrypt(
    config: &ClientConfig,
    cli: &Cli,
    payload: &str,
    key: Option<&str>,
) -> anyhow::Result<Value> {
    let tenant = tenant(config, cli)?;
    let payload = read_payload(payload).await?;
    let service = build_service(config)?;
    preload_key(&service, config, &tenant, key)?;

    Ok(service.encrypt(&tenant, &payload).await.to_json())
}

/// Decrypts gateway content.
async fn cmd_decrypt(
    config: &ClientConfig,
    cli: &Cli,
    content: &str,
    compressed: bool,
    key: Option<&str>,
) -> anyhow::Result<Value> {
    let tenant = tenant(config, cli)?;
    let service = build_service(config)?;
    preload_key(&service, config, &tenant, key)?;

    Ok(service.decrypt(&tenant, content, compressed).await.to_json())
}

/// Sends a payload to an interface.
async fn cmd_send(
    config: &ClientConfig,
    cli: &Cli,
    interface: InterfaceCode,
    payload: &str,
) -> anyhow::Result<Value> {
    let tenant = tenant(config, cli)?;
    let payload = read_payload(payload).await?;
    let service = build_service(config)?;

    info!(tenant = %tenant, interface = %interface, "Sending payload");
    Ok(service.send(&tenant, interface, &payload).await.to_json())
}

/// What `validate` reports.
#[derive(Serialize)]
struct ValidationReport {
    config: String,
    server_url: String,
    tenant: Option<String>,
    archive_path: String,
    key_ttl_secs: u64,
    unwrap_schemes: Vec<String>,
}

/// Validates the configuration and loads the credential archive once.
fn cmd_validate(config: &ClientConfig, config_path: &Path) -> Value {
    let report = config.credential_store().load().map(|_| ValidationReport {
        config: config_path.display().to_string(),
        server_url: config.gateway.server_url.clone(),
        tenant: config.tenant_id(None, None).ok().map(|t| t.to_string()),
        archive_path: config.credential.archive_path.display().to_string(),
        key_ttl_secs: config.key_cache.ttl_secs,
        unwrap_schemes: config
            .key_cache
            .unwrap_schemes
            .iter()
            .map(ToString::to_string)
            .collect(),
    });
    Outcome::from_result(report).to_json()
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber on stderr.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads config, or defaults if the file does not exist.
async fn load_config(path: &Path) -> anyhow::Result<ClientConfig> {
    if path.exists() {
        Ok(ClientConfig::load(path).await?)
    } else {
        Ok(ClientConfig::default())
    }
}

fn tenant(config: &ClientConfig, cli: &Cli) -> anyhow::Result<TenantId> {
    Ok(config.tenant_id(cli.tin.as_deref(), cli.device_no.as_deref())?)
}

fn build_service(config: &ClientConfig) -> anyhow::Result<GatewayService> {
    let transport: Arc<dyn GatewayTransport> = Arc::new(ReqwestTransport::new()?);
    let exchange = KeyExchangeClient::from_config(config, transport.clone());
    let keys = Arc::new(SessionKeyStore::from_config(config, Arc::new(exchange)));
    Ok(GatewayService::from_config(config, transport, keys))
}

/// Seeds the key cache with an explicit key.
fn preload_key(
    service: &GatewayService,
    config: &ClientConfig,
    tenant: &TenantId,
    key_hex: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(key_hex) = key_hex {
        let key = SessionKey::from_hex(key_hex).context("--key")?;
        service.key_store().set(tenant, &key, config.key_ttl());
    }
    Ok(())
}

/// Reads a JSON payload given inline or as `@path`.
async fn read_payload(arg: &str) -> anyhow::Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read payload file {path}"))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}
