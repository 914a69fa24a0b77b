//! Status Cat Cache - read-through cache for HTTP status cat images
//!
//! Serves `/<code>` from a local directory, fetching misses from the
//! upstream image source.

use clap::{ArgAction, Parser};
use status_cat_cache::{start_server, CacheConfig, ServerState, SharedState, StartupError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "status-cat-cache")]
#[command(about = "Read-through cache for HTTP status cat images")]
#[command(disable_help_flag = true)]
struct Args {
    /// Host to bind
    #[arg(short = 'h', long, env = "HOST")]
    host: String,

    /// Port to bind
    #[arg(short, long, env = "PORT")]
    port: u16,

    /// Path to the cache directory (created if missing)
    #[arg(short, long = "cache", env = "CACHE_DIR")]
    cache: PathBuf,

    /// Base URL of the upstream image source
    #[arg(long, env = "UPSTREAM_URL", default_value = "https://http.cat")]
    upstream: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    upstream_timeout_secs: u64,

    /// Largest accepted PUT body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 10 * 1024 * 1024)]
    max_body_bytes: usize,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let args = Args::parse();

    let env_filter = EnvFilter::from_default_env()
        .add_directive("status_cat_cache=info".parse()?)
        .add_directive("status_image_store=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    let config = load_config(args)?;
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Upstream: {}", config.upstream_url);

    let state = ServerState::from_config(&config)?;
    state.store.init().await?;
    let state: SharedState = Arc::new(state);

    start_server(state, &config.host, config.port).await?;

    info!("Server stopped");
    Ok(())
}

fn load_config(args: Args) -> Result<CacheConfig, StartupError> {
    if args.upstream_timeout_secs == 0 {
        return Err(StartupError::Config(
            "upstream timeout must be at least one second".to_string(),
        ));
    }

    let cache_dir = std::path::absolute(&args.cache)?;

    Ok(CacheConfig {
        host: args.host,
        port: args.port,
        cache_dir,
        upstream_url: args.upstream,
        upstream_timeout_secs: args.upstream_timeout_secs,
        max_body_bytes: args.max_body_bytes,
    })
}
