//! Fitness tracker backend entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fitness_proxy::api::{data_proxy_router, gateway_router, RouterOptions};
use fitness_proxy::config::Config;
use fitness_proxy::gemini::GeminiClient;
use fitness_proxy::metrics;
use fitness_proxy::store::SupabaseStore;
use fitness_proxy::utils::shutdown_signal;

/// Gemini proxy and per-user data proxy.
#[derive(Parser, Debug)]
#[command(name = "fitness-proxy")]
#[command(about = "Gemini API proxy and Supabase data proxy for the fitness tracker")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Listen port (overrides PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve static files and the Gemini proxy (default).
    Gateway,

    /// Serve the gateway plus the session and nutrition endpoints.
    DataProxy,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so RUST_LOG from .env applies
    let config = Config::load();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("fitness_proxy=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = config
                .as_ref()
                .map(|c| c.rust_log.clone())
                .unwrap_or_else(|_| "info".to_string());
            EnvFilter::new(level)
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    // Initialize metrics
    let prometheus = match metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };

    let mut config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(port) = args.port {
        config.port = port;
    }

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::DataProxy) => cmd_data_proxy(config, prometheus).await,
        Some(Command::Gateway) | None => cmd_gateway(config, prometheus).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("FITNESS PROXY - CONFIGURATION CHECK");
    println!("======================================================================");
    println!("  Port: {}", config.port);
    println!("  Static Dir: {}", config.static_dir.display());
    println!("  Gemini Model: {}", config.gemini_model);
    println!("  Gemini API Base: {}", config.gemini_api_base);
    println!(
        "  Gemini API Key: {}",
        if config.gemini_api_key().is_some() { "present" } else { "MISSING (generate requests will fail)" }
    );
    match config.upstream_timeout() {
        Some(timeout) => println!("  Upstream Timeout: {}s", timeout.as_secs()),
        None => println!("  Upstream Timeout: none"),
    }

    print!("Checking data store settings... ");
    match config.store_settings() {
        Ok(settings) => {
            println!("OK");
            println!("  Supabase URL: {}", settings.url);
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("data-proxy configuration incomplete"));
        }
    }

    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the gateway: static files and the Gemini proxy.
async fn cmd_gateway(config: Config, metrics: Option<PrometheusHandle>) -> anyhow::Result<()> {
    let gemini = build_gemini(&config)?;
    let options = router_options(&config, metrics);

    serve(config.port, gateway_router(gemini, &options)).await
}

/// Run the data proxy: the gateway plus Supabase-backed endpoints.
async fn cmd_data_proxy(
    config: Config,
    metrics: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    // Missing store settings are fatal before binding
    let settings = config.store_settings().map_err(|e| {
        error!("Supabase URL or key is not configured: {}", e);
        e
    })?;

    let gemini = build_gemini(&config)?;
    let store = SupabaseStore::new(&settings, &config)?;
    let options = router_options(&config, metrics);

    info!("Data store: {}", settings.url);

    serve(
        config.port,
        data_proxy_router(gemini, Arc::new(store), &options),
    )
    .await
}

fn build_gemini(config: &Config) -> anyhow::Result<GeminiClient> {
    let gemini = GeminiClient::new(config)?;
    if gemini.has_api_key() {
        info!("Gemini model: {}", gemini.model());
    } else {
        warn!("GEMINI_API_KEY is not set; /api/proxy-generate will return 500");
    }
    Ok(gemini)
}

fn router_options(config: &Config, metrics: Option<PrometheusHandle>) -> RouterOptions {
    RouterOptions {
        static_dir: config.static_dir.clone(),
        metrics,
    }
}

async fn serve(port: u16, router: axum::Router) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server running at http://localhost:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
