//! Gatehouse - HTTP gateway for SaaS integrations with a local MCP server registry

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::api::{self, AppState};
use gatehouse::config::{Config, ProxyMode};
use gatehouse::registry::{ProvisionTiming, ServerRegistry};
use gatehouse::upstream::Backends;

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "HTTP gateway for SaaS integrations with a local MCP server registry")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Backend selection: auto, live or stub
        #[arg(long)]
        mode: Option<String>,
    },

    /// Show which vendors are live and which are stubbed
    Services,

    /// List installed and running MCP servers
    Servers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment before logging so RUST_LOG from .env applies
    let _ = dotenvy::dotenv();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("gatehouse={},tower_http=debug", log_level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init => {
            // Environment overrides stay out of the written file
            let config = Config::load_or_default(config_path)?;
            let path = config.save(config_path)?;
            println!("✓ Config written to {}", path.display());
            println!("\nAPI keys are read from the environment:");
            println!("  CURSOR_API_KEY, SCRAPYBARA_API_KEY, MEM0_API_KEY, PIPEDREAM_API_KEY");
        }

        Commands::Serve { port, mode } => {
            let mut config = Config::load(config_path)?;
            if let Some(port) = port {
                config.http_port = port;
            }
            if let Some(mode) = mode {
                config.mode = mode.parse::<ProxyMode>()?;
            }

            let registry = open_registry(&config)?;
            let addr = format!("{}:{}", config.bind_address, config.http_port);
            let state = AppState::new(config, registry)?;
            let router = api::create_router(state);

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Starting HTTP server on {}", listener.local_addr()?);

            println!("Gatehouse running at http://{}", addr);
            println!("  API:      http://{}/api/...", addr);
            println!("  API Docs: http://{}/api/docs", addr);
            println!("  Health:   http://{}/health", addr);

            let shutdown = CancellationToken::new();
            tokio::spawn({
                let shutdown = shutdown.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Shutdown requested");
                    }
                    shutdown.cancel();
                }
            });

            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled_owned().await })
                .await?;
        }

        Commands::Services => {
            let config = Config::load(config_path)?;
            let backends = Backends::from_config(&config)?;

            println!("Gatehouse Services");
            println!("==================");
            println!("Mode: {:?}", config.mode);
            println!();
            for (vendor, mode) in backends.available_services() {
                let base_url = &config.vendors.get(vendor).base_url;
                println!("{:<12} {:<5} {}", vendor.to_string(), mode.to_string(), base_url);
            }
        }

        Commands::Servers => {
            let config = Config::load(config_path)?;
            let registry = open_registry(&config)?;
            let snapshot = registry.snapshot()?;

            if snapshot.installed.is_empty() {
                println!("No MCP servers installed");
            } else {
                for id in &snapshot.installed {
                    let marker = if snapshot.running.contains(id) { "running" } else { "stopped" };
                    println!("• {} ({})", id, marker);
                }
                println!();
                println!(
                    "{} installed, {} running",
                    snapshot.total_installed(),
                    snapshot.total_running()
                );
            }
        }
    }

    Ok(())
}

fn open_registry(config: &Config) -> anyhow::Result<ServerRegistry> {
    let timing = ProvisionTiming::from(&config.registry);

    let registry = if config.registry.persist {
        let path = config.registry_db_path();
        tracing::info!("Opening MCP registry at {}", path.display());
        ServerRegistry::open(&path, timing)?
    } else {
        ServerRegistry::open_in_memory(timing)?
    };

    Ok(registry)
}
