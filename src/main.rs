//! Preview Router
//!
//! Sends `<sha>.preview.<domain>` traffic to the matching per-commit
//! preview service and guards post-login redirects.
//!
//! # Startup
//! ```text
//! defaults → --config TOML → environment → validation
//!     → logging → metrics (optional) → listener → serve until SIGINT/SIGTERM
//! ```

use std::path::PathBuf;

use clap::Parser;

use preview_router::config::load_config;
use preview_router::http::HttpServer;
use preview_router::lifecycle::{wait_for_signal, Shutdown};
use preview_router::net::Listener;
use preview_router::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "preview-router", version, about = "Routes preview hosts to per-commit services")]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate configuration and exit.
    #[arg(long)]
    check: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config errors go to stderr before logging exists.
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("preview-router: {e}");
            std::process::exit(1);
        }
    };

    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }
    if args.check {
        println!("configuration ok");
        return Ok(());
    }

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "preview-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        namespace = %config.routing.namespace,
        service_pattern = %config.routing.service_pattern,
        service_port = %config.routing.service_port,
        domain_suffix = %config.routing.domain_suffix,
        fallback_url = %config.routing.fallback_url,
        strict_hosts = config.routing.strict_hosts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
    });

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
