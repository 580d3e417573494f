use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdserve::{AppState, Config, Credentials, routes, tls};

#[derive(Parser, Debug)]
#[command(name = "mdserve")]
#[command(about = "Serve a directory over HTTP(S), rendering Markdown files as themed HTML")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "MDSERVE_PORT", default_value = "8000")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "MDSERVE_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Root directory to serve files from
    #[arg(long, env = "MDSERVE_DIRECTORY", default_value = ".")]
    directory: PathBuf,

    /// Username for HTTP Basic authentication
    #[arg(short, long, env = "MDSERVE_USER")]
    user: Option<String>,

    /// Password for HTTP Basic authentication
    #[arg(short = 'P', long, env = "MDSERVE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// TLS certificate chain (PEM); requires --key
    #[arg(short, long, env = "MDSERVE_CERT")]
    cert: Option<PathBuf>,

    /// TLS private key (PEM); requires --cert
    #[arg(short, long, env = "MDSERVE_KEY")]
    key: Option<PathBuf>,

    /// Config file path (optional)
    #[arg(long, env = "MDSERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "MDSERVE_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "mdserve=debug,tower_http=debug"
    } else {
        "mdserve=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = match &cli.config {
        Some(path) => Config::from_file(path).context("loading config")?,
        None => Config::default(),
    };
    let grace = config.shutdown_grace();

    let credentials = Credentials::new(cli.user, cli.password);
    if credentials.username.is_some() != credentials.password.is_some() {
        warn!("Only one of --user/--password is set; the other must be sent empty");
    }

    let state = AppState::new(cli.directory, credentials, config).context("invalid server setup")?;
    info!("Serving files from: {}", state.root_dir.display());
    if state.credentials.is_enabled() {
        info!("HTTP Basic authentication enabled");
    }

    let app = routes::build_router(state);
    let addr = SocketAddr::new(cli.bind, cli.port);

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone(), grace));

    match (cli.cert, cli.key) {
        (Some(cert), Some(key)) => {
            let tls_config = tls::server_config(&cert, &key)
                .context("loading TLS certificate and key")?;
            let rustls_config = RustlsConfig::from_config(Arc::new(tls_config));

            info!("Starting mdserve on https://{}", addr);
            axum_server::bind_rustls(addr, rustls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .with_context(|| format!("serving on {}", addr))?;
        }
        (None, None) => {
            info!("Starting mdserve on http://{}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .with_context(|| format!("serving on {}", addr))?;
        }
        _ => bail!("--cert and --key must be given together"),
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then stop accepting and drain in-flight requests.
async fn shutdown_signal(handle: Handle, grace: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(grace));
}
