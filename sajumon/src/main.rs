// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use sajumon::config;
use sajumon::relay::Relay;
use sajumon::server;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sajumon", about = "Day-pillar calculator and streaming chat relay")]
struct Cli {
    /// Path to the sajumon.yaml config file
    #[arg(long, default_value = "sajumon.yaml", env = "SAJUMON_CONFIG")]
    config: String,

    /// Port to listen on (overrides server.port)
    #[arg(long, env = "SAJUMON_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let source = config::FileSource {
        path: std::path::PathBuf::from(&cli.config),
    };
    let config = match config::load_config(&source) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(path = %cli.config, "failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        version = %config.version,
        fingerprint = %config.fingerprint,
        upstream = %config.upstream.endpoint(),
        wire = config.upstream.wire.as_str(),
        model = %config.upstream.model,
        "config loaded"
    );
    if config.upstream.api_key.is_empty() {
        tracing::warn!("upstream api_key is empty; requests will be sent without credentials");
    }

    let relay = Relay::from_config(&config, reqwest::Client::new());
    let state = server::AppState {
        relay: Arc::new(relay),
    };
    let app = server::build_router(state, &config.cors);

    let port = cli.port.unwrap_or(config.server.port);
    let addr = SocketAddr::new(config.server.host, port);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, "failed to bind: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "sajumon listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
