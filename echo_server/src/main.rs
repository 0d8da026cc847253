//! Standalone server binary.
//!
//! Usage:
//!   cargo run -p echo_server -- [--addr 127.0.0.1:3000] [--public-dir public] [--config echo.json]
//!
//! A `PORT` environment variable overrides the port of the listen address.

use std::env;

use anyhow::Context;
use echo_server::{server::apply_port_override, EchoServer};
use echo_shared::config::EchoConfig;
use tracing::info;

fn parse_args() -> anyhow::Result<EchoConfig> {
    let args: Vec<String> = env::args().collect();

    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => EchoConfig::from_json_file(&args[i + 1])?,
        _ => EchoConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--public-dir" if i + 1 < args.len() => {
                cfg.public_dir = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }

    Ok(apply_port_override(cfg, env::var("PORT").ok().as_deref()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    info!(addr = %cfg.server_addr, public_dir = %cfg.public_dir, "Starting echo server");

    let server = EchoServer::bind(cfg).await.context("create server")?;
    server
        .serve_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        })
        .await
}
