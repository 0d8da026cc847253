//! Standalone headless client.
//!
//! Usage:
//!   cargo run -p echo_client -- [--api http://127.0.0.1:3000] [--user ID] [--ticks N] [--seed S] [--config echo.json]
//!
//! Runs the arena with the autopilot driving input, saves every collected echo
//! to the backend, then prints the server-side inventory.

use std::env;
use std::time::Duration;

use anyhow::Context;
use echo_client::{autopilot::Autopilot, sink::HttpEchoSink, GameClient};
use echo_shared::config::EchoConfig;
use tracing::{info, warn};

struct Args {
    cfg: EchoConfig,
    ticks: u64,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = env::args().collect();

    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => EchoConfig::from_json_file(&args[i + 1])?,
        _ => EchoConfig::default(),
    };
    let mut ticks = 60 * 30;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--api" if i + 1 < args.len() => {
                cfg.api_base = args[i + 1].clone();
                i += 2;
            }
            "--user" if i + 1 < args.len() => {
                cfg.user_id = args[i + 1].clone();
                i += 2;
            }
            "--ticks" if i + 1 < args.len() => {
                ticks = args[i + 1].parse().unwrap_or(ticks);
                i += 2;
            }
            "--seed" if i + 1 < args.len() => {
                cfg.seed = args[i + 1].parse().unwrap_or(cfg.seed);
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(Args { cfg, ticks })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let Args { cfg, ticks } = parse_args()?;
    info!(api = %cfg.api_base, user_id = %cfg.user_id, ticks, "Starting client");

    let api_base = cfg.api_base.clone();
    let user_id = cfg.user_id.clone();
    let mut client = GameClient::connect(cfg).context("connect")?;
    let mut pilot = Autopilot::default();

    let mut interval = tokio::time::interval(client.tick_interval());
    let report_every = u64::from(client.cfg.tick_hz) * 5;
    for _ in 0..ticks {
        interval.tick().await;
        let input = pilot.next_input(&client.game);
        client.tick(input);

        if client.tick_count() % report_every == 0 {
            let stats = client.game.stats();
            info!(
                tick = client.tick_count(),
                enemies = client.game.enemy_count(),
                defeated = stats.enemies_defeated,
                contacts = stats.contact_hits,
                status = %client.hud.status,
                "Progress"
            );
        }
    }

    if let Err(e) = client.wait_for_saves(Duration::from_secs(5)).await {
        warn!(error = %e, "Some saves did not finish");
    }
    let stats = client.game.stats();
    info!(
        defeated = stats.enemies_defeated,
        dashes = stats.dashes,
        echo_count = client.hud.echo_count,
        status = %client.hud.status,
        "Run finished"
    );

    let sink = HttpEchoSink::new(&api_base)?;
    match sink.inventory(&user_id).await {
        Ok(inv) => println!("{} holds {} echoes", inv.user_id, inv.items.len()),
        Err(e) => println!("Could not read inventory: {e:#}"),
    }
    Ok(())
}
