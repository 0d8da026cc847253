//! Full socket-based integration tests for client ↔ server communication.

use std::time::Duration;

use echo_client::{input::Buttons, input::InputState, sink::HttpEchoSink, GameClient};
use echo_shared::{
    api::{SaveEchoRequest, SaveEchoResponse, SAVE_ECHO_PATH},
    config::EchoConfig,
    math::Vec2,
};
use echo_tests::{init_tracing, RunningServer};

#[tokio::test]
async fn repeated_posts_count_up() -> anyhow::Result<()> {
    init_tracing();
    let server = RunningServer::start().await?;
    let http = reqwest::Client::new();
    let body = serde_json::json!({"userId": "u1", "type": "Echo_Core"});

    let mut last = None;
    for _ in 0..2 {
        let res: SaveEchoResponse = http
            .post(server.url(SAVE_ECHO_PATH))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        last = Some(res);
    }
    let last = last.expect("two responses");
    assert!(last.success);
    assert_eq!(last.count, 2);

    server.stop().await
}

#[tokio::test]
async fn missing_field_is_400_over_the_wire() -> anyhow::Result<()> {
    init_tracing();
    let server = RunningServer::start().await?;

    let res = reqwest::Client::new()
        .post(server.url(SAVE_ECHO_PATH))
        .json(&serde_json::json!({"type": "Echo_Core"}))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let sink = HttpEchoSink::new(&server.cfg.api_base)?;
    let err = echo_client::sink::EchoSink::save(&sink, &SaveEchoRequest::default())
        .await
        .expect_err("rejected");
    assert!(err.to_string().contains("400"), "{err}");

    server.stop().await
}

/// Full loop: defeat an enemy in the simulation, let the client save it, then
/// read the inventory back from the server.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn defeated_enemy_lands_in_server_inventory() -> anyhow::Result<()> {
    init_tracing();
    let server = RunningServer::start().await?;

    let mut client = GameClient::connect(EchoConfig {
        user_id: "integration".into(),
        ..server.cfg.clone()
    })?;

    for _ in 0..3 {
        let (enemy, _) = client.game.nearest_enemy().expect("enemy present");
        let at = client.game.player_position() + Vec2::new(40.0, 0.0);
        client.game.place(enemy, at);
        client.tick(InputState::default().with(Buttons::ATTACK));
        // Release, then wait out the respawn.
        for _ in 0..100 {
            client.tick(InputState::default());
        }
    }
    client.wait_for_saves(Duration::from_secs(5)).await?;

    assert_eq!(client.game.stats().enemies_defeated, 3);
    assert_eq!(client.hud.echo_count, 3);
    assert_eq!(client.hud.status, "Echoes: 3");

    let inv = HttpEchoSink::new(&server.cfg.api_base)?
        .inventory("integration")
        .await?;
    assert_eq!(inv.items.len(), 3);
    assert!(inv.items.iter().all(|r| r.echo_type == "Echo_Core"));

    server.stop().await
}

#[tokio::test]
async fn unreachable_server_sets_connection_error() -> anyhow::Result<()> {
    init_tracing();
    // Bind and stop a server so the port is known to be closed.
    let server = RunningServer::start().await?;
    let cfg = server.cfg.clone();
    server.stop().await?;

    let mut client = GameClient::connect(cfg)?;
    let (enemy, _) = client.game.nearest_enemy().expect("enemy present");
    let at = client.game.player_position();
    client.game.place(enemy, at);
    client.tick(InputState::default().with(Buttons::ATTACK));
    client.wait_for_saves(Duration::from_secs(5)).await?;

    assert_eq!(client.hud.status, echo_client::client::CONNECTION_ERROR);
    assert_eq!(client.hud.echo_count, 0);
    Ok(())
}
