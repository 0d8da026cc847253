//! Client implementation.
//!
//! The client owns:
//! - the arena simulation, stepped at a fixed rate
//! - an [`EchoSink`] that receives one save per collected echo
//! - the HUD state fed by save outcomes

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use echo_shared::{
    api::SaveEchoRequest,
    config::EchoConfig,
    event::{ContactHit, DashEvent, EchoCollected, EnemyDefeated, EnemySpawned},
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    game::GameState,
    input::InputState,
    sink::{spawn_save, EchoSink, HttpEchoSink, SaveOutcome},
};

/// Status shown when a save could not reach the server.
pub const CONNECTION_ERROR: &str = "Connection error";

/// What the player sees besides the arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hud {
    /// Echo count as last reported by the server.
    pub echo_count: usize,
    pub status: String,
    pub saves_in_flight: usize,
}

/// High-level game client.
pub struct GameClient {
    pub cfg: EchoConfig,
    pub game: GameState,
    pub hud: Hud,
    sink: Arc<dyn EchoSink>,
    outcomes_tx: mpsc::UnboundedSender<SaveOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<SaveOutcome>,
    tick: u64,
}

impl GameClient {
    /// Creates a client saving over HTTP to `cfg.api_base`.
    pub fn connect(cfg: EchoConfig) -> anyhow::Result<Self> {
        let sink = HttpEchoSink::new(&cfg.api_base).context("create http sink")?;
        info!(api = %cfg.api_base, user_id = %cfg.user_id, "Echo client ready");
        Self::with_sink(cfg, Arc::new(sink))
    }

    /// Creates a client with a caller-provided sink.
    pub fn with_sink(cfg: EchoConfig, sink: Arc<dyn EchoSink>) -> anyhow::Result<Self> {
        cfg.validate().context("invalid config")?;
        let game = GameState::new(cfg.tuning, cfg.echo_type.clone(), cfg.seed);
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Ok(Self {
            cfg,
            game,
            hud: Hud::default(),
            sink,
            outcomes_tx,
            outcomes_rx,
            tick: 0,
        })
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(self.cfg.tick_dt())
    }

    /// Advances one fixed step and fires a save for every echo collected in it.
    ///
    /// Must run inside a tokio runtime.
    pub fn tick(&mut self, input: InputState) {
        self.game.step(self.tick_interval(), input);
        self.tick += 1;
        self.dispatch_events();
        self.poll_saves();
    }

    fn dispatch_events(&mut self) {
        for defeated in self.game.events.drain::<EnemyDefeated>() {
            debug!(enemy = ?defeated.enemy, "Enemy defeated");
        }
        for spawned in self.game.events.drain::<EnemySpawned>() {
            debug!(enemy = ?spawned.enemy, "Enemy spawned");
        }
        for hit in self.game.events.drain::<ContactHit>() {
            debug!(enemy = ?hit.enemy, tick = self.tick, "Contact");
        }
        for dash in self.game.events.drain::<DashEvent>() {
            debug!(?dash, tick = self.tick, "Dash");
        }
        for echo in self.game.events.drain::<EchoCollected>() {
            let req = SaveEchoRequest::new(self.cfg.user_id.clone(), echo.echo_type);
            spawn_save(Arc::clone(&self.sink), req, self.outcomes_tx.clone());
            self.hud.saves_in_flight += 1;
        }
    }

    /// Folds finished saves into the HUD. Returns how many finished.
    pub fn poll_saves(&mut self) -> usize {
        let mut finished = 0;
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply_outcome(outcome);
            finished += 1;
        }
        finished
    }

    /// Waits until every in-flight save has reported, or `timeout` passes.
    pub async fn wait_for_saves(&mut self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.hud.saves_in_flight > 0 {
            match tokio::time::timeout_at(deadline, self.outcomes_rx.recv()).await {
                Ok(Some(outcome)) => self.apply_outcome(outcome),
                // The client holds a sender, so the channel cannot close.
                Ok(None) => break,
                Err(_) => anyhow::bail!(
                    "{} saves still pending after {timeout:?}",
                    self.hud.saves_in_flight
                ),
            }
        }
        Ok(())
    }

    fn apply_outcome(&mut self, outcome: SaveOutcome) {
        self.hud.saves_in_flight = self.hud.saves_in_flight.saturating_sub(1);
        match outcome {
            // Saves race each other; never move the counter backwards.
            SaveOutcome::Saved { count } => {
                self.hud.echo_count = self.hud.echo_count.max(count);
                self.hud.status = format!("Echoes: {}", self.hud.echo_count);
            }
            SaveOutcome::Failed { .. } => {
                self.hud.status = CONNECTION_ERROR.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use echo_shared::{api::SaveEchoResponse, echo::EchoRecord, math::Vec2};
    use tokio::sync::Mutex;

    use super::*;
    use crate::input::Buttons;

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<SaveEchoRequest>>,
    }

    #[async_trait]
    impl EchoSink for RecordingSink {
        async fn save(&self, req: &SaveEchoRequest) -> anyhow::Result<SaveEchoResponse> {
            let mut saved = self.saved.lock().await;
            saved.push(req.clone());
            let inventory = saved
                .iter()
                .map(|r| EchoRecord::new(r.echo_type().unwrap_or_default()))
                .collect::<Vec<_>>();
            Ok(SaveEchoResponse {
                success: true,
                count: inventory.len(),
                inventory,
            })
        }
    }

    #[derive(Default)]
    struct DownSink {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EchoSink for DownSink {
        async fn save(&self, _req: &SaveEchoRequest) -> anyhow::Result<SaveEchoResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("connection refused")
        }
    }

    fn cfg() -> EchoConfig {
        EchoConfig {
            user_id: "u1".into(),
            ..Default::default()
        }
    }

    fn put_enemy_next_to_player(client: &mut GameClient) {
        let (enemy, _) = client.game.nearest_enemy().expect("enemy");
        let at = client.game.player_position() + Vec2::new(50.0, 0.0);
        client.game.place(enemy, at);
    }

    #[tokio::test]
    async fn defeated_enemy_is_saved_and_counted() -> anyhow::Result<()> {
        let sink = Arc::new(RecordingSink::default());
        let mut client = GameClient::with_sink(cfg(), sink.clone())?;
        put_enemy_next_to_player(&mut client);

        client.tick(InputState::default().with(Buttons::ATTACK));
        assert_eq!(client.hud.saves_in_flight, 1);
        client.wait_for_saves(Duration::from_secs(1)).await?;

        assert_eq!(client.hud.echo_count, 1);
        assert_eq!(client.hud.status, "Echoes: 1");
        let saved = sink.saved.lock().await;
        assert_eq!(saved.as_slice(), [SaveEchoRequest::new("u1", "Echo_Core")]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_save_shows_connection_error_once() -> anyhow::Result<()> {
        let sink = Arc::new(DownSink::default());
        let mut client = GameClient::with_sink(cfg(), sink.clone())?;
        put_enemy_next_to_player(&mut client);

        client.tick(InputState::default().with(Buttons::ATTACK));
        client.wait_for_saves(Duration::from_secs(1)).await?;

        assert_eq!(client.hud.status, CONNECTION_ERROR);
        assert_eq!(client.hud.echo_count, 0);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn respawned_enemy_restores_count() -> anyhow::Result<()> {
        let mut client = GameClient::with_sink(cfg(), Arc::new(RecordingSink::default()))?;
        put_enemy_next_to_player(&mut client);
        client.tick(InputState::default().with(Buttons::ATTACK));
        assert_eq!(client.game.enemy_count(), 0);

        // 1.5s at 60 Hz, plus slack for the fractional step length.
        for _ in 0..95 {
            client.tick(InputState::default());
        }
        assert_eq!(client.game.enemy_count(), 1);
        client.wait_for_saves(Duration::from_secs(1)).await?;
        Ok(())
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = EchoConfig {
            tick_hz: 0,
            ..Default::default()
        };
        assert!(GameClient::with_sink(cfg, Arc::new(DownSink::default())).is_err());
    }
}
