//! Configuration system.
//!
//! Loads configuration from JSON strings/files. Every field has a default, so a
//! partial document (or `{}`) is valid.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::echo::{DEFAULT_ECHO_TYPE, DEFAULT_USER_ID};

/// Root configuration shared by client/server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Server listen address, e.g. `127.0.0.1:3000`.
    pub server_addr: String,
    /// Directory holding the static game client.
    pub public_dir: String,
    /// Base URL the client posts echoes to.
    pub api_base: String,
    /// Player identity sent with every save (client only).
    pub user_id: String,
    /// Echo type granted per defeated enemy (client only).
    pub echo_type: String,
    /// Fixed simulation tick rate.
    pub tick_hz: u32,
    /// Seed for enemy spawn positions.
    pub seed: u64,
    pub tuning: GameTuning,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:3000".to_string(),
            public_dir: "public".to_string(),
            api_base: "http://127.0.0.1:3000".to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            echo_type: DEFAULT_ECHO_TYPE.to_string(),
            tick_hz: 60,
            seed: 0x5eed,
            tuning: GameTuning::default(),
        }
    }
}

impl EchoConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(s).context("parse config json")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("load config {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.tick_hz > 0, "tick_hz must be positive");
        anyhow::ensure!(!self.user_id.trim().is_empty(), "user_id must not be empty");
        anyhow::ensure!(!self.echo_type.trim().is_empty(), "echo_type must not be empty");
        self.tuning.validate()
    }

    /// Fixed step length in seconds.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_hz as f32
    }

    /// Applies the `PORT` convention used by hosting platforms: keeps the
    /// configured host and swaps in the given port.
    pub fn with_port(mut self, port: u16) -> Self {
        let host = self
            .server_addr
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.server_addr = format!("{host}:{port}");
        self
    }
}

/// Gameplay constants. Distances are pixels, speeds pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    pub arena_width: f32,
    pub arena_height: f32,
    /// Enemies never spawn closer than this to the arena edge.
    pub spawn_margin: f32,
    pub move_speed: f32,
    pub dash_speed: f32,
    pub dash_duration_ms: u64,
    /// Extra lockout after a dash ends. Zero disables it.
    pub dash_cooldown_ms: u64,
    pub enemy_speed: f32,
    pub respawn_delay_ms: u64,
    pub attack_radius: f32,
    pub player_radius: f32,
    pub enemy_radius: f32,
    /// Maximum drag distance of the virtual joystick.
    pub joystick_radius: f32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            arena_width: 1280.0,
            arena_height: 720.0,
            spawn_margin: 100.0,
            move_speed: 350.0,
            dash_speed: 800.0,
            dash_duration_ms: 300,
            dash_cooldown_ms: 0,
            enemy_speed: 100.0,
            respawn_delay_ms: 1500,
            attack_radius: 120.0,
            player_radius: 30.0,
            enemy_radius: 26.0,
            joystick_radius: 60.0,
        }
    }
}

impl GameTuning {
    pub fn dash_multiplier(&self) -> f32 {
        self.dash_speed / self.move_speed
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.arena_width > 2.0 * self.spawn_margin && self.arena_height > 2.0 * self.spawn_margin,
            "arena {}x{} too small for spawn_margin {}",
            self.arena_width,
            self.arena_height,
            self.spawn_margin
        );
        anyhow::ensure!(self.move_speed > 0.0, "move_speed must be positive");
        anyhow::ensure!(self.enemy_speed >= 0.0, "enemy_speed must not be negative");
        anyhow::ensure!(self.dash_duration_ms > 0, "dash_duration_ms must be positive");
        anyhow::ensure!(self.respawn_delay_ms > 0, "respawn_delay_ms must be positive");
        anyhow::ensure!(self.attack_radius > 0.0, "attack_radius must be positive");
        anyhow::ensure!(self.joystick_radius > 0.0, "joystick_radius must be positive");
        let mult = self.dash_multiplier();
        anyhow::ensure!(
            (1.0..=4.0).contains(&mult),
            "dash multiplier {mult:.2} outside 1..=4"
        );
        Ok(())
    }
}
