//! Arena simulation.
//!
//! One explicit state struct advanced by fixed steps. Each step:
//! 1. advances the clock, ends an expired dash, runs due timers (respawns)
//! 2. applies newly pressed buttons (dash, attack)
//! 3. assigns velocities: player from input, enemies steer toward the player
//! 4. integrates positions and clamps them to the arena
//! 5. reports player/enemy overlaps unless the player is dashing
//! 6. removes enemies destroyed this step
//!
//! Determinism notes:
//! - Spawn positions come from a seeded RNG.
//! - Entities are visited in id order.

use std::time::Duration;

use echo_shared::{
    config::GameTuning,
    ecs::{EntityId, Position, Velocity, World},
    event::{ContactHit, DashEvent, EchoCollected, EnemyDefeated, EnemySpawned, EventBus},
    math::{Rect, Vec2},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::{
    dash::DashState,
    input::{Buttons, EdgeDetector, InputState},
    timer::Timers,
};

/// Player component.
#[derive(Debug, Clone, Copy)]
pub struct Player {
    /// Heading in radians; kept when the player stops.
    pub facing: f32,
    pub dash: DashState,
}

/// Enemy component. Inactive enemies are gone from play and removed at the
/// end of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enemy {
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheduled {
    RespawnEnemy,
}

/// Running totals for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    pub enemies_spawned: u64,
    pub enemies_defeated: u64,
    pub contact_hits: u64,
    pub dashes: u64,
}

pub struct GameState {
    tuning: GameTuning,
    arena: Rect,
    world: World,
    player: EntityId,
    now: Duration,
    timers: Timers<Scheduled>,
    rng: StdRng,
    edges: EdgeDetector,
    echo_type: String,
    stats: GameStats,
    /// Gameplay events for the embedding client to drain.
    pub events: EventBus,
}

impl GameState {
    /// Sets up the scene: the player at the arena centre and one enemy.
    pub fn new(tuning: GameTuning, echo_type: impl Into<String>, seed: u64) -> Self {
        let arena = Rect::from_size(tuning.arena_width, tuning.arena_height);
        let mut world = World::default();
        let player = world.spawn();
        world.insert(player, Position(arena.center()));
        world.insert(player, Velocity::default());
        world.insert(
            player,
            Player {
                facing: 0.0,
                dash: DashState::from_tuning(&tuning),
            },
        );

        let mut game = Self {
            tuning,
            arena,
            world,
            player,
            now: Duration::ZERO,
            timers: Timers::default(),
            rng: StdRng::seed_from_u64(seed),
            edges: EdgeDetector::default(),
            echo_type: echo_type.into(),
            stats: GameStats::default(),
            events: EventBus::default(),
        };
        game.spawn_enemy();
        game
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    pub fn arena(&self) -> Rect {
        self.arena
    }

    /// Simulation time since the scene started.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn player_position(&self) -> Vec2 {
        self.position(self.player).unwrap_or_else(|| self.arena.center())
    }

    pub fn player_velocity(&self) -> Vec2 {
        self.world
            .get::<Velocity>(self.player)
            .map_or(Vec2::ZERO, |v| v.0)
    }

    pub fn player_facing(&self) -> f32 {
        self.player_component().map_or(0.0, |p| p.facing)
    }

    pub fn is_dashing(&self) -> bool {
        self.player_component().is_some_and(|p| p.dash.is_dashing())
    }

    pub fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.world.get::<Position>(entity).map(|p| p.0)
    }

    /// Active enemies and their positions, in id order.
    pub fn enemies(&self) -> Vec<(EntityId, Vec2)> {
        self.active_enemies()
            .into_iter()
            .filter_map(|id| self.position(id).map(|p| (id, p)))
            .collect()
    }

    pub fn enemy_count(&self) -> usize {
        self.active_enemies().len()
    }

    /// Enemies waiting to respawn.
    pub fn pending_respawns(&self) -> usize {
        self.timers.len()
    }

    /// Nearest active enemy to the player.
    pub fn nearest_enemy(&self) -> Option<(EntityId, Vec2)> {
        let player = self.player_position();
        self.enemies().into_iter().min_by(|(_, a), (_, b)| {
            a.distance(player)
                .partial_cmp(&b.distance(player))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Places a new enemy uniformly at random inside the arena, at least
    /// `spawn_margin` from every edge.
    pub fn spawn_enemy(&mut self) -> EntityId {
        let area = self.arena.inset(self.tuning.spawn_margin);
        let position = Vec2::new(
            self.rng.gen_range(area.min.x..=area.max.x),
            self.rng.gen_range(area.min.y..=area.max.y),
        );
        let id = self.world.spawn();
        self.world.insert(id, Position(position));
        self.world.insert(id, Velocity::default());
        self.world.insert(id, Enemy { active: true });
        self.stats.enemies_spawned += 1;
        self.events.push(EnemySpawned {
            enemy: id,
            position,
        });
        debug!(enemy = ?id, x = position.x, y = position.y, "Enemy spawned");
        id
    }

    /// Starts a dash. Ignored while one is running.
    pub fn try_dash(&mut self) -> bool {
        let now = self.now;
        let started = self
            .world
            .get_mut::<Player>(self.player)
            .is_some_and(|p| p.dash.try_activate(now));
        if started {
            self.stats.dashes += 1;
            self.events.push(DashEvent::Started);
        }
        started
    }

    /// Destroys every active enemy within `attack_radius` of the player.
    /// Each one yields an echo and a respawn `respawn_delay_ms` later.
    /// Returns the number of enemies hit.
    pub fn attack(&mut self) -> usize {
        let origin = self.player_position();
        let radius = self.tuning.attack_radius;
        let hits: Vec<(EntityId, Vec2)> = self
            .enemies()
            .into_iter()
            .filter(|(_, p)| p.distance(origin) < radius)
            .collect();

        let delay = Duration::from_millis(self.tuning.respawn_delay_ms);
        for (enemy, position) in &hits {
            if let Some(e) = self.world.get_mut::<Enemy>(*enemy) {
                e.active = false;
            }
            self.events.push(EnemyDefeated {
                enemy: *enemy,
                position: *position,
            });
            self.events.push(EchoCollected {
                echo_type: self.echo_type.clone(),
            });
            self.timers.schedule(self.now, delay, Scheduled::RespawnEnemy);
            self.stats.enemies_defeated += 1;
        }
        if !hits.is_empty() {
            debug!(hits = hits.len(), "Attack landed");
        }
        hits.len()
    }

    /// Advances the simulation by `dt`.
    pub fn step(&mut self, dt: Duration, input: InputState) {
        self.now += dt;
        let now = self.now;

        let dash_ended = self
            .world
            .get_mut::<Player>(self.player)
            .is_some_and(|p| p.dash.update(now));
        if dash_ended {
            self.events.push(DashEvent::Ended);
        }
        for scheduled in self.timers.drain_due(now) {
            match scheduled {
                Scheduled::RespawnEnemy => {
                    self.spawn_enemy();
                }
            }
        }

        let pressed = self.edges.pressed(input.buttons);
        if pressed.contains(Buttons::DASH) {
            self.try_dash();
        }
        if pressed.contains(Buttons::ATTACK) {
            self.attack();
        }

        self.steer_player(input.move_vec);
        self.steer_enemies();
        self.integrate(dt.as_secs_f32());
        self.check_contacts();
        self.reap_enemies();
    }

    fn steer_player(&mut self, move_vec: Vec2) {
        let move_vec = move_vec.clamp_len(1.0);
        let speed = if self.is_dashing() {
            self.tuning.dash_speed
        } else {
            self.tuning.move_speed
        };
        if let Some(v) = self.world.get_mut::<Velocity>(self.player) {
            v.0 = move_vec.scale(speed);
        }
        if !move_vec.is_zero() {
            if let Some(p) = self.world.get_mut::<Player>(self.player) {
                p.facing = move_vec.angle();
            }
        }
    }

    fn steer_enemies(&mut self) {
        let target = self.player_position();
        let speed = self.tuning.enemy_speed;
        for id in self.active_enemies() {
            let Some(pos) = self.position(id) else {
                continue;
            };
            let heading = (target - pos).normalize_or_zero();
            if let Some(v) = self.world.get_mut::<Velocity>(id) {
                v.0 = heading.scale(speed);
            }
        }
    }

    fn integrate(&mut self, dt: f32) {
        let moving: Vec<(EntityId, Vec2)> =
            self.world.iter::<Velocity>().map(|(id, v)| (id, v.0)).collect();
        let arena = self.arena;
        for (id, v) in moving {
            if let Some(p) = self.world.get_mut::<Position>(id) {
                p.0 = arena.clamp(p.0 + v.scale(dt));
            }
        }
    }

    fn check_contacts(&mut self) {
        if self.is_dashing() {
            return;
        }
        let player = self.player_position();
        let reach = self.tuning.player_radius + self.tuning.enemy_radius;
        for (enemy, pos) in self.enemies() {
            if pos.distance(player) < reach {
                self.stats.contact_hits += 1;
                self.events.push(ContactHit { enemy });
            }
        }
    }

    fn reap_enemies(&mut self) {
        let dead: Vec<EntityId> = self
            .world
            .iter::<Enemy>()
            .filter(|(_, e)| !e.active)
            .map(|(id, _)| id)
            .collect();
        for id in dead {
            self.world.despawn(id);
        }
    }

    fn active_enemies(&self) -> Vec<EntityId> {
        self.world
            .iter::<Enemy>()
            .filter(|(_, e)| e.active)
            .map(|(id, _)| id)
            .collect()
    }

    fn player_component(&self) -> Option<&Player> {
        self.world.get::<Player>(self.player)
    }

    /// Moves an entity, clamped to the arena. Scenario setup for tools/tests.
    pub fn place(&mut self, entity: EntityId, at: Vec2) {
        let at = self.arena.clamp(at);
        if let Some(p) = self.world.get_mut::<Position>(entity) {
            p.0 = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(10);

    fn game() -> GameState {
        GameState::new(GameTuning::default(), "Echo_Core", 7)
    }

    fn run(game: &mut GameState, ticks: usize, input: InputState) {
        for _ in 0..ticks {
            game.step(DT, input);
        }
    }

    #[test]
    fn scene_starts_with_player_centered_and_one_enemy() {
        let game = game();
        assert_eq!(game.player_position(), Vec2::new(640.0, 360.0));
        assert_eq!(game.enemy_count(), 1);
        assert!(!game.is_dashing());
    }

    #[test]
    fn spawns_stay_inside_margin() {
        let mut game = game();
        let area = game.arena().inset(game.tuning().spawn_margin);
        for _ in 0..200 {
            let id = game.spawn_enemy();
            assert!(area.contains(game.position(id).unwrap()));
        }
    }

    #[test]
    fn same_seed_same_spawns() {
        let a = GameState::new(GameTuning::default(), "Echo_Core", 42);
        let b = GameState::new(GameTuning::default(), "Echo_Core", 42);
        assert_eq!(a.enemies(), b.enemies());
    }

    #[test]
    fn dash_is_timed_and_not_retriggerable() {
        let mut game = game();
        let dash = InputState::default().with(Buttons::DASH);

        game.step(DT, dash);
        assert!(game.is_dashing());
        assert_eq!(game.stats().dashes, 1);

        // Release and press again mid-dash: ignored.
        game.step(DT, InputState::default());
        game.step(DT, dash);
        assert_eq!(game.stats().dashes, 1);

        // Activated at t=10ms, so it ends at t=310ms.
        run(&mut game, 26, InputState::default());
        assert_eq!(game.now(), Duration::from_millis(290));
        assert!(game.is_dashing());
        run(&mut game, 2, InputState::default());
        assert!(!game.is_dashing());

        let events = game.events.drain::<DashEvent>();
        assert_eq!(events, vec![DashEvent::Started, DashEvent::Ended]);
    }

    #[test]
    fn holding_dash_does_not_chain_dashes() {
        let mut game = game();
        let dash = InputState::default().with(Buttons::DASH);
        run(&mut game, 100, dash);
        assert_eq!(game.stats().dashes, 1);
        assert!(!game.is_dashing());
    }

    #[test]
    fn dash_multiplies_speed() {
        let mut game = game();
        let right = InputState::moving(Vec2::new(1.0, 0.0));
        game.step(DT, right);
        assert_eq!(game.player_velocity(), Vec2::new(350.0, 0.0));

        game.step(DT, right.with(Buttons::DASH));
        assert_eq!(game.player_velocity(), Vec2::new(800.0, 0.0));
    }

    #[test]
    fn movement_sets_facing_and_respects_bounds() {
        let mut game = game();
        run(&mut game, 500, InputState::moving(Vec2::new(0.0, -1.0)));
        assert_eq!(game.player_position().y, 0.0);
        assert!((game.player_facing() + std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        run(&mut game, 1, InputState::default());
        assert_eq!(game.player_velocity(), Vec2::ZERO);
        assert!((game.player_facing() + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn enemies_chase_the_player() {
        let mut game = game();
        let (enemy, start) = game.nearest_enemy().unwrap();
        let before = start.distance(game.player_position());
        run(&mut game, 10, InputState::default());
        let after = game.position(enemy).unwrap().distance(game.player_position());
        assert!((before - after - 10.0).abs() < 0.01, "closed {}", before - after);
    }

    #[test]
    fn attack_destroys_enemies_in_range_and_they_respawn() {
        let mut game = game();
        let center = game.player_position();
        let (first, _) = game.nearest_enemy().unwrap();
        game.place(first, center + Vec2::new(100.0, 0.0));
        let far = game.spawn_enemy();
        game.place(far, center + Vec2::new(400.0, 0.0));
        game.events.clear();
        assert_eq!(game.enemy_count(), 2);

        game.step(DT, InputState::default().with(Buttons::ATTACK));
        assert_eq!(game.enemy_count(), 1);
        assert_eq!(game.pending_respawns(), 1);
        assert!(game.position(first).is_none());
        assert_eq!(
            game.events.drain::<EchoCollected>(),
            vec![EchoCollected {
                echo_type: "Echo_Core".into()
            }]
        );
        assert_eq!(game.events.drain::<EnemyDefeated>().len(), 1);

        // Respawn fires 1500ms after the attack (t=10ms).
        run(&mut game, 149, InputState::default());
        assert_eq!(game.enemy_count(), 1);
        game.step(DT, InputState::default());
        assert_eq!(game.enemy_count(), 2);
        assert_eq!(game.pending_respawns(), 0);
        assert_eq!(game.stats().enemies_spawned, 3);
    }

    #[test]
    fn attack_out_of_range_misses() {
        let mut game = game();
        let (enemy, _) = game.nearest_enemy().unwrap();
        game.place(enemy, game.player_position() + Vec2::new(0.0, 200.0));
        assert_eq!(game.attack(), 0);
        assert_eq!(game.enemy_count(), 1);
        assert_eq!(game.events.pending::<EchoCollected>(), 0);
    }

    #[test]
    fn contact_hits_are_suppressed_while_dashing() {
        let mut game = game();
        let (enemy, _) = game.nearest_enemy().unwrap();
        game.place(enemy, game.player_position());

        game.step(DT, InputState::default().with(Buttons::DASH));
        assert_eq!(game.events.drain::<ContactHit>().len(), 0);

        run(&mut game, 40, InputState::default());
        assert!(!game.is_dashing());
        assert!(!game.events.drain::<ContactHit>().is_empty());
        assert!(game.stats().contact_hits > 0);
    }
}
