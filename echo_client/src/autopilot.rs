//! Scripted input for headless runs.
//!
//! Walks toward the nearest enemy, attacks once it is in range and dashes
//! when an enemy is about to make contact.

use echo_shared::math::Vec2;

use crate::{
    game::GameState,
    input::{joystick_vector, Buttons, InputState},
};

#[derive(Debug, Default)]
pub struct Autopilot {
    // Alternating ticks release the buttons so every press is a fresh edge.
    release: bool,
}

impl Autopilot {
    pub fn next_input(&mut self, game: &GameState) -> InputState {
        self.release = !self.release;
        let Some((_, target)) = game.nearest_enemy() else {
            return InputState::default();
        };

        let tuning = game.tuning();
        let player = game.player_position();
        let distance = target.distance(player);

        // Drag the virtual stick toward the target; ease off when close.
        let reach = tuning.joystick_radius;
        let pointer = player + (target - player).normalize_or_zero().scale(reach);
        let mut move_vec = joystick_vector(player, pointer, reach);
        if distance < tuning.attack_radius * 0.5 {
            move_vec = Vec2::ZERO;
        }

        let mut input = InputState::moving(move_vec);
        if self.release {
            return input;
        }
        if distance < tuning.attack_radius * 0.8 {
            input = input.with(Buttons::ATTACK);
        }
        if distance < tuning.player_radius + tuning.enemy_radius + 20.0 && !game.is_dashing() {
            input = input.with(Buttons::DASH);
        }
        input
    }
}
