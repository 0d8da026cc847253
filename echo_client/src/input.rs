//! Input handling.
//!
//! Device handling (touch, keyboard, gamepad) stays outside this crate. What
//! arrives here is already sampled per tick: a movement vector and the set of
//! action buttons currently held.

use bitflags::bitflags;
use echo_shared::math::Vec2;

bitflags! {
    /// Action buttons.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const ATTACK = 1 << 0;
        const DASH = 1 << 1;
    }
}

/// User input state for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    /// Desired direction, length at most 1.
    pub move_vec: Vec2,
    /// Buttons held this tick.
    pub buttons: Buttons,
}

impl InputState {
    pub fn moving(move_vec: Vec2) -> Self {
        Self {
            move_vec: move_vec.clamp_len(1.0),
            buttons: Buttons::empty(),
        }
    }

    pub fn with(mut self, buttons: Buttons) -> Self {
        self.buttons |= buttons;
        self
    }
}

/// Turns a joystick drag into a movement vector.
///
/// The thumb travels at most `max_dist` from where the drag started; the
/// result scales linearly with that travel.
pub fn joystick_vector(base: Vec2, pointer: Vec2, max_dist: f32) -> Vec2 {
    if max_dist <= 0.0 {
        return Vec2::ZERO;
    }
    (pointer - base).clamp_len(max_dist).scale(1.0 / max_dist)
}

/// Reports buttons on the tick they go down, not while held.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    held: Buttons,
}

impl EdgeDetector {
    pub fn pressed(&mut self, now: Buttons) -> Buttons {
        let pressed = now & !self.held;
        self.held = now;
        pressed
    }
}
