//! `echo_shared`
//!
//! Shared libraries used by both the game client and the backend.
//!
//! Design goals:
//! - Deterministic simulation primitives (math, ECS, events).
//! - One definition of the HTTP wire format for both sides.
//! - No `unsafe`.

pub mod api;
pub mod config;
pub mod echo;
pub mod ecs;
pub mod event;
pub mod math;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::api::*;
    pub use crate::config::*;
    pub use crate::echo::*;
    pub use crate::ecs::*;
    pub use crate::event::*;
    pub use crate::math::*;
}
