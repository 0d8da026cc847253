//! `echo_client`
//!
//! Client-side systems:
//! - Fixed-step arena simulation (movement, dash, chase, attack, respawn)
//! - Input sampling and edge detection
//! - Fire-and-forget echo saves to the backend
//! - Scripted autopilot for headless runs

pub mod autopilot;
pub mod client;
pub mod dash;
pub mod game;
pub mod input;
pub mod sink;
pub mod timer;

pub use client::GameClient;
