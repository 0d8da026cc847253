//! `echo_server`
//!
//! Backend for the arena game:
//! - `POST /api/save-echo` records a pickup
//! - `GET /api/inventory/{user_id}` lists a user's pickups
//! - static serving of the game client
//!
//! Storage is injected through [`store::EchoStore`].

pub mod error;
pub mod server;
pub mod store;

pub use server::EchoServer;
