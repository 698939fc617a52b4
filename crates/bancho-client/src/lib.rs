//! Session runtime, dispatcher and transports for a headless bancho client.
//!
//! [`BanchoClient`] is the entry point: construct it with a [`Config`], then
//! drive it with [`BanchoClient::run`]. Built-in packet handling lives in
//! [`dispatcher`]; register your own callbacks through [`BanchoClient::events`]
//! and recurring work through [`BanchoClient::tasks`].

pub mod api;
pub mod channel;
pub mod client;
pub mod collections;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod player;
pub mod queue;
pub mod session;
pub mod tasks;
pub mod transport;
pub mod worker;

pub use client::BanchoClient;
pub use config::{Config, TransportKind};
pub use error::{ClientError, Result};
pub use player::Player;
pub use session::Session;
