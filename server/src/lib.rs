//! fxrate HTTP Server
//!
//! Wires the source registry and adapters to an axum router and owns
//! the process configuration.

pub mod config;
pub mod routes;

pub use config::ServerConfig;
pub use routes::{router, AppState};
