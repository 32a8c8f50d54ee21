//! HTTP front end of the shurl link shortener.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod model;
pub mod state;
pub mod trusted;

pub use app::App;
pub use config::{Cli, GatewayConfig, StorageConfig};
pub use state::AppState;
