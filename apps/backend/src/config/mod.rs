//! Configuration: per-session game rules and process settings.

pub mod game;
pub mod server;

pub use game::GameConfig;
pub use server::ServerConfig;
