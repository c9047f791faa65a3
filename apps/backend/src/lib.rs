#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod health;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod timer;
pub mod utils;
pub mod ws;

// Re-exports for public API
pub use config::{GameConfig, ServerConfig};
pub use error::AppError;
pub use errors::{DomainError, ErrorCode};
pub use middleware::cors::cors_middleware;
pub use services::gateway::{Command, Dispatch, Feedback, GameGateway, Scope, Subscription};
pub use services::registry::{GameRegistry, JoinOutcome, LeaveOutcome};
pub use session::{spawn_session, GameSession, SharedSession};
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    findmines_test_support::logging::init();
}
