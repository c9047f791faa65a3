use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::gateway::GameGateway;
use crate::services::registry::GameRegistry;
use crate::timer::TimerFactory;
use crate::ws::hub::RoomHub;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Live sessions and player membership
    pub registry: Arc<GameRegistry>,
    /// Command dispatch over the registry
    pub gateway: Arc<GameGateway>,
    /// WebSocket connections per room
    pub hub: Arc<RoomHub>,
    pub config: ServerConfig,
}

impl AppState {
    /// Build the state for `config`, with session timers from `timers`.
    pub fn new(config: ServerConfig, timers: Arc<dyn TimerFactory>) -> Self {
        let registry = Arc::new(GameRegistry::new(config.game_defaults, timers));
        Self {
            gateway: Arc::new(GameGateway::new(Arc::clone(&registry))),
            registry,
            hub: Arc::new(RoomHub::new()),
            config,
        }
    }
}
