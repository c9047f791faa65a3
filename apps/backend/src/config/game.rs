//! Per-session game rules.

use serde::{Deserialize, Serialize};

use crate::domain::rules::{
    check_bombs_fit, check_max_players, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH,
    DEFAULT_BOMB_COUNT, DEFAULT_MAX_PLAYERS, DEFAULT_SCORE_MULTIPLIER, DEFAULT_WAIT_TIME_SECS,
};
use crate::errors::domain::{DomainError, ValidationKind};

/// Rules a session is created with. Mutable afterwards only through the
/// session's configuration operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub bomb_count: usize,
    pub max_players: usize,
    pub wait_time_secs: u32,
    pub score_multiplier: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_WIDTH,
            height: DEFAULT_BOARD_HEIGHT,
            bomb_count: DEFAULT_BOMB_COUNT,
            max_players: DEFAULT_MAX_PLAYERS,
            wait_time_secs: DEFAULT_WAIT_TIME_SECS,
            score_multiplier: DEFAULT_SCORE_MULTIPLIER,
        }
    }
}

impl GameConfig {
    /// Check the static rules; called before a config seeds a new session.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_bombs_fit(self.bomb_count, self.width, self.height)?;
        check_max_players(self.max_players, 0)?;
        if self.wait_time_secs == 0 {
            return Err(DomainError::validation(
                ValidationKind::InvalidWaitTime,
                "turn length must be at least one second",
            ));
        }
        Ok(())
    }

    pub fn wait_time(&self) -> i32 {
        i32::try_from(self.wait_time_secs).unwrap_or(i32::MAX)
    }
}
