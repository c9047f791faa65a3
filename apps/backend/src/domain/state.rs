use serde::{Deserialize, Serialize};

use crate::errors::domain::DomainError;

/// Game identifier (7-character join code).
pub type GameId = String;

/// Room lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Waiting for players; room not full.
    NotStarted,
    /// Room full, waiting for someone to start.
    Ready,
    /// Turns are running under the countdown.
    Ongoing,
    /// Turns suspended; countdown stopped.
    Paused,
    /// All bombs found, or only one player left.
    Finished,
    /// No members left. Terminal.
    Empty,
}

impl SessionState {
    /// States in which a current player must exist.
    pub const fn has_turn(self) -> bool {
        matches!(
            self,
            SessionState::Ongoing | SessionState::Paused | SessionState::Finished
        )
    }

    /// States in which rules and membership may be reconfigured.
    pub const fn is_lobby(self) -> bool {
        matches!(self, SessionState::NotStarted | SessionState::Ready)
    }

    /// A match is running (possibly paused).
    pub const fn is_in_play(self) -> bool {
        matches!(self, SessionState::Ongoing | SessionState::Paused)
    }
}

/// Turn math over a player list whose length may change between calls.
///
/// Returns the index after `current`, wrapping to 0.
#[inline]
pub fn next_index(current: usize, len: usize) -> Result<usize, DomainError> {
    if len == 0 {
        return Err(DomainError::invariant(
            "cannot rotate turn over an empty player list",
        ));
    }
    Ok((current + 1) % len)
}

/// Index of the current player after removing `removed` from the list.
///
/// `current` must not equal `removed`; the caller advances first.
#[inline]
pub fn index_after_removal(current: usize, removed: usize) -> usize {
    if removed < current {
        current - 1
    } else {
        current
    }
}

pub fn require_current(
    current: Option<usize>,
    len: usize,
    ctx: &'static str,
) -> Result<usize, DomainError> {
    match current {
        Some(index) if index < len => Ok(index),
        Some(index) => Err(DomainError::invariant(format!(
            "current player index {index} out of range for {len} players ({ctx})"
        ))),
        None => Err(DomainError::invariant(format!(
            "current player must be set ({ctx})"
        ))),
    }
}
