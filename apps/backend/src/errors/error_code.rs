//! Error codes sent to clients.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the wire strings.

use core::fmt;

use serde::{Serialize, Serializer};

/// Centralized error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Phase mismatch
    PhaseMismatch,
    /// Out of turn
    OutOfTurn,
    /// Coordinate outside the board
    OutOfBounds,
    /// Tile already selected
    TileAlreadySelected,
    /// Invalid bomb count
    InvalidBombCount,
    /// Invalid board size
    InvalidBoardSize,
    /// Invalid max players
    InvalidMaxPlayers,
    /// Invalid turn length
    InvalidWaitTime,
    /// Not enough players to start
    NotEnoughPlayers,
    /// General validation error
    ValidationError,
    /// Malformed client message
    BadRequest,
    /// Unsupported protocol version
    BadProtocol,

    // Resource Not Found
    /// Game not found
    GameNotFound,
    /// Player not found
    PlayerNotFound,
    /// Player is not in a game
    NotInGame,

    // Conflicts
    /// Already a member of this game
    AlreadyMember,
    /// Already playing another game
    AlreadyInGame,
    /// Room is full
    RoomFull,
    /// Join code already exists
    JoinCodeConflict,

    // System Errors
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::OutOfBounds => "OUT_OF_BOUNDS",
            Self::TileAlreadySelected => "TILE_ALREADY_SELECTED",
            Self::InvalidBombCount => "INVALID_BOMB_COUNT",
            Self::InvalidBoardSize => "INVALID_BOARD_SIZE",
            Self::InvalidMaxPlayers => "INVALID_MAX_PLAYERS",
            Self::InvalidWaitTime => "INVALID_WAIT_TIME",
            Self::NotEnoughPlayers => "NOT_ENOUGH_PLAYERS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::BadProtocol => "BAD_PROTOCOL",

            Self::GameNotFound => "GAME_NOT_FOUND",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::NotInGame => "NOT_IN_GAME",

            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::AlreadyInGame => "ALREADY_IN_GAME",
            Self::RoomFull => "ROOM_FULL",
            Self::JoinCodeConflict => "JOIN_CODE_CONFLICT",

            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
