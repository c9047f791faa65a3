//! Domain-level error type used by the engine, the registry and the gateway.
//!
//! This error type is transport-agnostic. The WebSocket layer converts it into
//! `crate::error::AppError` through the provided `From` implementation.

use thiserror::Error;

/// Reasons an operation's guard rejected the call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    /// Operation not allowed in the session's current state
    PhaseMismatch,
    /// Actor is not the current player
    OutOfTurn,
    /// Coordinate outside the generated board
    OutOfBounds,
    /// Tile was already selected
    TileAlreadySelected,
    /// Bomb count violates board or player-count constraints
    InvalidBombCount,
    /// Width or height is zero or cannot hold the bombs
    InvalidBoardSize,
    /// Max player count too small for the room
    InvalidMaxPlayers,
    /// Turn length must be at least one second
    InvalidWaitTime,
    /// Not enough players to start
    NotEnoughPlayers,
    Other(String),
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Game,
    Player,
    /// Player is not attached to any game
    Membership,
}

/// Domain-level conflict kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    /// Player id already present as player or spectator
    AlreadyMember,
    /// Player already attached to another game
    AlreadyInGame,
    /// Room has no free player slot
    RoomFull,
    /// Could not find an unused game identifier
    JoinCodeConflict,
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Guard failure; the session is left unchanged
    #[error("validation error {0:?}: {1}")]
    Validation(ValidationKind, String),
    /// Semantic conflict with existing membership or capacity
    #[error("conflict {0:?}: {1}")]
    Conflict(ConflictKind, String),
    /// Missing game or player
    #[error("not found {0:?}: {1}")]
    NotFound(NotFoundKind, String),
    /// Broken invariant; indicates a bug elsewhere in the engine
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }

    pub fn validation_other(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::Validation(ValidationKind::Other(detail.clone()), detail)
    }

    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }

    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant(detail.into())
    }

    pub fn phase(detail: impl Into<String>) -> Self {
        Self::Validation(ValidationKind::PhaseMismatch, detail.into())
    }

    /// True for guard failures (validation and conflicts).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(..) | Self::Conflict(..))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(..))
    }
}
