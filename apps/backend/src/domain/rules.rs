//! Board and room rules shared by configuration and the session state machine.

use crate::errors::domain::{DomainError, ValidationKind};

pub const DEFAULT_BOARD_WIDTH: usize = 6;
pub const DEFAULT_BOARD_HEIGHT: usize = 6;
pub const DEFAULT_BOMB_COUNT: usize = 3;
pub const DEFAULT_MAX_PLAYERS: usize = 2;
pub const DEFAULT_WAIT_TIME_SECS: u32 = 10;
pub const DEFAULT_SCORE_MULTIPLIER: u32 = 1;

/// A match needs at least two players.
pub const MIN_PLAYERS: usize = 2;

/// Largest board a room may use. Keeps generation bounded per session.
pub const MAX_BOARD_TILES: usize = 10_000;

/// Tile count for a `width x height` board, or an `InvalidBoardSize`
/// rejection when a side is zero or the board exceeds [`MAX_BOARD_TILES`].
pub fn check_board_size(width: usize, height: usize) -> Result<usize, DomainError> {
    if width == 0 || height == 0 {
        return Err(DomainError::validation(
            ValidationKind::InvalidBoardSize,
            format!("board must be at least 1x1, got {width}x{height}"),
        ));
    }
    match width.checked_mul(height) {
        Some(tiles) if tiles <= MAX_BOARD_TILES => Ok(tiles),
        _ => Err(DomainError::validation(
            ValidationKind::InvalidBoardSize,
            format!("a {width}x{height} board exceeds {MAX_BOARD_TILES} tiles"),
        )),
    }
}

/// Bombs must leave at least one safe tile: `0 < bombs < width * height`.
pub fn check_bombs_fit(bomb_count: usize, width: usize, height: usize) -> Result<(), DomainError> {
    let tiles = check_board_size(width, height)?;
    if bomb_count == 0 {
        return Err(DomainError::validation(
            ValidationKind::InvalidBombCount,
            "bomb count must be positive",
        ));
    }
    if bomb_count >= tiles {
        return Err(DomainError::validation(
            ValidationKind::InvalidBombCount,
            format!("{bomb_count} bombs do not fit on a {width}x{height} board"),
        ));
    }
    Ok(())
}

/// A bomb count evenly divisible by the player count could end in a tie by
/// construction, so it is refused.
pub fn check_bombs_not_divisible(bomb_count: usize, max_players: usize) -> Result<(), DomainError> {
    if max_players > 0 && bomb_count % max_players == 0 {
        return Err(DomainError::validation(
            ValidationKind::InvalidBombCount,
            format!("{bomb_count} bombs split evenly across {max_players} players"),
        ));
    }
    Ok(())
}

pub fn check_max_players(max_players: usize, current_players: usize) -> Result<(), DomainError> {
    if max_players < MIN_PLAYERS {
        return Err(DomainError::validation(
            ValidationKind::InvalidMaxPlayers,
            format!("max players must be at least {MIN_PLAYERS}"),
        ));
    }
    if max_players < current_players {
        return Err(DomainError::validation(
            ValidationKind::InvalidMaxPlayers,
            format!("{current_players} players already seated, cannot lower max to {max_players}"),
        ));
    }
    Ok(())
}
