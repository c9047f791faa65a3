//! Domain layer: pure game types and helpers.

pub mod board;
pub mod game_transition;
pub mod player;
pub mod rules;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod tests_board;
#[cfg(test)]
mod tests_props_board;

// Re-exports for ergonomics
pub use board::{generate, tile_index, Board, Tile, TileView};
pub use game_transition::{derive_game_transitions, GameTransition, LifecycleView, SessionEvent};
pub use player::{leading_index, leading_player, Player, PlayerId, Role};
pub use snapshot::GameSnapshot;
pub use state::{next_index, GameId, SessionState};
