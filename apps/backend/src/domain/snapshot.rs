//! Public snapshot returned after every successful mutation.

use serde::{Deserialize, Serialize};

use crate::domain::board::TileView;
use crate::domain::player::{Player, PlayerId};
use crate::domain::state::{GameId, SessionState};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub players: Vec<Player>,
    pub spectators: Vec<Player>,
    pub selected_tiles: Vec<TileView>,
    pub state: SessionState,
    pub board_width: usize,
    pub board_height: usize,
    pub number_of_bombs: usize,
    pub number_of_bombs_found: usize,
    pub max_players: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<PlayerId>,
}
