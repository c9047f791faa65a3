//! Push events and their derivation from before/after lifecycle views.

use serde::{Deserialize, Serialize};

use crate::domain::player::{Player, PlayerId};
use crate::domain::state::{GameId, SessionState};

/// The slice of session state whose changes are announced to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleView {
    pub state: SessionState,
    pub current_player: Option<PlayerId>,
    pub total_members: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameTransition {
    /// Edge-triggered: state tag changed.
    StateChanged {
        from: SessionState,
        to: SessionState,
    },

    /// Edge-triggered: the turn moved to a specific player.
    TurnBecame { player_id: PlayerId },

    /// Edge-triggered: someone joined or left.
    MembersChanged { total: usize },

    /// Edge-triggered: the match just ended.
    GameEnded,
}

/// Derive transitions from before/after lifecycle state.
pub fn derive_game_transitions(
    before: &LifecycleView,
    after: &LifecycleView,
) -> Vec<GameTransition> {
    let mut transitions = Vec::new();

    if before.state != after.state {
        transitions.push(GameTransition::StateChanged {
            from: before.state,
            to: after.state,
        });
    }

    // Turn changes only matter while turns are being taken.
    if after.state.is_in_play() {
        if let Some(player_id) = &after.current_player {
            if before.current_player.as_ref() != Some(player_id) || !before.state.is_in_play() {
                transitions.push(GameTransition::TurnBecame {
                    player_id: player_id.clone(),
                });
            }
        }
    }

    if before.total_members != after.total_members {
        transitions.push(GameTransition::MembersChanged {
            total: after.total_members,
        });
    }

    if before.state != SessionState::Finished && after.state == SessionState::Finished {
        transitions.push(GameTransition::GameEnded);
    }

    transitions
}

/// Engine-originated events, distinct from request/response feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Tick {
        game_id: GameId,
        remaining: i32,
    },
    NextPlayer {
        game_id: GameId,
        player: Player,
    },
    StateChanged {
        game_id: GameId,
        from: SessionState,
        to: SessionState,
    },
    Winner {
        game_id: GameId,
        player: Player,
    },
    MembersChanged {
        game_id: GameId,
        total: usize,
    },
}
