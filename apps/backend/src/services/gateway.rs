//! Transport-neutral command dispatch.
//!
//! Each inbound [`Command`] maps to one registry or session operation and
//! produces a [`Feedback`] plus the audience it is meant for. The WebSocket
//! layer only has to route the result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::domain::{GameId, GameSnapshot, Player, SessionEvent};
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::errors::ErrorCode;
use crate::services::registry::{GameRegistry, JoinOutcome};
use crate::session::GameSession;

/// One inbound operation. Numeric fields are signed so that negative input
/// is reported as a rule violation rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    CreateGame {
        #[serde(default)]
        name: Option<String>,
    },
    JoinGame {
        game_id: GameId,
        #[serde(default)]
        name: Option<String>,
    },
    QuickMatch {
        #[serde(default)]
        name: Option<String>,
    },
    StartGame,
    PlayAgain,
    ResetBoard,
    SelectTile {
        x: i64,
        y: i64,
    },
    SetNumberOfBombs {
        number_of_bombs: i64,
    },
    SetBoardSize {
        width: i64,
        height: i64,
    },
    SetMaxPlayers {
        max_players: i64,
    },
    SetWaitTime {
        seconds: i64,
    },
    SetPlayerName {
        name: String,
    },
    TogglePause,
    ChangeRole,
    LeaveGame,
    GetCurrentPlayer,
}

impl Command {
    /// Wire name, echoed back as the feedback event.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateGame { .. } => "create_game",
            Command::JoinGame { .. } => "join_game",
            Command::QuickMatch { .. } => "quick_match",
            Command::StartGame => "start_game",
            Command::PlayAgain => "play_again",
            Command::ResetBoard => "reset_board",
            Command::SelectTile { .. } => "select_tile",
            Command::SetNumberOfBombs { .. } => "set_number_of_bombs",
            Command::SetBoardSize { .. } => "set_board_size",
            Command::SetMaxPlayers { .. } => "set_max_players",
            Command::SetWaitTime { .. } => "set_wait_time",
            Command::SetPlayerName { .. } => "set_player_name",
            Command::TogglePause => "toggle_pause",
            Command::ChangeRole => "change_role",
            Command::LeaveGame => "leave_game",
            Command::GetCurrentPlayer => "get_current_player",
        }
    }
}

/// Reply to a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub event: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<GameSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Feedback {
    fn success(event: &'static str, data: Option<GameSnapshot>) -> Self {
        Self {
            event,
            ok: true,
            data,
            player: None,
            code: None,
            message: None,
        }
    }

    fn failure(event: &'static str, err: &AppError) -> Self {
        Self {
            event,
            ok: false,
            data: None,
            player: None,
            code: Some(err.code()),
            message: Some(err.to_string()),
        }
    }
}

/// Who should receive the feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every connection attached to the room.
    Room(GameId),
    /// Only the sender.
    Private,
}

/// Change in which room's events the sender should follow.
#[derive(Debug)]
pub enum Subscription {
    Joined {
        game_id: GameId,
        events: broadcast::Receiver<SessionEvent>,
    },
    Left {
        game_id: GameId,
    },
}

#[derive(Debug)]
pub struct Dispatch {
    pub feedback: Feedback,
    pub scope: Scope,
    pub subscription: Option<Subscription>,
}

impl Dispatch {
    fn room(game_id: GameId, feedback: Feedback) -> Self {
        Self {
            feedback,
            scope: Scope::Room(game_id),
            subscription: None,
        }
    }

    fn private(feedback: Feedback) -> Self {
        Self {
            feedback,
            scope: Scope::Private,
            subscription: None,
        }
    }

    fn joined(event: &'static str, outcome: JoinOutcome) -> Self {
        Self {
            feedback: Feedback::success(event, Some(outcome.snapshot)),
            scope: Scope::Room(outcome.game_id.clone()),
            subscription: Some(Subscription::Joined {
                game_id: outcome.game_id,
                events: outcome.events,
            }),
        }
    }
}

pub struct GameGateway {
    registry: Arc<GameRegistry>,
}

impl GameGateway {
    pub fn new(registry: Arc<GameRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<GameRegistry> {
        &self.registry
    }

    /// Run `command` on behalf of `player_id`. Failures come back as private
    /// feedback; nothing here returns an error to the transport.
    pub fn dispatch(&self, player_id: &str, command: Command) -> Dispatch {
        let event = command.name();
        debug!(player_id, command = event, "Dispatching command");
        match self.execute(player_id, command) {
            Ok(dispatch) => dispatch,
            Err(err) => {
                if matches!(err, DomainError::Invariant(_)) {
                    error!(player_id, command = event, error = %err, "Command hit an invariant");
                } else {
                    debug!(player_id, command = event, error = %err, "Command failed");
                }
                Dispatch::private(Feedback::failure(event, &AppError::from(err)))
            }
        }
    }

    /// The sender's connection went away. Returns the room notification when
    /// they were in a game.
    pub fn disconnect(&self, player_id: &str) -> Option<Dispatch> {
        match self.execute(player_id, Command::LeaveGame) {
            Ok(dispatch) => {
                debug!(player_id, "Disconnected player left their game");
                Some(dispatch)
            }
            Err(err) if err.is_not_found() => None,
            Err(err) => {
                error!(player_id, error = %err, "Failed to remove disconnected player");
                None
            }
        }
    }

    fn execute(&self, player_id: &str, command: Command) -> Result<Dispatch, DomainError> {
        let event = command.name();
        match command {
            Command::CreateGame { name } => {
                let outcome = self.registry.create_game(player_id, name.as_deref())?;
                Ok(Dispatch::joined(event, outcome))
            }
            Command::JoinGame { game_id, name } => {
                let outcome = self
                    .registry
                    .join_game(player_id, game_id.trim(), name.as_deref())?;
                Ok(Dispatch::joined(event, outcome))
            }
            Command::QuickMatch { name } => {
                match self.registry.quick_match(player_id, name.as_deref())? {
                    Some(outcome) => Ok(Dispatch::joined(event, outcome)),
                    None => Err(DomainError::not_found(
                        NotFoundKind::Game,
                        "no game is waiting for players",
                    )),
                }
            }
            Command::StartGame => self.in_room(player_id, event, GameSession::start),
            Command::PlayAgain => self.in_room(player_id, event, |s| s.play_again().map(|_| ())),
            Command::ResetBoard => self.in_room(player_id, event, |s| s.reset_board().map(|_| ())),
            Command::SelectTile { x, y } => {
                let x = to_usize(x, ValidationKind::OutOfBounds, "x")?;
                let y = to_usize(y, ValidationKind::OutOfBounds, "y")?;
                self.in_room(player_id, event, |s| {
                    s.select_tile(player_id, x, y).map(|_| ())
                })
            }
            Command::SetNumberOfBombs { number_of_bombs } => {
                let n = to_usize(number_of_bombs, ValidationKind::InvalidBombCount, "bomb count")?;
                self.in_room(player_id, event, |s| s.set_number_of_bombs(n))
            }
            Command::SetBoardSize { width, height } => {
                let w = to_usize(width, ValidationKind::InvalidBoardSize, "width")?;
                let h = to_usize(height, ValidationKind::InvalidBoardSize, "height")?;
                self.in_room(player_id, event, |s| s.set_board_size(w, h))
            }
            Command::SetMaxPlayers { max_players } => {
                let n = to_usize(max_players, ValidationKind::InvalidMaxPlayers, "max players")?;
                self.in_room(player_id, event, |s| s.set_max_players(n))
            }
            Command::SetWaitTime { seconds } => {
                let secs = u32::try_from(seconds).map_err(|_| {
                    DomainError::validation(
                        ValidationKind::InvalidWaitTime,
                        format!("turn length {seconds} is out of range"),
                    )
                })?;
                self.in_room(player_id, event, |s| s.set_wait_time(secs))
            }
            Command::SetPlayerName { name } => {
                match self.registry.set_player_name(player_id, &name)? {
                    Some(snapshot) => Ok(Dispatch::room(
                        snapshot.game_id.clone(),
                        Feedback::success(event, Some(snapshot)),
                    )),
                    None => Ok(Dispatch::private(Feedback::success(event, None))),
                }
            }
            Command::TogglePause => {
                self.in_room(player_id, event, |s| s.toggle_pause().map(|_| ()))
            }
            Command::ChangeRole => {
                self.in_room(player_id, event, |s| s.change_role(player_id).map(|_| ()))
            }
            Command::LeaveGame => {
                let outcome = self.registry.leave(player_id)?;
                let feedback = Feedback::success(event, outcome.snapshot);
                Ok(Dispatch {
                    feedback,
                    scope: Scope::Room(outcome.game_id.clone()),
                    subscription: Some(Subscription::Left {
                        game_id: outcome.game_id,
                    }),
                })
            }
            Command::GetCurrentPlayer => {
                let (_, session) = self.room_of(player_id)?;
                let guard = session.lock();
                let mut feedback = Feedback::success(event, None);
                feedback.player = guard.current_player().cloned();
                Ok(Dispatch::private(feedback))
            }
        }
    }

    fn room_of(
        &self,
        player_id: &str,
    ) -> Result<(GameId, crate::session::SharedSession), DomainError> {
        self.registry.find_by_player(player_id).ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Membership,
                format!("{player_id} is not in a game"),
            )
        })
    }

    /// Apply `op` to the sender's room and broadcast the new snapshot.
    fn in_room(
        &self,
        player_id: &str,
        event: &'static str,
        op: impl FnOnce(&mut GameSession) -> Result<(), DomainError>,
    ) -> Result<Dispatch, DomainError> {
        let (game_id, session) = self.room_of(player_id)?;
        let snapshot = {
            let mut guard = session.lock();
            op(&mut *guard)?;
            guard.snapshot()
        };
        Ok(Dispatch::room(game_id, Feedback::success(event, Some(snapshot))))
    }
}

fn to_usize(value: i64, kind: ValidationKind, what: &str) -> Result<usize, DomainError> {
    usize::try_from(value)
        .map_err(|_| DomainError::validation(kind, format!("{what} must not be negative, got {value}")))
}
