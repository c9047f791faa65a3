//! Process-wide index of live sessions and of which player sits where.
//!
//! Lock order is always registry, then session. Sessions and their timers
//! never reach back into the registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::domain::{GameId, GameSnapshot, PlayerId, Role, SessionEvent, SessionState};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::session::{spawn_session, GameSession, SharedSession};
use crate::timer::TimerFactory;
use crate::utils::join_code::generate_join_code;

/// Attempts at drawing an unused join code before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// What a player gets back after entering a room.
#[derive(Debug)]
pub struct JoinOutcome {
    pub game_id: GameId,
    pub role: Role,
    pub snapshot: GameSnapshot,
    /// Subscribed under the session lock, so no event after the join is
    /// missed.
    pub events: broadcast::Receiver<SessionEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub game_id: GameId,
    pub state: SessionState,
    /// `None` once the session has been evicted.
    pub snapshot: Option<GameSnapshot>,
}

#[derive(Default)]
struct RegistryInner {
    games: HashMap<GameId, SharedSession>,
    /// Creation order, for quick match.
    order: Vec<GameId>,
    player_games: HashMap<PlayerId, GameId>,
    names: HashMap<PlayerId, String>,
}

impl RegistryInner {
    fn ensure_free(&self, player_id: &str) -> Result<(), DomainError> {
        match self.player_games.get(player_id) {
            Some(game_id) => Err(DomainError::conflict(
                ConflictKind::AlreadyInGame,
                format!("{player_id} is already in game {game_id}"),
            )),
            None => Ok(()),
        }
    }

    /// Remember an explicit name, or fall back to the last one used.
    fn resolve_name(&mut self, player_id: &str, name: Option<&str>) -> String {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => {
                self.names.insert(player_id.to_string(), name.to_string());
                name.to_string()
            }
            None => self
                .names
                .get(player_id)
                .cloned()
                .unwrap_or_else(|| default_name(player_id)),
        }
    }

    fn evict(&mut self, game_id: &str) {
        self.games.remove(game_id);
        self.order.retain(|id| id != game_id);
    }
}

fn default_name(player_id: &str) -> String {
    let short: String = player_id.chars().take(6).collect();
    format!("Player {short}")
}

pub struct GameRegistry {
    inner: Mutex<RegistryInner>,
    defaults: GameConfig,
    timers: Arc<dyn TimerFactory>,
}

impl GameRegistry {
    /// `defaults` seeds every new session; it is validated per session.
    pub fn new(defaults: GameConfig, timers: Arc<dyn TimerFactory>) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            defaults,
            timers,
        }
    }

    /// Open a new room with the creator as its first player.
    pub fn create_game(
        &self,
        player_id: &str,
        name: Option<&str>,
    ) -> Result<JoinOutcome, DomainError> {
        let mut inner = self.inner.lock();
        inner.ensure_free(player_id)?;

        let game_id = (0..MAX_ID_ATTEMPTS)
            .map(|_| generate_join_code())
            .find(|code| !inner.games.contains_key(code))
            .ok_or_else(|| {
                DomainError::conflict(
                    ConflictKind::JoinCodeConflict,
                    format!("no unused join code after {MAX_ID_ATTEMPTS} attempts"),
                )
            })?;

        let session = spawn_session(game_id.clone(), self.defaults, self.timers.as_ref(), None)?;
        let name = inner.resolve_name(player_id, name);
        let outcome = {
            let mut guard = session.lock();
            guard.admit_player(player_id, name)?;
            seated(&guard, Role::Player)
        };

        inner.games.insert(game_id.clone(), session);
        inner.order.push(game_id.clone());
        inner
            .player_games
            .insert(player_id.to_string(), game_id.clone());
        info!(game_id = %game_id, player_id, "Game created");
        Ok(outcome)
    }

    /// Enter an existing room: as a player while it accepts players,
    /// otherwise as a spectator.
    pub fn join_game(
        &self,
        player_id: &str,
        game_id: &str,
        name: Option<&str>,
    ) -> Result<JoinOutcome, DomainError> {
        let mut inner = self.inner.lock();
        inner.ensure_free(player_id)?;
        let session = inner
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Game, format!("no game {game_id}")))?;
        let name = inner.resolve_name(player_id, name);

        let outcome = {
            let mut guard = session.lock();
            let role = if guard.accepts_players() {
                guard.admit_player(player_id, name)?;
                Role::Player
            } else {
                guard.admit_spectator(player_id, name)?;
                Role::Spectator
            };
            seated(&guard, role)
        };

        inner
            .player_games
            .insert(player_id.to_string(), game_id.to_string());
        info!(game_id, player_id, role = ?outcome.role, "Joined game");
        Ok(outcome)
    }

    /// Seat the player in the oldest room still waiting for players.
    /// `None` when there is no such room.
    pub fn quick_match(
        &self,
        player_id: &str,
        name: Option<&str>,
    ) -> Result<Option<JoinOutcome>, DomainError> {
        let mut inner = self.inner.lock();
        inner.ensure_free(player_id)?;

        let candidate = inner.order.iter().find_map(|id| {
            let session = inner.games.get(id)?;
            let guard = session.lock();
            (guard.state() == SessionState::NotStarted && guard.accepts_players())
                .then(|| (id.clone(), Arc::clone(session)))
        });
        let Some((game_id, session)) = candidate else {
            debug!(player_id, "Quick match found no open room");
            return Ok(None);
        };

        let name = inner.resolve_name(player_id, name);
        let outcome = {
            let mut guard = session.lock();
            guard.admit_player(player_id, name)?;
            seated(&guard, Role::Player)
        };
        inner
            .player_games
            .insert(player_id.to_string(), game_id.clone());
        info!(game_id = %game_id, player_id, "Quick matched");
        Ok(Some(outcome))
    }

    /// Take the player out of their room. A room left with no members is
    /// evicted before the lock is released.
    pub fn leave(&self, player_id: &str) -> Result<LeaveOutcome, DomainError> {
        let mut inner = self.inner.lock();
        let game_id = inner.player_games.get(player_id).cloned().ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Membership,
                format!("{player_id} is not in a game"),
            )
        })?;

        let Some(session) = inner.games.get(&game_id).cloned() else {
            warn!(game_id = %game_id, player_id, "Membership pointed at a missing game");
            inner.player_games.remove(player_id);
            return Err(DomainError::not_found(
                NotFoundKind::Game,
                format!("no game {game_id}"),
            ));
        };

        let (state, snapshot) = {
            let mut guard = session.lock();
            let state = guard.remove_member(player_id)?;
            (state, guard.snapshot())
        };
        inner.player_games.remove(player_id);

        let snapshot = if state == SessionState::Empty {
            inner.evict(&game_id);
            info!(game_id = %game_id, "Game evicted");
            None
        } else {
            Some(snapshot)
        };
        Ok(LeaveOutcome {
            game_id,
            state,
            snapshot,
        })
    }

    /// Remember `name` for future rooms and rename the player where they sit
    /// now. Returns the updated snapshot when they are in a room.
    pub fn set_player_name(
        &self,
        player_id: &str,
        name: &str,
    ) -> Result<Option<GameSnapshot>, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation_other("name must not be blank"));
        }
        let mut inner = self.inner.lock();
        inner
            .names
            .insert(player_id.to_string(), name.to_string());

        let Some(game_id) = inner.player_games.get(player_id) else {
            return Ok(None);
        };
        let Some(session) = inner.games.get(game_id) else {
            return Ok(None);
        };
        let mut guard = session.lock();
        guard.set_player_name(player_id, name)?;
        Ok(Some(guard.snapshot()))
    }

    pub fn find_by_player(&self, player_id: &str) -> Option<(GameId, SharedSession)> {
        let inner = self.inner.lock();
        let game_id = inner.player_games.get(player_id)?;
        let session = inner.games.get(game_id)?;
        Some((game_id.clone(), Arc::clone(session)))
    }

    pub fn get(&self, game_id: &str) -> Option<SharedSession> {
        self.inner.lock().games.get(game_id).cloned()
    }

    pub fn name_of(&self, player_id: &str) -> Option<String> {
        self.inner.lock().names.get(player_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().games.is_empty()
    }
}

fn seated(session: &GameSession, role: Role) -> JoinOutcome {
    JoinOutcome {
        game_id: session.id().to_string(),
        role,
        snapshot: session.snapshot(),
        events: session.subscribe(),
    }
}
