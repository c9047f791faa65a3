//! One room: board, members, turn order and countdown.
//!
//! Every public operation either succeeds or returns a [`DomainError`] with
//! the session untouched. Push events are derived by comparing the lifecycle
//! view before and after each mutation.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace};

use crate::config::GameConfig;
use crate::domain::rules::{
    check_bombs_fit, check_bombs_not_divisible, check_max_players, MIN_PLAYERS,
};
use crate::domain::state::require_current;
use crate::domain::{
    derive_game_transitions, leading_index, leading_player, next_index, Board,
    GameId, GameSnapshot, GameTransition, LifecycleView, Player, SessionEvent, SessionState,
    Tile, TileView,
};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::timer::{Tick, TurnTimer};

mod membership;
mod shared;

pub use shared::{spawn_session, SharedSession};

#[cfg(test)]
mod tests_lifecycle;
#[cfg(test)]
mod tests_timer;

/// Capacity of each session's event channel. Slow subscribers lag rather
/// than block the session.
const EVENT_CAPACITY: usize = 64;

/// Result of a successful tile selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOutcome {
    pub tile: Tile,
    /// The selection found the last bomb.
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session not ongoing.
    Ignored,
    /// Tick from a stopped or replaced timer generation.
    Stale,
    /// Consumed by the skip flag set on the previous turn change.
    Skipped,
    Counted { remaining: i32 },
    TurnAdvanced { player_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnCause {
    /// A player action or departure moved the turn.
    Action,
    /// The countdown ran out.
    Timer,
}

pub struct GameSession {
    id: GameId,
    state: SessionState,
    config: GameConfig,
    board: Option<Board>,
    selected_tiles: Vec<Tile>,
    players: Vec<Player>,
    spectators: Vec<Player>,
    current_player_index: Option<usize>,
    current_time: i32,
    bombs_found: usize,
    skip_next_tick: bool,
    timer: Box<dyn TurnTimer>,
    tick_interval: Duration,
    rng: ChaCha8Rng,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("players", &self.players.len())
            .field("spectators", &self.spectators.len())
            .field("current_player_index", &self.current_player_index)
            .field("current_time", &self.current_time)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Create an empty-handed session in `NotStarted`. The first member is
    /// admitted separately.
    pub fn new(
        id: impl Into<GameId>,
        config: GameConfig,
        timer: Box<dyn TurnTimer>,
        tick_interval: Duration,
        seed: Option<u64>,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self::from_parts(id.into(), config, timer, tick_interval, seed))
    }

    /// Caller has already validated `config`.
    pub(crate) fn from_parts(
        id: GameId,
        config: GameConfig,
        timer: Box<dyn TurnTimer>,
        tick_interval: Duration,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::seed_from_u64(rand::rng().random()),
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id,
            state: SessionState::NotStarted,
            config,
            board: None,
            selected_tiles: Vec::new(),
            players: Vec::new(),
            spectators: Vec::new(),
            current_player_index: None,
            current_time: -1,
            bombs_found: 0,
            skip_next_tick: false,
            timer,
            tick_interval,
            rng,
            events,
        }
    }

    // ---- queries ----

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn spectators(&self) -> &[Player] {
        &self.spectators
    }

    pub fn selected_tiles(&self) -> &[Tile] {
        &self.selected_tiles
    }

    pub fn current_player_index(&self) -> Option<usize> {
        self.current_player_index
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player_index.and_then(|i| self.players.get(i))
    }

    /// Seconds left in the current turn, or -1 when no countdown runs.
    pub fn current_time(&self) -> i32 {
        self.current_time
    }

    pub fn bombs_found(&self) -> usize {
        self.bombs_found
    }

    pub fn skip_pending(&self) -> bool {
        self.skip_next_tick
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Leader by score. Final once the session is `Finished`.
    pub fn winner(&self) -> Option<&Player> {
        leading_player(&self.players)
    }

    pub fn total_members(&self) -> usize {
        self.players.len() + self.spectators.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.config.max_players
    }

    /// Whether a newcomer would be seated as a player rather than a spectator.
    pub fn accepts_players(&self) -> bool {
        !self.is_full()
            && matches!(
                self.state,
                SessionState::NotStarted | SessionState::Ready | SessionState::Finished
            )
    }

    pub fn find_member(&self, player_id: &str) -> Option<&Player> {
        self.players
            .iter()
            .chain(self.spectators.iter())
            .find(|p| p.id == player_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_id: self.id.clone(),
            players: self.players.clone(),
            spectators: self.spectators.clone(),
            selected_tiles: self.selected_tiles.iter().map(TileView::from).collect(),
            state: self.state,
            board_width: self.config.width,
            board_height: self.config.height,
            number_of_bombs: self.config.bomb_count,
            number_of_bombs_found: self.bombs_found,
            max_players: self.config.max_players,
            current_player: self.current_player().map(|p| p.id.clone()),
        }
    }

    /// Full board with bombs hidden on unselected tiles. Empty before the
    /// first round.
    pub fn public_board(&self) -> Vec<TileView> {
        self.board
            .as_ref()
            .map(Board::public_view)
            .unwrap_or_default()
    }

    // ---- round lifecycle ----

    pub fn start(&mut self) -> Result<(), DomainError> {
        self.transact("start", |s| {
            if !s.state.is_lobby() {
                return Err(DomainError::phase(format!(
                    "cannot start a game in state {:?}",
                    s.state
                )));
            }
            if s.players.len() < MIN_PLAYERS {
                return Err(DomainError::validation(
                    ValidationKind::NotEnoughPlayers,
                    format!("need at least {MIN_PLAYERS} players to start"),
                ));
            }
            s.begin_round(None)
        })
    }

    pub fn select_tile(
        &mut self,
        player_id: &str,
        x: usize,
        y: usize,
    ) -> Result<SelectOutcome, DomainError> {
        self.transact("select_tile", |s| {
            if s.state != SessionState::Ongoing {
                return Err(DomainError::phase(format!(
                    "tiles can only be selected while ongoing, not {:?}",
                    s.state
                )));
            }
            let actor = match s.player_index(player_id) {
                Some(index) => index,
                None if s.spectator_index(player_id).is_some() => {
                    return Err(DomainError::validation(
                        ValidationKind::OutOfTurn,
                        "spectators cannot select tiles",
                    ));
                }
                None => {
                    return Err(DomainError::not_found(
                        NotFoundKind::Player,
                        format!("player {player_id} is not in this game"),
                    ));
                }
            };
            let current = require_current(s.current_player_index, s.players.len(), "select_tile")?;
            if actor != current {
                return Err(DomainError::validation(
                    ValidationKind::OutOfTurn,
                    "it is not your turn",
                ));
            }

            let board = s
                .board
                .as_mut()
                .ok_or_else(|| DomainError::invariant("ongoing session has no board"))?;
            let tile = board.select(x, y)?;
            s.selected_tiles.push(tile);
            debug!(game_id = %s.id, player_id, x, y, is_bomb = tile.is_bomb, "Tile selected");

            if tile.is_bomb {
                s.players[actor].score += s.config.score_multiplier;
                s.bombs_found += 1;
                if s.bombs_found >= s.config.bomb_count {
                    s.finish();
                    return Ok(SelectOutcome {
                        tile,
                        finished: true,
                    });
                }
            }
            s.advance_turn(TurnCause::Action)?;
            Ok(SelectOutcome {
                tile,
                finished: false,
            })
        })
    }

    /// One countdown step.
    ///
    /// A turn handed over by a selection swallows its first tick, so it runs
    /// `wait_time + 1` ticks; a turn handed over by a timeout runs
    /// `wait_time` ticks.
    pub fn tick(&mut self) -> Result<TickOutcome, DomainError> {
        self.transact("tick", |s| {
            if s.state != SessionState::Ongoing {
                return Ok(TickOutcome::Ignored);
            }
            if s.skip_next_tick {
                s.skip_next_tick = false;
                trace!(game_id = %s.id, "Tick consumed by turn change");
                return Ok(TickOutcome::Skipped);
            }
            s.current_time -= 1;
            s.emit(SessionEvent::Tick {
                game_id: s.id.clone(),
                remaining: s.current_time,
            });
            if s.current_time > 0 {
                return Ok(TickOutcome::Counted {
                    remaining: s.current_time,
                });
            }
            let next = s.advance_turn(TurnCause::Timer)?;
            debug!(game_id = %s.id, next, "Turn timed out");
            Ok(TickOutcome::TurnAdvanced {
                player_id: s.players[next].id.clone(),
            })
        })
    }

    /// Entry point for ticks coming from this session's timer.
    pub fn handle_timer_tick(&mut self, tick: Tick) -> Result<TickOutcome, DomainError> {
        if !self.timer.is_current(tick) {
            trace!(game_id = %self.id, generation = tick.generation, "Stale tick dropped");
            return Ok(TickOutcome::Stale);
        }
        self.tick()
    }

    pub fn pause(&mut self) -> Result<(), DomainError> {
        self.transact("pause", |s| {
            if s.state != SessionState::Ongoing {
                return Err(DomainError::phase(format!(
                    "cannot pause in state {:?}",
                    s.state
                )));
            }
            s.timer.stop();
            s.state = SessionState::Paused;
            Ok(())
        })
    }

    pub fn resume(&mut self) -> Result<(), DomainError> {
        self.transact("resume", |s| {
            if s.state != SessionState::Paused {
                return Err(DomainError::phase(format!(
                    "cannot resume in state {:?}",
                    s.state
                )));
            }
            s.timer.start(s.tick_interval);
            s.state = SessionState::Ongoing;
            Ok(())
        })
    }

    /// Returns the state after toggling.
    pub fn toggle_pause(&mut self) -> Result<SessionState, DomainError> {
        match self.state {
            SessionState::Ongoing => self.pause()?,
            SessionState::Paused => self.resume()?,
            other => {
                return Err(DomainError::phase(format!(
                    "cannot toggle pause in state {other:?}"
                )));
            }
        }
        Ok(self.state)
    }

    /// Rematch with the same members; the previous winner moves first.
    pub fn play_again(&mut self) -> Result<SessionState, DomainError> {
        self.transact("play_again", |s| {
            if s.state != SessionState::Finished {
                return Err(DomainError::phase(format!(
                    "play again requires a finished game, not {:?}",
                    s.state
                )));
            }
            if s.players.len() < MIN_PLAYERS {
                s.back_to_lobby();
            } else {
                let first = leading_index(&s.players);
                s.begin_round(first)?;
            }
            Ok(s.state)
        })
    }

    /// Fresh board and scores outside of a running match.
    pub fn reset_board(&mut self) -> Result<SessionState, DomainError> {
        self.transact("reset_board", |s| {
            if !s.is_configurable() {
                return Err(DomainError::phase(format!(
                    "cannot reset the board in state {:?}",
                    s.state
                )));
            }
            if s.players.len() < MIN_PLAYERS {
                s.back_to_lobby();
            } else {
                s.begin_round(None)?;
            }
            Ok(s.state)
        })
    }

    // ---- configuration ----

    pub fn set_number_of_bombs(&mut self, bomb_count: usize) -> Result<(), DomainError> {
        self.transact("set_number_of_bombs", |s| {
            s.ensure_configurable("change the bomb count")?;
            check_bombs_fit(bomb_count, s.config.width, s.config.height)?;
            check_bombs_not_divisible(bomb_count, s.config.max_players)?;
            s.config.bomb_count = bomb_count;
            Ok(())
        })
    }

    pub fn set_board_size(&mut self, width: usize, height: usize) -> Result<(), DomainError> {
        self.transact("set_board_size", |s| {
            s.ensure_configurable("resize the board")?;
            check_bombs_fit(s.config.bomb_count, width, height).map_err(|err| match err {
                DomainError::Validation(_, detail) => {
                    DomainError::validation(ValidationKind::InvalidBoardSize, detail)
                }
                other => other,
            })?;
            s.config.width = width;
            s.config.height = height;
            Ok(())
        })
    }

    pub fn set_max_players(&mut self, max_players: usize) -> Result<(), DomainError> {
        self.transact("set_max_players", |s| {
            if !s.state.is_lobby() {
                return Err(DomainError::phase(format!(
                    "cannot change max players in state {:?}",
                    s.state
                )));
            }
            check_max_players(max_players, s.players.len())?;
            s.config.max_players = max_players;
            s.state = s.lobby_state();
            Ok(())
        })
    }

    pub fn set_wait_time(&mut self, secs: u32) -> Result<(), DomainError> {
        self.transact("set_wait_time", |s| {
            s.ensure_configurable("change the turn length")?;
            if secs == 0 {
                return Err(DomainError::validation(
                    ValidationKind::InvalidWaitTime,
                    "turn length must be at least one second",
                ));
            }
            s.config.wait_time_secs = secs;
            Ok(())
        })
    }

    // ---- invariants ----

    /// Verify the structural invariants. Used by tests after each operation.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        let fail = |msg: String| Err(DomainError::invariant(msg));

        if let Some(board) = &self.board {
            let tiles = board.width() * board.height();
            if board.tiles().len() != tiles {
                return fail(format!("board holds {} of {tiles} tiles", board.tiles().len()));
            }
            let bombs = board.bomb_count();
            if bombs == 0 || bombs >= tiles {
                return fail(format!("{bombs} bombs on {tiles} tiles"));
            }
        }

        match (self.state.has_turn(), self.current_player_index) {
            (false, None) => {}
            (false, Some(i)) => {
                return fail(format!("current player {i} set in {:?}", self.state));
            }
            (true, None) => return fail(format!("no current player in {:?}", self.state)),
            (true, Some(i)) if i >= self.players.len() => {
                return fail(format!("current player {i} beyond {} players", self.players.len()));
            }
            (true, Some(_)) => {}
        }

        if self.players.len() > self.config.max_players {
            return fail(format!(
                "{} players exceed max {}",
                self.players.len(),
                self.config.max_players
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for tile in &self.selected_tiles {
            if !seen.insert((tile.x, tile.y)) {
                return fail(format!("tile ({}, {}) selected twice", tile.x, tile.y));
            }
            let Some(board) = &self.board else {
                return fail("selected tiles without a board".to_string());
            };
            let stored = board.tile(tile.x, tile.y)?;
            if !stored.is_selected || stored != tile {
                return fail(format!("selected tile ({}, {}) out of sync", tile.x, tile.y));
            }
        }

        let bombs_selected = self.selected_tiles.iter().filter(|t| t.is_bomb).count();
        if bombs_selected != self.bombs_found {
            return fail(format!(
                "bombs_found {} but {bombs_selected} bombs selected",
                self.bombs_found
            ));
        }

        let empty = self.total_members() == 0;
        if empty != (self.state == SessionState::Empty) {
            return fail(format!(
                "{} members in state {:?}",
                self.total_members(),
                self.state
            ));
        }
        Ok(())
    }

    // ---- internals ----

    fn lifecycle_view(&self) -> LifecycleView {
        LifecycleView {
            state: self.state,
            current_player: self.current_player().map(|p| p.id.clone()),
            total_members: self.total_members(),
        }
    }

    /// Run one mutation and announce what it changed.
    fn transact<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let before = self.lifecycle_view();
        let result = f(self);
        match &result {
            Ok(_) => self.announce(&before),
            Err(err @ DomainError::Invariant(_)) => {
                error!(game_id = %self.id, op, error = %err, "Session invariant violated");
            }
            Err(err) => debug!(game_id = %self.id, op, error = %err, "Operation rejected"),
        }
        result
    }

    fn announce(&self, before: &LifecycleView) {
        let after = self.lifecycle_view();
        for transition in derive_game_transitions(before, &after) {
            match transition {
                GameTransition::StateChanged { from, to } => {
                    info!(game_id = %self.id, ?from, ?to, "Session state changed");
                    self.emit(SessionEvent::StateChanged {
                        game_id: self.id.clone(),
                        from,
                        to,
                    });
                }
                GameTransition::TurnBecame { player_id } => {
                    if let Some(player) = self.current_player() {
                        debug!(game_id = %self.id, player_id = %player_id, "Next player");
                        self.emit(SessionEvent::NextPlayer {
                            game_id: self.id.clone(),
                            player: player.clone(),
                        });
                    }
                }
                GameTransition::MembersChanged { total } => {
                    self.emit(SessionEvent::MembersChanged {
                        game_id: self.id.clone(),
                        total,
                    });
                }
                GameTransition::GameEnded => {
                    if let Some(winner) = self.winner() {
                        info!(game_id = %self.id, winner = %winner.id, score = winner.score, "Game finished");
                        self.emit(SessionEvent::Winner {
                            game_id: self.id.clone(),
                            player: winner.clone(),
                        });
                    }
                }
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    fn spectator_index(&self, player_id: &str) -> Option<usize> {
        self.spectators.iter().position(|p| p.id == player_id)
    }

    fn lobby_state(&self) -> SessionState {
        if self.is_full() {
            SessionState::Ready
        } else {
            SessionState::NotStarted
        }
    }

    fn is_configurable(&self) -> bool {
        self.state.is_lobby() || self.state == SessionState::Finished
    }

    fn ensure_configurable(&self, what: &str) -> Result<(), DomainError> {
        if self.is_configurable() {
            Ok(())
        } else {
            Err(DomainError::phase(format!(
                "cannot {what} in state {:?}",
                self.state
            )))
        }
    }

    fn ensure_not_empty(&self) -> Result<(), DomainError> {
        if self.state == SessionState::Empty {
            return Err(DomainError::phase("session is closed"));
        }
        Ok(())
    }

    /// Generate a board and hand the turn to `first` (random if `None`).
    /// Fails before touching anything if the board cannot be generated.
    fn begin_round(&mut self, first: Option<usize>) -> Result<(), DomainError> {
        let board = Board::generate(
            self.config.width,
            self.config.height,
            self.config.bomb_count,
            &mut self.rng,
        )?;
        let first = match first {
            Some(index) => index,
            None => self.rng.random_range(0..self.players.len()),
        };
        self.board = Some(board);
        self.selected_tiles.clear();
        self.bombs_found = 0;
        for player in &mut self.players {
            player.score = 0;
        }
        self.current_player_index = Some(first);
        self.state = SessionState::Ongoing;
        self.skip_next_tick = false;
        self.restart_countdown();
        Ok(())
    }

    /// Drop the round and wait for players again.
    fn back_to_lobby(&mut self) {
        self.timer.stop();
        self.board = None;
        self.selected_tiles.clear();
        self.bombs_found = 0;
        for player in &mut self.players {
            player.score = 0;
        }
        self.current_player_index = None;
        self.current_time = -1;
        self.skip_next_tick = false;
        self.state = self.lobby_state();
    }

    fn finish(&mut self) {
        self.timer.stop();
        self.current_time = -1;
        self.skip_next_tick = false;
        self.state = SessionState::Finished;
    }

    fn close(&mut self) {
        self.timer.stop();
        self.board = None;
        self.selected_tiles.clear();
        self.bombs_found = 0;
        self.current_player_index = None;
        self.current_time = -1;
        self.skip_next_tick = false;
        self.state = SessionState::Empty;
    }

    fn restart_countdown(&mut self) {
        self.current_time = self.config.wait_time();
        self.timer.reset(Some(self.tick_interval));
        self.emit(SessionEvent::Tick {
            game_id: self.id.clone(),
            remaining: self.current_time,
        });
    }

    /// Move the turn to the next player. The countdown restarts only while
    /// ongoing; a paused session keeps its timer stopped.
    fn advance_turn(&mut self, cause: TurnCause) -> Result<usize, DomainError> {
        let current =
            require_current(self.current_player_index, self.players.len(), "advance_turn")?;
        let next = next_index(current, self.players.len())?;
        self.current_player_index = Some(next);
        if cause == TurnCause::Action {
            self.skip_next_tick = true;
        }
        if self.state == SessionState::Ongoing {
            self.restart_countdown();
        } else {
            self.current_time = self.config.wait_time();
        }
        Ok(next)
    }
}
