//! Joining, leaving and switching roles.

use tracing::info;

use crate::domain::rules::MIN_PLAYERS;
use crate::domain::state::{index_after_removal, require_current};
use crate::domain::{Player, Role, SessionState};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};

use super::{GameSession, TurnCause};

impl GameSession {
    /// Seat a new player. A finished session drops its board and returns to
    /// the lobby.
    pub fn admit_player(
        &mut self,
        player_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<(), DomainError> {
        let player = Player::player(player_id, name);
        self.transact("admit_player", move |s| {
            s.ensure_not_empty()?;
            s.ensure_not_member(&player.id)?;
            if s.state.is_in_play() {
                return Err(DomainError::phase(format!(
                    "cannot join as a player while {:?}",
                    s.state
                )));
            }
            if s.is_full() {
                return Err(DomainError::conflict(
                    ConflictKind::RoomFull,
                    format!("room holds at most {} players", s.config.max_players),
                ));
            }
            if s.state == SessionState::Finished {
                s.back_to_lobby();
            }
            info!(game_id = %s.id, player_id = %player.id, "Player joined");
            s.players.push(player);
            s.state = s.lobby_state();
            Ok(())
        })
    }

    pub fn admit_spectator(
        &mut self,
        player_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<(), DomainError> {
        let spectator = Player::spectator(player_id, name);
        self.transact("admit_spectator", move |s| {
            s.ensure_not_empty()?;
            s.ensure_not_member(&spectator.id)?;
            info!(game_id = %s.id, player_id = %spectator.id, "Spectator joined");
            s.spectators.push(spectator);
            Ok(())
        })
    }

    /// Swap a member between players and spectators. Returns the new role.
    pub fn change_role(&mut self, player_id: &str) -> Result<Role, DomainError> {
        self.transact("change_role", |s| {
            s.ensure_not_empty()?;
            if s.state.is_in_play() {
                return Err(DomainError::phase(format!(
                    "cannot change role while {:?}",
                    s.state
                )));
            }

            let role = if let Some(index) = s.player_index(player_id) {
                let mut member = s.players.remove(index);
                member.role = member.role.toggled();
                let role = member.role;
                s.spectators.push(member);
                role
            } else if let Some(index) = s.spectator_index(player_id) {
                if s.is_full() {
                    return Err(DomainError::conflict(
                        ConflictKind::RoomFull,
                        format!("room holds at most {} players", s.config.max_players),
                    ));
                }
                let mut member = s.spectators.remove(index);
                member.role = member.role.toggled();
                let role = member.role;
                s.players.push(member);
                role
            } else {
                return Err(Self::unknown_member(player_id));
            };

            if s.state == SessionState::Finished {
                s.back_to_lobby();
            } else {
                s.state = s.lobby_state();
            }
            info!(game_id = %s.id, player_id, ?role, "Role changed");
            Ok(role)
        })
    }

    /// Remove a player or spectator and return the resulting state.
    ///
    /// If the departing member holds the turn mid-match, the turn moves on
    /// first. A match left with a single player finishes; a session left with
    /// no members becomes `Empty` for good.
    pub fn remove_member(&mut self, player_id: &str) -> Result<SessionState, DomainError> {
        self.transact("remove_member", |s| {
            if let Some(index) = s.player_index(player_id) {
                s.remove_player_at(index)?;
            } else if let Some(index) = s.spectator_index(player_id) {
                s.spectators.remove(index);
            } else {
                return Err(Self::unknown_member(player_id));
            }
            info!(game_id = %s.id, player_id, "Member left");

            if s.total_members() == 0 {
                s.close();
            }
            Ok(s.state)
        })
    }

    pub fn set_player_name(
        &mut self,
        player_id: &str,
        name: impl Into<String>,
    ) -> Result<(), DomainError> {
        let name = name.into();
        self.transact("set_player_name", move |s| {
            s.ensure_not_empty()?;
            let member = s
                .players
                .iter_mut()
                .chain(s.spectators.iter_mut())
                .find(|p| p.id == player_id)
                .ok_or_else(|| Self::unknown_member(player_id))?;
            member.name = name;
            Ok(())
        })
    }

    fn remove_player_at(&mut self, index: usize) -> Result<(), DomainError> {
        match self.state {
            SessionState::Ongoing | SessionState::Paused => {
                let mut current =
                    require_current(self.current_player_index, self.players.len(), "remove_member")?;
                if current == index && self.players.len() > 1 {
                    current = self.advance_turn(TurnCause::Action)?;
                }
                self.players.remove(index);
                if self.players.is_empty() {
                    self.back_to_lobby();
                    return Ok(());
                }
                self.current_player_index = Some(index_after_removal(current, index));
                if self.players.len() < MIN_PLAYERS {
                    self.finish();
                }
            }
            SessionState::Finished => {
                let current =
                    require_current(self.current_player_index, self.players.len(), "remove_member")?;
                self.players.remove(index);
                if self.players.is_empty() {
                    self.back_to_lobby();
                    return Ok(());
                }
                let current = if current == index {
                    index % self.players.len()
                } else {
                    index_after_removal(current, index)
                };
                self.current_player_index = Some(current);
            }
            _ => {
                self.players.remove(index);
                self.state = self.lobby_state();
            }
        }
        Ok(())
    }

    fn ensure_not_member(&self, player_id: &str) -> Result<(), DomainError> {
        if self.find_member(player_id).is_some() {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyMember,
                format!("{player_id} is already in this game"),
            ));
        }
        Ok(())
    }

    fn unknown_member(player_id: &str) -> DomainError {
        DomainError::not_found(
            NotFoundKind::Player,
            format!("{player_id} is not a member of this game"),
        )
    }
}
