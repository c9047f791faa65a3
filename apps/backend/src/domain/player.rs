use serde::{Deserialize, Serialize};

/// Opaque, connection-scoped player identifier.
pub type PlayerId = String;

/// Whether a member takes turns or only watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Player,
    Spectator,
}

impl Role {
    pub fn toggled(self) -> Self {
        match self {
            Role::Player => Role::Spectator,
            Role::Spectator => Role::Player,
        }
    }
}

/// A room member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub role: Role,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: 0,
            role,
        }
    }

    pub fn player(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Player)
    }

    pub fn spectator(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Spectator)
    }
}

/// Index of the highest scorer; ties go to the earliest player in turn order.
pub fn leading_index(players: &[Player]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, p) in players.iter().enumerate() {
        match best {
            Some(b) if players[b].score >= p.score => {}
            _ => best = Some(i),
        }
    }
    best
}

pub fn leading_player(players: &[Player]) -> Option<&Player> {
    leading_index(players).map(|i| &players[i])
}
