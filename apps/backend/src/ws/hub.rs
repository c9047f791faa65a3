use actix::prelude::*;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::GameId;
use crate::services::gateway::Feedback;

/// Room-scoped feedback pushed to every connection in a game.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct RoomBroadcast {
    pub feedback: Feedback,
}

/// Which connections are attached to which room.
#[derive(Default)]
pub struct RoomHub {
    rooms: DashMap<GameId, DashMap<Uuid, Recipient<RoomBroadcast>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    pub fn join(&self, game_id: &str, conn_id: Uuid, recipient: Recipient<RoomBroadcast>) {
        self.rooms
            .entry(game_id.to_string())
            .or_default()
            .insert(conn_id, recipient);
        debug!(game_id, conn_id = %conn_id, "Connection joined room");
    }

    pub fn leave(&self, game_id: &str, conn_id: Uuid) {
        if let Some(room) = self.rooms.get(game_id) {
            room.remove(&conn_id);
        }
        // The shard guard from `get` is released before this.
        self.rooms.remove_if(game_id, |_, room| room.is_empty());
        debug!(game_id, conn_id = %conn_id, "Connection left room");
    }

    /// Returns how many connections the message was queued for.
    pub fn broadcast(&self, game_id: &str, message: RoomBroadcast) -> usize {
        let Some(room) = self.rooms.get(game_id) else {
            return 0;
        };
        let delivered = room
            .iter()
            .filter(|entry| entry.value().try_send(message.clone()).is_ok())
            .count();
        delivered
    }

    pub fn contains(&self, game_id: &str, conn_id: Uuid) -> bool {
        self.rooms
            .get(game_id)
            .is_some_and(|room| room.contains_key(&conn_id))
    }

    pub fn room_size(&self, game_id: &str) -> usize {
        self.rooms.get(game_id).map_or(0, |room| room.len())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
