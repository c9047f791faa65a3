use serde::{Deserialize, Serialize};

use crate::domain::SessionEvent;
use crate::errors::ErrorCode;
use crate::services::gateway::{Command, Feedback};

pub const PROTOCOL_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Hello { protocol: i32 },
    Command { command: Command },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    HelloAck {
        protocol: i32,
        /// Connection-scoped identity used for every later command.
        player_id: String,
    },

    Feedback {
        feedback: Feedback,
    },

    Event {
        event: SessionEvent,
    },

    Error {
        code: ErrorCode,
        message: String,
    },
}
