//! WebSocket message DTOs.
//!
//! Every frame is a JSON object tagged by `"event"`; event names are kebab-case and
//! fields are camelCase, e.g.
//!
//! ```json
//! {"event":"toggle-player-state","roomId":"r1","playing":true,"time":42.5}
//! ```

use serde::{Deserialize, Serialize};

/// Events sent by browser clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinRoom {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ack_id: Option<u64>,
    },
    TogglePlayerState {
        room_id: String,
        playing: bool,
        #[serde(default)]
        time: Option<f64>,
    },
    QueryCurrentTime {
        room_id: String,
    },
    MyTimeIs {
        requester: String,
        time: f64,
    },
    PlaybackRateChanged {
        room_id: String,
        rate: f64,
    },
    SeekVideo {
        room_id: String,
        seconds: f64,
    },
    CloseRoom {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ack_id: Option<u64>,
    },
    ChangeMediaUrl {
        room_id: String,
        media_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ack_id: Option<u64>,
    },
    SendMessage {
        room_id: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ack_id: Option<u64>,
    },
    ChangeUsername {
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ack_id: Option<u64>,
    },
}

impl ClientEvent {
    pub fn ack_id(&self) -> Option<u64> {
        match self {
            Self::JoinRoom { ack_id, .. }
            | Self::CloseRoom { ack_id, .. }
            | Self::ChangeMediaUrl { ack_id, .. }
            | Self::SendMessage { ack_id, .. }
            | Self::ChangeUsername { ack_id, .. } => *ack_id,
            _ => None,
        }
    }
}

/// Sender of a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderInfo {
    pub id: String,
    pub username: String,
}

/// Events sent by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Ack {
        ack_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    RoomUsersList {
        room_id: String,
        users: Vec<String>,
    },
    TogglePlayerState {
        playing: bool,
        time: Option<f64>,
    },
    GiveYourTime {
        requester: String,
    },
    OthersTimeIs {
        time: f64,
    },
    PlaybackRateChanged {
        rate: f64,
    },
    VideoSeeked {
        seconds: f64,
    },
    RoomClosed {
        room_id: String,
    },
    MediaUrlChanged {
        media_url: String,
    },
    MessageReceived {
        text: String,
        sender: Option<SenderInfo>,
        timestamp: String,
    },
    NewAdmin {
        user_id: String,
    },
}
