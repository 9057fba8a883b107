//! クライアントへ配送するリレーイベント
//!
//! UseCase 層はこの型でイベントを組み立て、`MessagePusher` の実装がワイヤ形式
//! （JSON など）への変換を担当する。

use super::value_object::{
    ConnectionId, MediaUrl, MessageContent, PlaybackPosition, PlaybackRate, RoomId, Timestamp,
    UserId, Username,
};

/// チャットメッセージの送信者
#[derive(Debug, Clone, PartialEq)]
pub struct SenderIdentity {
    pub id: UserId,
    pub username: Username,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// 在室ユーザー一覧（重複なし、入室順）
    PresenceUpdated { room_id: RoomId, users: Vec<UserId> },
    /// 再生 / 一時停止（再生開始時は位置が必ず付く）
    PlayerStateToggled {
        playing: bool,
        position: Option<PlaybackPosition>,
    },
    /// 「今どこ？」の問い合わせ。回答は `requester` へ直接返す
    TimeQueried { requester: ConnectionId },
    /// 問い合わせへの回答
    TimeAnswered { position: PlaybackPosition },
    PlaybackRateChanged { rate: PlaybackRate },
    Seeked { position: PlaybackPosition },
    RoomClosed { room_id: RoomId },
    MediaUrlChanged { media_url: MediaUrl },
    /// `sender` が `None` のものはシステム（ボット）メッセージ
    MessageReceived {
        text: MessageContent,
        sender: Option<SenderIdentity>,
        timestamp: Timestamp,
    },
    AdminChanged { user_id: UserId },
}

impl RelayEvent {
    /// ログ用のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            Self::PresenceUpdated { .. } => "room-users-list",
            Self::PlayerStateToggled { .. } => "toggle-player-state",
            Self::TimeQueried { .. } => "give-your-time",
            Self::TimeAnswered { .. } => "others-time-is",
            Self::PlaybackRateChanged { .. } => "playback-rate-changed",
            Self::Seeked { .. } => "video-seeked",
            Self::RoomClosed { .. } => "room-closed",
            Self::MediaUrlChanged { .. } => "media-url-changed",
            Self::MessageReceived { .. } => "message-received",
            Self::AdminChanged { .. } => "new-admin",
        }
    }
}
