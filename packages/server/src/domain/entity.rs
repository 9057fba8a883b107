//! Entity 定義
//!
//! - `User` / `Room` / `RoomInfo`: Room Registry（外部ストア）が保持する永続データ
//! - `Session`: 接続ごとにプロセス内だけで保持する一時データ（永続化しない）

use std::collections::BTreeSet;

use serde::Serialize;

use super::value_object::{
    ConnectionId, MediaUrl, PlaybackPosition, PlaybackRate, RoomId, RoomLink, UserId, Username,
};

/// ユーザー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
}

impl User {
    pub fn new(id: UserId, username: Username) -> Self {
        Self { id, username }
    }
}

/// ルーム
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub link: RoomLink,
    pub media_url: MediaUrl,
    /// 現在の管理者。在室者がいる間は在室者の誰かを指す
    pub admin_id: UserId,
    pub owner_id: UserId,
}

/// ルームの再生チェックポイント
///
/// `curr_time` は最後の状態変更時点での再生位置であり、再生中に進み続ける時計ではない。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub is_opened: bool,
    pub is_playing: bool,
    pub curr_time: PlaybackPosition,
    pub curr_speed: PlaybackRate,
}

impl RoomInfo {
    /// ルーム作成直後の状態（開いていて、停止中、先頭、等速）
    pub fn opened(room_id: RoomId) -> Self {
        Self {
            room_id,
            is_opened: true,
            is_playing: false,
            curr_time: PlaybackPosition::START,
            curr_speed: PlaybackRate::NORMAL,
        }
    }

    pub fn apply(&mut self, patch: &RoomInfoPatch) {
        if let Some(is_opened) = patch.is_opened {
            self.is_opened = is_opened;
        }
        if let Some(is_playing) = patch.is_playing {
            self.is_playing = is_playing;
        }
        if let Some(curr_time) = patch.curr_time {
            self.curr_time = curr_time;
        }
        if let Some(curr_speed) = patch.curr_speed {
            self.curr_speed = curr_speed;
        }
    }
}

/// Room の部分更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    pub admin_id: Option<UserId>,
    pub media_url: Option<MediaUrl>,
}

impl Room {
    pub fn apply(&mut self, patch: &RoomPatch) {
        if let Some(admin_id) = &patch.admin_id {
            self.admin_id = admin_id.clone();
        }
        if let Some(media_url) = &patch.media_url {
            self.media_url = media_url.clone();
        }
    }
}

/// RoomInfo の部分更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomInfoPatch {
    pub is_opened: Option<bool>,
    pub is_playing: Option<bool>,
    pub curr_time: Option<PlaybackPosition>,
    pub curr_speed: Option<PlaybackRate>,
}

impl RoomInfoPatch {
    pub fn closed() -> Self {
        Self {
            is_opened: Some(false),
            ..Self::default()
        }
    }

    /// メディア差し替え時のリセット値
    pub fn playback_reset() -> Self {
        Self {
            is_opened: None,
            is_playing: Some(false),
            curr_time: Some(PlaybackPosition::START),
            curr_speed: Some(PlaybackRate::NORMAL),
        }
    }
}

/// 接続セッション
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub username: Username,
    pub joined_rooms: BTreeSet<RoomId>,
}

impl Session {
    pub fn new(connection_id: ConnectionId, user_id: UserId, username: Username) -> Self {
        Self {
            connection_id,
            user_id,
            username,
            joined_rooms: BTreeSet::new(),
        }
    }

    pub fn has_joined(&self, room_id: &RoomId) -> bool {
        self.joined_rooms.contains(room_id)
    }
}

/// ルーム在室者（接続単位）
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub username: Username,
}
