//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{MessagePushError, RegistryError, ValueObjectError};

/// 接続受付（ハンドシェイク）のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdmissionError {
    /// userId が無い・空
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Registry でのユーザー検索に失敗（メッセージは Registry のものをそのまま返す）
    #[error("{0}")]
    UserLookup(RegistryError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JoinRoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is closed")]
    RoomClosed,

    #[error("Session not found")]
    SessionNotFound,

    #[error("{0}")]
    Registry(RegistryError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("Not joined to the room")]
    NotInRoom,

    /// 再生開始には位置が必須
    #[error("Position is required when playing")]
    PositionRequired,

    #[error("Requester not found")]
    RequesterNotFound,

    #[error("Requester is not in a shared room")]
    NotSharingRoom,

    #[error(transparent)]
    Push(#[from] MessagePushError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoomControlError {
    #[error("Not joined to the room")]
    NotInRoom,

    #[error("Only the room admin can do this")]
    NotAdmin,

    #[error("Room not found")]
    RoomNotFound,

    #[error("{0}")]
    Registry(RegistryError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SendMessageError {
    #[error("Not joined to the room")]
    NotInRoom,

    #[error("Failed to broadcast message: {0}")]
    BroadcastFailed(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenameUserError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("{0}")]
    Registry(RegistryError),
}

/// HTTP API（ユーザー・ルームの参照と作成）のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),

    #[error("{0}")]
    Registry(#[from] RegistryError),
}

impl From<RegistryError> for RoomControlError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::RoomNotFound(_) | RegistryError::RoomInfoNotFound(_) => {
                Self::RoomNotFound
            }
            other => Self::Registry(other),
        }
    }
}

impl From<RegistryError> for JoinRoomError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::RoomNotFound(_) | RegistryError::RoomInfoNotFound(_) => {
                Self::RoomNotFound
            }
            other => Self::Registry(other),
        }
    }
}
