//! ドメイン層のエラー型

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long ({actual} > {max})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("malformed {0}")]
    Malformed(&'static str),
}

/// Room Registry（外部ストア）へのアクセスエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("User not found!")]
    UserNotFound(String),

    #[error("Room not found!")]
    RoomNotFound(String),

    #[error("RoomInfo not found!")]
    RoomInfoNotFound(String),

    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

/// セッションリポジトリのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Push failed: {0}")]
    PushFailed(String),
}
