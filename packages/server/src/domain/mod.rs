//! Domain 層
//!
//! 値オブジェクト・エンティティ・リレーイベントと、UseCase 層が依存する trait を定義する。

pub mod entity;
pub mod error;
pub mod event;
pub mod pusher;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use entity::{Member, Room, RoomInfo, RoomInfoPatch, RoomPatch, Session, User};
pub use error::{MessagePushError, RegistryError, RepositoryError, ValueObjectError};
pub use event::{RelayEvent, SenderIdentity};
pub use pusher::{MessagePusher, PusherChannel};
pub use registry::RoomRegistry;
#[cfg(test)]
pub use registry::MockRoomRegistry;
pub use repository::SessionRepository;
pub use value_object::{
    ConnectionId, MediaUrl, MessageContent, PlaybackPosition, PlaybackRate, RoomId, RoomLink,
    Timestamp, UserId, Username,
};
