//! UseCase 層
//!
//! 1 操作 1 構造体。依存する Registry / Repository / MessagePusher は
//! `Arc<dyn Trait>` で受け取る。

pub mod admit_connection;
pub mod control_room;
pub mod disconnect_participant;
pub mod error;
pub mod join_room;
pub mod persist_checkpoint;
pub mod rename_user;
pub mod room_directory;
pub mod room_lifecycle;
pub mod send_message;
pub mod succeed_admin;
pub mod sync_playback;

#[cfg(test)]
pub(crate) mod test_support;

pub use admit_connection::{Admission, AdmitConnectionUseCase};
pub use control_room::ControlRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{
    AdmissionError, DirectoryError, JoinRoomError, PlaybackError, RenameUserError,
    RoomControlError, SendMessageError,
};
pub use join_room::JoinRoomUseCase;
pub use persist_checkpoint::{CheckpointKind, CheckpointPersister};
pub use rename_user::RenameUserUseCase;
pub use room_directory::{RoomDirectoryUseCase, RoomPresence};
pub use room_lifecycle::RoomLifecycleManager;
pub use send_message::SendMessageUseCase;
pub use succeed_admin::SucceedAdminUseCase;
pub use sync_playback::SyncPlaybackUseCase;
