//! UseCase: 管理者によるルーム操作（クローズ・メディア差し替え）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ControlRoomUseCase::close_room() / change_media_url() メソッド
//!
//! ### なぜこのテストが必要か
//! - 管理者以外の操作を拒否すること
//! - メディア差し替えで再生チェックポイントが {0 秒, 等速, 停止} に戻ること
//! - 差し替え・クローズ前の書き込み待ち（書き込み中のものを含む）が、新しい状態を上書きしないこと
//! - 閉じたルームでは再生操作が中継されないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：管理者によるクローズ、メディア差し替え
//! - 異常系：管理者以外の操作、未参加ルームの操作

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MediaUrl, MessagePusher, RelayEvent, RoomId, RoomInfoPatch, RoomPatch,
    RoomRegistry, Session, SessionRepository,
};

use super::{error::RoomControlError, persist_checkpoint::CheckpointPersister};

pub struct ControlRoomUseCase {
    registry: Arc<dyn RoomRegistry>,
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    checkpoints: Arc<CheckpointPersister>,
}

impl ControlRoomUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        checkpoints: Arc<CheckpointPersister>,
    ) -> Self {
        Self {
            registry,
            sessions,
            message_pusher,
            checkpoints,
        }
    }

    /// ルームを閉じ、他の在室者に room-closed を送る
    ///
    /// 操作した本人を含む全接続をルームから退室させる（接続自体は残る）。
    pub async fn close_room(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), RoomControlError> {
        let admin = self.ensure_admin(from, room_id).await?;

        self.checkpoints.cancel_room(room_id).await;
        self.registry
            .update_room_info(room_id, RoomInfoPatch::closed())
            .await?;

        // 閉じたルームへの再生操作・チャットは NotInRoom で拒否される
        let targets: Vec<ConnectionId> = self
            .sessions
            .evict_room(room_id)
            .await
            .into_iter()
            .filter(|connection_id| *connection_id != from)
            .collect();
        let event = RelayEvent::RoomClosed {
            room_id: room_id.clone(),
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast room-closed for '{}': {}", room_id, e);
        }

        tracing::info!("Room '{}' closed by admin '{}'", room_id, admin.user_id);
        Ok(())
    }

    /// メディアを差し替え、再生チェックポイントを先頭・等速・停止に戻す
    ///
    /// media-url-changed は操作した本人を含む全員に送る。
    pub async fn change_media_url(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
        media_url: MediaUrl,
    ) -> Result<(), RoomControlError> {
        let admin = self.ensure_admin(from, room_id).await?;

        self.checkpoints.cancel_room(room_id).await;
        let patch = RoomPatch {
            media_url: Some(media_url.clone()),
            ..RoomPatch::default()
        };
        self.registry.update_room(room_id, patch).await?;
        self.registry
            .update_room_info(room_id, RoomInfoPatch::playback_reset())
            .await?;

        let targets = self.member_connections(room_id).await;
        let event = RelayEvent::MediaUrlChanged {
            media_url: media_url.clone(),
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast media-url-changed for '{}': {}", room_id, e);
        }

        tracing::info!(
            "Media of room '{}' changed to '{}' by '{}'",
            room_id,
            media_url,
            admin.user_id
        );
        Ok(())
    }

    async fn ensure_admin(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
    ) -> Result<Session, RoomControlError> {
        let session = self
            .sessions
            .get_session(&from)
            .await
            .filter(|session| session.has_joined(room_id))
            .ok_or(RoomControlError::NotInRoom)?;

        let room = self.registry.get_room_by_id(room_id).await?;
        if room.admin_id != session.user_id {
            tracing::warn!(
                "User '{}' is not the admin of room '{}', request rejected",
                session.user_id,
                room_id
            );
            return Err(RoomControlError::NotAdmin);
        }
        Ok(session)
    }

    async fn member_connections(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.sessions
            .room_members(room_id)
            .await
            .into_iter()
            .map(|member| member.connection_id)
            .collect()
    }
}
