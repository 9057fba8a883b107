//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 参加後の在室一覧（room-users-list）のブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 在室一覧は参加者本人を含む全員に、重複なしの入室順で届く必要がある
//! - 猶予期間中のルームに参加すると自動クローズが取り消されることを保証
//! - 存在しない・閉じたルームへの参加を拒否すること
//!
//! ### どのような状況を想定しているか
//! - 正常系：空のルーム、既に在室者がいるルームへの参加
//! - 異常系：存在しないルーム、閉じたルーム
//! - エッジケース：同じユーザーの 2 本目の接続（一覧は重複しない、参加通知も出さない）

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, RelayEvent, RoomId, RoomRegistry, SessionRepository, UserId,
};

use super::{
    error::JoinRoomError, room_lifecycle::RoomLifecycleManager, send_message::SendMessageUseCase,
};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    registry: Arc<dyn RoomRegistry>,
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    lifecycle: Arc<RoomLifecycleManager>,
    notices: Arc<SendMessageUseCase>,
}

impl JoinRoomUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        lifecycle: Arc<RoomLifecycleManager>,
        notices: Arc<SendMessageUseCase>,
    ) -> Self {
        Self {
            registry,
            sessions,
            message_pusher,
            lifecycle,
            notices,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<UserId>)` - 参加後の在室ユーザー（ブロードキャストした一覧）
    /// * `Err(JoinRoomError)` - 参加失敗
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<Vec<UserId>, JoinRoomError> {
        // 1. セッションとルームの状態を確認
        let session = self
            .sessions
            .get_session(&connection_id)
            .await
            .ok_or(JoinRoomError::SessionNotFound)?;

        let info = self.registry.get_room_info(&room_id).await?;
        if !info.is_opened {
            tracing::warn!(
                "Connection '{}' tried to join closed room '{}'",
                connection_id,
                room_id
            );
            return Err(JoinRoomError::RoomClosed);
        }

        // 2. 在室状況に追加
        let already_present = self
            .sessions
            .presence(&room_id)
            .await
            .contains(&session.user_id);
        self.sessions
            .join_room(&connection_id, &room_id)
            .await
            .map_err(|_| JoinRoomError::SessionNotFound)?;

        // 3. 猶予期間中なら自動クローズを取り消す
        self.lifecycle.cancel_close(&room_id).await;

        // 4. 在室一覧を全員（参加者本人を含む）に送る
        let users = self.sessions.presence(&room_id).await;
        let targets = self
            .sessions
            .room_members(&room_id)
            .await
            .into_iter()
            .map(|member| member.connection_id)
            .collect();
        let event = RelayEvent::PresenceUpdated {
            room_id: room_id.clone(),
            users: users.clone(),
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast presence for room '{}': {}", room_id, e);
        }

        tracing::info!(
            "User '{}' joined room '{}' via '{}' ({} user(s) present)",
            session.user_id,
            room_id,
            connection_id,
            users.len()
        );

        // 5. 新しく在室になったユーザーだけ通知する
        if !already_present {
            self.notices
                .announce(&room_id, format!("{} joined the room", session.username))
                .await;
        }

        Ok(users)
    }
}
