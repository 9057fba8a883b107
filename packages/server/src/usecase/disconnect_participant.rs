//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断時の在室一覧の再計算、管理者の引き継ぎ、自動クローズの開始
//!
//! ### なぜこのテストが必要か
//! - 在室一覧はセッションストアから都度計算し、切断済みのユーザーを含めてはいけない
//! - 管理者が抜けたときに new-admin がちょうど 1 回だけ届くことを保証
//! - 最後の 1 人が抜けたルームは在室一覧を送らず、猶予期間に入ること
//!
//! ### どのような状況を想定しているか
//! - 正常系：管理者の切断（引き継ぎあり）、一般参加者の切断
//! - エッジケース：最後の参加者の切断、同じユーザーの別接続が残っている切断
//! - 異常系：存在しない接続の切断

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, RelayEvent, RepositoryError, Session, SessionRepository,
};

use super::{
    room_lifecycle::RoomLifecycleManager, send_message::SendMessageUseCase,
    succeed_admin::SucceedAdminUseCase,
};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（セッションと在室状況）
    sessions: Arc<dyn SessionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    lifecycle: Arc<RoomLifecycleManager>,
    succession: Arc<SucceedAdminUseCase>,
    notices: Arc<SendMessageUseCase>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        lifecycle: Arc<RoomLifecycleManager>,
        succession: Arc<SucceedAdminUseCase>,
        notices: Arc<SendMessageUseCase>,
    ) -> Self {
        Self {
            sessions,
            message_pusher,
            lifecycle,
            succession,
            notices,
        }
    }

    /// 参加者切断を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - 閉じたセッション（参加していたルームを含む）
    /// * `Err(RepositoryError)` - 接続が存在しない
    pub async fn execute(&self, connection_id: ConnectionId) -> Result<Session, RepositoryError> {
        // 1. セッションを削除（全ルームから抜ける）
        let session = self
            .sessions
            .close_session(&connection_id)
            .await
            .ok_or_else(|| RepositoryError::SessionNotFound(connection_id.to_string()))?;

        // 2. MessagePusher から接続を登録解除
        self.message_pusher.unregister_client(&connection_id).await;

        // 3. 参加していたルームごとに後始末
        for room_id in &session.joined_rooms {
            // 切断後のストアから再計算する
            let remaining = self.sessions.presence(room_id).await;

            if remaining.is_empty() {
                self.lifecycle.schedule_close(room_id.clone()).await;
                continue;
            }

            let targets = self
                .sessions
                .room_members(room_id)
                .await
                .into_iter()
                .map(|member| member.connection_id)
                .collect();
            let event = RelayEvent::PresenceUpdated {
                room_id: room_id.clone(),
                users: remaining.clone(),
            };
            if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
                tracing::warn!("Failed to broadcast presence for room '{}': {}", room_id, e);
            }

            // 同じユーザーの別接続が残っていれば「退室」ではない
            if remaining.contains(&session.user_id) {
                continue;
            }
            self.notices
                .announce(room_id, format!("{} left the room", session.username))
                .await;
            self.succession
                .execute(room_id, &session.user_id, &remaining)
                .await;
        }

        tracing::info!(
            "Connection '{}' of user '{}' closed ({} room(s) left)",
            connection_id,
            session.user_id,
            session.joined_rooms.len()
        );

        Ok(session)
    }
}
