//! UseCase: チャットメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() / announce() メソッド
//! - ルーム内へのチャット配送（送信者本人を含む）とシステムメッセージ
//!
//! ### なぜこのテストが必要か
//! - 送信者の画面にも自分のメッセージを出すため、本人にも配送されることを保証
//! - 参加していないルームには送れないことを確認
//! - タイムスタンプの扱い（クライアント指定を優先、無ければサーバー時刻）を確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：在室者全員への配送
//! - 異常系：未参加のルームへの送信
//! - エッジケース：システムメッセージ（送信者なし）

use std::sync::Arc;

use sajiki_shared::time::Clock;

use crate::domain::{
    ConnectionId, MessageContent, MessagePusher, RelayEvent, RoomId, SenderIdentity,
    SessionRepository, Timestamp,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（セッションと在室状況）
    sessions: Arc<dyn SessionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// タイムスタンプ未指定時に使う時計
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            message_pusher,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ConnectionId>)` - 配送先の接続（送信者本人を含む）
    /// * `Err(SendMessageError)` - 送信失敗
    pub async fn execute(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
        content: MessageContent,
        timestamp: Option<Timestamp>,
    ) -> Result<Vec<ConnectionId>, SendMessageError> {
        // 1. 送信者がルームに参加しているか確認
        let session = self
            .sessions
            .get_session(&from)
            .await
            .filter(|session| session.has_joined(room_id))
            .ok_or(SendMessageError::NotInRoom)?;

        // 2. 配送先を取得（送信者本人も含む）
        let targets = self.room_targets(room_id).await;

        // 3. MessagePusher を使ってブロードキャスト
        let event = RelayEvent::MessageReceived {
            text: content,
            sender: Some(SenderIdentity {
                id: session.user_id,
                username: session.username,
            }),
            timestamp: timestamp.unwrap_or_else(|| self.now()),
        };
        self.message_pusher
            .broadcast(targets.clone(), &event)
            .await
            .map_err(|e| SendMessageError::BroadcastFailed(e.to_string()))?;

        Ok(targets)
    }

    /// システムメッセージ（送信者なし）をルームに流す
    ///
    /// 失敗してもログに残すだけで呼び出し元には返さない。
    pub async fn announce(&self, room_id: &RoomId, text: String) {
        let text = match MessageContent::new(text) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipped system message for room '{}': {}", room_id, e);
                return;
            }
        };

        let targets = self.room_targets(room_id).await;
        let event = RelayEvent::MessageReceived {
            text,
            sender: None,
            timestamp: self.now(),
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to announce in room '{}': {}", room_id, e);
        }
    }

    async fn room_targets(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.sessions
            .room_members(room_id)
            .await
            .into_iter()
            .map(|member| member.connection_id)
            .collect()
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}
