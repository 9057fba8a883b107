//! UseCase: 接続受付処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AdmitConnectionUseCase::execute() / open_session() メソッド
//! - ハンドシェイクで名乗られた userId を Registry で検証する処理
//!
//! ### なぜこのテストが必要か
//! - userId が無い接続、存在しないユーザーの接続を確実に拒否する
//! - 拒否メッセージ（"Invalid credentials" / Registry のメッセージ）がクライアントに返る文言と一致すること
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録済みユーザーの接続
//! - 異常系：userId なし、空白のみ、未登録ユーザー
//! - エッジケース：同じユーザーの複数接続（別セッションとして受け付ける）

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, PusherChannel, RoomRegistry, Session, SessionRepository, UserId,
    Username,
};

use super::error::AdmissionError;

/// 検証済みの接続者
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub user_id: UserId,
    pub username: Username,
}

/// 接続受付のユースケース
pub struct AdmitConnectionUseCase {
    registry: Arc<dyn RoomRegistry>,
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl AdmitConnectionUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            sessions,
            message_pusher,
        }
    }

    /// 名乗られた userId を検証する（WebSocket のアップグレード前に呼ぶ）
    ///
    /// `username` が指定されていて有効ならセッションの表示名に使い、
    /// そうでなければ Registry の表示名を使う。
    pub async fn execute(
        &self,
        user_id: Option<String>,
        username: Option<String>,
    ) -> Result<Admission, AdmissionError> {
        let user_id = user_id
            .and_then(|id| UserId::new(id).ok())
            .ok_or(AdmissionError::InvalidCredentials)?;

        let user = self
            .registry
            .get_user_by_id(&user_id)
            .await
            .map_err(AdmissionError::UserLookup)?;

        let username = username
            .and_then(|name| Username::new(name).ok())
            .unwrap_or(user.username);

        Ok(Admission {
            user_id: user.id,
            username,
        })
    }

    /// アップグレード完了後にセッションを開き、送信チャンネルを登録する
    pub async fn open_session(&self, admission: Admission, sender: PusherChannel) -> Session {
        let session = Session::new(
            ConnectionId::generate(),
            admission.user_id,
            admission.username,
        );
        self.sessions.open_session(session.clone()).await;
        self.message_pusher
            .register_client(session.connection_id, sender)
            .await;

        tracing::info!(
            "Connection '{}' opened for user '{}'",
            session.connection_id,
            session.user_id
        );
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockRoomRegistry, RegistryError};
    use crate::usecase::test_support::Fixture;

    fn create_usecase(fixture: &Fixture) -> AdmitConnectionUseCase {
        AdmitConnectionUseCase::new(
            fixture.registry.clone(),
            fixture.sessions.clone(),
            fixture.pusher.clone(),
        )
    }

    #[tokio::test]
    async fn test_admit_registered_user() {
        // テスト項目: 登録済みユーザーは受け付けられ、Registry の表示名が使われる
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        let admission = usecase
            .execute(Some(alice.id.to_string()), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(admission.user_id, alice.id);
        assert_eq!(admission.username.as_str(), "alice");
    }

    #[tokio::test]
    async fn test_admit_prefers_handshake_username() {
        // テスト項目: ハンドシェイクの表示名が有効ならそちらが使われる
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        let admission = usecase
            .execute(Some(alice.id.to_string()), Some("Alice W.".to_string()))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(admission.username.as_str(), "Alice W.");
    }

    #[tokio::test]
    async fn test_reject_missing_user_id() {
        // テスト項目: userId なし・空白のみは "Invalid credentials" で拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = create_usecase(&fixture);

        // when (操作):
        let missing = usecase.execute(None, None).await;
        let blank = usecase.execute(Some("  ".to_string()), None).await;

        // then (期待する結果):
        assert_eq!(missing, Err(AdmissionError::InvalidCredentials));
        assert_eq!(blank, Err(AdmissionError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_reject_unknown_user_with_registry_message() {
        // テスト項目: 未登録ユーザーは Registry のエラーメッセージで拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = create_usecase(&fixture);

        // when (操作):
        let error = usecase
            .execute(Some("ghost".to_string()), None)
            .await
            .unwrap_err();

        // then (期待する結果):
        assert_eq!(error.to_string(), "User not found!");
        assert_eq!(fixture.sessions.count_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_reject_when_registry_is_unavailable() {
        // テスト項目: Registry 障害時も接続は拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let mut registry = MockRoomRegistry::new();
        registry
            .expect_get_user_by_id()
            .returning(|_| Err(RegistryError::Unavailable("connection refused".to_string())));
        let usecase = AdmitConnectionUseCase::new(
            Arc::new(registry),
            fixture.sessions.clone(),
            fixture.pusher.clone(),
        );

        // when (操作):
        let result = usecase.execute(Some("u1".to_string()), None).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(AdmissionError::UserLookup(RegistryError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_same_user_can_open_multiple_sessions() {
        // テスト項目: 同じユーザーの複数接続は別々のセッションになる
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let usecase = create_usecase(&fixture);
        let admission = usecase
            .execute(Some(alice.id.to_string()), None)
            .await
            .unwrap();

        // when (操作):
        let (tx1, _rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();
        let first = usecase.open_session(admission.clone(), tx1).await;
        let second = usecase.open_session(admission, tx2).await;

        // then (期待する結果):
        assert_ne!(first.connection_id, second.connection_id);
        assert_eq!(fixture.sessions.count_sessions().await, 2);
    }
}
