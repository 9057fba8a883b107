//! UseCase: 表示名の変更
//!
//! Registry のユーザーを更新し、そのユーザーの全接続の表示名を揃えたうえで、
//! 接続が参加している各ルームに変更を知らせる。

use std::{collections::BTreeSet, sync::Arc};

use crate::domain::{ConnectionId, RoomId, RoomRegistry, SessionRepository, User, Username};

use super::{error::RenameUserError, send_message::SendMessageUseCase};

pub struct RenameUserUseCase {
    registry: Arc<dyn RoomRegistry>,
    sessions: Arc<dyn SessionRepository>,
    notices: Arc<SendMessageUseCase>,
}

impl RenameUserUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        sessions: Arc<dyn SessionRepository>,
        notices: Arc<SendMessageUseCase>,
    ) -> Self {
        Self {
            registry,
            sessions,
            notices,
        }
    }

    pub async fn execute(
        &self,
        from: ConnectionId,
        username: Username,
    ) -> Result<User, RenameUserError> {
        let session = self
            .sessions
            .get_session(&from)
            .await
            .ok_or(RenameUserError::SessionNotFound)?;
        let previous = session.username;

        let user = self
            .registry
            .update_username(&session.user_id, username.clone())
            .await
            .map_err(RenameUserError::Registry)?;

        let renamed = self.sessions.rename_user(&user.id, username).await;
        let rooms: BTreeSet<RoomId> = renamed
            .into_iter()
            .flat_map(|session| session.joined_rooms)
            .collect();

        if previous != user.username {
            for room_id in &rooms {
                self.notices
                    .announce(
                        room_id,
                        format!("{} is now known as {}", previous, user.username),
                    )
                    .await;
            }
        }

        tracing::info!(
            "User '{}' renamed from '{}' to '{}'",
            user.id,
            previous,
            user.username
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoomRegistry, Session};
    use crate::usecase::test_support::{Fixture, notice_texts};
    use sajiki_shared::time::FixedClock;

    fn create_usecase(fixture: &Fixture) -> RenameUserUseCase {
        let notices = Arc::new(SendMessageUseCase::new(
            fixture.sessions.clone(),
            fixture.pusher.clone(),
            Arc::new(FixedClock::new(0)),
        ));
        RenameUserUseCase::new(fixture.registry.clone(), fixture.sessions.clone(), notices)
    }

    fn name(value: &str) -> Username {
        Username::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_rename_updates_registry_sessions_and_rooms() {
        // テスト項目: 表示名の変更が Registry と全接続に反映され、参加ルームに通知される
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let room = fixture.room(&alice).await;
        let other = fixture.room(&alice).await;
        let tab1 = fixture.connect(&alice, &room.id).await;
        let tab2 = fixture.connect(&alice, &other.id).await;
        let bob_conn = fixture.connect(&bob, &room.id).await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        let user = usecase.execute(tab1, name("alicia")).await.unwrap();

        // then (期待する結果):
        assert_eq!(user.username, name("alicia"));
        assert_eq!(
            fixture.registry.get_user_by_id(&alice.id).await.unwrap().username,
            name("alicia")
        );
        let session: Session = fixture.sessions.get_session(&tab2).await.unwrap();
        assert_eq!(session.username, name("alicia"));
        assert_eq!(
            notice_texts(&fixture.pusher.received_by(&bob_conn).await),
            vec!["alice is now known as alicia"]
        );
        assert_eq!(
            notice_texts(&fixture.pusher.received_by(&tab2).await),
            vec!["alice is now known as alicia"]
        );
    }

    #[tokio::test]
    async fn test_rename_without_session_fails() {
        // テスト項目: セッションのない接続からの変更はエラーになる
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = create_usecase(&fixture);

        // when (操作):
        let result = usecase.execute(ConnectionId::generate(), name("x")).await;

        // then (期待する結果):
        assert_eq!(result, Err(RenameUserError::SessionNotFound));
    }
}
