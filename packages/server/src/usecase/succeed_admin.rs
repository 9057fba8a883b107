//! UseCase: 管理者の引き継ぎ
//!
//! 管理者の最後の接続がルームから消えたとき、残っている在室者の先頭
//! （入室順）に管理者を移す。Registry の失敗はログに残して握りつぶす。
//! 引き継ぎは best-effort で、失敗時は一時的に管理者不在になりうる。

use std::sync::Arc;

use crate::domain::{
    MessagePusher, RelayEvent, RoomId, RoomPatch, RoomRegistry, SessionRepository, UserId,
};

use super::send_message::SendMessageUseCase;

pub struct SucceedAdminUseCase {
    registry: Arc<dyn RoomRegistry>,
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    notices: Arc<SendMessageUseCase>,
}

impl SucceedAdminUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        notices: Arc<SendMessageUseCase>,
    ) -> Self {
        Self {
            registry,
            sessions,
            message_pusher,
            notices,
        }
    }

    /// 新しい管理者を返す。引き継ぎが不要・失敗した場合は `None`
    pub async fn execute(
        &self,
        room_id: &RoomId,
        departing: &UserId,
        remaining: &[UserId],
    ) -> Option<UserId> {
        // 残りがいなければ何もしない（ルームは自動クローズ待ちになる）
        let successor = remaining.first()?.clone();

        let room = match self.registry.get_room_by_id(room_id).await {
            Ok(room) => room,
            Err(e) => {
                tracing::error!("Admin succession for room '{}' skipped: {}", room_id, e);
                return None;
            }
        };
        if room.admin_id != *departing {
            return None;
        }

        let patch = RoomPatch {
            admin_id: Some(successor.clone()),
            ..RoomPatch::default()
        };
        if let Err(e) = self.registry.update_room(room_id, patch).await {
            tracing::error!(
                "Failed to hand admin of room '{}' to '{}': {}",
                room_id,
                successor,
                e
            );
            return None;
        }

        let members = self.sessions.room_members(room_id).await;
        let successor_name = members
            .iter()
            .find(|member| member.user_id == successor)
            .map(|member| member.username.to_string());
        let targets = members.into_iter().map(|member| member.connection_id).collect();
        let event = RelayEvent::AdminChanged {
            user_id: successor.clone(),
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast new admin for room '{}': {}", room_id, e);
        }
        tracing::info!(
            "Admin of room '{}' handed from '{}' to '{}'",
            room_id,
            departing,
            successor
        );

        if let Some(name) = successor_name {
            self.notices
                .announce(room_id, format!("{} is now the room admin", name))
                .await;
        }

        Some(successor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockRoomRegistry, RegistryError};
    use crate::usecase::test_support::{Fixture, notice_texts, user_id};
    use sajiki_shared::time::FixedClock;

    fn create_usecase(fixture: &Fixture, registry: Arc<dyn RoomRegistry>) -> SucceedAdminUseCase {
        let notices = Arc::new(SendMessageUseCase::new(
            fixture.sessions.clone(),
            fixture.pusher.clone(),
            Arc::new(FixedClock::new(0)),
        ));
        SucceedAdminUseCase::new(
            registry,
            fixture.sessions.clone(),
            fixture.pusher.clone(),
            notices,
        )
    }

    #[tokio::test]
    async fn test_admin_is_handed_to_first_remaining_member() {
        // テスト項目: 管理者が抜けると残りの先頭に管理者が移り、new-admin が届く
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let carol = fixture.user("carol").await;
        let room = fixture.room(&alice).await;
        let bob_conn = fixture.connect(&bob, &room.id).await;
        fixture.connect(&carol, &room.id).await;
        let usecase = create_usecase(&fixture, fixture.registry.clone());

        // when (操作):
        let successor = usecase
            .execute(&room.id, &alice.id, &[bob.id.clone(), carol.id.clone()])
            .await;

        // then (期待する結果):
        assert_eq!(successor, Some(bob.id.clone()));
        let stored = fixture.registry.get_room_by_id(&room.id).await.unwrap();
        assert_eq!(stored.admin_id, bob.id);
        let received = fixture.pusher.received_by(&bob_conn).await;
        assert_eq!(
            received[0],
            RelayEvent::AdminChanged {
                user_id: bob.id.clone()
            }
        );
        assert_eq!(notice_texts(&received), vec!["bob is now the room admin"]);
    }

    #[tokio::test]
    async fn test_non_admin_departure_changes_nothing() {
        // テスト項目: 管理者以外が抜けても引き継ぎは起きない
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let room = fixture.room(&alice).await;
        fixture.connect(&alice, &room.id).await;
        let usecase = create_usecase(&fixture, fixture.registry.clone());

        // when (操作):
        let successor = usecase.execute(&room.id, &bob.id, &[alice.id.clone()]).await;

        // then (期待する結果):
        assert_eq!(successor, None);
        assert!(fixture.pusher.recipients_of("new-admin").await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_room_keeps_stale_admin() {
        // テスト項目: 残りがいなければ Registry に触れず、管理者はそのまま
        // given (前提条件):
        let fixture = Fixture::new();
        let registry = MockRoomRegistry::new(); // 呼ばれたら panic する
        let usecase = create_usecase(&fixture, Arc::new(registry));

        // when (操作):
        let successor = usecase
            .execute(&RoomId::new("r1".to_string()).unwrap(), &user_id("alice"), &[])
            .await;

        // then (期待する結果):
        assert_eq!(successor, None);
    }

    #[tokio::test]
    async fn test_registry_failure_is_swallowed() {
        // テスト項目: Registry の更新失敗はログに残るだけで、new-admin は送られない
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let room = fixture.room(&alice).await;
        fixture.connect(&bob, &room.id).await;

        let mut registry = MockRoomRegistry::new();
        let stored = room.clone();
        registry
            .expect_get_room_by_id()
            .returning(move |_| Ok(stored.clone()));
        registry
            .expect_update_room()
            .times(1)
            .returning(|_, _| Err(RegistryError::Unavailable("timeout".to_string())));
        let usecase = create_usecase(&fixture, Arc::new(registry));

        // when (操作):
        let successor = usecase.execute(&room.id, &alice.id, &[bob.id.clone()]).await;

        // then (期待する結果):
        assert_eq!(successor, None);
        assert!(fixture.pusher.recipients_of("new-admin").await.is_empty());
    }
}
