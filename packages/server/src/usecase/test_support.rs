//! UseCase テスト用の共通部品

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        ConnectionId, Member, MediaUrl, MessagePushError, MessagePusher, PusherChannel,
        RegistryError, RelayEvent, RepositoryError, Room, RoomId, RoomInfo, RoomInfoPatch,
        RoomPatch, RoomRegistry, Session, SessionRepository, User, UserId, Username,
    },
    infrastructure::repository::{InMemoryRoomRegistry, InMemorySessionRepository},
};

/// 送信したイベントを記録するだけの MessagePusher
#[derive(Default)]
pub struct RecordingPusher {
    sent: Mutex<Vec<(ConnectionId, RelayEvent)>>,
}

impl RecordingPusher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 特定の接続が受け取ったイベント
    pub async fn received_by(&self, connection_id: &ConnectionId) -> Vec<RelayEvent> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == connection_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// イベント名ごとの配送先
    pub async fn recipients_of(&self, event_name: &str) -> Vec<ConnectionId> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(_, event)| event.name() == event_name)
            .map(|(to, _)| *to)
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_client(&self, _connection_id: ConnectionId, _sender: PusherChannel) {}

    async fn unregister_client(&self, _connection_id: &ConnectionId) {}

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), MessagePushError> {
        self.sent.lock().await.push((*connection_id, event.clone()));
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RelayEvent,
    ) -> Result<(), MessagePushError> {
        let mut sent = self.sent.lock().await;
        for target in targets {
            sent.push((target, event.clone()));
        }
        Ok(())
    }
}

/// ユーザーとルームを持つ Registry と、空のセッションストア
pub struct Fixture {
    pub registry: Arc<InMemoryRoomRegistry>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub pusher: Arc<RecordingPusher>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(InMemoryRoomRegistry::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            pusher: RecordingPusher::new(),
        }
    }

    pub async fn user(&self, name: &str) -> User {
        self.registry
            .create_user(Username::new(name.to_string()).unwrap())
            .await
            .unwrap()
    }

    /// `owner` が管理者のルームを作る
    pub async fn room(&self, owner: &User) -> Room {
        let media_url = MediaUrl::new("https://example.com/video.mp4".to_string()).unwrap();
        let (room, _) = self
            .registry
            .create_room(&owner.id, media_url)
            .await
            .unwrap();
        room
    }

    /// 接続を開いてルームに入れる（ブロードキャストはしない）
    pub async fn connect(&self, user: &User, room_id: &RoomId) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        self.sessions
            .open_session(Session::new(
                connection_id,
                user.id.clone(),
                user.username.clone(),
            ))
            .await;
        self.sessions
            .join_room(&connection_id, room_id)
            .await
            .unwrap();
        connection_id
    }
}

/// 最初の `presence` だけ、読んだ値を `lag` だけ遅れて返すセッションストア
///
/// 読み取りから結果の利用までの間に、別の接続の操作が割り込む状況を作る。
pub struct LaggingPresenceSessions {
    inner: Arc<InMemorySessionRepository>,
    lag: Duration,
    lagged: AtomicBool,
}

impl LaggingPresenceSessions {
    pub fn new(inner: Arc<InMemorySessionRepository>, lag: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner,
            lag,
            lagged: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl SessionRepository for LaggingPresenceSessions {
    async fn open_session(&self, session: Session) {
        self.inner.open_session(session).await;
    }

    async fn close_session(&self, connection_id: &ConnectionId) -> Option<Session> {
        self.inner.close_session(connection_id).await
    }

    async fn get_session(&self, connection_id: &ConnectionId) -> Option<Session> {
        self.inner.get_session(connection_id).await
    }

    async fn join_room(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), RepositoryError> {
        self.inner.join_room(connection_id, room_id).await
    }

    async fn room_members(&self, room_id: &RoomId) -> Vec<Member> {
        self.inner.room_members(room_id).await
    }

    async fn presence(&self, room_id: &RoomId) -> Vec<UserId> {
        let users = self.inner.presence(room_id).await;
        if !self.lagged.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.lag).await;
        }
        users
    }

    async fn evict_room(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.inner.evict_room(room_id).await
    }

    async fn rename_user(&self, user_id: &UserId, username: Username) -> Vec<Session> {
        self.inner.rename_user(user_id, username).await
    }

    async fn count_sessions(&self) -> usize {
        self.inner.count_sessions().await
    }
}

/// 最初の `update_room_info` だけ、反映までに `delay` かかる Registry
pub struct SlowFirstWriteRegistry {
    inner: Arc<InMemoryRoomRegistry>,
    delay: Duration,
    slowed: AtomicBool,
}

impl SlowFirstWriteRegistry {
    pub fn new(inner: Arc<InMemoryRoomRegistry>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner,
            delay,
            slowed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl RoomRegistry for SlowFirstWriteRegistry {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User, RegistryError> {
        self.inner.get_user_by_id(id).await
    }

    async fn create_user(&self, username: Username) -> Result<User, RegistryError> {
        self.inner.create_user(username).await
    }

    async fn update_username(
        &self,
        id: &UserId,
        username: Username,
    ) -> Result<User, RegistryError> {
        self.inner.update_username(id, username).await
    }

    async fn get_room_by_id(&self, id: &RoomId) -> Result<Room, RegistryError> {
        self.inner.get_room_by_id(id).await
    }

    async fn get_room_by_link(&self, link: &str) -> Result<Room, RegistryError> {
        self.inner.get_room_by_link(link).await
    }

    async fn create_room(
        &self,
        owner_id: &UserId,
        media_url: MediaUrl,
    ) -> Result<(Room, RoomInfo), RegistryError> {
        self.inner.create_room(owner_id, media_url).await
    }

    async fn update_room(&self, id: &RoomId, patch: RoomPatch) -> Result<Room, RegistryError> {
        self.inner.update_room(id, patch).await
    }

    async fn get_room_info(&self, room_id: &RoomId) -> Result<RoomInfo, RegistryError> {
        self.inner.get_room_info(room_id).await
    }

    async fn update_room_info(
        &self,
        room_id: &RoomId,
        patch: RoomInfoPatch,
    ) -> Result<RoomInfo, RegistryError> {
        if !self.slowed.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.update_room_info(room_id, patch).await
    }
}

pub fn user_id(value: &str) -> UserId {
    UserId::new(value.to_string()).unwrap()
}

/// システムメッセージ本文を取り出す
pub fn notice_texts(events: &[RelayEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            RelayEvent::MessageReceived {
                text, sender: None, ..
            } => Some(text.as_str().to_string()),
            _ => None,
        })
        .collect()
}
