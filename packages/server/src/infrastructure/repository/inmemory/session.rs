//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! 接続セッションと、ルームごとの接続一覧（入室順）を HashMap で保持します。
//!
//! 2 つのマップは同じ Mutex の内側で更新するため、セッション削除とルーム在室者の
//! 更新が別々に観測されることはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Member, RepositoryError, RoomId, Session, SessionRepository, UserId, Username,
};

#[derive(Debug, Default)]
struct SessionStore {
    sessions: HashMap<ConnectionId, Session>,
    /// ルーム ID → 在室中の接続（入室順）
    rooms: HashMap<RoomId, Vec<ConnectionId>>,
}

impl SessionStore {
    fn members(&self, room_id: &RoomId) -> Vec<Member> {
        self.rooms
            .get(room_id)
            .map(|connections| {
                connections
                    .iter()
                    .filter_map(|connection_id| self.sessions.get(connection_id))
                    .map(|session| Member {
                        connection_id: session.connection_id,
                        user_id: session.user_id.clone(),
                        username: session.username.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// インメモリ Session Repository 実装
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    store: Mutex<SessionStore>,
}

impl InMemorySessionRepository {
    /// 新しい InMemorySessionRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn open_session(&self, session: Session) {
        let mut store = self.store.lock().await;
        store.sessions.insert(session.connection_id, session);
    }

    async fn close_session(&self, connection_id: &ConnectionId) -> Option<Session> {
        let mut store = self.store.lock().await;
        let session = store.sessions.remove(connection_id)?;

        for room_id in &session.joined_rooms {
            let now_empty = match store.rooms.get_mut(room_id) {
                Some(connections) => {
                    connections.retain(|id| id != connection_id);
                    connections.is_empty()
                }
                None => false,
            };
            if now_empty {
                store.rooms.remove(room_id);
            }
        }

        Some(session)
    }

    async fn get_session(&self, connection_id: &ConnectionId) -> Option<Session> {
        let store = self.store.lock().await;
        store.sessions.get(connection_id).cloned()
    }

    async fn join_room(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        let session = store
            .sessions
            .get_mut(connection_id)
            .ok_or_else(|| RepositoryError::SessionNotFound(connection_id.to_string()))?;

        if !session.joined_rooms.insert(room_id.clone()) {
            return Ok(());
        }

        store
            .rooms
            .entry(room_id.clone())
            .or_default()
            .push(*connection_id);

        Ok(())
    }

    async fn room_members(&self, room_id: &RoomId) -> Vec<Member> {
        let store = self.store.lock().await;
        store.members(room_id)
    }

    async fn presence(&self, room_id: &RoomId) -> Vec<UserId> {
        let store = self.store.lock().await;
        let mut users: Vec<UserId> = Vec::new();
        for member in store.members(room_id) {
            if !users.contains(&member.user_id) {
                users.push(member.user_id);
            }
        }
        users
    }

    async fn evict_room(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let mut store = self.store.lock().await;
        let evicted = store.rooms.remove(room_id).unwrap_or_default();
        for connection_id in &evicted {
            if let Some(session) = store.sessions.get_mut(connection_id) {
                session.joined_rooms.remove(room_id);
            }
        }
        evicted
    }

    async fn rename_user(&self, user_id: &UserId, username: Username) -> Vec<Session> {
        let mut store = self.store.lock().await;
        store
            .sessions
            .values_mut()
            .filter(|session| &session.user_id == user_id)
            .map(|session| {
                session.username = username.clone();
                session.clone()
            })
            .collect()
    }

    async fn count_sessions(&self) -> usize {
        let store = self.store.lock().await;
        store.sessions.len()
    }
}
