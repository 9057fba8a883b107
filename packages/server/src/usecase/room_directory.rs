//! UseCase: ユーザー・ルームの参照と作成（HTTP API 用）

use std::sync::Arc;

use crate::domain::{
    MediaUrl, Room, RoomId, RoomInfo, RoomRegistry, SessionRepository, User, UserId, Username,
};

use super::error::DirectoryError;

/// ルームの在室状況
#[derive(Debug, Clone, PartialEq)]
pub struct RoomPresence {
    pub room_id: RoomId,
    pub users: Vec<UserId>,
    pub connections: usize,
}

pub struct RoomDirectoryUseCase {
    registry: Arc<dyn RoomRegistry>,
    sessions: Arc<dyn SessionRepository>,
}

impl RoomDirectoryUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { registry, sessions }
    }

    pub async fn create_user(&self, username: String) -> Result<User, DirectoryError> {
        let username = Username::new(username)?;
        Ok(self.registry.create_user(username).await?)
    }

    pub async fn get_user(&self, user_id: String) -> Result<User, DirectoryError> {
        let user_id = UserId::new(user_id)?;
        Ok(self.registry.get_user_by_id(&user_id).await?)
    }

    /// `owner_id` は Bearer トークン（= ユーザー ID）
    pub async fn create_room(
        &self,
        owner_id: String,
        media_url: String,
    ) -> Result<(Room, RoomInfo), DirectoryError> {
        let owner_id = UserId::new(owner_id)?;
        let media_url = MediaUrl::new(media_url)?;
        let (room, info) = self.registry.create_room(&owner_id, media_url).await?;
        tracing::info!("Room '{}' created by '{}'", room.id, owner_id);
        Ok((room, info))
    }

    pub async fn get_room(&self, room_id: String) -> Result<(Room, RoomInfo), DirectoryError> {
        let room_id = RoomId::new(room_id)?;
        let room = self.registry.get_room_by_id(&room_id).await?;
        let info = self.registry.get_room_info(&room_id).await?;
        Ok((room, info))
    }

    pub async fn get_room_by_link(
        &self,
        link: String,
    ) -> Result<(Room, RoomInfo), DirectoryError> {
        let room = self.registry.get_room_by_link(&link).await?;
        let info = self.registry.get_room_info(&room.id).await?;
        Ok((room, info))
    }

    /// 現在の在室状況（Registry ではなくセッションストアから計算）
    pub async fn presence(&self, room_id: String) -> Result<RoomPresence, DirectoryError> {
        let room_id = RoomId::new(room_id)?;
        self.registry.get_room_by_id(&room_id).await?;
        let users = self.sessions.presence(&room_id).await;
        let connections = self.sessions.room_members(&room_id).await.len();
        Ok(RoomPresence {
            room_id,
            users,
            connections,
        })
    }
}
