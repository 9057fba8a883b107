//! InMemory Room Registry 実装
//!
//! 本来は外部のキーバリューストア（DB）が担う Room Registry を、プロセス内の
//! HashMap で代替する実装です。起動時に JSON シードから初期データを読み込めます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    MediaUrl, RegistryError, Room, RoomId, RoomInfo, RoomInfoPatch, RoomLink, RoomPatch,
    RoomRegistry, User, UserId, Username,
};

/// 共有リンクの長さ
const ROOM_LINK_LENGTH: usize = 10;

#[derive(Debug, Default)]
struct RegistryData {
    users: HashMap<UserId, User>,
    rooms: HashMap<RoomId, Room>,
    room_infos: HashMap<RoomId, RoomInfo>,
}

/// インメモリ Room Registry 実装
#[derive(Debug, Default)]
pub struct InMemoryRoomRegistry {
    data: Mutex<RegistryData>,
}

impl InMemoryRoomRegistry {
    /// 空の Registry を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のユーザー・ルームで初期化する
    ///
    /// `room_infos` に含まれないルームは開いた状態の RoomInfo を持つ。
    pub fn with_data(users: Vec<User>, rooms: Vec<Room>, room_infos: Vec<RoomInfo>) -> Self {
        let mut data = RegistryData::default();
        for user in users {
            data.users.insert(user.id.clone(), user);
        }
        for info in room_infos {
            data.room_infos.insert(info.room_id.clone(), info);
        }
        for room in rooms {
            data.room_infos
                .entry(room.id.clone())
                .or_insert_with(|| RoomInfo::opened(room.id.clone()));
            data.rooms.insert(room.id.clone(), room);
        }
        Self {
            data: Mutex::new(data),
        }
    }

    fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn generate_link() -> String {
        Uuid::new_v4().simple().to_string()[..ROOM_LINK_LENGTH].to_string()
    }
}

fn generated<T>(value: String) -> Result<T, RegistryError>
where
    T: TryFrom<String>,
{
    T::try_from(value).map_err(|_| RegistryError::Unavailable("failed to generate id".to_string()))
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn get_user_by_id(&self, id: &UserId) -> Result<User, RegistryError> {
        let data = self.data.lock().await;
        data.users
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UserNotFound(id.to_string()))
    }

    async fn create_user(&self, username: Username) -> Result<User, RegistryError> {
        let user = User::new(generated(Self::generate_id())?, username);
        let mut data = self.data.lock().await;
        data.users.insert(user.id.clone(), user.clone());
        tracing::debug!("User '{}' created", user.id);
        Ok(user)
    }

    async fn update_username(
        &self,
        id: &UserId,
        username: Username,
    ) -> Result<User, RegistryError> {
        let mut data = self.data.lock().await;
        let user = data
            .users
            .get_mut(id)
            .ok_or_else(|| RegistryError::UserNotFound(id.to_string()))?;
        user.username = username;
        Ok(user.clone())
    }

    async fn get_room_by_id(&self, id: &RoomId) -> Result<Room, RegistryError> {
        let data = self.data.lock().await;
        data.rooms
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::RoomNotFound(id.to_string()))
    }

    async fn get_room_by_link(&self, link: &str) -> Result<Room, RegistryError> {
        let data = self.data.lock().await;
        data.rooms
            .values()
            .find(|room| room.link.as_str() == link)
            .cloned()
            .ok_or_else(|| RegistryError::RoomNotFound(link.to_string()))
    }

    async fn create_room(
        &self,
        owner_id: &UserId,
        media_url: MediaUrl,
    ) -> Result<(Room, RoomInfo), RegistryError> {
        let mut data = self.data.lock().await;
        if !data.users.contains_key(owner_id) {
            return Err(RegistryError::UserNotFound(owner_id.to_string()));
        }

        let room_id: RoomId = generated(Self::generate_id())?;
        let link: RoomLink = generated(Self::generate_link())?;
        let room = Room {
            id: room_id.clone(),
            link,
            media_url,
            admin_id: owner_id.clone(),
            owner_id: owner_id.clone(),
        };
        let info = RoomInfo::opened(room_id.clone());

        data.rooms.insert(room_id.clone(), room.clone());
        data.room_infos.insert(room_id, info.clone());
        tracing::debug!("Room '{}' created by '{}'", room.id, owner_id);

        Ok((room, info))
    }

    async fn update_room(&self, id: &RoomId, patch: RoomPatch) -> Result<Room, RegistryError> {
        let mut data = self.data.lock().await;
        let room = data
            .rooms
            .get_mut(id)
            .ok_or_else(|| RegistryError::RoomNotFound(id.to_string()))?;
        room.apply(&patch);
        Ok(room.clone())
    }

    async fn get_room_info(&self, room_id: &RoomId) -> Result<RoomInfo, RegistryError> {
        let data = self.data.lock().await;
        data.room_infos
            .get(room_id)
            .cloned()
            .ok_or_else(|| RegistryError::RoomInfoNotFound(room_id.to_string()))
    }

    async fn update_room_info(
        &self,
        room_id: &RoomId,
        patch: RoomInfoPatch,
    ) -> Result<RoomInfo, RegistryError> {
        let mut data = self.data.lock().await;
        let info = data
            .room_infos
            .get_mut(room_id)
            .ok_or_else(|| RegistryError::RoomInfoNotFound(room_id.to_string()))?;
        info.apply(&patch);
        Ok(info.clone())
    }
}
