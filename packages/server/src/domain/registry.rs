//! Room Registry trait 定義
//!
//! ユーザー・ルーム・再生チェックポイントを保持する外部ストアへのインターフェース。
//! リレーは get / 部分更新だけを利用し、ストア側の排他制御（行単位の更新など）に依存する。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    MediaUrl, RegistryError, Room, RoomId, RoomInfo, RoomInfoPatch, RoomPatch, User, UserId,
    Username,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// ユーザーを ID で取得
    async fn get_user_by_id(&self, id: &UserId) -> Result<User, RegistryError>;

    /// ユーザーを作成
    async fn create_user(&self, username: Username) -> Result<User, RegistryError>;

    /// 表示名を変更
    async fn update_username(&self, id: &UserId, username: Username)
    -> Result<User, RegistryError>;

    /// ルームを ID で取得
    async fn get_room_by_id(&self, id: &RoomId) -> Result<Room, RegistryError>;

    /// ルームを共有リンクで取得
    async fn get_room_by_link(&self, link: &str) -> Result<Room, RegistryError>;

    /// ルームを作成（作成者がオーナー兼管理者、RoomInfo は開いた状態で作られる）
    async fn create_room(
        &self,
        owner_id: &UserId,
        media_url: MediaUrl,
    ) -> Result<(Room, RoomInfo), RegistryError>;

    /// ルームを部分更新
    async fn update_room(&self, id: &RoomId, patch: RoomPatch) -> Result<Room, RegistryError>;

    /// 再生チェックポイントを取得
    async fn get_room_info(&self, room_id: &RoomId) -> Result<RoomInfo, RegistryError>;

    /// 再生チェックポイントを部分更新
    async fn update_room_info(
        &self,
        room_id: &RoomId,
        patch: RoomInfoPatch,
    ) -> Result<RoomInfo, RegistryError>;
}
