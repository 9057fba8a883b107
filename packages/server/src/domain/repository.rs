//! Repository trait 定義
//!
//! 接続セッションとルーム在室状況を保持するプロセス内ストアのインターフェース。
//! UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
//!
//! ## 依存性の逆転（DIP）
//!
//! - ドメイン層が必要とするインターフェースをドメイン層自身が定義
//! - Infrastructure 層がドメイン層のインターフェースに依存
//! - テストでは実装を差し替えられる

use async_trait::async_trait;

use super::{ConnectionId, Member, RepositoryError, RoomId, Session, UserId, Username};

/// Session Repository trait
///
/// プレゼンスは常にこの Repository から都度計算する（キャッシュしない）。
/// 同時に複数の接続が切断しても、古い一覧をブロードキャストしないため。
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// セッションを登録
    async fn open_session(&self, session: Session);

    /// セッションを削除し、参加していたルームごと返す
    async fn close_session(&self, connection_id: &ConnectionId) -> Option<Session>;

    /// セッションを取得
    async fn get_session(&self, connection_id: &ConnectionId) -> Option<Session>;

    /// ルームに参加（既に参加済みなら何もしない）
    async fn join_room(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), RepositoryError>;

    /// ルームの在室者（接続単位、入室順）
    async fn room_members(&self, room_id: &RoomId) -> Vec<Member>;

    /// ルームの在室ユーザー ID（重複なし、入室順）
    async fn presence(&self, room_id: &RoomId) -> Vec<UserId>;

    /// ルームから全接続を退室させ、退室させた接続を返す（セッション自体は残す）
    async fn evict_room(&self, room_id: &RoomId) -> Vec<ConnectionId>;

    /// 指定ユーザーの全接続の表示名を変更し、変更した接続の一覧を返す
    async fn rename_user(&self, user_id: &UserId, username: Username) -> Vec<Session>;

    /// 全セッション数
    async fn count_sessions(&self) -> usize;
}
