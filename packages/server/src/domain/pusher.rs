//! MessagePusher trait 定義
//!
//! 接続へのイベント配送を抽象化する。配送先は接続 ID 単位。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RelayEvent};

/// 接続ごとの送信チャンネル（シリアライズ済みフレーム）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続を登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続に送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RelayEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続に送信（一部の失敗は許容する）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RelayEvent,
    ) -> Result<(), MessagePushError>;
}
