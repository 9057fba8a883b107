//! UseCase: ルームの自動クローズ
//!
//! 最後の接続がルームから抜けると猶予期間のタイマーを張り、期間内に誰も
//! 戻らなければ RoomInfo を `isOpened = false` に更新する。
//!
//! ```text
//! Active --(最後の接続が切断)--> GracePeriod --(タイマー発火)--> Closed
//!    ^                              |
//!    +-------(join-room)------------+
//! ```
//!
//! Closed は終端で、自動で開き直すことはない。
//!
//! 切断側の「空になった」判定と参加は並行して走るため、在室状況はタイマーを
//! 張った直後と発火時にもセッションストアから読み直す。在室者がいれば閉じない。

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{RoomId, RoomInfoPatch, RoomRegistry, SessionRepository},
    infrastructure::scheduler::DelayedTasks,
};

pub struct RoomLifecycleManager {
    registry: Arc<dyn RoomRegistry>,
    sessions: Arc<dyn SessionRepository>,
    /// roomId → 猶予期間タイマー
    timers: DelayedTasks<RoomId>,
    grace_period: Duration,
}

impl RoomLifecycleManager {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        sessions: Arc<dyn SessionRepository>,
        grace_period: Duration,
    ) -> Self {
        Self {
            registry,
            sessions,
            timers: DelayedTasks::new(),
            grace_period,
        }
    }

    /// Active → GracePeriod
    ///
    /// 既にタイマーがあれば張り直す。張った時点で在室者がいれば（参加と競合した場合）
    /// すぐに取り消す。
    pub async fn schedule_close(&self, room_id: RoomId) {
        let registry = Arc::clone(&self.registry);
        let sessions = Arc::clone(&self.sessions);
        let task_room_id = room_id.clone();
        let grace_period = self.grace_period;

        self.timers
            .schedule(room_id.clone(), grace_period, async move {
                let present = sessions.presence(&task_room_id).await;
                if !present.is_empty() {
                    tracing::info!(
                        "Room '{}' has {} user(s) again, close skipped",
                        task_room_id,
                        present.len()
                    );
                    return;
                }
                match registry
                    .update_room_info(&task_room_id, RoomInfoPatch::closed())
                    .await
                {
                    Ok(_) => tracing::info!(
                        "Room '{}' closed after {}s without participants",
                        task_room_id,
                        grace_period.as_secs()
                    ),
                    Err(e) => tracing::error!("Failed to close room '{}': {}", task_room_id, e),
                }
            })
            .await;

        // 空と判定してからタイマーを張るまでの間に参加があった場合
        if !self.sessions.presence(&room_id).await.is_empty() {
            self.timers.cancel(&room_id).await;
            tracing::info!("Room '{}' was rejoined while arming, close cancelled", room_id);
            return;
        }

        tracing::info!(
            "Room '{}' is empty, closing in {}s unless someone rejoins",
            room_id,
            grace_period.as_secs()
        );
    }

    /// GracePeriod → Active
    pub async fn cancel_close(&self, room_id: &RoomId) -> bool {
        let cancelled = self.timers.cancel(room_id).await;
        if cancelled {
            tracing::info!("Room '{}' rejoined, pending close cancelled", room_id);
        }
        cancelled
    }

    pub async fn is_closing(&self, room_id: &RoomId) -> bool {
        self.timers.is_pending(room_id).await
    }

    /// 全ルームのタイマーを止める（プロセス終了時）
    pub async fn shutdown(&self) -> usize {
        let cancelled = self.timers.cancel_all().await;
        tracing::info!("Cancelled {} pending room close timer(s)", cancelled);
        cancelled
    }
}
