//! UseCase: 再生チェックポイントの書き込み（間引き）
//!
//! 再生操作のたびに Registry へ書くと負荷が跳ねるため、(ルーム, 種別) ごとに
//! 書き込みを間引く。
//!
//! - 窓が空いていれば要求を受け付け、`window` 経過後に書き込む
//! - 書き込み待ちの間に来た同じキーの要求は破棄する（タイマーは延長しない）
//!
//! つまり保存されるのは「窓が開いてから最初に処理された要求」の値になる。

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{RoomId, RoomInfoPatch, RoomRegistry},
    infrastructure::scheduler::DelayedTasks,
};

/// チェックポイントの種別。種別ごとに独立して間引く
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckpointKind {
    /// 再生位置と再生状態（toggle / seek）
    Position,
    /// 再生速度
    Rate,
}

pub struct CheckpointPersister {
    registry: Arc<dyn RoomRegistry>,
    pending: DelayedTasks<(RoomId, CheckpointKind)>,
    window: Duration,
}

impl CheckpointPersister {
    pub fn new(registry: Arc<dyn RoomRegistry>, window: Duration) -> Self {
        Self {
            registry,
            pending: DelayedTasks::new(),
            window,
        }
    }

    /// 書き込みを要求する。受け付けた場合は `true`、間引いた場合は `false`
    pub async fn request(
        &self,
        room_id: &RoomId,
        kind: CheckpointKind,
        patch: RoomInfoPatch,
    ) -> bool {
        let registry = Arc::clone(&self.registry);
        let task_room_id = room_id.clone();

        let accepted = self
            .pending
            .schedule_if_idle((room_id.clone(), kind), self.window, async move {
                if let Err(e) = registry.update_room_info(&task_room_id, patch).await {
                    tracing::error!(
                        "Failed to persist {:?} checkpoint for room '{}': {}",
                        kind,
                        task_room_id,
                        e
                    );
                }
            })
            .await;

        if !accepted {
            tracing::debug!(
                "Dropped {:?} checkpoint for room '{}' (write pending)",
                kind,
                room_id
            );
        }
        accepted
    }

    /// ルームの書き込み待ちをすべて破棄する
    ///
    /// 書き込み中のものは中断せず、完了を待ってから返る。
    pub async fn cancel_room(&self, room_id: &RoomId) -> usize {
        self.pending
            .cancel_where(|(pending_room, _)| pending_room == room_id)
            .await
    }

    pub async fn is_pending(&self, room_id: &RoomId, kind: CheckpointKind) -> bool {
        self.pending.is_pending(&(room_id.clone(), kind)).await
    }

    pub async fn shutdown(&self) -> usize {
        let cancelled = self.pending.cancel_all().await;
        tracing::info!("Cancelled {} pending checkpoint write(s)", cancelled);
        cancelled
    }
}
