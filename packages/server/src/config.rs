//! リレーの設定値

use std::time::Duration;

/// 最後の参加者が抜けてからルームを閉じるまでの猶予
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(120);

/// チェックポイント書き込みの間引き窓
pub const DEFAULT_CHECKPOINT_WINDOW: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub grace_period: Duration,
    pub checkpoint_window: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            checkpoint_window: DEFAULT_CHECKPOINT_WINDOW,
        }
    }
}
