//! Application state shared by every handler.

use std::sync::Arc;

use sajiki_shared::time::SystemClock;

use crate::{
    config::RelayConfig,
    domain::RoomRegistry,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemorySessionRepository,
    },
    usecase::{
        AdmitConnectionUseCase, CheckpointPersister, ControlRoomUseCase,
        DisconnectParticipantUseCase, JoinRoomUseCase, RenameUserUseCase, RoomDirectoryUseCase,
        RoomLifecycleManager, SendMessageUseCase, SucceedAdminUseCase, SyncPlaybackUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// AdmitConnectionUseCase（接続受け入れのユースケース）
    pub admit_connection_usecase: Arc<AdmitConnectionUseCase>,
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SyncPlaybackUseCase（再生同期のユースケース）
    pub sync_playback_usecase: Arc<SyncPlaybackUseCase>,
    /// ControlRoomUseCase（管理者操作のユースケース）
    pub control_room_usecase: Arc<ControlRoomUseCase>,
    /// SendMessageUseCase（チャット送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// RenameUserUseCase（表示名変更のユースケース）
    pub rename_user_usecase: Arc<RenameUserUseCase>,
    /// RoomDirectoryUseCase（HTTP API 用の参照・作成）
    pub room_directory_usecase: Arc<RoomDirectoryUseCase>,
    lifecycle: Arc<RoomLifecycleManager>,
    checkpoints: Arc<CheckpointPersister>,
}

impl AppState {
    /// Registry を受け取り、残りの依存をすべて組み立てる
    pub fn new(registry: Arc<dyn RoomRegistry>, config: RelayConfig) -> Self {
        // Initialize dependencies in order:
        // 1. Repository
        // 2. MessagePusher
        // 3. Timers (room lifecycle, checkpoint persistence)
        // 4. UseCases

        // 1. Create Repository (in-memory session store)
        let sessions = Arc::new(InMemorySessionRepository::new());

        // 2. Create MessagePusher (WebSocket implementation)
        let message_pusher = Arc::new(WebSocketMessagePusher::new());

        // 3. Create timers
        let lifecycle = Arc::new(RoomLifecycleManager::new(
            registry.clone(),
            sessions.clone(),
            config.grace_period,
        ));
        let checkpoints = Arc::new(CheckpointPersister::new(
            registry.clone(),
            config.checkpoint_window,
        ));

        // 4. Create UseCases
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            sessions.clone(),
            message_pusher.clone(),
            Arc::new(SystemClock),
        ));
        let succeed_admin_usecase = Arc::new(SucceedAdminUseCase::new(
            registry.clone(),
            sessions.clone(),
            message_pusher.clone(),
            send_message_usecase.clone(),
        ));

        Self {
            admit_connection_usecase: Arc::new(AdmitConnectionUseCase::new(
                registry.clone(),
                sessions.clone(),
                message_pusher.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                registry.clone(),
                sessions.clone(),
                message_pusher.clone(),
                lifecycle.clone(),
                send_message_usecase.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                sessions.clone(),
                message_pusher.clone(),
                lifecycle.clone(),
                succeed_admin_usecase,
                send_message_usecase.clone(),
            )),
            sync_playback_usecase: Arc::new(SyncPlaybackUseCase::new(
                sessions.clone(),
                message_pusher.clone(),
                checkpoints.clone(),
            )),
            control_room_usecase: Arc::new(ControlRoomUseCase::new(
                registry.clone(),
                sessions.clone(),
                message_pusher,
                checkpoints.clone(),
            )),
            rename_user_usecase: Arc::new(RenameUserUseCase::new(
                registry.clone(),
                sessions.clone(),
                send_message_usecase.clone(),
            )),
            room_directory_usecase: Arc::new(RoomDirectoryUseCase::new(registry, sessions)),
            send_message_usecase,
            lifecycle,
            checkpoints,
        }
    }

    /// 待機中のタイマー（自動クローズ・チェックポイント書き込み）をすべて止める
    pub async fn shutdown(&self) {
        let closes = self.lifecycle.shutdown().await;
        let writes = self.checkpoints.shutdown().await;
        tracing::info!(
            "Cancelled {} pending room close(s) and {} checkpoint write(s)",
            closes,
            writes
        );
    }
}
