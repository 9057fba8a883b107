//! UseCase: 再生状態の同期
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SyncPlaybackUseCase の toggle / query_current_time / answer_time /
//!   change_playback_rate / seek
//!
//! ### なぜこのテストが必要か
//! - 操作は送信元以外の在室者にだけ中継され、送信元には決して返らない
//! - 再生開始には必ず位置が付くこと（受信側が「シークしてから再生」できるように）
//! - 時刻の回答は問い合わせ元にだけ届くこと
//! - 中継と同時にチェックポイントの書き込みが（間引かれて）予約されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：再生、一時停止、速度変更、シーク、時刻の問い合わせと回答
//! - 異常系：位置なしの再生、未参加ルームへの操作、ルームを共有しない相手への回答
//!
//! ## 中継の方針
//!
//! サーバーは状態を持たず、最後に処理した操作がそのまま全員に届く。
//! 時刻の問い合わせへの回答はすべて問い合わせ元に届け、どれを採用するか
//! （最初に届いたもの）はクライアントが決める。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, PlaybackPosition, PlaybackRate, RelayEvent, RoomId,
    RoomInfoPatch, Session, SessionRepository,
};

use super::{
    error::PlaybackError,
    persist_checkpoint::{CheckpointKind, CheckpointPersister},
};

pub struct SyncPlaybackUseCase {
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    checkpoints: Arc<CheckpointPersister>,
}

impl SyncPlaybackUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        checkpoints: Arc<CheckpointPersister>,
    ) -> Self {
        Self {
            sessions,
            message_pusher,
            checkpoints,
        }
    }

    /// 再生 / 一時停止
    pub async fn toggle(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
        playing: bool,
        position: Option<PlaybackPosition>,
    ) -> Result<(), PlaybackError> {
        if playing && position.is_none() {
            return Err(PlaybackError::PositionRequired);
        }
        self.joined_session(from, room_id).await?;

        let event = RelayEvent::PlayerStateToggled { playing, position };
        self.relay_to_others(from, room_id, &event).await?;

        let patch = RoomInfoPatch {
            is_playing: Some(playing),
            curr_time: position,
            ..RoomInfoPatch::default()
        };
        self.checkpoints
            .request(room_id, CheckpointKind::Position, patch)
            .await;
        Ok(())
    }

    /// 「今どこ？」を他の在室者に聞く
    pub async fn query_current_time(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), PlaybackError> {
        self.joined_session(from, room_id).await?;
        let event = RelayEvent::TimeQueried { requester: from };
        self.relay_to_others(from, room_id, &event).await
    }

    /// 問い合わせ元にだけ現在位置を返す
    ///
    /// 回答者と問い合わせ元が同じルームにいる場合だけ届ける。
    pub async fn answer_time(
        &self,
        from: ConnectionId,
        requester: ConnectionId,
        position: PlaybackPosition,
    ) -> Result<(), PlaybackError> {
        let responder = self
            .sessions
            .get_session(&from)
            .await
            .ok_or(PlaybackError::NotInRoom)?;
        let requester_session = self
            .sessions
            .get_session(&requester)
            .await
            .ok_or(PlaybackError::RequesterNotFound)?;

        let shares_room = responder
            .joined_rooms
            .iter()
            .any(|room_id| requester_session.has_joined(room_id));
        if !shares_room {
            return Err(PlaybackError::NotSharingRoom);
        }

        let event = RelayEvent::TimeAnswered { position };
        self.message_pusher.push_to(&requester, &event).await?;
        Ok(())
    }

    pub async fn change_playback_rate(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
        rate: PlaybackRate,
    ) -> Result<(), PlaybackError> {
        self.joined_session(from, room_id).await?;

        let event = RelayEvent::PlaybackRateChanged { rate };
        self.relay_to_others(from, room_id, &event).await?;

        let patch = RoomInfoPatch {
            curr_speed: Some(rate),
            ..RoomInfoPatch::default()
        };
        self.checkpoints
            .request(room_id, CheckpointKind::Rate, patch)
            .await;
        Ok(())
    }

    /// シーク。位置だけをチェックポイントに残す（再生状態は変えない）
    pub async fn seek(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
        position: PlaybackPosition,
    ) -> Result<(), PlaybackError> {
        self.joined_session(from, room_id).await?;

        let event = RelayEvent::Seeked { position };
        self.relay_to_others(from, room_id, &event).await?;

        let patch = RoomInfoPatch {
            curr_time: Some(position),
            ..RoomInfoPatch::default()
        };
        self.checkpoints
            .request(room_id, CheckpointKind::Position, patch)
            .await;
        Ok(())
    }

    async fn joined_session(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<Session, PlaybackError> {
        self.sessions
            .get_session(&connection_id)
            .await
            .filter(|session| session.has_joined(room_id))
            .ok_or(PlaybackError::NotInRoom)
    }

    /// 送信元を除く在室者へ中継する
    async fn relay_to_others(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
        event: &RelayEvent,
    ) -> Result<(), PlaybackError> {
        let targets: Vec<ConnectionId> = self
            .sessions
            .room_members(room_id)
            .await
            .into_iter()
            .map(|member| member.connection_id)
            .filter(|connection_id| *connection_id != from)
            .collect();

        tracing::debug!(
            "Relaying '{}' from '{}' to {} connection(s) in room '{}'",
            event.name(),
            from,
            targets.len(),
            room_id
        );
        self.message_pusher.broadcast(targets, event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoomRegistry;
    use crate::usecase::test_support::Fixture;
    use std::time::Duration;

    fn create_usecase(fixture: &Fixture) -> SyncPlaybackUseCase {
        let checkpoints = Arc::new(CheckpointPersister::new(
            fixture.registry.clone(),
            Duration::from_millis(200),
        ));
        SyncPlaybackUseCase::new(
            fixture.sessions.clone(),
            fixture.pusher.clone(),
            checkpoints,
        )
    }

    fn position(seconds: f64) -> PlaybackPosition {
        PlaybackPosition::new(seconds).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_is_relayed_to_others_only() {
        // テスト項目: A の再生操作は B に届き、A 自身には返らない
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let room = fixture.room(&alice).await;
        let alice_conn = fixture.connect(&alice, &room.id).await;
        let bob_conn = fixture.connect(&bob, &room.id).await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        usecase
            .toggle(alice_conn, &room.id, true, Some(position(42.5)))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            fixture.pusher.received_by(&bob_conn).await,
            vec![RelayEvent::PlayerStateToggled {
                playing: true,
                position: Some(position(42.5)),
            }]
        );
        assert!(fixture.pusher.received_by(&alice_conn).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_burst_persists_first_checkpoint_once() {
        // テスト項目: 窓の中の連続操作は全員に中継されるが、保存は最初の 1 件だけ
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let room = fixture.room(&alice).await;
        let alice_conn = fixture.connect(&alice, &room.id).await;
        let bob_conn = fixture.connect(&bob, &room.id).await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        usecase
            .toggle(alice_conn, &room.id, true, Some(position(10.0)))
            .await
            .unwrap();
        usecase
            .toggle(alice_conn, &room.id, false, Some(position(11.0)))
            .await
            .unwrap();
        usecase
            .toggle(alice_conn, &room.id, true, Some(position(12.0)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        // then (期待する結果):
        assert_eq!(fixture.pusher.received_by(&bob_conn).await.len(), 3);
        let info = fixture.registry.get_room_info(&room.id).await.unwrap();
        assert!(info.is_playing);
        assert_eq!(info.curr_time.seconds(), 10.0);
    }

    #[tokio::test]
    async fn test_play_without_position_is_rejected() {
        // テスト項目: 位置なしの再生開始は拒否され、誰にも届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let room = fixture.room(&alice).await;
        let alice_conn = fixture.connect(&alice, &room.id).await;
        let bob_conn = fixture.connect(&bob, &room.id).await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        let play = usecase.toggle(alice_conn, &room.id, true, None).await;
        let pause = usecase.toggle(alice_conn, &room.id, false, None).await;

        // then (期待する結果): 一時停止は位置なしでもよい
        assert_eq!(play, Err(PlaybackError::PositionRequired));
        assert!(pause.is_ok());
        assert_eq!(
            fixture.pusher.received_by(&bob_conn).await,
            vec![RelayEvent::PlayerStateToggled {
                playing: false,
                position: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_actions_on_unjoined_room_are_rejected() {
        // テスト項目: 参加していないルームへの操作は拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let room = fixture.room(&alice).await;
        let other = fixture.room(&alice).await;
        let alice_conn = fixture.connect(&alice, &room.id).await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        let seek = usecase.seek(alice_conn, &other.id, position(5.0)).await;
        let rate = usecase
            .change_playback_rate(alice_conn, &other.id, PlaybackRate::NORMAL)
            .await;

        // then (期待する結果):
        assert_eq!(seek, Err(PlaybackError::NotInRoom));
        assert_eq!(rate, Err(PlaybackError::NotInRoom));
    }

    #[tokio::test]
    async fn test_time_query_round_trip() {
        // テスト項目: 問い合わせは他の在室者に届き、回答は問い合わせ元にだけ届く
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let carol = fixture.user("carol").await;
        let room = fixture.room(&alice).await;
        let alice_conn = fixture.connect(&alice, &room.id).await;
        let bob_conn = fixture.connect(&bob, &room.id).await;
        let carol_conn = fixture.connect(&carol, &room.id).await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        usecase.query_current_time(carol_conn, &room.id).await.unwrap();
        usecase
            .answer_time(alice_conn, carol_conn, position(30.0))
            .await
            .unwrap();
        usecase
            .answer_time(bob_conn, carol_conn, position(31.0))
            .await
            .unwrap();

        // then (期待する結果):
        let query = RelayEvent::TimeQueried {
            requester: carol_conn,
        };
        assert_eq!(fixture.pusher.received_by(&alice_conn).await, vec![query.clone()]);
        assert_eq!(fixture.pusher.received_by(&bob_conn).await, vec![query]);
        assert_eq!(
            fixture.pusher.received_by(&carol_conn).await,
            vec![
                RelayEvent::TimeAnswered {
                    position: position(30.0)
                },
                RelayEvent::TimeAnswered {
                    position: position(31.0)
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_answer_to_stranger_is_rejected() {
        // テスト項目: ルームを共有しない相手への回答は届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let room = fixture.room(&alice).await;
        let other = fixture.room(&bob).await;
        let alice_conn = fixture.connect(&alice, &room.id).await;
        let bob_conn = fixture.connect(&bob, &other.id).await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        let stranger = usecase.answer_time(alice_conn, bob_conn, position(1.0)).await;
        let gone = usecase
            .answer_time(alice_conn, ConnectionId::generate(), position(1.0))
            .await;

        // then (期待する結果):
        assert_eq!(stranger, Err(PlaybackError::NotSharingRoom));
        assert_eq!(gone, Err(PlaybackError::RequesterNotFound));
        assert!(fixture.pusher.received_by(&bob_conn).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_and_rate_are_persisted() {
        // テスト項目: シークと速度変更がチェックポイントに残る（再生状態は変えない）
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = fixture.user("alice").await;
        let bob = fixture.user("bob").await;
        let room = fixture.room(&alice).await;
        let alice_conn = fixture.connect(&alice, &room.id).await;
        let bob_conn = fixture.connect(&bob, &room.id).await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        usecase.seek(alice_conn, &room.id, position(75.0)).await.unwrap();
        usecase
            .change_playback_rate(alice_conn, &room.id, PlaybackRate::new(2.0).unwrap())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        // then (期待する結果):
        let info = fixture.registry.get_room_info(&room.id).await.unwrap();
        assert_eq!(info.curr_time.seconds(), 75.0);
        assert_eq!(info.curr_speed.value(), 2.0);
        assert!(!info.is_playing);
        assert_eq!(
            fixture.pusher.received_by(&bob_conn).await,
            vec![
                RelayEvent::Seeked {
                    position: position(75.0)
                },
                RelayEvent::PlaybackRateChanged {
                    rate: PlaybackRate::new(2.0).unwrap()
                },
            ]
        );
    }
}
