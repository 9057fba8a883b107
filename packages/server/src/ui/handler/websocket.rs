//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, MediaUrl, MessageContent, PlaybackPosition, PlaybackRate, PusherChannel,
        RoomId, Timestamp, Username, ValueObjectError,
    },
    infrastructure::dto::{
        http::ErrorDto,
        websocket::{ClientEvent, ServerEvent},
    },
    ui::state::AppState,
    usecase::{
        Admission, JoinRoomError, PlaybackError, RenameUserError, RoomControlError,
        SendMessageError,
    },
};
use sajiki_shared::time::parse_rfc3339_millis;

use super::bearer_token;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// クライアントイベントの処理に失敗した理由（ack の error に載せる）
#[derive(Debug, Error)]
enum HandlerError {
    #[error(transparent)]
    InvalidValue(#[from] ValueObjectError),
    #[error(transparent)]
    Join(#[from] JoinRoomError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error(transparent)]
    Control(#[from] RoomControlError),
    #[error(transparent)]
    Message(#[from] SendMessageError),
    #[error(transparent)]
    Rename(#[from] RenameUserError),
}

/// ハンドシェイクで資格情報を検証してからアップグレードする
///
/// ユーザー ID はクエリの `userId`、なければ `Authorization: Bearer` から取る。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Response {
    let user_id = query
        .user_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| bearer_token(&headers));

    match state
        .admit_connection_usecase
        .execute(user_id, query.username)
        .await
    {
        Ok(admission) => {
            tracing::info!("User '{}' admitted", admission.user_id);
            ws.on_upgrade(move |socket| handle_socket(socket, state, admission))
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Rejected WebSocket handshake: {}", e);
            let body = ErrorDto {
                message: e.to_string(),
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for frames addressed to this connection
/// * `sender` - WebSocket sink to send messages to this client
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, admission: Admission) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive frames
    let (tx, rx) = mpsc::unbounded_channel();
    let session = state
        .admit_connection_usecase
        .open_session(admission, tx.clone())
        .await;
    let connection_id = session.connection_id;

    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from '{}': {}", connection_id, text);
                    handle_text(&state_clone, connection_id, &tx, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push relayed frames to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    if let Err(e) = state
        .disconnect_participant_usecase
        .execute(connection_id)
        .await
    {
        tracing::warn!("Failed to disconnect '{}': {}", connection_id, e);
    }
}

/// 1 フレームを処理し、ackId があれば結果を返す
///
/// パースできないフレームはログに残して無視する。
async fn handle_text(
    state: &AppState,
    connection_id: ConnectionId,
    tx: &PusherChannel,
    text: &str,
) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Ignored malformed frame from '{}': {}", connection_id, e);
            return;
        }
    };

    let ack_id = event.ack_id();
    let result = dispatch(state, connection_id, event).await;
    if let Err(e) = &result {
        tracing::warn!("Rejected event from '{}': {}", connection_id, e);
    }

    let Some(ack_id) = ack_id else {
        return;
    };
    let ack = ServerEvent::Ack {
        ack_id,
        error: result.err().map(|e| e.to_string()),
    };
    match serde_json::to_string(&ack) {
        Ok(frame) => {
            if tx.send(frame).is_err() {
                tracing::debug!("Connection '{}' closed before ack {}", connection_id, ack_id);
            }
        }
        Err(e) => tracing::error!("Failed to serialize ack: {}", e),
    }
}

async fn dispatch(
    state: &AppState,
    from: ConnectionId,
    event: ClientEvent,
) -> Result<(), HandlerError> {
    match event {
        ClientEvent::JoinRoom { room_id, .. } => {
            state
                .join_room_usecase
                .execute(from, RoomId::new(room_id)?)
                .await?;
        }
        ClientEvent::TogglePlayerState {
            room_id,
            playing,
            time,
        } => {
            let position = time.map(PlaybackPosition::new).transpose()?;
            state
                .sync_playback_usecase
                .toggle(from, &RoomId::new(room_id)?, playing, position)
                .await?;
        }
        ClientEvent::QueryCurrentTime { room_id } => {
            state
                .sync_playback_usecase
                .query_current_time(from, &RoomId::new(room_id)?)
                .await?;
        }
        ClientEvent::MyTimeIs { requester, time } => {
            state
                .sync_playback_usecase
                .answer_time(
                    from,
                    ConnectionId::parse(&requester)?,
                    PlaybackPosition::new(time)?,
                )
                .await?;
        }
        ClientEvent::PlaybackRateChanged { room_id, rate } => {
            state
                .sync_playback_usecase
                .change_playback_rate(from, &RoomId::new(room_id)?, PlaybackRate::new(rate)?)
                .await?;
        }
        ClientEvent::SeekVideo { room_id, seconds } => {
            state
                .sync_playback_usecase
                .seek(from, &RoomId::new(room_id)?, PlaybackPosition::new(seconds)?)
                .await?;
        }
        ClientEvent::CloseRoom { room_id, .. } => {
            state
                .control_room_usecase
                .close_room(from, &RoomId::new(room_id)?)
                .await?;
        }
        ClientEvent::ChangeMediaUrl {
            room_id, media_url, ..
        } => {
            state
                .control_room_usecase
                .change_media_url(from, &RoomId::new(room_id)?, MediaUrl::new(media_url)?)
                .await?;
        }
        ClientEvent::SendMessage {
            room_id,
            text,
            timestamp,
            ..
        } => {
            // 解釈できないクライアント時刻はサーバー時刻で置き換える
            let timestamp = timestamp
                .as_deref()
                .and_then(parse_rfc3339_millis)
                .map(Timestamp::new);
            state
                .send_message_usecase
                .execute(
                    from,
                    &RoomId::new(room_id)?,
                    MessageContent::new(text)?,
                    timestamp,
                )
                .await?;
        }
        ClientEvent::ChangeUsername { username, .. } => {
            state
                .rename_user_usecase
                .execute(from, Username::new(username)?)
                .await?;
        }
    }
    Ok(())
}
