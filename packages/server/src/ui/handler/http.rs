//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    domain::RegistryError,
    infrastructure::dto::http::{
        CreateRoomRequest, CreateUserRequest, ErrorDto, PresenceDto, RoomDto, UserDto,
    },
    ui::state::AppState,
    usecase::{AdmissionError, DirectoryError},
};

use super::bearer_token;

/// HTTP API のエラー応答
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Directory(DirectoryError),
}

impl From<DirectoryError> for ApiError {
    fn from(error: DirectoryError) -> Self {
        Self::Directory(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            Self::Directory(error) => {
                let status = match &error {
                    DirectoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    DirectoryError::Registry(RegistryError::Unavailable(_)) => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    DirectoryError::Registry(_) => StatusCode::NOT_FOUND,
                };
                (status, error.to_string())
            }
        };
        (status, Json(ErrorDto { message })).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let user = state
        .room_directory_usecase
        .create_user(request.username)
        .await?;
    tracing::info!("User '{}' registered as '{}'", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.room_directory_usecase.get_user(user_id).await?;
    Ok(Json(user.into()))
}

/// Create a room owned by the bearer
///
/// 作成者が最初の管理者になる。
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomDto>), ApiError> {
    let owner_id = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized(AdmissionError::InvalidCredentials.to_string()))?;

    match state
        .room_directory_usecase
        .create_room(owner_id, request.media_url)
        .await
    {
        Ok((room, info)) => Ok((
            StatusCode::CREATED,
            Json(RoomDto::from_room(room, Some(info))),
        )),
        Err(DirectoryError::Registry(e @ RegistryError::UserNotFound(_))) => {
            Err(ApiError::Unauthorized(e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDto>, ApiError> {
    let (room, info) = state.room_directory_usecase.get_room(room_id).await?;
    Ok(Json(RoomDto::from_room(room, Some(info))))
}

pub async fn get_room_by_link(
    State(state): State<Arc<AppState>>,
    Path(link): Path<String>,
) -> Result<Json<RoomDto>, ApiError> {
    let (room, info) = state.room_directory_usecase.get_room_by_link(link).await?;
    Ok(Json(RoomDto::from_room(room, Some(info))))
}

/// 現在の在室状況（接続中のセッションから計算）
pub async fn get_room_presence(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<PresenceDto>, ApiError> {
    let presence = state.room_directory_usecase.presence(room_id).await?;
    Ok(Json(PresenceDto {
        room_id: presence.room_id.into_string(),
        users: presence
            .users
            .into_iter()
            .map(|user_id| user_id.into_string())
            .collect(),
        connections: presence.connections,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValueObjectError;

    fn status_of(error: ApiError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn test_api_error_status_codes() {
        // テスト項目: エラーの種類ごとに HTTP ステータスが決まる
        // given (前提条件):
        let invalid = ApiError::from(DirectoryError::InvalidInput(ValueObjectError::Empty(
            "username",
        )));
        let missing = ApiError::from(DirectoryError::Registry(RegistryError::RoomNotFound(
            "r1".to_string(),
        )));
        let unavailable = ApiError::from(DirectoryError::Registry(RegistryError::Unavailable(
            "down".to_string(),
        )));
        let unauthorized = ApiError::Unauthorized("Invalid credentials".to_string());

        // when (操作) / then (期待する結果):
        assert_eq!(status_of(invalid), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(missing), StatusCode::NOT_FOUND);
        assert_eq!(status_of(unavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(unauthorized), StatusCode::UNAUTHORIZED);
    }
}
