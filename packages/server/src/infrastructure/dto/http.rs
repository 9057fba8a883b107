//! HTTP API DTOs (request / response bodies and the registry seed file).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub media_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfoDto {
    pub room_id: String,
    pub is_opened: bool,
    pub is_playing: bool,
    pub curr_time: f64,
    pub curr_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: String,
    pub link: String,
    pub media_url: String,
    pub admin_id: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_info: Option<RoomInfoDto>,
}

/// Live presence of a room (debug view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDto {
    pub room_id: String,
    pub users: Vec<String>,
    pub connections: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub message: String,
}

/// Initial registry contents loaded with `--seed <PATH>`
///
/// ```json
/// {
///   "users": [{"id": "u1", "username": "alice"}],
///   "rooms": [{"id": "r1", "link": "abc", "mediaUrl": "https://...", "adminId": "u1", "ownerId": "u1"}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegistrySeed {
    #[serde(default)]
    pub users: Vec<UserDto>,
    #[serde(default)]
    pub rooms: Vec<RoomDto>,
}
