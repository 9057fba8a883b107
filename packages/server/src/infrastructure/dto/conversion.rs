//! Conversion logic between DTOs and domain entities.

use sajiki_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    MediaUrl, PlaybackPosition, PlaybackRate, RelayEvent, Room, RoomId, RoomInfo, RoomLink,
    SenderIdentity, User, UserId, Username, ValueObjectError,
};
use crate::infrastructure::dto::{http, websocket as ws};

// ========================================
// Domain → DTO
// ========================================

impl From<SenderIdentity> for ws::SenderInfo {
    fn from(sender: SenderIdentity) -> Self {
        Self {
            id: sender.id.into_string(),
            username: sender.username.into_string(),
        }
    }
}

impl From<RelayEvent> for ws::ServerEvent {
    fn from(event: RelayEvent) -> Self {
        match event {
            RelayEvent::PresenceUpdated { room_id, users } => Self::RoomUsersList {
                room_id: room_id.into_string(),
                users: users.into_iter().map(UserId::into_string).collect(),
            },
            RelayEvent::PlayerStateToggled { playing, position } => Self::TogglePlayerState {
                playing,
                time: position.map(|p| p.seconds()),
            },
            RelayEvent::TimeQueried { requester } => Self::GiveYourTime {
                requester: requester.to_string(),
            },
            RelayEvent::TimeAnswered { position } => Self::OthersTimeIs {
                time: position.seconds(),
            },
            RelayEvent::PlaybackRateChanged { rate } => Self::PlaybackRateChanged {
                rate: rate.value(),
            },
            RelayEvent::Seeked { position } => Self::VideoSeeked {
                seconds: position.seconds(),
            },
            RelayEvent::RoomClosed { room_id } => Self::RoomClosed {
                room_id: room_id.into_string(),
            },
            RelayEvent::MediaUrlChanged { media_url } => Self::MediaUrlChanged {
                media_url: media_url.into_string(),
            },
            RelayEvent::MessageReceived {
                text,
                sender,
                timestamp,
            } => Self::MessageReceived {
                text: text.into_string(),
                sender: sender.map(Into::into),
                timestamp: timestamp_to_rfc3339(timestamp.value()),
            },
            RelayEvent::AdminChanged { user_id } => Self::NewAdmin {
                user_id: user_id.into_string(),
            },
        }
    }
}

impl From<User> for http::UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.into_string(),
            username: user.username.into_string(),
        }
    }
}

impl From<RoomInfo> for http::RoomInfoDto {
    fn from(info: RoomInfo) -> Self {
        Self {
            room_id: info.room_id.into_string(),
            is_opened: info.is_opened,
            is_playing: info.is_playing,
            curr_time: info.curr_time.seconds(),
            curr_speed: info.curr_speed.value(),
        }
    }
}

impl http::RoomDto {
    pub fn from_room(room: Room, info: Option<RoomInfo>) -> Self {
        Self {
            id: room.id.into_string(),
            link: room.link.into_string(),
            media_url: room.media_url.into_string(),
            admin_id: room.admin_id.into_string(),
            owner_id: room.owner_id.into_string(),
            room_info: info.map(Into::into),
        }
    }
}

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<http::UserDto> for User {
    type Error = ValueObjectError;

    fn try_from(dto: http::UserDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(dto.id)?,
            username: Username::new(dto.username)?,
        })
    }
}

impl TryFrom<http::RoomInfoDto> for RoomInfo {
    type Error = ValueObjectError;

    fn try_from(dto: http::RoomInfoDto) -> Result<Self, Self::Error> {
        Ok(Self {
            room_id: RoomId::new(dto.room_id)?,
            is_opened: dto.is_opened,
            is_playing: dto.is_playing,
            curr_time: PlaybackPosition::new(dto.curr_time)?,
            curr_speed: PlaybackRate::new(dto.curr_speed)?,
        })
    }
}

impl TryFrom<http::RoomDto> for (Room, Option<RoomInfo>) {
    type Error = ValueObjectError;

    fn try_from(dto: http::RoomDto) -> Result<Self, Self::Error> {
        let room = Room {
            id: RoomId::new(dto.id)?,
            link: RoomLink::new(dto.link)?,
            media_url: MediaUrl::new(dto.media_url)?,
            admin_id: UserId::new(dto.admin_id)?,
            owner_id: UserId::new(dto.owner_id)?,
        };
        let info = dto.room_info.map(RoomInfo::try_from).transpose()?;
        Ok((room, info))
    }
}

/// Seed file → registry contents (users, rooms, room infos)
pub fn seed_into_domain(
    seed: http::RegistrySeed,
) -> Result<(Vec<User>, Vec<Room>, Vec<RoomInfo>), ValueObjectError> {
    let users = seed
        .users
        .into_iter()
        .map(User::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let mut rooms = Vec::with_capacity(seed.rooms.len());
    let mut infos = Vec::new();
    for dto in seed.rooms {
        let (room, info): (Room, Option<RoomInfo>) = dto.try_into()?;
        rooms.push(room);
        infos.extend(info);
    }

    Ok((users, rooms, infos))
}
