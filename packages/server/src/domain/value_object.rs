//! Value Object 定義
//!
//! 値そのものに意味を持つ不変オブジェクト。生成時にバリデーションを行い、
//! 不正な値がドメイン層に入り込まないことを保証します。

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::error::ValueObjectError;

/// 表示名の最大文字数
pub const MAX_USERNAME_LENGTH: usize = 50;

/// チャットメッセージの最大文字数
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// 再生速度の上限（ブラウザの HTMLMediaElement が受け付ける範囲に合わせる）
pub const MAX_PLAYBACK_RATE: f64 = 16.0;

fn non_empty(value: String, field: &'static str) -> Result<String, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                non_empty(value, $field).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// ユーザー ID（Room Registry が発行する不透明な文字列）
    UserId,
    "user id"
);

string_value_object!(
    /// ルーム ID
    RoomId,
    "room id"
);

string_value_object!(
    /// 共有用のルームリンク
    RoomLink,
    "room link"
);

string_value_object!(
    /// 埋め込みプレイヤーに渡すメディア URL
    MediaUrl,
    "media url"
);

/// 表示名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let value = non_empty(value, "username")?;
        let length = value.chars().count();
        if length > MAX_USERNAME_LENGTH {
            return Err(ValueObjectError::TooLong {
                field: "username",
                max: MAX_USERNAME_LENGTH,
                actual: length,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// チャットメッセージ本文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    /// 前後の空白は保持するが、空白のみのメッセージは拒否する
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("message"));
        }
        let length = value.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(ValueObjectError::TooLong {
                field: "message",
                max: MAX_MESSAGE_LENGTH,
                actual: length,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// WebSocket 接続 ID
///
/// 同じユーザーが複数タブから接続できるため、プレゼンスはユーザー単位、
/// 配送は接続単位で扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::Malformed("connection id"))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 再生位置（秒）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlaybackPosition(f64);

impl PlaybackPosition {
    pub const START: Self = Self(0.0);

    pub fn new(seconds: f64) -> Result<Self, ValueObjectError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ValueObjectError::OutOfRange {
                field: "position",
                value: seconds,
            });
        }
        Ok(Self(seconds))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

/// 再生速度（倍率）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlaybackRate(f64);

impl PlaybackRate {
    pub const NORMAL: Self = Self(1.0);

    pub fn new(rate: f64) -> Result<Self, ValueObjectError> {
        if !rate.is_finite() || rate <= 0.0 || rate > MAX_PLAYBACK_RATE {
            return Err(ValueObjectError::OutOfRange {
                field: "playback rate",
                value: rate,
            });
        }
        Ok(Self(rate))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
