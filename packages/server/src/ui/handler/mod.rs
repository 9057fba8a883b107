//! Request handlers.

mod http;
mod websocket;

use axum::http::{HeaderMap, header::AUTHORIZATION};

pub use http::{
    create_room, create_user, get_room, get_room_by_link, get_room_presence, get_user,
    health_check,
};
pub use websocket::websocket_handler;

/// `Authorization: Bearer <user id>` からユーザー ID を取り出す
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        // テスト項目: Bearer トークンだけを取り出し、それ以外の形式は無視する
        // given (前提条件):
        let mut bearer = HeaderMap::new();
        bearer.insert(AUTHORIZATION, HeaderValue::from_static("Bearer user-1"));
        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        let mut blank = HeaderMap::new();
        blank.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));

        // when (操作) / then (期待する結果):
        assert_eq!(bearer_token(&bearer), Some("user-1".to_string()));
        assert_eq!(bearer_token(&basic), None);
        assert_eq!(bearer_token(&blank), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
