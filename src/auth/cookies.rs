use axum::http::{header, HeaderMap, HeaderValue};

use super::AuthSession;

pub const ACCESS_COOKIE: &str = "sb-access-token";
pub const REFRESH_COOKIE: &str = "sb-refresh-token";

/// Refresh cookies outlive the access token by a wide margin
const REFRESH_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 30;

/// Token from `Authorization: Bearer ...`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Value of one cookie across every `Cookie` header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Session token from the access cookie, falling back to a bearer header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_COOKIE).or_else(|| bearer_token(headers))
}

fn cookie(name: &str, value: &str, max_age: i64, secure: bool) -> Option<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}"
    ))
    .ok()
}

/// `Set-Cookie` values storing a fresh session
pub fn session_cookies(session: &AuthSession, secure: bool) -> Vec<HeaderValue> {
    [
        cookie(ACCESS_COOKIE, &session.access_token, session.expires_in, secure),
        cookie(REFRESH_COOKIE, &session.refresh_token, REFRESH_MAX_AGE_SECS, secure),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// `Set-Cookie` values expiring both session cookies
pub fn clear_session_cookies(secure: bool) -> Vec<HeaderValue> {
    [cookie(ACCESS_COOKIE, "", 0, secure), cookie(REFRESH_COOKIE, "", 0, secure)]
        .into_iter()
        .flatten()
        .collect()
}
