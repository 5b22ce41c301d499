use axum::http::{HeaderMap, header};

use crate::model::Session;

pub const SESSION_COOKIE_NAME: &str = "session_id";

pub fn session_cookie(session: &Session, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE_NAME, session.id
    );
    if secure {
        cookie.push_str("; Secure");
    }

    cookie
}

pub fn expired_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE_NAME
    );
    if secure {
        cookie.push_str("; Secure");
    }

    cookie
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let mut header = auth_header.split_whitespace();
    let (bearer, token) = (header.next()?, header.next()?);

    if !bearer.eq_ignore_ascii_case("bearer") {
        return None;
    }

    Some(token)
}
