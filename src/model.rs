use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Public shape of a user. Credential fields never appear here.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserProjection {
    pub username: String,
}

impl From<&User> for UserProjection {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
        }
    }
}

/// Row used by the stores when a password has to be checked.
#[derive(sqlx::FromRow, Debug)]
pub struct UserCredential {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

impl UserCredential {
    pub fn into_parts(self) -> (User, String) {
        (
            User {
                id: self.id,
                username: self.username,
            },
            self.password_hash,
        )
    }
}

/// Server-side sign-in state behind the session cookie.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn issue(user: &User, lifetime_minutes: i64) -> Self {
        let id = URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>());

        Self {
            id,
            user_id: user.id,
            username: user.username.clone(),
            expires_at: Utc::now() + Duration::minutes(lifetime_minutes),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
    /// Present when the request carried a live session cookie for `user`.
    pub session: Option<Session>,
}

/// Lookup key for usernames. Matching is case-insensitive.
pub fn normalize_username(username: &str) -> String {
    username.to_uppercase()
}
