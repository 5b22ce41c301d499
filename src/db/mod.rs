//! User and session persistence.
//!
//! The gateway only sees the [`UserStore`] and [`SessionStore`] traits. The
//! Postgres stores are used when a database is configured. The memory stores
//! back tests and local runs without one.

use anyhow::Context;
use async_trait::async_trait;
use futures::stream::BoxStream;
use secrecy::SecretString;

use crate::{
    auth::{
        compute_password_hash, error::AuthError, password::UNKNOWN_USER_PASSWORD_HASH,
        policy::IdentityPolicy, verify_password_hash,
    },
    error::Error,
    model::{Session, User},
    telemetry::spawn_blocking_with_tracing,
};

pub mod error;
pub mod memory;
pub mod session;
pub mod user;

pub use memory::{MemorySessionStore, MemoryUserStore};
pub use session::PgSessionStore;
pub use user::PgUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_name(&self, username: &str) -> Result<Option<User>, Error>;

    /// The user together with its PHC password hash.
    async fn find_credential(&self, username: &str) -> Result<Option<(User, String)>, Error>;

    /// Fails with `AuthError::DuplicateUserName` when the name is taken.
    async fn insert(&self, username: &str, password_hash: String) -> Result<User, Error>;

    /// Every user, in ascending id order.
    fn users(&self) -> BoxStream<'_, Result<User, Error>>;

    fn policy(&self) -> &IdentityPolicy;

    /// Returns the user when `password` matches the stored hash.
    ///
    /// Unknown names are verified against a fixed hash and then rejected. A
    /// stored hash that cannot be read is an error, not a mismatch.
    #[tracing::instrument(name = "check password", skip(self, password))]
    async fn check_password(
        &self,
        username: &str,
        password: SecretString,
    ) -> Result<Option<User>, Error> {
        let (user, password_hash) = match self.find_credential(username).await? {
            Some((user, password_hash)) => (Some(user), password_hash),
            None => (None, UNKNOWN_USER_PASSWORD_HASH.to_string()),
        };

        let verified =
            spawn_blocking_with_tracing(move || verify_password_hash(password_hash, password))
                .await
                .context("verify password hash")
                .map_err(Error::Other)?;

        match (user, verified) {
            (Some(user), Ok(())) => Ok(Some(user)),
            (None, _) | (_, Err(Error::Auth(AuthError::IncorrectCredential))) => Ok(None),
            (Some(user), Err(error)) => {
                tracing::error!(
                    user_id = user.id,
                    err.msg = %error,
                    err.details = ?error,
                    "Stored password hash is unreadable"
                );
                Err(error)
            }
        }
    }

    /// Validates the identity policy, hashes the password and stores the user.
    #[tracing::instrument(name = "create user", skip(self, password))]
    async fn create(&self, username: &str, password: SecretString) -> Result<User, Error> {
        self.policy()
            .validate(username, &password)
            .map_err(Error::Validation)?;

        let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
            .await
            .context("compute password hash")
            .map_err(Error::Other)??;

        self.insert(username, password_hash).await
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn sign_in(&self, user: &User) -> Result<Session, Error>;

    /// Expired sessions are reported as missing.
    async fn find(&self, session_id: &str) -> Result<Option<Session>, Error>;

    async fn sign_out(&self, session: &Session) -> Result<(), Error>;
}
