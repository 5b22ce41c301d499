use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use sqlx::PgPool;

use crate::{
    auth::{error::AuthError, policy::IdentityPolicy},
    error::Error,
    model::{User, UserCredential, normalize_username},
};

use super::{UserStore, error::DatabaseError};

pub struct PgUserStore {
    pool: PgPool,
    policy: IdentityPolicy,
}

impl PgUserStore {
    pub fn new(pool: PgPool, policy: IdentityPolicy) -> Self {
        Self { pool, policy }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(name = "get user by name", skip(self))]
    async fn find_by_name(&self, username: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT
                id, username
            FROM
                users
            WHERE
                normalized_username = $1;
        "#,
        )
        .bind(normalize_username(username))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
    }

    #[tracing::instrument(name = "get user credential", skip(self))]
    async fn find_credential(&self, username: &str) -> Result<Option<(User, String)>, Error> {
        let credential = sqlx::query_as::<_, UserCredential>(
            r#"
            SELECT
                id, username, password_hash
            FROM
                users
            WHERE
                normalized_username = $1;
        "#,
        )
        .bind(normalize_username(username))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))?;

        Ok(credential.map(UserCredential::into_parts))
    }

    #[tracing::instrument(name = "insert user", skip(self, password_hash))]
    async fn insert(&self, username: &str, password_hash: String) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (username, normalized_username, password_hash)
            VALUES
                ($1, $2, $3)
            RETURNING id, username;
        "#,
        )
        .bind(username)
        .bind(normalize_username(username))
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref database_error) if database_error.is_unique_violation() => {
                Error::Auth(AuthError::DuplicateUserName)
            }
            e => Error::Database(DatabaseError::DatabaseError(e)),
        })
    }

    fn users(&self) -> BoxStream<'_, Result<User, Error>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT
                id, username
            FROM
                users
            ORDER BY
                id;
        "#,
        )
        .fetch(&self.pool)
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
        .boxed()
    }

    fn policy(&self) -> &IdentityPolicy {
        &self.policy
    }
}
