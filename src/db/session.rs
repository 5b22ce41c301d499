use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::Error,
    model::{Session, User},
};

use super::{SessionStore, error::DatabaseError};

pub struct PgSessionStore {
    pool: PgPool,
    lifetime_minutes: i64,
}

impl PgSessionStore {
    pub fn new(pool: PgPool, lifetime_minutes: i64) -> Self {
        Self {
            pool,
            lifetime_minutes,
        }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    #[tracing::instrument(name = "sign in", skip_all, fields(user_id = user.id))]
    async fn sign_in(&self, user: &User) -> Result<Session, Error> {
        let session = Session::issue(user, self.lifetime_minutes);

        let pruned = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE
                expires_at <= now();
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))?
        .rows_affected();
        if pruned > 0 {
            tracing::debug!(pruned, "Expired sessions removed");
        }

        sqlx::query(
            r#"
            INSERT INTO sessions
                (id, user_id, expires_at)
            VALUES
                ($1, $2, $3);
        "#,
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))?;

        Ok(session)
    }

    #[tracing::instrument(name = "get session", skip_all)]
    async fn find(&self, session_id: &str) -> Result<Option<Session>, Error> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT
                s.id, s.user_id, u.username, s.expires_at
            FROM
                sessions s
            JOIN
                users u ON u.id = s.user_id
            WHERE
                s.id = $1
                AND s.expires_at > now();
        "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))
    }

    #[tracing::instrument(name = "sign out", skip_all, fields(user_id = session.user_id))]
    async fn sign_out(&self, session: &Session) -> Result<(), Error> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE
                id = $1;
        "#,
        )
        .bind(&session.id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(DatabaseError::DatabaseError(e)))?;

        Ok(())
    }
}
