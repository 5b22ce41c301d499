use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::{
    config::Config,
    db::{
        MemorySessionStore, MemoryUserStore, PgSessionStore, PgUserStore, SessionStore,
        UserStore, error::DatabaseError,
    },
    error::Error,
};

pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        AppState {
            config,
            users,
            sessions,
        }
    }

    /// Postgres stores when a database is configured, memory stores otherwise.
    /// Production configurations always carry a database.
    pub async fn init(config: Config) -> Result<Self, Error> {
        let Some(database) = &config.database else {
            tracing::warn!("No database configured, accounts are kept in memory only.");
            return Ok(Self::in_memory(config));
        };

        let pool = PgPoolOptions::new()
            .min_connections(5)
            .max_connections(30)
            .connect_lazy_with(database.with_db());

        if config.application.run_migration {
            tracing::warn!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(DatabaseError::MigrationError)?;
        }

        let users = Arc::new(PgUserStore::new(pool.clone(), config.identity.clone()));
        let sessions = Arc::new(PgSessionStore::new(pool, config.session.lifetime_minutes));

        Ok(Self::new(config, users, sessions))
    }

    pub fn in_memory(config: Config) -> Self {
        let users = Arc::new(MemoryUserStore::new(config.identity.clone()));
        let sessions = Arc::new(MemorySessionStore::new(config.session.lifetime_minutes));

        Self::new(config, users, sessions)
    }
}
