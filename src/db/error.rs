#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("Database error")]
    DatabaseError(sqlx::Error),
    #[error("Migration error")]
    MigrationError(sqlx::migrate::MigrateError),
}
