use axum::{http::StatusCode, response::IntoResponse};
use validator::ValidationErrors;

use crate::{auth::basic::CredentialsError, auth::error::AuthError, db::error::DatabaseError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database error")]
    Database(DatabaseError),

    #[error("Auth error")]
    Auth(AuthError),

    #[error("Validation error")]
    Validation(ValidationErrors),

    #[error("Credentials error: {0}")]
    Credentials(CredentialsError),

    #[error("Other error: {0}")]
    Other(anyhow::Error),
}

impl From<DatabaseError> for Error {
    fn from(value: DatabaseError) -> Self {
        Self::Database(value)
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Database(database_error) => {
                tracing::error!(err.msg = %database_error, err.details = ?database_error, "Database Error");

                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Error::Auth(auth_error) => match auth_error {
                AuthError::JwtError(error) => {
                    tracing::error!(err.msg = %error, err.details = ?error, "JWT Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                AuthError::PasswordError(error) => {
                    tracing::error!(err.msg = %error, err.details = ?error, "Password Hash Error");

                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                // No body: callers must not learn which of these happened.
                AuthError::Unauthenticated
                | AuthError::IncorrectCredential
                | AuthError::DuplicateUserName => StatusCode::UNAUTHORIZED.into_response(),
            },
            Error::Validation(validation_error) => {
                tracing::info!(err.msg = %validation_error, err.details = ?validation_error, "Validation Error");

                (StatusCode::BAD_REQUEST, validation_error.to_string()).into_response()
            }
            Error::Credentials(credentials_error) => {
                tracing::info!(err.msg = %credentials_error, "Malformed Credentials");

                (StatusCode::BAD_REQUEST, credentials_error.to_string()).into_response()
            }
            Error::Other(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Other Error");

                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
