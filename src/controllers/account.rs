use std::sync::Arc;

use anyhow::Context;
use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;

use crate::{
    auth::{
        BasicCredentials, encode_jwt,
        error::AuthError,
        session::{expired_session_cookie, session_cookie},
    },
    error::Error,
    middlewares::MaybeCaller,
    model::{Caller, User, UserProjection},
    state::SharedAppState,
    telemetry::spawn_blocking_with_tracing,
};

#[tracing::instrument(name = "[POST] Account/Login", skip_all, fields(username = %credentials.username))]
pub async fn login(
    State(app_state): State<SharedAppState>,
    credentials: BasicCredentials,
) -> Result<Response, Error> {
    let user = app_state
        .users
        .check_password(&credentials.username, credentials.password)
        .await?
        .ok_or(Error::Auth(AuthError::IncorrectCredential))?;

    sign_in(app_state, user).await
}

#[tracing::instrument(name = "[POST] Account/Register", skip_all, fields(username = %credentials.username))]
pub async fn register(
    State(app_state): State<SharedAppState>,
    MaybeCaller(caller): MaybeCaller,
    credentials: BasicCredentials,
) -> Result<Response, Error> {
    if let Some(existing) = app_state.users.find_by_name(&credentials.username).await? {
        return match caller {
            Some(caller) if caller.user.id == existing.id => Ok(StatusCode::OK.into_response()),
            _ => Err(Error::Auth(AuthError::Unauthenticated)),
        };
    }

    let user = match app_state
        .users
        .create(&credentials.username, credentials.password)
        .await
    {
        Ok(user) => user,
        // Same status as a taken name, so callers cannot tell accounts apart.
        Err(Error::Validation(errors)) => {
            tracing::info!(err.details = ?errors, "Registration rejected by identity policy");
            return Err(Error::Auth(AuthError::Unauthenticated));
        }
        Err(Error::Auth(AuthError::DuplicateUserName)) => {
            return Err(Error::Auth(AuthError::Unauthenticated));
        }
        Err(error) => return Err(error),
    };

    tracing::info!(user_id = user.id, "User registered");

    sign_in(app_state, user).await
}

#[tracing::instrument(name = "[POST] Account/Logout", skip_all, fields(username = %caller.user.username))]
pub async fn logout(
    State(app_state): State<SharedAppState>,
    Extension(caller): Extension<Arc<Caller>>,
) -> Result<Response, Error> {
    if let Some(session) = &caller.session {
        app_state.sessions.sign_out(session).await?;
    }

    let cookie = expired_session_cookie(app_state.config.session.secure_cookie);

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]).into_response())
}

#[tracing::instrument(name = "[GET] Account/Users", skip_all)]
pub async fn users(
    State(app_state): State<SharedAppState>,
) -> Result<Json<Vec<UserProjection>>, Error> {
    let users: Vec<UserProjection> = app_state
        .users
        .users()
        .map_ok(|user| UserProjection::from(&user))
        .try_collect()
        .await?;

    Ok(Json(users))
}

/// Opens a session for `user` and answers with a fresh token.
async fn sign_in(app_state: SharedAppState, user: User) -> Result<Response, Error> {
    let session = app_state.sessions.sign_in(&user).await?;
    let cookie = session_cookie(&session, app_state.config.session.secure_cookie);

    let token = spawn_blocking_with_tracing(move || {
        encode_jwt(&user.username, &app_state.config.jwt)
    })
    .await
    .context("encode jwt")
    .map_err(Error::Other)??;

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], token).into_response())
}
