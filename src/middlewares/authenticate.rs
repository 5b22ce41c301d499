use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{
        decode_jwt,
        error::AuthError,
        session::{bearer_token, session_id_from_headers},
    },
    error::Error,
    model::Caller,
    state::{AppState, SharedAppState},
};

/// Works out who is calling from a bearer token or, failing that, the
/// session cookie. Invalid or stale credentials yield `None`.
pub async fn resolve_caller(
    app_state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Caller>, Error> {
    let session = match session_id_from_headers(headers) {
        Some(session_id) => app_state.sessions.find(&session_id).await?,
        None => None,
    };

    if let Some(token) = bearer_token(headers) {
        let Ok(token_data) = decode_jwt(token, &app_state.config.jwt) else {
            return Ok(None);
        };

        let Some(user) = app_state.users.find_by_name(&token_data.claims.sub).await? else {
            return Ok(None);
        };

        let session = session.filter(|session| session.user_id == user.id);
        return Ok(Some(Caller { user, session }));
    }

    let Some(session) = session else {
        return Ok(None);
    };

    let user = app_state
        .users
        .find_by_name(&session.username)
        .await?
        .filter(|user| user.id == session.user_id);

    Ok(user.map(|user| Caller {
        user,
        session: Some(session),
    }))
}

#[tracing::instrument(name = "[MIDDLEWARE] authenticate", skip_all, fields(username))]
pub async fn authenticate_middleware(
    State(app_state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, Error> {
    let caller = resolve_caller(&app_state, req.headers())
        .await?
        .ok_or(Error::Auth(AuthError::Unauthenticated))?;

    tracing::Span::current().record("username", tracing::field::display(&caller.user.username));

    req.extensions_mut().insert(Arc::new(caller));

    Ok(next.run(req).await)
}

/// The caller of an anonymous route, if the request is authenticated at all.
pub struct MaybeCaller(pub Option<Caller>);

impl FromRequestParts<SharedAppState> for MaybeCaller {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Arc<Caller>>() {
            return Ok(MaybeCaller(Some(caller.as_ref().clone())));
        }

        resolve_caller(state, &parts.headers).await.map(MaybeCaller)
    }
}
