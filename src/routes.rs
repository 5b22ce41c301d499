use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, Request, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{middlewares::authenticate_middleware, state::SharedAppState};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn init_router(state: SharedAppState) -> Router {
    let anonymous_route = Router::new()
        .route("/Login", post(crate::controllers::account::login))
        .route("/Register", post(crate::controllers::account::register));

    let authenticated_route = Router::new()
        .route("/Logout", post(crate::controllers::account::logout))
        .route("/Users", get(crate::controllers::account::users))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate_middleware,
        ));

    let x_request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();
                let user_agent = request
                    .headers()
                    .get(header::USER_AGENT)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();

                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);

                tracing::info_span!(
                    "http_request",
                    request_id,
                    method = ?request.method(),
                    uri = ?request.uri(),
                    path = matched_path,
                    version = ?request.version(),
                    user_agent,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id_header));

    Router::new()
        .route("/", get(crate::controllers::home::index))
        .nest("/Account", anonymous_route.merge(authenticated_route))
        .layer(CompressionLayer::new())
        .layer(request_id_middleware)
        .with_state(state)
}
