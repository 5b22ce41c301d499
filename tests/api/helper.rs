use std::sync::Arc;

use account_gateway::{
    config::Config,
    routes::init_router,
    state::{AppState, SharedAppState},
};
use axum::{
    body::Body,
    http::{Request, Response, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use fake::{Fake, faker::lorem::en::Word};
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const PASSWORD: &str = "Passw0rd!";

pub fn test_config() -> Config {
    let mut config = Config::new().expect("Failed to read configuration");
    config.database = None;
    config.application.port = 0;
    config
}

pub struct AppStateTest {
    pub app_state: SharedAppState,
}

impl AppStateTest {
    pub fn new() -> Self {
        Self::new_with_config(test_config())
    }

    pub fn new_with_config(config: Config) -> Self {
        AppStateTest {
            app_state: Arc::new(AppState::in_memory(config)),
        }
    }

    pub async fn generate_response(&self, request: Request<Body>) -> Response<Body> {
        init_router(self.app_state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    pub async fn post_with_basic(
        &self,
        uri: &str,
        username: &str,
        password: &str,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, basic_header(username, password));
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.generate_response(request.body(Body::empty()).unwrap())
            .await
    }

    /// Registers a user and returns the issued token and session cookie.
    pub async fn register(&self, username: &str) -> (String, String) {
        let response = self
            .post_with_basic("/Account/Register", username, PASSWORD, None)
            .await;
        assert!(response.status().is_success(), "register {username}");

        let cookie = session_cookie(&response);
        let token = body_string(response).await;

        (token, cookie)
    }
}

pub fn basic_header(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

pub fn random_username() -> String {
    format!("{}-{}", Word().fake::<String>(), (1000..9999).fake::<u32>())
}

/// `name=value` part of the session `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("session_id="))
        .and_then(|value| value.split(';').next())
        .expect("session cookie is missing")
        .to_string()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
