use std::collections::HashSet;

use account_gateway::{auth::decode_jwt, model::UserProjection};
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};

use crate::{AppStateTest, PASSWORD, body_string, random_username, session_cookie, test_config};

#[tokio::test]
async fn register_then_login_issue_tokens_for_the_username() {
    let test_state = AppStateTest::new();
    let jwt = &test_state.app_state.config.jwt;

    for _ in 0..3 {
        let username = random_username();

        let response = test_state
            .post_with_basic("/Account/Register", &username, PASSWORD, None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let register_token = body_string(response).await;

        let response = test_state
            .post_with_basic("/Account/Login", &username, PASSWORD, None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let login_token = body_string(response).await;

        for token in [register_token, login_token] {
            let claims = decode_jwt(&token, jwt).unwrap().claims;
            assert_eq!(username, claims.sub);
            assert_eq!(username, claims.name);
        }
    }
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let test_state = AppStateTest::new();
    test_state.register("alice").await;

    let response = test_state
        .post_with_basic("/Account/Login", "alice", PASSWORD, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.len() > "session_id=".len());
}

#[tokio::test]
async fn login_is_case_insensitive_on_username() {
    let test_state = AppStateTest::new();
    test_state.register("Alice").await;

    let response = test_state
        .post_with_basic("/Account/Login", "aLICE", PASSWORD, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn second_anonymous_register_of_same_name_is_unauthorized() {
    let test_state = AppStateTest::new();

    let first = test_state
        .post_with_basic("/Account/Register", "alice", PASSWORD, None)
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert!(!body_string(first).await.is_empty());

    let second = test_state
        .post_with_basic("/Account/Register", "alice", PASSWORD, None)
        .await;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(second).await.is_empty());
}

#[tokio::test]
async fn register_by_same_signed_in_user_is_ok_with_empty_body() {
    let test_state = AppStateTest::new();
    let (_, cookie) = test_state.register("alice").await;

    let response = test_state
        .post_with_basic("/Account/Register", "alice", PASSWORD, Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn register_of_existing_name_by_another_user_is_unauthorized() {
    let test_state = AppStateTest::new();
    test_state.register("alice").await;
    let (_, bob_cookie) = test_state.register("bob").await;

    let response = test_state
        .post_with_basic("/Account/Register", "alice", PASSWORD, Some(&bob_cookie))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejected_by_policy_is_unauthorized() {
    let test_state = AppStateTest::new();

    let weak_password = test_state
        .post_with_basic("/Account/Register", "alice", "password", None)
        .await;
    assert_eq!(weak_password.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(weak_password).await.is_empty());

    let bad_username = test_state
        .post_with_basic("/Account/Register", "alice smith", PASSWORD, None)
        .await;
    assert_eq!(bad_username.status(), StatusCode::UNAUTHORIZED);

    let login = test_state
        .post_with_basic("/Account/Login", "alice", "password", None)
        .await;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_containing_colon_round_trips() {
    let test_state = AppStateTest::new();
    let password = "Pa:ss:w0rd!";

    let response = test_state
        .post_with_basic("/Account/Register", "alice", password, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_state
        .post_with_basic("/Account/Login", "alice", password, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let test_state = AppStateTest::new();
    test_state.register("alice").await;

    let wrong_password = test_state
        .post_with_basic("/Account/Login", "alice", "Wr0ng-password", None)
        .await;
    let unknown_user = test_state
        .post_with_basic("/Account/Login", "nobody", PASSWORD, None)
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong_password.headers().get(header::SET_COOKIE).is_none());
    assert!(unknown_user.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        body_string(wrong_password).await,
        body_string(unknown_user).await
    );
}

#[tokio::test]
async fn malformed_authorization_header_is_bad_request() {
    let test_state = AppStateTest::new();

    let headers = [
        None,
        Some("Bearer abc.def.ghi"),
        Some("Basic %%%"),
        Some("Basic YWxpY2U="),
    ];

    for uri in ["/Account/Login", "/Account/Register"] {
        for authorization in headers {
            let mut request = Request::builder().method("POST").uri(uri);
            if let Some(value) = authorization {
                request = request.header(header::AUTHORIZATION, value);
            }

            let response = test_state
                .generate_response(request.body(Body::empty()).unwrap())
                .await;

            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "{uri} with {authorization:?}"
            );
        }
    }
}

#[tokio::test]
async fn username_with_control_character_is_bad_request() {
    let test_state = AppStateTest::new();
    test_state.register("alice").await;

    for uri in ["/Account/Login", "/Account/Register"] {
        for username in ["ali\0ce", "alice\0", "al\tice"] {
            let response = test_state
                .post_with_basic(uri, username, PASSWORD, None)
                .await;

            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "{uri} with {username:?}"
            );
            assert!(response.headers().get(header::SET_COOKIE).is_none());
        }
    }
}

#[tokio::test]
async fn users_lists_projections_of_every_user() {
    let test_state = AppStateTest::new();
    let (token, _) = test_state.register("alice").await;
    test_state.register("bob").await;

    let request = Request::builder()
        .uri("/Account/Users")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;

    let raw: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    for user in &raw {
        let keys: Vec<&String> = user.as_object().unwrap().keys().collect();
        assert_eq!(vec!["username"], keys);
    }

    let users: HashSet<UserProjection> = serde_json::from_str(&body).unwrap();
    let expected: HashSet<UserProjection> = ["alice", "bob"]
        .into_iter()
        .map(|username| UserProjection {
            username: username.to_string(),
        })
        .collect();
    assert_eq!(expected, users);
}

#[tokio::test]
async fn users_accepts_session_cookie() {
    let test_state = AppStateTest::new();
    let (_, cookie) = test_state.register("alice").await;

    let request = Request::builder()
        .uri("/Account/Users")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let test_state = AppStateTest::new();
    let (_, cookie) = test_state.register("alice").await;

    let request = Request::builder()
        .method("POST")
        .uri("/Account/Logout")
        .header(header::COOKIE, cookie.clone())
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    // The old cookie no longer identifies alice.
    let response = test_state
        .post_with_basic("/Account/Register", "alice", PASSWORD, Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/Account/Users")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_with_bearer_token_is_ok() {
    let test_state = AppStateTest::new();
    let (token, _) = test_state.register("alice").await;

    let request = Request::builder()
        .method("POST")
        .uri("/Account/Logout")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn secure_cookie_flag_follows_config() {
    let mut config = test_config();
    config.session.secure_cookie = true;
    let test_state = AppStateTest::new_with_config(config);

    let response = test_state
        .post_with_basic("/Account/Register", "alice", PASSWORD, None)
        .await;

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("; Secure"));
}
