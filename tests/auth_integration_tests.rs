mod common;

use axum::{
    extract::FromRequestParts,
    http::{Request, header},
};
use brightpath_timeline::{
    AppState,
    auth::{AuthUser, Caller, Claims},
    config::{AppConfig, Env},
    error::ApiError,
    repository::RepositoryState,
};
use common::{MemoryRepo, seed_user, test_state};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::test;
use uuid::Uuid;

// --- Helpers ---

fn make_token(state: &AppState, sub: Uuid, expires_in: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let claims = Claims {
        sub,
        exp: (now + expires_in) as usize,
        iat: now as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
    )
    .expect("token encoding")
}

fn parts_with_headers(headers: &[(&str, &str)]) -> axum::http::request::Parts {
    let mut builder = Request::builder().uri("/items");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let (parts, _body) = builder.body(()).unwrap().into_parts();
    parts
}

// --- AuthUser extractor ---

#[test]
async fn valid_token_resolves_identity_with_role() {
    let repo = Arc::new(MemoryRepo::default());
    let user = seed_user(&repo, "ines", "INSTRUCTOR", false);
    let state = test_state(repo);

    let token = make_token(&state, user.id, 3600);
    let mut parts = parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);

    let auth = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("valid token must authenticate");
    assert_eq!(auth.id, user.id);
    assert_eq!(auth.username, "ines");
    assert_eq!(auth.role, "INSTRUCTOR");
    assert!(!auth.is_superuser);
}

#[test]
async fn expired_token_is_unauthorized() {
    let repo = Arc::new(MemoryRepo::default());
    let user = seed_user(&repo, "ines", "INSTRUCTOR", false);
    let state = test_state(repo);

    let token = make_token(&state, user.id, -3600);
    let mut parts = parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[test]
async fn missing_credentials_are_unauthorized() {
    let state = test_state(Arc::new(MemoryRepo::default()));
    let mut parts = parts_with_headers(&[]);

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[test]
async fn malformed_token_is_unauthorized() {
    let state = test_state(Arc::new(MemoryRepo::default()));
    let mut parts = parts_with_headers(&[(header::AUTHORIZATION.as_str(), "Bearer not-a-jwt")]);

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[test]
async fn valid_token_for_deleted_user_is_unauthorized() {
    let state = test_state(Arc::new(MemoryRepo::default()));

    // Token is cryptographically fine, but the profile no longer exists.
    let token = make_token(&state, Uuid::new_v4(), 3600);
    let mut parts = parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[test]
async fn local_bypass_header_resolves_seeded_user() {
    let repo = Arc::new(MemoryRepo::default());
    let user = seed_user(&repo, "ada", "ADMIN", false);
    let state = test_state(repo);
    assert_eq!(state.config.env, Env::Local);

    let mut parts = parts_with_headers(&[("x-user-id", &user.id.to_string())]);

    let auth = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("bypass must work in Env::Local");
    assert_eq!(auth.id, user.id);
    assert_eq!(auth.role, "ADMIN");
}

#[test]
async fn bypass_header_is_ignored_in_production() {
    let repo = Arc::new(MemoryRepo::default());
    let user = seed_user(&repo, "ada", "ADMIN", false);
    let state = AppState {
        repo: repo as RepositoryState,
        config: AppConfig {
            env: Env::Production,
            ..AppConfig::default()
        },
    };

    let mut parts = parts_with_headers(&[("x-user-id", &user.id.to_string())]);

    // Without a bearer token the request must fall through to JWT validation
    // and fail, never through the development bypass.
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

// --- Caller extractor ---

#[test]
async fn no_credentials_resolve_to_anonymous_caller() {
    let state = test_state(Arc::new(MemoryRepo::default()));
    let mut parts = parts_with_headers(&[]);

    let caller = Caller::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert!(matches!(caller, Caller::Anonymous));
}

#[test]
async fn presented_but_invalid_credentials_are_rejected_not_downgraded() {
    let state = test_state(Arc::new(MemoryRepo::default()));
    let mut parts = parts_with_headers(&[("authorization", "Bearer bogus")]);

    // A bad token must be a 401, not a silent fall back to anonymous reads.
    let err = Caller::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[test]
async fn valid_credentials_resolve_to_user_caller() {
    let repo = Arc::new(MemoryRepo::default());
    let user = seed_user(&repo, "mona", "MANAGER", false);
    let state = test_state(repo);

    let token = make_token(&state, user.id, 3600);
    let mut parts = parts_with_headers(&[("authorization", &format!("Bearer {token}"))]);

    let caller = Caller::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    match caller {
        Caller::User(auth) => assert_eq!(auth.id, user.id),
        Caller::Anonymous => panic!("expected an authenticated caller"),
    }
}
