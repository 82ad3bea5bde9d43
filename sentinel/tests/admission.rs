#![cfg(feature = "axum-extract")]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use sentinel::extract::{AdmissionState, Identity, RequireRole};
use sentinel::revocation::{MemoryRevocationStore, RevocationStore, StoreError};
use sentinel::{ClaimMeta, Role, RoleId, TokenCodec, ADMIN, NORMAL};
use std::sync::Arc;
use time::Duration;
use tower::ServiceExt;

//--------------------------------------------------------------------------------------------------
// Test fixtures
//--------------------------------------------------------------------------------------------------

const SECRET: &str = "admission-test-secret";

struct AdminRole;

impl Role for AdminRole {
    fn role_id() -> RoleId {
        ADMIN
    }
}

struct TestState<R> {
    codec: TokenCodec,
    revocations: R,
}

impl<R: RevocationStore> AdmissionState for TestState<R> {
    fn token_codec(&self) -> &TokenCodec {
        &self.codec
    }

    fn revocation_store(&self) -> &dyn RevocationStore {
        &self.revocations
    }
}

// Models the revocation backend being unreachable
struct DownStore;

#[async_trait]
impl RevocationStore for DownStore {
    async fn revoke(&self, _token: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError("connection refused".to_string()))
    }

    async fn is_revoked(&self, _token: &str) -> Result<bool, StoreError> {
        Err(StoreError("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError("connection refused".to_string()))
    }
}

async fn whoami(Identity(claims): Identity) -> String {
    claims.user_id().to_string()
}

async fn admin_only(_: RequireRole<AdminRole>) -> StatusCode {
    StatusCode::NO_CONTENT
}

fn router<R: RevocationStore + 'static>(state: TestState<R>) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .route("/admin", get(admin_only))
        .with_state(Arc::new(state))
}

fn memory_state() -> TestState<MemoryRevocationStore> {
    TestState {
        codec: TokenCodec::new(SECRET, Duration::hours(1), "admission-test").unwrap(),
        revocations: MemoryRevocationStore::new(),
    }
}

fn request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header("token", token);
    }
    builder.body(Body::empty()).unwrap()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = router(memory_state());

    let response = app.oneshot(request("/whoami", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = router(memory_state());

    let response = app
        .oneshot(request("/whoami", Some("not-a-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_unauthorized() {
    let app = router(memory_state());

    let other = TokenCodec::new("other-secret", Duration::hours(1), "admission-test").unwrap();
    let token = other
        .issue(ClaimMeta {
            user_id: 1,
            role_id: ADMIN,
        })
        .unwrap();

    let response = app.oneshot(request("/whoami", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_is_admitted_with_identity() {
    let state = memory_state();
    let token = state
        .codec
        .issue(ClaimMeta {
            user_id: 42,
            role_id: NORMAL,
        })
        .unwrap();
    let app = router(state);

    let response = app.oneshot(request("/whoami", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn revoked_token_is_rejected_until_expiry() {
    let state = memory_state();
    let token = state
        .codec
        .issue(ClaimMeta {
            user_id: 42,
            role_id: NORMAL,
        })
        .unwrap();

    state
        .revocations
        .revoke(&token, Duration::hours(1))
        .await
        .unwrap();

    // A fresh token for the same user stays valid
    let other_token = state
        .codec
        .issue(ClaimMeta {
            user_id: 42,
            role_id: NORMAL,
        })
        .unwrap();

    let app = router(state);

    let response = app
        .clone()
        .oneshot(request("/whoami", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request("/whoami", Some(&other_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn role_mismatch_is_forbidden_not_unauthorized() {
    let state = memory_state();
    let normal_token = state
        .codec
        .issue(ClaimMeta {
            user_id: 7,
            role_id: NORMAL,
        })
        .unwrap();
    let admin_token = state
        .codec
        .issue(ClaimMeta {
            user_id: 1,
            role_id: ADMIN,
        })
        .unwrap();
    let app = router(state);

    let response = app
        .clone()
        .oneshot(request("/admin", Some(&normal_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request("/admin", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unreachable_store_fails_closed() {
    let state = TestState {
        codec: TokenCodec::new(SECRET, Duration::hours(1), "admission-test").unwrap(),
        revocations: DownStore,
    };
    let token = state
        .codec
        .issue(ClaimMeta {
            user_id: 42,
            role_id: NORMAL,
        })
        .unwrap();
    let app = router(state);

    let response = app.oneshot(request("/whoami", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
