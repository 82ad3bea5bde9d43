use crate::handlers::captcha::{self, GenerateCaptchaResponse};
use crate::handlers::images::{self, UploadError, UploadResponse};
use crate::handlers::login::{self, LoginError, LoginRequest, LoginResponse};
use crate::handlers::logout::{self, LogoutError, LogoutResponse};
use crate::handlers::probe::{self, ProbeError, ProbeResponse};
use crate::handlers::users::{
    self, CreateUserRequest, ListUsersQuery, UserError, UserListResponse, UserResponse,
};
use crate::response::{JsonResponse, NoContentResponse};
use crate::roles::AdminRole;
use crate::state::StateRef;
use crate::types::Username;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use sentinel::extract;

//--------------------------------------------------------------------------------------------------
// Types to represent permissions for the handlers
//--------------------------------------------------------------------------------------------------

#[allow(dead_code)]
pub struct IssueAccess(bool);

//--------------------------------------------------------------------------------------------------
// Re-export handlers, but grant access where applicable
//--------------------------------------------------------------------------------------------------

// login needs to be able to mint tokens, so is granted the issuing side of the codec
pub async fn login(
    state: State<StateRef>,
    request: Json<LoginRequest>,
) -> JsonResponse<LoginResponse, LoginError> {
    login::handler(IssueAccess(true), state, request).await
}

// logout reads the raw token itself: an unverifiable token is already unusable and still logs out
pub async fn logout(
    state: State<StateRef>,
    headers: HeaderMap,
) -> JsonResponse<LogoutResponse, LogoutError> {
    logout::handler(state, headers).await
}

//--------------------------------------------------------------------------------------------------

// Any authenticated user; the verified claims flow in as a typed value
pub async fn current_user(
    state: State<StateRef>,
    extract::Identity(claims): extract::Identity,
) -> JsonResponse<UserResponse, UserError> {
    users::me(state, claims).await
}

pub async fn list_users(
    state: State<StateRef>,
    _: extract::RequireRole<AdminRole>,
    query: Query<ListUsersQuery>,
) -> JsonResponse<UserListResponse, UserError> {
    users::list(state, query).await
}

pub async fn create_user(
    state: State<StateRef>,
    _: extract::RequireRole<AdminRole>,
    request: Json<CreateUserRequest>,
) -> JsonResponse<UserResponse, UserError> {
    users::create(state, request).await
}

pub async fn remove_user(
    state: State<StateRef>,
    _: extract::RequireRole<AdminRole>,
    username: Path<Username>,
) -> NoContentResponse<UserError> {
    users::remove(state, username).await
}

//--------------------------------------------------------------------------------------------------

pub async fn upload_image(
    state: State<StateRef>,
    _: extract::RequireRole<AdminRole>,
    multipart: Multipart,
) -> JsonResponse<UploadResponse, UploadError> {
    images::handler(state, multipart).await
}

//--------------------------------------------------------------------------------------------------

pub async fn generate_captcha(state: State<StateRef>) -> Json<GenerateCaptchaResponse> {
    captcha::handler(state).await
}

//--------------------------------------------------------------------------------------------------

pub async fn liveness() -> Json<ProbeResponse> {
    probe::liveness().await
}

pub async fn readiness(state: State<StateRef>) -> JsonResponse<ProbeResponse, ProbeError> {
    probe::readiness(state).await
}

//--------------------------------------------------------------------------------------------------
