use crate::db_models::User;
use crate::queries::{create_user, delete_user, get_user_by_id, get_user_by_username, list_users};
use crate::response::{ApiError, JsonResponse, NoContentResponse};
use crate::state::StateRef;
use crate::types::{Nickname, Password, PasswordHash, Username};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sentinel::RoleId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info, warn};

//--------------------------------------------------------------------------------------------------
// Requests
//--------------------------------------------------------------------------------------------------

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    // Fuzzy-matches username and nickname
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: Username,
    #[serde(default)]
    pub nickname: Option<Nickname>,
    pub password: Password,
    #[serde(rename = "roleID")]
    pub role_id: i16,
}

//--------------------------------------------------------------------------------------------------
// Responses
//--------------------------------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: Username,
    pub nickname: Option<Nickname>,
    #[serde(rename = "roleID")]
    pub role_id: i16,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            nickname: user.nickname,
            role_id: user.role_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
}

pub enum UserError {
    UserAlreadyExists,
    UserNotFound,
    InvalidRole,
    DatabaseError,
    CryptoError,
}

impl ApiError for UserError {
    fn response_data(&self) -> (StatusCode, &'static str, String) {
        match self {
            UserError::UserAlreadyExists => (
                StatusCode::CONFLICT,
                "user_already_exists",
                "User already exists".to_string(),
            ),
            UserError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "user_not_found",
                "User not found".to_string(),
            ),
            UserError::InvalidRole => (
                StatusCode::BAD_REQUEST,
                "invalid_role",
                "Role must be 1 (admin) or 2 (normal)".to_string(),
            ),
            UserError::DatabaseError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Database error".to_string(),
            ),
            UserError::CryptoError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "crypto_error",
                "Crypto error".to_string(),
            ),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Handlers
//--------------------------------------------------------------------------------------------------

// The claims arrive as a typed extractor value, never by poking at raw request state
pub async fn me(
    State(state): State<StateRef>,
    claims: sentinel::Claims,
) -> JsonResponse<UserResponse, UserError> {
    let user = match get_user_by_id(claims.user_id(), state.db_connection()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Token outlived the account
            warn!("User {} from token no longer exists", claims.user_id());
            return Err(UserError::UserNotFound).into();
        }
        Err(err) => {
            error!("Failed to get user {}: {}", claims.user_id(), err);
            return Err(UserError::DatabaseError).into();
        }
    };

    info!("Returning profile for user {}", claims.user_id());

    Ok(UserResponse::from(user)).into()
}

pub async fn list(
    State(state): State<StateRef>,
    Query(query): Query<ListUsersQuery>,
) -> JsonResponse<UserListResponse, UserError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    // An empty key means no filtering
    let key = query.key.as_deref().filter(|key| !key.is_empty());

    let user_page = match list_users(page, limit, key, state.db_connection()).await {
        Ok(user_page) => user_page,
        Err(err) => {
            error!("Failed to list users: {}", err);
            return Err(UserError::DatabaseError).into();
        }
    };

    info!(
        "Returning {} of {} users",
        user_page.users.len(),
        user_page.total
    );

    Ok(UserListResponse {
        users: user_page.users.into_iter().map(UserResponse::from).collect(),
        total: user_page.total,
    })
    .into()
}

pub async fn create(
    State(state): State<StateRef>,
    Json(request): Json<CreateUserRequest>,
) -> JsonResponse<UserResponse, UserError> {
    if request.role_id != sentinel::ADMIN.value() && request.role_id != sentinel::NORMAL.value() {
        warn!("Attempt to create user with role {}", request.role_id);
        return Err(UserError::InvalidRole).into();
    }

    // Ensure user does not already exist
    match get_user_by_username(&request.username, state.db_connection()).await {
        Ok(Some(_)) => {
            warn!("User already exists: {:?}", request.username);
            return Err(UserError::UserAlreadyExists).into();
        }
        Ok(None) => (),
        Err(err) => {
            error!("Failed to check for user {:?}: {}", request.username, err);
            return Err(UserError::DatabaseError).into();
        }
    };

    // Hash the password
    let password_hash = match PasswordHash::from_password(&request.password) {
        Ok(password_hash) => password_hash,
        Err(err) => {
            error!(
                "Failed to hash password for user {:?}: {}",
                request.username, err
            );
            return Err(UserError::CryptoError).into();
        }
    };

    // Create the user
    let new_user_res = create_user(
        &request.username,
        &request.nickname,
        &password_hash,
        RoleId::new(request.role_id),
        state.db_connection(),
    )
    .await;

    let new_user = match new_user_res {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to create user {:?}: {}", request.username, err);
            return Err(UserError::DatabaseError).into();
        }
    };

    info!("Created user {:?}", request.username);

    Ok(UserResponse::from(new_user)).into()
}

pub async fn remove(
    State(state): State<StateRef>,
    Path(username): Path<Username>,
) -> NoContentResponse<UserError> {
    match delete_user(&username, state.db_connection()).await {
        Ok(0) => {
            warn!("User not found to delete: {:?}", username);
            Err(UserError::UserNotFound).into()
        }
        Ok(_) => {
            info!("Deleted user {:?}", username);
            Ok(()).into()
        }
        Err(err) => {
            error!("Failed to delete user {:?}: {}", username, err);
            Err(UserError::DatabaseError).into()
        }
    }
}

//--------------------------------------------------------------------------------------------------
