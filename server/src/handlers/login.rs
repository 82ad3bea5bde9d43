use crate::handler_proxy::IssueAccess;
use crate::queries::get_user_by_username;
use crate::response::{ApiError, JsonResponse};
use crate::state::StateRef;
use crate::types::{Password, Username};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use sentinel::{ClaimMeta, RoleId};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

//--------------------------------------------------------------------------------------------------
// Request and response types
//--------------------------------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Username,
    pub password: Password,
    #[serde(default, rename = "captchaID")]
    pub captcha_id: Option<String>,
    #[serde(default, rename = "captchaAns")]
    pub captcha_ans: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
}

pub enum LoginError {
    CaptchaRequired,
    CaptchaFailed,
    InvalidCredentials,
    TokenGenerationError,
    DatabaseError,
    CryptoError,
}

impl ApiError for LoginError {
    fn response_data(&self) -> (StatusCode, &'static str, String) {
        match self {
            LoginError::CaptchaRequired => (
                StatusCode::BAD_REQUEST,
                "captcha_required",
                "Captcha is required".to_string(),
            ),
            LoginError::CaptchaFailed => (
                StatusCode::BAD_REQUEST,
                "captcha_failed",
                "Failed to validate captcha".to_string(),
            ),
            LoginError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Username or password is incorrect".to_string(),
            ),
            LoginError::TokenGenerationError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_generation_error",
                "Error generating token".to_string(),
            ),
            LoginError::DatabaseError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Error accessing database".to_string(),
            ),
            LoginError::CryptoError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "crypto_error",
                "Error with cryptographic operations".to_string(),
            ),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Handler
//--------------------------------------------------------------------------------------------------

pub async fn handler(
    issue_access: IssueAccess,
    State(state): State<StateRef>,
    Json(request): Json<LoginRequest>,
) -> JsonResponse<LoginResponse, LoginError> {
    // Captcha gate, when enabled for logins
    if state.login_captcha() {
        let (Some(captcha_id), Some(captcha_ans)) = (&request.captcha_id, &request.captcha_ans)
        else {
            warn!("Login attempt without captcha while captcha is required");
            return Err(LoginError::CaptchaRequired).into();
        };

        if !state.captchas().verify(captcha_id, captcha_ans) {
            warn!("Login attempt with wrong or stale captcha");
            return Err(LoginError::CaptchaFailed).into();
        }
    }

    // Unknown user and wrong password answer identically
    let user = match get_user_by_username(&request.username, state.db_connection()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Login attempt for unknown user {:?}", request.username);
            return Err(LoginError::InvalidCredentials).into();
        }
        Err(err) => {
            error!("Error accessing database to get user: {}", err);
            return Err(LoginError::DatabaseError).into();
        }
    };

    let password_passes = match user.password_hash.validate(&request.password) {
        Ok(password_passes) => password_passes,
        Err(err) => {
            error!("Error validating password: {}", err);
            return Err(LoginError::CryptoError).into();
        }
    };

    if !password_passes {
        warn!("Invalid password for user {:?}", request.username);
        return Err(LoginError::InvalidCredentials).into();
    }

    // WE HAVE VALIDATED THE USER

    let codec = state.issue_codec(issue_access);
    let token = match codec.issue(ClaimMeta {
        user_id: user.id,
        role_id: RoleId::new(user.role_id),
    }) {
        Ok(token) => token,
        Err(err) => {
            error!("Error generating token: {}", err);
            return Err(LoginError::TokenGenerationError).into();
        }
    };

    info!("User {:?} logged in - token issued", request.username);

    Ok(LoginResponse {
        token,
        expires_in: codec.validity().whole_seconds(),
    })
    .into()
}

//--------------------------------------------------------------------------------------------------
