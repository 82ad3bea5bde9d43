use crate::response::{ApiError, JsonResponse};
use crate::state::StateRef;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use sentinel::extract::AdmissionState;
use serde::Serialize;
use tracing::{debug, error, info};

//--------------------------------------------------------------------------------------------------
// Response types
//--------------------------------------------------------------------------------------------------

#[derive(Serialize)]
pub struct LogoutResponse {
    message: &'static str,
}

impl Default for LogoutResponse {
    fn default() -> Self {
        LogoutResponse {
            message: "Logged out",
        }
    }
}

pub enum LogoutError {
    RevocationStoreError,
}

impl ApiError for LogoutError {
    fn response_data(&self) -> (StatusCode, &'static str, String) {
        match self {
            LogoutError::RevocationStoreError => (
                StatusCode::SERVICE_UNAVAILABLE,
                "revocation_store_error",
                "Error recording logout".to_string(),
            ),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Handler
//--------------------------------------------------------------------------------------------------

const TOKEN_HEADER: &str = "token";

// Blacklists the presented token until its own expiry. A token that does not verify cannot be
// used anyway, so logout with one reports success rather than leaking why.
pub async fn handler(
    State(state): State<StateRef>,
    headers: HeaderMap,
) -> JsonResponse<LogoutResponse, LogoutError> {
    let Some(token) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) else {
        debug!("Logout without a usable token header");
        return Ok(LogoutResponse::default()).into();
    };

    let claims = match state.token_codec().verify(token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("Logout with token that failed verification: {}", err);
            return Ok(LogoutResponse::default()).into();
        }
    };

    // Blacklist only until the token would die on its own
    let ttl = claims.expires_at().duration_until();

    match state.revocations().revoke(token, ttl).await {
        Ok(()) => {
            info!(user_id = claims.user_id(), "User logged out - token blacklisted");
            Ok(LogoutResponse::default()).into()
        }
        Err(err) => {
            error!("Failed to blacklist token: {}", err);
            Err(LogoutError::RevocationStoreError).into()
        }
    }
}

//--------------------------------------------------------------------------------------------------
