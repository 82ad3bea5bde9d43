use crate::response::{ApiError, JsonResponse};
use crate::state::StateRef;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

//--------------------------------------------------------------------------------------------------
// Response types
//--------------------------------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ProbeResponse {
    pub status: &'static str,
}

pub enum ProbeError {
    DatabaseDown,
    RevocationStoreDown,
}

impl ApiError for ProbeError {
    fn response_data(&self) -> (StatusCode, &'static str, String) {
        match self {
            ProbeError::DatabaseDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "database_down",
                "Database unreachable".to_string(),
            ),
            ProbeError::RevocationStoreDown => (
                StatusCode::SERVICE_UNAVAILABLE,
                "revocation_store_down",
                "Revocation store unreachable".to_string(),
            ),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Handlers
//--------------------------------------------------------------------------------------------------

pub async fn liveness() -> Json<ProbeResponse> {
    Json(ProbeResponse { status: "alive" })
}

// Ready only when both backing services answer
pub async fn readiness(State(state): State<StateRef>) -> JsonResponse<ProbeResponse, ProbeError> {
    if let Err(err) = state.db_connection().get().await {
        error!("Readiness probe failed to reach database: {}", err);
        return Err(ProbeError::DatabaseDown).into();
    }

    if let Err(err) = state.revocations().ping().await {
        error!("Readiness probe failed to reach revocation store: {}", err);
        return Err(ProbeError::RevocationStoreDown).into();
    }

    Ok(ProbeResponse { status: "ready" }).into()
}

//--------------------------------------------------------------------------------------------------
