use crate::claims::Claims;
use crate::codec::TokenCodec;
use crate::revocation::RevocationStore;
use crate::role::Role;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Json};
use serde::Serialize;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, error, warn};

//--------------------------------------------------------------------------------------------------
// Trait for axum states to comply with to provide the admission dependencies
//--------------------------------------------------------------------------------------------------

pub trait AdmissionState {
    fn token_codec(&self) -> &TokenCodec;
    fn revocation_store(&self) -> &dyn RevocationStore;
}

impl<T: AdmissionState> AdmissionState for Arc<T> {
    fn token_codec(&self) -> &TokenCodec {
        self.deref().token_codec()
    }

    fn revocation_store(&self) -> &dyn RevocationStore {
        self.deref().revocation_store()
    }
}

//--------------------------------------------------------------------------------------------------
// Extract Error
//--------------------------------------------------------------------------------------------------

pub enum ExtractError {
    NoTokenHeader,
    InvalidTokenHeader,
    BadToken,
    TokenRevoked,
    RevocationUnavailable,
    RoleNotPermitted,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    code: &'static str,
    message: &'static str,
}

fn error_response(status_code: StatusCode, code: &'static str, message: &'static str) -> Response {
    (status_code, Json(ErrorResponse { code, message })).into_response()
}

impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        match self {
            // All verification failure kinds collapse into one user-visible outcome
            ExtractError::NoTokenHeader
            | ExtractError::InvalidTokenHeader
            | ExtractError::BadToken => error_response(
                StatusCode::UNAUTHORIZED,
                "authentication_failed",
                "Authentication failed",
            ),
            // Safe to distinguish: leaks no verification internals
            ExtractError::TokenRevoked => error_response(
                StatusCode::UNAUTHORIZED,
                "logged_out",
                "User has logged out",
            ),
            ExtractError::RevocationUnavailable => error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "authentication_unavailable",
                "Authentication temporarily unavailable",
            ),
            ExtractError::RoleNotPermitted => error_response(
                StatusCode::FORBIDDEN,
                "role_not_permitted",
                "Role not permitted",
            ),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Validation function
//--------------------------------------------------------------------------------------------------

const TOKEN_HEADER: &str = "token";

async fn validate_request<S>(parts: &mut Parts, state: &S) -> Result<Claims, ExtractError>
where
    S: AdmissionState + Send + Sync,
{
    // Check to see if an earlier extractor on this request already validated the token
    if let Some(claims) = parts.extensions.get::<Claims>() {
        debug!(user_id = claims.user_id(), "Token already validated");
        return Ok(claims.clone());
    }

    // Extract the token
    let Some(header) = parts.headers.get(TOKEN_HEADER) else {
        warn!("Request made with no token header");
        return Err(ExtractError::NoTokenHeader);
    };

    let Ok(token) = header.to_str() else {
        warn!("Request made with token header with more than visible ASCII characters");
        return Err(ExtractError::InvalidTokenHeader);
    };

    // Verify signature and expiry
    let claims = match state.token_codec().verify(token) {
        Ok(claims) => claims,
        Err(err) => {
            warn!("Request made with token that failed verification: {}", err);
            return Err(ExtractError::BadToken);
        }
    };

    // A verified token may still have been blacklisted by logout. Fail closed: an unreachable
    // store must never admit a revoked token.
    match state.revocation_store().is_revoked(token).await {
        Ok(false) => (),
        Ok(true) => {
            warn!(user_id = claims.user_id(), "Request made with revoked token");
            return Err(ExtractError::TokenRevoked);
        }
        Err(err) => {
            error!("Revocation lookup failed: {}", err);
            return Err(ExtractError::RevocationUnavailable);
        }
    }

    // Everything was successful; save the claims for stacked extractors

    parts.extensions.insert(claims.clone());

    debug!(user_id = claims.user_id(), "Token validated");

    Ok(claims)
}

//--------------------------------------------------------------------------------------------------
// Axum extractor to enforce a role
//--------------------------------------------------------------------------------------------------

pub struct RequireRole<T>(PhantomData<T>)
where
    T: Role;

#[async_trait]
impl<S, T> FromRequestParts<S> for RequireRole<T>
where
    S: AdmissionState + Send + Sync,
    T: Role + Send + Sync,
{
    type Rejection = ExtractError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = validate_request(parts, state).await?;

        if claims.role_id() == T::role_id() {
            debug!(user_id = claims.user_id(), "User has required role");
            Ok(RequireRole(PhantomData))
        } else {
            warn!(
                user_id = claims.user_id(),
                "User does not have required role"
            );
            Err(ExtractError::RoleNotPermitted)
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Axum extractor to get the verified identity
//--------------------------------------------------------------------------------------------------

pub struct Identity(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: AdmissionState + Send + Sync,
{
    type Rejection = ExtractError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = validate_request(parts, state).await?;

        Ok(Identity(claims))
    }
}

//--------------------------------------------------------------------------------------------------
