use crate::response::{ApiError, StandaloneError};
use crate::state::StateRef;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use tracing::warn;

//--------------------------------------------------------------------------------------------------
// Rate limit rejection
//--------------------------------------------------------------------------------------------------

pub enum RateLimitError {
    Exceeded,
}

impl ApiError for RateLimitError {
    fn response_data(&self) -> (StatusCode, &'static str, String) {
        match self {
            RateLimitError::Exceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests".to_string(),
            ),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Middleware
//--------------------------------------------------------------------------------------------------

// Every request passes here before any token handling; identity never factors in

pub async fn rate_limit(
    State(state): State<StateRef>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(request.headers(), addr);

    if state.limiter().allow(&client) {
        next.run(request).await
    } else {
        warn!(client = %client, "Rate limit exceeded");
        StandaloneError::from(RateLimitError::Exceeded).into_response()
    }
}

// Proxies put the original client in x-forwarded-for; fall back to the socket address
fn client_key(headers: &HeaderMap, addr: SocketAddr) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    addr.ip().to_string()
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr() -> SocketAddr {
        "10.0.0.1:54321".parse().unwrap()
    }

    #[test]
    fn socket_address_is_the_default_key() {
        assert_eq!(client_key(&HeaderMap::new(), addr()), "10.0.0.1");
    }

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));

        assert_eq!(client_key(&headers, addr()), "1.2.3.4");
    }

    #[test]
    fn real_ip_is_used_when_forwarded_for_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));

        assert_eq!(client_key(&headers, addr()), "9.9.9.9");
    }

    #[test]
    fn empty_forwarded_for_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));

        assert_eq!(client_key(&headers, addr()), "10.0.0.1");
    }
}
