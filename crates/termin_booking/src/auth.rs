// --- File: crates/termin_booking/src/auth.rs ---

use axum::{
    body::Body as AxumBody,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use termin_common::TerminError;
use tracing::warn;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";
const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

/// What the admin middleware needs: the configured key, if any.
#[derive(Clone)]
pub struct AdminAuthState {
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AdminAuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuthState")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Requires a matching `X-Admin-Key` header.
///
/// Answers 503 when no key is configured and 401 when the header is missing or wrong.
pub async fn admin_auth_middleware(
    State(auth_state): State<Arc<AdminAuthState>>,
    req: Request<AxumBody>,
    next: Next,
) -> Response {
    let Some(expected) = auth_state.api_key.as_deref().filter(|k| !k.is_empty()) else {
        warn!("Admin request refused: no admin api key configured");
        return TerminError::UnavailableError("Admin API is not configured".to_string())
            .into_response();
    };

    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected.as_bytes()) => {
            next.run(req).await
        }
        Some(_) => {
            warn!("Admin request with invalid key");
            TerminError::AuthError("Invalid credentials".to_string()).into_response()
        }
        None => TerminError::AuthError(format!("Missing {} header", ADMIN_KEY_HEADER))
            .into_response(),
    }
}

/// The requester's address: the first `X-Forwarded-For` hop, else the socket peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string);

        let ip = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });
        Ok(ClientIp(ip))
    }
}
