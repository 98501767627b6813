use axum::{
    Json,
    extract::{FromRequestParts, Query},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use murmur_types::api::ErrorBody;

use crate::error::GatewayError;

/// Caller identity bound to a connection for its whole lifetime.
///
/// The handshake token is taken as the user id verbatim. Its authenticity is
/// established upstream; the gateway only requires that one is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
}

impl Identity {
    pub fn from_token(token: &str) -> Result<Self, GatewayError> {
        if token.trim().is_empty() {
            return Err(GatewayError::Unauthenticated);
        }
        Ok(Self {
            user_id: token.to_string(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[derive(Debug, Deserialize)]
struct HandshakeParams {
    token: Option<String>,
}

/// Token from `?token=`, falling back to `Authorization: Bearer`.
fn handshake_token(parts: &Parts) -> Option<String> {
    let from_query = Query::<HandshakeParams>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(params)| params.token)
        .filter(|token| !token.trim().is_empty());

    from_query.or_else(|| {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
    })
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = handshake_token(parts).unwrap_or_default();
        Identity::from_token(&token).map_err(|_| {
            warn!("Rejected gateway handshake without token");
            AuthRejection
        })
    }
}

/// Handshake refused before the websocket upgrade.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                error: GatewayError::Unauthenticated.to_string(),
            }),
        )
            .into_response()
    }
}
