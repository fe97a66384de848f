//! Authorization gate in front of sensitive routes.
//!
//! Handlers never decide access themselves: they take an `AdminAccess`
//! argument, whose extraction asks the configured `AuthGate` for a verdict.

use super::state::ServerState;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

pub const ADMIN_PASSWORD_HEADER: &str = "X-Admin-Password";

pub trait AuthGate: Send + Sync {
    /// Yes/no verdict for the request carrying `headers`.
    fn approve(&self, headers: &HeaderMap) -> bool;
}

/// Approves requests whose `X-Admin-Password` header matches the configured
/// password. Without a password nothing is approved.
pub struct SharedPasswordGate {
    password: Option<String>,
}

impl SharedPasswordGate {
    pub fn new(password: Option<String>) -> Self {
        Self {
            password: password.filter(|p| !p.is_empty()),
        }
    }
}

impl AuthGate for SharedPasswordGate {
    fn approve(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.password.as_deref() else {
            debug!("No admin password configured, denying");
            return false;
        };
        headers
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|provided| provided == expected)
            .unwrap_or(false)
    }
}

/// Proof that the gate approved the current request.
#[derive(Debug)]
pub struct AdminAccess;

pub enum AccessError {
    Denied,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        match self {
            AccessError::Denied => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({ "error": "Access denied" })),
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<ServerState> for AdminAccess {
    type Rejection = AccessError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if ctx.auth_gate.approve(&parts.headers) {
            Ok(AdminAccess)
        } else {
            warn!("Denied {} {}", parts.method, parts.uri.path());
            Err(AccessError::Denied)
        }
    }
}
