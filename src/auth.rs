//! HTTP Basic authentication gate.
//!
//! Stateless: every request carries its own `Authorization` header and is
//! checked against the credentials fixed at startup.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::AppState;
use crate::error::ServerError;

/// Username/password pair configured at startup. Both unset disables the gate.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Allowed,
    Denied,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    pub fn is_enabled(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    /// Check an `Authorization` header value against the configured pair.
    pub fn authenticate(&self, header: Option<&HeaderValue>) -> AuthOutcome {
        if !self.is_enabled() {
            return AuthOutcome::Allowed;
        }

        let Some((user, pass)) = header.and_then(parse_basic) else {
            return AuthOutcome::Denied;
        };

        let expected_user = self.username.as_deref().unwrap_or_default();
        let expected_pass = self.password.as_deref().unwrap_or_default();

        // Evaluate both so a wrong username costs the same as a wrong password.
        let user_ok = constant_time_eq(user.as_bytes(), expected_user.as_bytes());
        let pass_ok = constant_time_eq(pass.as_bytes(), expected_pass.as_bytes());

        if user_ok & pass_ok {
            AuthOutcome::Allowed
        } else {
            AuthOutcome::Denied
        }
    }
}

/// Decode `Basic <base64(user:pass)>`, splitting on the first `:`.
fn parse_basic(value: &HeaderValue) -> Option<(String, String)> {
    let value = value.to_str().ok()?.trim();
    let (scheme, payload) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(payload.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware guarding every route. Denied requests never reach a handler.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    match state
        .credentials
        .authenticate(req.headers().get(header::AUTHORIZATION))
    {
        AuthOutcome::Allowed => Ok(next.run(req).await),
        AuthOutcome::Denied => {
            debug!("Authentication failed for {}", req.uri().path());
            Err(ServerError::Unauthorized)
        }
    }
}
