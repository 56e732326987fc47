//! Bearer token authentication.
//!
//! Login checks the configured admin credentials and issues a random opaque
//! token held in an in-memory session table until it expires.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use crm_core::config::DEFAULT_TOKEN_TTL_HOURS;
use crm_core::{AuthConfig, CrmError, CrmResult};
use dashmap::DashMap;
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{ErrorResponse, LoginRequest, LoginResponse, User};

const TOKEN_PREFIX: &str = "crm_";

#[derive(Debug, Clone)]
struct Session {
    user: User,
    expires_at: DateTime<Utc>,
}

struct Account {
    user: User,
    password: String,
}

pub struct AuthService {
    accounts: Vec<Account>,
    sessions: DashMap<String, Session>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        let admin = Account {
            user: User {
                id: Uuid::new_v4(),
                name: config.admin_name.clone(),
                email: config.admin_email.trim().to_lowercase(),
                role: "admin".to_string(),
            },
            password: config.admin_password.clone(),
        };
        let token_ttl = config.token_ttl().unwrap_or_else(|| {
            warn!(
                token_ttl_hours = config.token_ttl_hours,
                fallback_hours = DEFAULT_TOKEN_TTL_HOURS,
                "Token TTL out of range, using default"
            );
            Duration::hours(DEFAULT_TOKEN_TTL_HOURS)
        });
        Self {
            accounts: vec![admin],
            sessions: DashMap::new(),
            token_ttl,
        }
    }

    /// The account mutating actions are attributed to when seeding.
    pub fn admin(&self) -> Option<&User> {
        self.accounts.first().map(|a| &a.user)
    }

    pub fn login(&self, req: &LoginRequest) -> CrmResult<LoginResponse> {
        let email = req.email.trim().to_lowercase();
        let account = self
            .accounts
            .iter()
            .find(|a| a.user.email == email && a.password == req.password)
            .ok_or_else(|| {
                warn!(email = %email, "Rejected login");
                CrmError::Unauthorized("Invalid email or password".to_string())
            })?;

        let token = generate_token();
        let expires_at = Utc::now() + self.token_ttl;
        self.sessions.insert(
            token.clone(),
            Session {
                user: account.user.clone(),
                expires_at,
            },
        );
        info!(user = %account.user.email, "User logged in");
        Ok(LoginResponse {
            token,
            user: account.user.clone(),
            expires_at,
        })
    }

    /// Resolve a bearer token. Expired sessions are dropped on sight.
    pub fn verify(&self, token: &str) -> CrmResult<User> {
        let session = self
            .sessions
            .get(token)
            .map(|s| s.value().clone())
            .ok_or_else(|| CrmError::Unauthorized("Invalid or expired bearer token".to_string()))?;
        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            debug!(user = %session.user.email, "Session expired");
            return Err(CrmError::Unauthorized("Invalid or expired bearer token".to_string()));
        }
        Ok(session.user)
    }

    pub fn logout(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!(
        "{}{}",
        TOKEN_PREFIX,
        bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
    )
}

/// Rejects requests without a live bearer token and attaches the
/// authenticated [`User`] to the request extensions.
pub async fn require_auth(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match header_value.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(token) => token.trim().to_string(),
        None => {
            return unauthorized("missing_auth", "Authorization header with Bearer token required");
        }
    };

    match auth.verify(&token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(_) => unauthorized("invalid_token", "Invalid or expired bearer token"),
    }
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}
