#![cfg(feature = "web")]

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::app::SharedState;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session";
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// User session data
#[derive(Debug, Clone)]
pub struct Session {
    /// Time when the session expires
    pub expires_at: SystemTime,
}

/// Optional password gate in front of the admin pages.
///
/// Built without a password it lets every request through.
#[derive(Debug, Default)]
pub struct AdminAuth {
    password_hash: Option<String>,
    sessions: RwLock<HashMap<String, Session>>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub password: String,
}

impl AdminAuth {
    pub fn new(password: Option<&str>) -> Result<Self, AppError> {
        Ok(Self {
            password_hash: password.map(hash_password).transpose()?,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn verify(&self, password: &str) -> Result<bool, AppError> {
        match &self.password_hash {
            Some(hash) => verify_password(password, hash),
            None => Ok(true),
        }
    }

    /// Creates and stores a new session; returns its id.
    pub fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let session = Session {
            expires_at: SystemTime::now() + Duration::from_secs(SESSION_DURATION),
        };

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let now = SystemTime::now();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(session_id.clone(), session);
        session_id
    }

    pub fn validate_session(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(session_id)
            .is_some_and(|s| s.expires_at > SystemTime::now())
    }

    pub fn end_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id);
    }
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Auth(format!("password hashing failed: {}", e)))
}

/// Verify a password against a stored hash
fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Auth("invalid password hash format".to_string()))?;

    // A mismatch is not an error
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Authentication middleware for the admin routes
///
/// Passes the request through when no password is configured or the session
/// cookie is valid; otherwise redirects to the login page.
pub async fn require_admin(
    State(state): State<SharedState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if !state.auth.enabled() {
        return next.run(request).await;
    }

    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        if state.auth.validate_session(session_cookie.value()) {
            return next.run(request).await;
        }
    }

    tracing::debug!(path = %request.uri().path(), "admin request without session");
    Redirect::to("/login").into_response()
}

pub async fn serve_login_page(State(state): State<SharedState>) -> Result<Response, AppError> {
    if !state.auth.enabled() {
        return Ok(Redirect::to("/admin").into_response());
    }
    Ok(render_login(&state, None)?.into_response())
}

pub async fn handle_login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if state.auth.verify(&form.password)? {
        let session_id = state.auth.create_session();
        let cookie = Cookie::build((SESSION_COOKIE, session_id))
            .path("/")
            .http_only(true);
        tracing::info!("admin logged in");
        return Ok((jar.add(cookie), Redirect::to("/admin")).into_response());
    }

    tracing::warn!("admin login rejected");
    Ok((
        StatusCode::UNAUTHORIZED,
        render_login(&state, Some("Kata sandi salah."))?,
    )
        .into_response())
}

pub async fn handle_logout(State(state): State<SharedState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.auth.end_session(cookie.value());
    }
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}

fn render_login(state: &SharedState, error: Option<&str>) -> Result<Html<String>, AppError> {
    state.pages.render("login", &json!({ "error": error, "menu_admin": true }))
}
