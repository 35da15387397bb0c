//! Registration, login and the session extractor.
//!
//! Sessions are bearer tokens: 32 random bytes, hex-encoded, stored with an
//! expiry.  Handlers that need the caller take a [`CurrentUser`] argument;
//! the extractor resolves the `Authorization: Bearer` header to a user or
//! rejects with 401.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use fresco_store::{StoreError, User};
use rand::RngCore;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::AppState;
use crate::error::ApiError;
use crate::payload::{created, message, message_data, user_payload};
use crate::validate::Validator;

/// The authenticated caller, resolved from the bearer token.
pub struct CurrentUser {
    pub user: User,
    /// The session token the request carried; logout needs it.
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?
            .to_string();

        let session = state
            .db
            .get_session(&token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

        let user = state
            .db
            .get_user(session.user_id)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(CurrentUser { user, token })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth.strip_prefix("Bearer ")
}

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.check_name(&req.name);
    v.check_username(&req.username);
    v.check_email(&req.email);
    v.check_password("password", &req.password);
    if state.db.username_taken(&req.username, None)? {
        v.add("username", "The username has already been taken.");
    }
    if state.db.email_taken(&req.email, None)? {
        v.add("email", "The email has already been taken.");
    }
    v.finish()?;

    let hash = hash_password(&req.password)?;
    let user = state
        .db
        .insert_user(&req.name, &req.username, &req.email, &hash, None)
        .map_err(|e| match e {
            // Pre-checks passed but a concurrent registration won the
            // constraint race.
            StoreError::Conflict => {
                ApiError::Conflict("The username or email has already been taken.".to_string())
            }
            other => other.into(),
        })?;

    let token = new_session_token();
    state
        .db
        .create_session(user.id, &token, state.config.session_ttl)?;

    info!(username = %user.username, "user registered");

    Ok(created(
        "User registered successfully",
        json!({
            "user": user_payload(&state.db, &user, &state.config.base_url)?,
            "token": token,
        }),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    if req.login.is_empty() {
        v.add("login", "The login field is required.");
    }
    if req.password.is_empty() {
        v.add("password", "The password field is required.");
    }
    v.finish()?;

    let user = state
        .db
        .get_user_by_login(&req.login)
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::InvalidCredentials,
            other => other.into(),
        })?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = new_session_token();
    state
        .db
        .create_session(user.id, &token, state.config.session_ttl)?;

    info!(username = %user.username, "user logged in");

    Ok(message_data(
        "Logged in successfully",
        json!({
            "user": user_payload(&state.db, &user, &state.config.base_url)?,
            "token": token,
        }),
    ))
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    state.db.delete_session(&current.token)?;
    Ok(message("Successfully logged out"))
}

/// GET /user
pub async fn current_user(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let payload = user_payload(&state.db, &current.user, &state.config.base_url)?;
    Ok(crate::payload::data(json!({ "user": payload })))
}
