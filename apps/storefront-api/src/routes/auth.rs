//! # Auth Routes
//!
//! Signup, login, token refresh and the current user.
//!
//! ```text
//! POST /api/auth/signup   {email, password, full_name?}  → 201 {user, access_token, refresh_token, ...}
//! POST /api/auth/login    {email, password}              → 200 {user, access_token, refresh_token, ...}
//! POST /api/auth/refresh  {refresh_token}                → 200 {user, access_token, refresh_token, ...}
//! GET  /api/auth/me       Authorization: Bearer <access> → 200 User
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use lumen_core::validation::validate_email;
use lumen_core::{Role, User};

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::dto::{AuthResponse, LoginRequest, RefreshRequest, SignupRequest};
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

const BAD_CREDENTIALS: &str = "Invalid email or password";

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
}

async fn signup(
    State(state): State<SharedState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let email = validate_email(&request.email)?;
    request.validate()?;

    if state.db.users().get_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let role = if state.config.bootstrap_admin_email.as_deref() == Some(email.as_str()) {
        Role::Admin
    } else {
        Role::Customer
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: hash_password(&request.password)?,
        full_name: request
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        role,
        created_at: now,
        updated_at: now,
    };

    state.db.users().insert(&user).await?;
    info!(user_id = %user.id, role = %user.role, "User signed up");

    let tokens = state.jwt.issue(&user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

async fn login(
    State(state): State<SharedState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = validate_email(&request.email).map_err(|_| ApiError::unauthorized(BAD_CREDENTIALS))?;

    let user = match state.db.users().get_by_email(&email).await? {
        Some(user) if verify_password(&request.password, &user.password_hash) => user,
        _ => {
            warn!(email = %email, "Failed login");
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        }
    };

    info!(user_id = %user.id, "User logged in");

    let tokens = state.jwt.issue(&user)?;
    Ok(Json(AuthResponse { user, tokens }))
}

/// Issues a new pair with the user's current role.
async fn refresh(
    State(state): State<SharedState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let claims = state.jwt.validate_refresh_token(&request.refresh_token)?;

    let user = state
        .db
        .users()
        .get_by_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    let tokens = state.jwt.issue(&user)?;
    Ok(Json(AuthResponse { user, tokens }))
}

async fn me(State(state): State<SharedState>, user: AuthUser) -> ApiResult<Json<User>> {
    state
        .db
        .users()
        .get_by_id(&user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User", &user.id))
}
