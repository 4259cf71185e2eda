// SPDX-License-Identifier: MIT

//! Account registration and login routes.

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::User;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name is required"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image_url: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Register a new account and start a session.
///
/// A duplicate email surfaces through the unique index as a 400 naming
/// the field.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = User::new(
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.password,
    )?;
    let user_id = state.db.insert_user(&user).await?;

    tracing::info!(user_id = %user_id, "User registered");
    issue_session(&state, jar, user_id, &user)
}

/// Log in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let user = state
        .db
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !user.verify_password(&payload.password) {
        return Err(AppError::Unauthorized);
    }
    let user_id = user.id.ok_or(AppError::Unauthorized)?;

    tracing::info!(user_id = %user_id, "User logged in");
    issue_session(&state, jar, user_id, &user)
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (
        jar.remove(cookie),
        Json(serde_json::json!({ "success": true })),
    )
}

/// Issue a JWT as both a cookie and a response-body token.
fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user_id: bson::oid::ObjectId,
    user: &User,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let token = create_jwt(
        &user_id,
        &user.display_name(),
        &user.email,
        &state.config.jwt_signing_key,
        state.config.jwt_expires_secs,
    )?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            token,
            user: UserResponse {
                id: user_id.to_hex(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
                image_url: user.image_url.clone(),
            },
        }),
    ))
}
