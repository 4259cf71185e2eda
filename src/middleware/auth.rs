// SPDX-License-Identifier: MIT

//! JWT authentication middleware.
//!
//! Two layers exist: `require_auth` rejects requests without a valid
//! token, while `optional_auth` threads an explicit [`Identity`] through
//! so read endpoints can personalize (bookmark flags) without demanding
//! a login.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use bson::oid::ObjectId;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "tripcraft_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user object id, hex)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// The requesting principal, threaded through handler extensions.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    Authenticated {
        user_id: ObjectId,
        name: String,
        email: String,
    },
}

impl Identity {
    pub fn user_id(&self) -> Option<ObjectId> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { user_id, .. } => Some(*user_id),
        }
    }
}

/// Authenticated user extracted from a verified JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub name: String,
    pub email: String,
}

fn extract_token(jar: &CookieJar, request: &Request) -> Option<String> {
    // Try cookie first, then header
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

fn verify_token(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    let user_id = ObjectId::parse_str(&token_data.claims.sub).ok()?;

    Some(AuthUser {
        user_id,
        name: token_data.claims.name,
        email: token_data.claims.email,
    })
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_token(&jar, &request).ok_or(StatusCode::UNAUTHORIZED)?;
    let user =
        verify_token(&token, &state.config.jwt_signing_key).ok_or(StatusCode::UNAUTHORIZED)?;

    let identity = Identity::Authenticated {
        user_id: user.user_id,
        name: user.name.clone(),
        email: user.email.clone(),
    };
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Middleware that attaches an [`Identity`] without requiring one.
///
/// A missing or invalid token degrades to `Identity::Anonymous` instead
/// of rejecting the request.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = extract_token(&jar, &request)
        .and_then(|token| verify_token(&token, &state.config.jwt_signing_key))
        .map(|user| Identity::Authenticated {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
        })
        .unwrap_or(Identity::Anonymous);

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Create a JWT for a user session.
pub fn create_jwt(
    user_id: &ObjectId,
    name: &str,
    email: &str,
    signing_key: &[u8],
    expires_secs: u64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_hex(),
        name: name.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + expires_secs as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_round_trip() {
        let key = b"test_jwt_key_32_bytes_minimum!!";
        let user_id = ObjectId::new();
        let token = create_jwt(&user_id, "Ada Lovelace", "ada@example.com", key, 3600).unwrap();

        let user = verify_token(&token, key).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_wrong_key_rejected() {
        let user_id = ObjectId::new();
        let token = create_jwt(&user_id, "A", "a@example.com", b"key-one-key-one-key-one!", 3600)
            .unwrap();
        assert!(verify_token(&token, b"key-two-key-two-key-two!").is_none());
    }
}
