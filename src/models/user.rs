//! User model for storage and API.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use ring::{digest, pbkdf2, rand::SecureRandom};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// User profile stored in the `users` collection.
///
/// Emails are stored lowercase and carry a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// PBKDF2-HMAC-SHA256 derived key (hex)
    pub password_hash: String,
    /// Per-user random salt (hex)
    pub password_salt: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a freshly salted password hash.
    pub fn new(
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Self> {
        let rng = ring::rand::SystemRandom::new();
        let mut salt = [0u8; SALT_LEN];
        rng.fill(&mut salt)
            .map_err(|_| anyhow::anyhow!("Failed to generate password salt"))?;

        Ok(Self {
            id: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.trim().to_lowercase(),
            password_hash: hex::encode(derive_key(password, &salt)),
            password_salt: hex::encode(salt),
            image_url: String::new(),
            reset_token: None,
            reset_token_expires: None,
            created_at: Utc::now(),
        })
    }

    /// Constant-time password check against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(salt) = hex::decode(&self.password_salt) else {
            return false;
        };
        let Ok(stored) = hex::decode(&self.password_hash) else {
            return false;
        };
        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            NonZeroU32::new(PBKDF2_ITERATIONS).expect("nonzero"),
            &salt,
            password.as_bytes(),
            &stored,
        )
        .is_ok()
    }

    /// Display name used in API responses and token claims.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; CREDENTIAL_LEN] {
    let mut out = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(PBKDF2_ITERATIONS).expect("nonzero"),
        salt,
        password.as_bytes(),
        &mut out,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let user = User::new("Ada", "Lovelace", "Ada@Example.com", "s3cret-pass").unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(user.verify_password("s3cret-pass"));
        assert!(!user.verify_password("wrong-pass"));
    }

    #[test]
    fn test_salts_are_unique() {
        let a = User::new("A", "B", "a@example.com", "pw").unwrap();
        let b = User::new("A", "B", "b@example.com", "pw").unwrap();
        assert_ne!(a.password_salt, b.password_salt);
        assert_ne!(a.password_hash, b.password_hash);
    }
}
