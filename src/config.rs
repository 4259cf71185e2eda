//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string
    pub mongodb_uri: String,
    /// Database name
    pub mongodb_db: String,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    /// Google Maps/Places API key. Optional at startup; enrichment
    /// endpoints fail with a configuration error when it is absent.
    pub maps_api_key: Option<String>,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Session token lifetime in seconds
    pub jwt_expires_secs: u64,

    /// Cloudinary cloud name for durable image storage
    pub image_cloud_name: Option<String>,
    /// Cloudinary API key
    pub image_api_key: Option<String>,
    /// Cloudinary API secret (used to sign uploads)
    pub image_api_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            mongodb_uri: env::var("MONGODB_URI")
                .map_err(|_| ConfigError::Missing("MONGODB_URI"))?,
            mongodb_db: env::var("MONGODB_DB").unwrap_or_else(|_| "tripcraft".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            jwt_expires_secs: env::var("JWT_EXPIRES_IN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30 * 24 * 60 * 60),

            image_cloud_name: env::var("CLOUDINARY_CLOUD_NAME").ok(),
            image_api_key: env::var("CLOUDINARY_API_KEY").ok(),
            image_api_secret: env::var("CLOUDINARY_API_SECRET").ok(),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_db: "tripcraft-test".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            maps_api_key: None,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            jwt_expires_secs: 3600,
            image_cloud_name: None,
            image_api_key: None,
            image_api_secret: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
