// SPDX-License-Identifier: MIT

//! Durable image storage (Cloudinary signed uploads).
//!
//! Enrichment hands provider photo URLs to this store so cached records
//! reference stable image URLs instead of short-lived provider links.

use crate::error::{AppError, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};

const UPLOAD_FOLDER: &str = "tripcraft/places";

/// Image upload client.
#[derive(Clone)]
pub struct ImageStore {
    http: reqwest::Client,
    base_url: String,
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl ImageStore {
    pub fn new(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> Self {
        Self::with_base_url(
            cloud_name,
            api_key,
            api_secret,
            "https://api.cloudinary.com/v1_1".to_string(),
        )
    }

    /// Construct against an alternative endpoint (used by tests).
    pub fn with_base_url(
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
        base_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            cloud_name,
            api_key,
            api_secret,
        }
    }

    fn credentials(&self) -> Result<(&str, &str, &str)> {
        match (&self.cloud_name, &self.api_key, &self.api_secret) {
            (Some(cloud), Some(key), Some(secret)) => Ok((cloud, key, secret)),
            _ => Err(AppError::Config("CLOUDINARY_CLOUD_NAME")),
        }
    }

    /// Upload a remote image by URL. Empty input is a no-op.
    pub async fn upload_from_url(&self, image_url: &str) -> Result<Option<String>> {
        if image_url.is_empty() {
            return Ok(None);
        }

        let (cloud, key, secret) = self.credentials()?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_upload(&timestamp, UPLOAD_FOLDER, secret);

        let url = format!("{}/{}/image/upload", self.base_url, cloud);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("file", image_url),
                ("folder", UPLOAD_FOLDER),
                ("timestamp", &timestamp),
                ("api_key", key),
                ("signature", &signature),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|e| AppError::MapsApi(format!("Image upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MapsApi(format!(
                "Image upload failed: HTTP {}: {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::MapsApi(format!("JSON parse error: {}", e)))?;

        Ok(Some(uploaded.secure_url))
    }
}

/// Signature over the sorted upload parameters, per the provider's signed
/// upload contract (sha256 variant).
fn sign_upload(timestamp: &str, folder: &str, secret: &str) -> String {
    let to_sign = format!("folder={}&timestamp={}{}", folder, timestamp, secret);
    let digest = Sha256::digest(to_sign.as_bytes());
    hex::encode(digest)
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}
