//! Minimal object-store client for template downloads.
//!
//! Talks to the Firebase Storage REST download endpoint
//! (`/v0/b/{bucket}/o/{object}?alt=media`), which Google Cloud Storage buckets
//! behind a Firebase project also answer. The object name is a single path
//! segment on the wire, so `templates/invoice.html` travels as
//! `templates%2Finvoice.html`.
//!
//! Token minting is out of scope: callers hand in a ready OAuth2 access token
//! (or none, for publicly readable buckets and local emulators).

use crate::error::StorageError;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info};

/// Downloads objects from one bucket.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    access_token: Option<String>,
}

impl StorageClient {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::InvalidUrl {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url,
            bucket: bucket.into(),
            access_token,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Build the download URL for `object`.
    pub fn object_url(&self, object: &str) -> Result<Url, StorageError> {
        let invalid = |reason: String| StorageError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v0", "b", self.bucket.as_str(), "o", object]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    /// Download `object` and decode it as UTF-8 text.
    pub async fn download_text(&self, object: &str) -> Result<String, StorageError> {
        let url = self.object_url(object)?;
        info!("Downloading gs://{}/{}", self.bucket, object);

        let mut request = self.http.get(url);
        if let Some(ref token) = self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| StorageError::Transport {
            object: object.to_string(),
            reason: e.to_string(),
        })?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(StorageError::ObjectNotFound {
                    bucket: self.bucket.clone(),
                    object: object.to_string(),
                })
            }
            s => {
                return Err(StorageError::Status {
                    object: object.to_string(),
                    status: s.as_u16(),
                })
            }
        }

        let text = response.text().await.map_err(|e| StorageError::Transport {
            object: object.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Downloaded {} bytes for '{}'", text.len(), object);
        Ok(text)
    }
}
