//! # GCS API Client Logic
//!
//! Connector and bucket handle for the GCS JSON API: authentication through
//! [`auth`](crate::gcs::auth), paginated listing of a whole bucket and
//! single-shot media downloads.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::{debug, info};

use crate::contract::{BucketHandle, CredentialMode, RemoteObject, ResolvedCredential, StorageConnector};
use crate::error::StoreError;
use crate::gcs::auth::{fetch_access_token, parse_service_account};
use crate::gcs::types::ListResponse;

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Connects to GCS with a service-account key supplied per call.
#[derive(Debug, Clone)]
pub struct GcsConnector {
    http: reqwest::Client,
    endpoint: String,
    credential_mode: CredentialMode,
}

impl Default for GcsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl GcsConnector {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential_mode: CredentialMode::InMemory,
        }
    }

    /// Read the key from a file path instead of receiving it in memory.
    pub fn with_credential_mode(mut self, mode: CredentialMode) -> Self {
        self.credential_mode = mode;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StorageConnector for GcsConnector {
    fn credential_mode(&self) -> CredentialMode {
        self.credential_mode
    }

    async fn connect(
        &self,
        credential: &ResolvedCredential,
        bucket: &str,
    ) -> Result<Box<dyn BucketHandle>, StoreError> {
        let key_json = match credential {
            ResolvedCredential::Inline(json) => json.clone(),
            ResolvedCredential::File(path) => std::fs::read_to_string(path).map_err(|e| {
                StoreError::Unauthorized(format!("cannot read key file {}: {e}", path.display()))
            })?,
        };
        let account = parse_service_account(&key_json)?;
        let token = fetch_access_token(&self.http, &account).await?;
        info!(
            bucket,
            client_email = %account.client_email,
            "Authenticated to GCS"
        );
        Ok(Box::new(GcsBucket::with_token(
            self.http.clone(),
            &self.endpoint,
            bucket,
            token,
        )))
    }
}

/// Bearer-authenticated handle on one GCS bucket.
#[derive(Debug, Clone)]
pub struct GcsBucket {
    http: reqwest::Client,
    endpoint: String,
    bucket: String,
    token: String,
}

impl GcsBucket {
    pub fn with_token(http: reqwest::Client, endpoint: &str, bucket: &str, token: String) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            token,
        }
    }

    fn objects_url(&self) -> Result<Url, StoreError> {
        Url::parse(&format!(
            "{}/storage/v1/b/{}/o",
            self.endpoint,
            encode_object_name(&self.bucket)
        ))
        .map_err(|e| StoreError::Transport(format!("invalid endpoint: {e}")))
    }

    async fn get(&self, url: Url, what: &str) -> Result<reqwest::Response, StoreError> {
        let res = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("GCS {what} request failed: {e}")))?;
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let message = format!("GCS {what} failed ({status}): {body}");
        Err(match status {
            StatusCode::UNAUTHORIZED => StoreError::Unauthorized(message),
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            _ => StoreError::Transport(message),
        })
    }
}

#[async_trait]
impl BucketHandle for GcsBucket {
    async fn list(&self) -> Result<Vec<RemoteObject>, StoreError> {
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.objects_url()?;
            {
                let mut qp = url.query_pairs_mut();
                qp.append_pair("fields", "items(name,size),nextPageToken");
                if let Some(ref t) = page_token {
                    qp.append_pair("pageToken", t);
                }
            }
            let page: ListResponse = self
                .get(url, "list")
                .await?
                .json()
                .await
                .map_err(|e| StoreError::Transport(format!("invalid GCS list response: {e}")))?;
            debug!(
                bucket = %self.bucket,
                items = page.items.len(),
                more = page.next_page_token.is_some(),
                "Fetched GCS listing page"
            );
            objects.extend(page.items.into_iter().map(|it| {
                let size = it.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0);
                RemoteObject::new(it.name, size)
            }));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(objects)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        // The object name is a single path segment, so '/' must be escaped too.
        let url = Url::parse(&format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.endpoint,
            encode_object_name(&self.bucket),
            encode_object_name(key)
        ))
        .map_err(|e| StoreError::Transport(format!("invalid object URL: {e}")))?;
        let bytes = self
            .get(url, "download")
            .await?
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(format!("failed to read GCS body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn encode_object_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
