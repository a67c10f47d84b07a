//! # GCS Authentication
//!
//! Server-to-server OAuth 2.0 for service accounts: the key document is
//! parsed, a JWT asserting the account's identity is signed with its private
//! key (RS256) and exchanged at the account's token endpoint for a bearer
//! token. The key is always passed in explicitly; nothing is read from the
//! process environment here.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::error::StoreError;
use crate::gcs::types::{AccessToken, Claims, ServiceAccount};

/// Read-only access to object data and metadata.
pub const READ_ONLY_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_only";

/// Lifetime requested for the signed assertion, in seconds.
const ASSERTION_TTL_SECS: u64 = 3600;

pub fn parse_service_account(json: &str) -> Result<ServiceAccount, StoreError> {
    serde_json::from_str(json)
        .map_err(|e| StoreError::Unauthorized(format!("invalid service account key: {e}")))
}

/// Builds the signed JWT bearer assertion for `account`.
pub fn sign_assertion(account: &ServiceAccount, now: u64) -> Result<String, StoreError> {
    let claims = Claims {
        iss: account.client_email.clone(),
        scope: READ_ONLY_SCOPE.to_string(),
        aud: account.token_uri.clone(),
        exp: now + ASSERTION_TTL_SECS,
        iat: now,
    };
    let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
        .map_err(|e| StoreError::Unauthorized(format!("invalid private key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| StoreError::Unauthorized(format!("failed to sign assertion: {e}")))
}

/// Exchanges the service account key for an access token.
pub async fn fetch_access_token(
    client: &reqwest::Client,
    account: &ServiceAccount,
) -> Result<String, StoreError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| StoreError::Unauthorized(format!("system clock error: {e}")))?
        .as_secs();
    let jwt = sign_assertion(account, now)?;

    let params = [
        ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
        ("assertion", jwt.as_str()),
    ];
    let response = client
        .post(&account.token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| StoreError::Unauthorized(format!("token request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Unauthorized(format!(
            "token endpoint rejected credential ({status}): {body}"
        )));
    }

    let token: AccessToken = response
        .json()
        .await
        .map_err(|e| StoreError::Unauthorized(format!("invalid token response: {e}")))?;
    tracing::debug!(
        client_email = %account.client_email,
        expires_in = ?token.expires_in,
        "Obtained GCS access token"
    );
    Ok(token.access_token)
}
