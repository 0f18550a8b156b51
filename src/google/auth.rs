//! Service-account authentication for the Google APIs.
//!
//! Signs a short-lived RS256 assertion with the service account's private key
//! and trades it for an access token, which is cached until shortly before it
//! expires.

use crate::config::GoogleCredentials;
use crate::error::{RsvpError, RsvpResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::{debug, info};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/documents",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh a little early so a token never expires mid-request
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct Signer {
    client_email: String,
    key: EncodingKey,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

pub struct ServiceAccountAuth {
    client: reqwest::Client,
    signer: Option<Signer>,
    token: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Without credentials every token request fails with a configuration error.
    /// A key that is not a valid RSA PEM is rejected up front.
    pub fn new(client: reqwest::Client, credentials: Option<&GoogleCredentials>) -> anyhow::Result<Self> {
        let signer = match credentials {
            Some(creds) => {
                let key = EncodingKey::from_rsa_pem(creds.private_key.expose_secret().as_bytes())
                    .map_err(|e| anyhow::anyhow!("Invalid Google service account private key: {}", e))?;
                Some(Signer {
                    client_email: creds.client_email.clone(),
                    key,
                })
            }
            None => None,
        };

        Ok(Self {
            client,
            signer,
            token: Mutex::new(None),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.signer.is_some()
    }

    /// A valid bearer token, fetching a new one if the cached token is stale.
    pub async fn access_token(&self) -> RsvpResult<String> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            RsvpError::configuration(
                "Missing Google service account credentials. Set GOOGLE_SHEETS_CLIENT_EMAIL and GOOGLE_SHEETS_PRIVATE_KEY.",
            )
        })?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.value.clone());
        }

        debug!("Requesting Google access token for {}", signer.client_email);
        let fresh = self.fetch_token(signer).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        info!("Obtained Google access token for {}", signer.client_email);

        Ok(value)
    }

    async fn fetch_token(&self, signer: &Signer) -> RsvpResult<CachedToken> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &signer.client_email,
            scope: SCOPES.join(" "),
            aud: TOKEN_URL,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signer.key)
            .map_err(|e| RsvpError::configuration(format!("Failed to sign service account assertion: {}", e)))?;

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RsvpError::backing_store(format!(
                "Token request failed ({}): {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let auth = ServiceAccountAuth::new(reqwest::Client::new(), None).expect("no key to parse");
        assert!(!auth.is_configured());
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, RsvpError::Configuration(_)));
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        let creds = GoogleCredentials {
            client_email: "svc@example.iam.gserviceaccount.com".to_string(),
            private_key: "not a pem".to_string().into(),
        };
        assert!(ServiceAccountAuth::new(reqwest::Client::new(), Some(&creds)).is_err());
    }

    #[test]
    fn test_token_expiry_margin() {
        let soon = CachedToken {
            value: "t".to_string(),
            expires_at: Utc::now() + Duration::seconds(30),
        };
        assert!(soon.is_expired());
        let later = CachedToken {
            value: "t".to_string(),
            expires_at: Utc::now() + Duration::seconds(600),
        };
        assert!(!later.is_expired());
    }
}
