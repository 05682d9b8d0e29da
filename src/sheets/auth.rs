//! OAuth2 service-account flow: sign a JWT assertion with the account's
//! private key and trade it for a bearer token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::GoogleSettings;
use crate::error::SheetsError;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// refresh a little before Google considers the token expired
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Token source for one service account.
pub struct ServiceAccountAuth {
    client_email: Option<String>,
    private_key: Option<String>,
    token_uri: String,
    http: reqwest::Client,
    cached: RwLock<Option<AccessToken>>,
}

impl ServiceAccountAuth {
    pub fn new(settings: &GoogleSettings, http: reqwest::Client) -> Self {
        ServiceAccountAuth {
            client_email: settings.client_email.clone().filter(|e| !e.trim().is_empty()),
            private_key: settings
                .private_key
                .as_deref()
                .map(normalize_private_key)
                .filter(|k| !k.trim().is_empty()),
            token_uri: settings.token_uri.clone(),
            http,
            cached: RwLock::new(None),
        }
    }

    /// Bearer token for the spreadsheets scope, reusing the last one until
    /// it is about to expire.
    pub async fn access_token(&self) -> Result<String, SheetsError> {
        if let Some(token) = valid_token(self.cached.read().await.as_ref()) {
            return Ok(token);
        }

        // held across the exchange so concurrent callers wait for one token
        let mut cached = self.cached.write().await;
        if let Some(token) = valid_token(cached.as_ref()) {
            return Ok(token);
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetsError> {
        let client_email = self
            .client_email
            .as_deref()
            .ok_or(SheetsError::MissingCredentials("client email"))?;
        let private_key = self
            .private_key
            .as_deref()
            .ok_or(SheetsError::MissingCredentials("private key"))?;

        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| SheetsError::InvalidPrivateKey(e.to_string()))?;

        let claims = AssertionClaims {
            iss: client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SheetsError::InvalidPrivateKey(e.to_string()))
    }

    async fn exchange(&self) -> Result<AccessToken, SheetsError> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;

        log::debug!("Requesting access token from {}", self.token_uri);
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => format!("token endpoint returned {}", status),
            };
            log::error!("Token exchange rejected: {}", message);
            return Err(SheetsError::TokenExchange(message));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsError::TokenExchange(e.to_string()))?;

        Ok(AccessToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in - EXPIRY_MARGIN_SECS),
        })
    }
}

fn valid_token(cached: Option<&AccessToken>) -> Option<String> {
    cached
        .filter(|token| token.expires_at > Utc::now())
        .map(|token| token.token.clone())
}

/// Keys pasted into env files usually carry literal `\n` sequences.
pub fn normalize_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}
