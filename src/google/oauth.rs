use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ExternalServiceError;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Refresh this long before Google's stated expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Where the Forms/Drive bearer token comes from.
#[derive(Debug)]
pub enum AccessTokenSource {
    /// A pre-issued token, used as is until Google rejects it.
    Static(String),
    /// OAuth 2.0 installed-app credentials, exchanged for short-lived tokens.
    Refresh {
        credentials: RefreshCredentials,
        cached: Mutex<Option<CachedToken>>,
    },
}

impl AccessTokenSource {
    pub fn refreshing(credentials: RefreshCredentials) -> Self {
        Self::Refresh {
            credentials,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self, http: &Client) -> Result<String, ExternalServiceError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Refresh {
                credentials,
                cached,
            } => {
                let mut cached = cached.lock().await;
                if let Some(token) = cached.as_ref() {
                    if token.expires_at > Utc::now() {
                        return Ok(token.value.clone());
                    }
                }
                let fresh = exchange_refresh_token(http, credentials).await?;
                let value = fresh.value.clone();
                *cached = Some(fresh);
                Ok(value)
            }
        }
    }
}

async fn exchange_refresh_token(
    http: &Client,
    credentials: &RefreshCredentials,
) -> Result<CachedToken, ExternalServiceError> {
    debug!("Refreshing Google OAuth access token");
    let response = http
        .post(TOKEN_URL)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .map_err(|e| ExternalServiceError::new("Google OAuth", e.to_string()))?;
    if !response.status().is_success() {
        return Err(ExternalServiceError::new(
            "Google OAuth",
            format!("token refresh failed with status {}", response.status()),
        ));
    }
    let body = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| ExternalServiceError::new("Google OAuth", format!("unreadable token response: {e}")))?;
    Ok(cache_entry(body, Utc::now()))
}

fn cache_entry(body: TokenResponse, now: DateTime<Utc>) -> CachedToken {
    let lifetime = body.expires_in.unwrap_or(3600) - EXPIRY_MARGIN_SECS;
    CachedToken {
        value: body.access_token,
        expires_at: now + Duration::seconds(lifetime.max(0)),
    }
}
