use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{AuthError, UserIdentity};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserIdentity, AuthError>;
}

/// Google encodes some tokeninfo claims as strings, others as JSON scalars.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl ClaimValue {
    fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0,
            Self::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(_) => None,
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    pub aud: String,
    pub iss: String,
    pub email: Option<String>,
    pub email_verified: Option<ClaimValue>,
    pub exp: Option<ClaimValue>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Checks audience, issuer, expiry and e-mail verification.
pub fn validate_claims(
    claims: IdTokenClaims,
    client_id: &str,
    now_unix: i64,
) -> Result<UserIdentity, AuthError> {
    if claims.aud != client_id {
        return Err(AuthError::InvalidToken("audience mismatch".to_string()));
    }
    if !ISSUERS.contains(&claims.iss.as_str()) {
        return Err(AuthError::InvalidToken(format!(
            "unexpected issuer {}",
            claims.iss
        )));
    }
    match claims.exp.as_ref().and_then(ClaimValue::as_i64) {
        Some(exp) if exp > now_unix => {}
        Some(_) => return Err(AuthError::InvalidToken("token expired".to_string())),
        None => return Err(AuthError::InvalidToken("missing expiry".to_string())),
    }
    let email = claims
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AuthError::InvalidToken("missing email".to_string()))?;
    if !claims.email_verified.as_ref().is_some_and(ClaimValue::as_bool) {
        return Err(AuthError::InvalidToken("email not verified".to_string()));
    }
    Ok(UserIdentity {
        name: claims.name.unwrap_or_else(|| email.clone()),
        email,
        picture: claims.picture,
    })
}

pub struct GoogleIdTokenVerifier {
    http: Client,
    client_id: String,
}

impl GoogleIdTokenVerifier {
    pub fn new(client_id: String) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Upstream(e.to_string()))?;
        Ok(Self { http, client_id })
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;
        let status = response.status();
        if status.is_client_error() {
            debug!("tokeninfo rejected token with {status}");
            return Err(AuthError::InvalidToken("token rejected by Google".to_string()));
        }
        if !status.is_success() {
            warn!("tokeninfo returned {status}");
            return Err(AuthError::Upstream(format!("tokeninfo returned {status}")));
        }
        let claims = response
            .json::<IdTokenClaims>()
            .await
            .map_err(|e| AuthError::InvalidToken(format!("unreadable claims: {e}")))?;
        validate_claims(claims, &self.client_id, chrono::Utc::now().timestamp())
    }
}

/// Used when `GOOGLE_CLIENT_ID` is not set.
pub struct DisabledSignIn;

#[async_trait]
impl IdTokenVerifier for DisabledSignIn {
    async fn verify(&self, _token: &str) -> Result<UserIdentity, AuthError> {
        Err(AuthError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_claims, IdTokenClaims};
    use crate::auth::AuthError;
    use serde_json::json;

    const NOW: i64 = 1_800_000_000;

    fn claims(value: serde_json::Value) -> IdTokenClaims {
        serde_json::from_value(value).expect("claims")
    }

    fn base() -> serde_json::Value {
        json!({
          "aud": "client-1",
          "iss": "https://accounts.google.com",
          "email": "ada@example.com",
          "email_verified": "true",
          "exp": (NOW + 600).to_string(),
          "name": "Ada Lovelace",
          "picture": "https://example.com/ada.png"
        })
    }

    #[test]
    fn accepts_tokeninfo_string_claims() {
        let user = validate_claims(claims(base()), "client-1", NOW).expect("valid");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.picture.as_deref(), Some("https://example.com/ada.png"));
    }

    #[test]
    fn rejects_wrong_audience_and_expired_tokens() {
        assert!(matches!(
            validate_claims(claims(base()), "other", NOW),
            Err(AuthError::InvalidToken(_))
        ));

        let mut expired = base();
        expired["exp"] = json!(NOW - 1);
        assert!(matches!(
            validate_claims(claims(expired), "client-1", NOW),
            Err(AuthError::InvalidToken(ref m)) if m == "token expired"
        ));
    }

    #[test]
    fn rejects_unverified_email_and_foreign_issuer() {
        let mut unverified = base();
        unverified["email_verified"] = json!(false);
        assert!(validate_claims(claims(unverified), "client-1", NOW).is_err());

        let mut foreign = base();
        foreign["iss"] = json!("https://evil.example.com");
        assert!(validate_claims(claims(foreign), "client-1", NOW).is_err());
    }

    #[test]
    fn name_falls_back_to_email() {
        let mut anonymous = base();
        anonymous.as_object_mut().expect("object").remove("name");
        let user = validate_claims(claims(anonymous), "client-1", NOW).expect("valid");
        assert_eq!(user.name, "ada@example.com");
    }
}
