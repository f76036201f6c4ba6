use std::env;
use std::fmt::Display;
use std::fs::read_to_string;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::google::oauth::RefreshCredentials;
use crate::notify::SmtpSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// How the backend authenticates against the Forms and Drive APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormsCredentials {
    AccessToken(String),
    Refresh(RefreshCredentials),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub google_client_id: Option<String>,
    pub session_ttl_hours: i64,
    /// `None` keeps surveys in memory only.
    pub database_path: Option<PathBuf>,
    pub smtp: Option<SmtpSettings>,
    pub forms: Option<FormsCredentials>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| var(key).or_else(|| read_secret(key)))
    }

    /// Builds the config from any key lookup; `load` uses the environment
    /// with `/run/secrets` as fallback.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_ttl_hours: i64 = try_load(&lookup, "SESSION_TTL_HOURS", "24")?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_HOURS",
                value: session_ttl_hours.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            host: try_load(&lookup, "HOST", "127.0.0.1")?,
            port: try_load(&lookup, "PORT", "8000")?,
            allowed_origins: try_load::<String, _>(&lookup, "ALLOWED_ORIGINS", "http://localhost:3000")?
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            google_client_id: optional(&lookup, "GOOGLE_CLIENT_ID"),
            session_ttl_hours,
            database_path: optional(&lookup, "DATABASE_PATH").map(PathBuf::from),
            smtp: smtp_settings(&lookup)?,
            forms: forms_credentials(&lookup),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn smtp_settings<F>(lookup: &F) -> Result<Option<SmtpSettings>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (Some(user), Some(password)) = (
        optional(lookup, "SMTP_USER"),
        optional(lookup, "SMTP_PASSWORD"),
    ) else {
        warn!("SMTP_USER or SMTP_PASSWORD not set, approval emails are disabled");
        return Ok(None);
    };
    Ok(Some(SmtpSettings {
        host: try_load(lookup, "SMTP_HOST", "smtp.gmail.com")?,
        port: try_load(lookup, "SMTP_PORT", "587")?,
        user,
        password,
        from: optional(lookup, "SMTP_FROM"),
    }))
}

fn forms_credentials<F>(lookup: &F) -> Option<FormsCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let refresh = (
        optional(lookup, "GOOGLE_OAUTH_CLIENT_ID"),
        optional(lookup, "GOOGLE_OAUTH_CLIENT_SECRET"),
        optional(lookup, "GOOGLE_OAUTH_REFRESH_TOKEN"),
    );
    if let (Some(client_id), Some(client_secret), Some(refresh_token)) = refresh {
        return Some(FormsCredentials::Refresh(RefreshCredentials {
            client_id,
            client_secret,
            refresh_token,
        }));
    }
    if let Some(token) = optional(lookup, "GOOGLE_ACCESS_TOKEN") {
        return Some(FormsCredentials::AccessToken(token));
    }
    warn!("No Google OAuth credentials set, surveys are stored without forms");
    None
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = optional(lookup, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }
    })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            debug!("No secret file for {secret_name}: {e}");
        })
        .ok()
}
