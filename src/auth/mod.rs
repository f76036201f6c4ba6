pub mod extract;
pub mod session;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use extract::{CurrentUser, MaybeUser};
pub use session::{SessionStore, SESSION_COOKIE};

/// Who is signed in, as reported by Google.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid Google token: {0}")]
    InvalidToken(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Google Sign-In is not configured")]
    NotConfigured,

    #[error("Could not reach Google to verify the token: {0}")]
    Upstream(String),
}
