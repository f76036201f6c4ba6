use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::session::expired_cookie;
use crate::auth::{AuthError, MaybeUser};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GoogleToken {
    token: String,
}

pub async fn google_login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GoogleToken>,
) -> Result<impl IntoResponse, ApiError> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken("empty token".to_string()).into());
    }
    let user = state.verifier.verify(token).await?;
    info!("User verified: {}", user.email);

    let session = state.sessions.create(user.clone()).await;
    Ok((
        [(SET_COOKIE, state.sessions.cookie(&session))],
        Json(json!({
          "message": "Login successful",
          "user": user,
        })),
    ))
}

pub async fn current_user_handler(MaybeUser { user, .. }: MaybeUser) -> Json<Value> {
    match user {
        Some(user) => Json(json!({ "user": user })),
        None => Json(json!({
          "user": null,
          "message": "No active session. Please log in.",
        })),
    }
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    MaybeUser { token, .. }: MaybeUser,
) -> impl IntoResponse {
    if let Some(token) = token {
        state.sessions.remove(&token).await;
    }
    (
        [(SET_COOKIE, expired_cookie())],
        Json(json!({ "message": "Logged out" })),
    )
}

#[cfg(test)]
mod tests {
    use crate::auth::AuthError;
    use crate::google::forms::MockFormCreator;
    use crate::google::id_token::MockIdTokenVerifier;
    use crate::notify::MockNotifier;
    use crate::routes::router;
    use crate::routes::test_support::{ada, json_body, login, request, state, state_with};
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let mut verifier = MockIdTokenVerifier::new();
        verifier
            .expect_verify()
            .withf(|token| token == "google-id-token")
            .returning(|_| Ok(ada()));
        let state = state_with(MockFormCreator::new(), MockNotifier::new(), verifier);

        let response = router(state.clone())
            .oneshot(request(
                "POST",
                "/auth/google",
                None,
                Some(json!({ "token": "google-id-token" })),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .expect("cookie")
            .to_string();
        assert!(cookie.starts_with("session_token="));
        assert!(cookie.contains("HttpOnly"));
        let body = json_body(response).await;
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["email"], "ada@example.com");

        let token = cookie
            .trim_start_matches("session_token=")
            .split(';')
            .next()
            .expect("token");
        assert_eq!(state.sessions.lookup(token).await, Some(ada()));
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let mut verifier = MockIdTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Err(AuthError::InvalidToken("audience mismatch".to_string())));
        let state = state_with(MockFormCreator::new(), MockNotifier::new(), verifier);

        let response = router(state)
            .oneshot(request("POST", "/auth/google", None, Some(json!({ "token": "bad" }))))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().expect("detail").contains("audience mismatch"));
    }

    #[tokio::test]
    async fn current_user_with_and_without_session() {
        let state = state();
        let cookie = login(&state).await;

        let anonymous = router(state.clone())
            .oneshot(request("GET", "/auth/user", None, None))
            .await
            .expect("response");
        let body = json_body(anonymous).await;
        assert!(body["user"].is_null());
        assert!(body["message"].is_string());

        let signed_in = router(state)
            .oneshot(request("GET", "/auth/user", Some(&cookie), None))
            .await
            .expect("response");
        assert_eq!(json_body(signed_in).await["user"]["name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn logout_drops_the_session() {
        let state = state();
        let cookie = login(&state).await;

        let response = router(state.clone())
            .oneshot(request("POST", "/auth/logout", Some(&cookie), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("Max-Age=0")));

        let token = cookie.trim_start_matches("session_token=");
        assert_eq!(state.sessions.lookup(token).await, None);
    }
}
