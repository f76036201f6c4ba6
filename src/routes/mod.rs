pub mod auth;
pub mod surveys;

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let origins = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!("Ignoring invalid CORS origin {origin}: {e}"))
                .ok()
        })
        .collect::<Vec<HeaderValue>>();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(health_handler))
        .route("/auth/google", post(auth::google_login_handler))
        .route("/auth/user", get(auth::current_user_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/surveys",
            get(surveys::list_handler).post(surveys::create_handler),
        )
        .route("/questions/preview", post(surveys::preview_handler))
        .route(
            "/surveys/{id}",
            get(surveys::get_handler)
                .patch(surveys::update_handler)
                .delete(surveys::delete_handler),
        )
        .route("/surveys/{id}/approve", post(surveys::approve_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "Backend is running" }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, Response};
    use http_body_util::BodyExt;
    use serde_json::Value;

    use crate::auth::UserIdentity;
    use crate::config::Config;
    use crate::google::forms::MockFormCreator;
    use crate::google::id_token::MockIdTokenVerifier;
    use crate::notify::MockNotifier;
    use crate::state::AppState;
    use crate::store::MemorySurveyStore;
    use crate::survey::types::FormReference;
    use crate::survey::SurveyService;

    pub fn config() -> Config {
        Config::from_lookup(|_| None).expect("config")
    }

    pub fn form() -> FormReference {
        FormReference {
            form_id: "f1".to_string(),
            form_url: "https://docs.google.com/forms/d/e/f1/viewform".to_string(),
            edit_url: "https://docs.google.com/forms/d/f1/edit".to_string(),
        }
    }

    pub fn ada() -> UserIdentity {
        UserIdentity {
            email: "ada@example.com".to_string(),
            name: "Ada Lovelace".to_string(),
            picture: None,
        }
    }

    pub fn state_with(
        forms: MockFormCreator,
        notifier: MockNotifier,
        verifier: MockIdTokenVerifier,
    ) -> Arc<AppState> {
        let surveys = SurveyService::new(
            Arc::new(MemorySurveyStore::new()),
            Arc::new(forms),
            Arc::new(notifier),
        );
        AppState::new(config(), surveys, Arc::new(verifier))
    }

    pub fn state() -> Arc<AppState> {
        let mut forms = MockFormCreator::new();
        forms.expect_create_form().returning(|_| Ok(form()));
        let mut notifier = MockNotifier::new();
        notifier.expect_send_approval().returning(|_| true);
        state_with(forms, notifier, MockIdTokenVerifier::new())
    }

    pub async fn login(state: &AppState) -> String {
        let token = state.sessions.create(ada()).await;
        format!("session_token={token}")
    }

    pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    pub async fn json_body(response: Response<Body>) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json")
    }
}

#[cfg(test)]
mod tests {
    use super::router;
    use super::test_support::{json_body, request, state};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_check_reports_running() {
        let response = router(state())
            .oneshot(request("GET", "/", None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "Backend is running");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_with_credentials() {
        let req = axum::http::Request::builder()
            .method("OPTIONS")
            .uri("/surveys")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "POST")
            .body(axum::body::Body::empty())
            .expect("request");
        let response = router(state()).oneshot(req).await.expect("response");
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").map(|v| v.as_bytes()),
            Some(&b"http://localhost:3000"[..])
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").map(|v| v.as_bytes()),
            Some(&b"true"[..])
        );
    }
}
