use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::questions::{parse_questions, Question};
use crate::state::AppState;
use crate::survey::types::{NewSurvey, Survey, SurveyFilter, SurveyPatch, SurveyStatus, WarningItem};
use crate::survey::ApprovalRequest;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

/// Questions arrive either as pasted text or as an already structured array.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum QuestionsInput {
    Text(String),
    Structured(Value),
}

impl QuestionsInput {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Structured(value) => value.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    status: Option<String>,
    skip: Option<String>,
    limit: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateSurveyBody {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    questions: Option<QuestionsInput>,
}

#[derive(Deserialize)]
pub struct PreviewBody {
    questions: QuestionsInput,
}

#[derive(Deserialize, Default)]
pub struct ApproveBody {
    #[serde(default)]
    recipient_email: Option<String>,
    #[serde(default)]
    custom_message: Option<String>,
}

#[derive(Serialize)]
struct SurveyListResponse {
    surveys: Vec<Survey>,
    total: usize,
    skip: usize,
    limit: usize,
}

#[derive(Serialize)]
struct CreateSurveyResponse {
    #[serde(flatten)]
    survey: Survey,
    questions_parsed: Vec<Question>,
    warnings: Vec<WarningItem>,
}

#[derive(Serialize)]
struct ApproveResponse {
    #[serde(flatten)]
    survey: Survey,
    email_sent: bool,
    warnings: Vec<WarningItem>,
}

fn parse_count(key: &str, value: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("{key} must be a non-negative integer"))),
        None => Ok(default),
    }
}

fn status_filter(value: Option<&str>) -> Result<SurveyFilter, ApiError> {
    let status = match value.map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(raw.parse::<SurveyStatus>()?),
    };
    Ok(SurveyFilter { status })
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = status_filter(query.status.as_deref())?;
    let skip = parse_count("skip", query.skip.as_deref(), 0)?;
    let limit = parse_count("limit", query.limit.as_deref(), DEFAULT_LIMIT)?;
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let page = state.surveys.list(filter, skip, limit).await?;
    Ok(Json(SurveyListResponse {
        surveys: page.surveys,
        total: page.total,
        skip,
        limit,
    }))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateSurveyBody>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .surveys
        .create(NewSurvey {
            title: body.title,
            description: body.description.unwrap_or_default(),
            questions: body.questions.map(QuestionsInput::into_text),
            owner_email: Some(user.email.clone()),
            created_by: user.email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSurveyResponse {
            survey: created.survey,
            questions_parsed: created.questions_parsed,
            warnings: created.warnings,
        }),
    ))
}

pub async fn preview_handler(
    _user: CurrentUser,
    Json(body): Json<PreviewBody>,
) -> Result<impl IntoResponse, ApiError> {
    let questions = parse_questions(&body.questions.into_text())?;
    Ok(Json(json!({
      "count": questions.len(),
      "questions": questions,
    })))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.surveys.get(&id).await?))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<SurveyPatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.surveys.update(&id, patch).await?))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.surveys.delete(&id).await?;
    Ok(Json(json!({ "message": "Survey deleted" })))
}

pub async fn approve_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<ApproveBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .surveys
        .approve(
            &id,
            &user.name,
            ApprovalRequest {
                recipient_email: body.recipient_email,
                custom_message: body.custom_message,
            },
        )
        .await?;

    Ok(Json(ApproveResponse {
        survey: outcome.survey,
        email_sent: outcome.email_sent,
        warnings: outcome.warnings,
    }))
}
