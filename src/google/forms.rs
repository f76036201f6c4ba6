use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ExternalServiceError;
use crate::questions::{Question, QuestionType};
use crate::survey::types::FormReference;

use super::oauth::AccessTokenSource;

const FORMS_API: &str = "https://forms.googleapis.com/v1";
const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
const SERVICE: &str = "Google Forms";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    /// Shared as writer so the form shows up in the creator's Drive.
    pub owner_email: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormCreator: Send + Sync {
    async fn create_form(&self, request: &FormRequest)
        -> Result<FormReference, ExternalServiceError>;
}

/// Used when no Google credentials are configured.
pub struct DisabledForms;

#[async_trait]
impl FormCreator for DisabledForms {
    async fn create_form(
        &self,
        _request: &FormRequest,
    ) -> Result<FormReference, ExternalServiceError> {
        Err(ExternalServiceError::new(
            SERVICE,
            "Google Forms integration is not configured",
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedForm {
    form_id: String,
    responder_uri: String,
}

pub struct GoogleFormsClient {
    http: Client,
    tokens: AccessTokenSource,
}

impl GoogleFormsClient {
    pub fn new(tokens: AccessTokenSource) -> Result<Self, ExternalServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExternalServiceError::new(SERVICE, e.to_string()))?;
        Ok(Self { http, tokens })
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<T, ExternalServiceError> {
        let token = self.tokens.access_token(&self.http).await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(|e| ExternalServiceError::new(SERVICE, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExternalServiceError::new(
                SERVICE,
                format!("{url} returned {status}: {}", detail.trim()),
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ExternalServiceError::new(SERVICE, format!("unreadable response: {e}")))
    }

    async fn grant_permission(&self, form_id: &str, permission: Value, notify: bool) {
        let url = format!("{DRIVE_API}/files/{form_id}/permissions");
        let notify = if notify { "true" } else { "false" };
        let result = self
            .post_json::<Value>(
                &url,
                &[("fields", "id"), ("sendNotificationEmail", notify)],
                &permission,
            )
            .await;
        if let Err(err) = result {
            warn!("Could not update sharing for form {form_id}: {err}");
        }
    }
}

#[async_trait]
impl FormCreator for GoogleFormsClient {
    async fn create_form(
        &self,
        request: &FormRequest,
    ) -> Result<FormReference, ExternalServiceError> {
        let created: CreatedForm = self
            .post_json(&format!("{FORMS_API}/forms"), &[], &create_form_body(&request.title))
            .await?;
        info!("Created form '{}' ({})", request.title, created.form_id);

        let update = batch_update_body(&request.description, &request.questions);
        if update["requests"].as_array().is_some_and(|r| !r.is_empty()) {
            self.post_json::<Value>(
                &format!("{FORMS_API}/forms/{}:batchUpdate", created.form_id),
                &[],
                &update,
            )
            .await?;
            info!(
                "Added {} questions to form {}",
                request.questions.len(),
                created.form_id
            );
        }

        // Sharing is best effort; the form is usable without it.
        self.grant_permission(&created.form_id, public_permission(), false)
            .await;
        if let Some(email) = request.owner_email.as_deref() {
            self.grant_permission(&created.form_id, owner_permission(email), false)
                .await;
        }

        Ok(FormReference {
            edit_url: edit_url(&created.form_id),
            form_id: created.form_id,
            form_url: created.responder_uri,
        })
    }
}

pub fn edit_url(form_id: &str) -> String {
    format!("https://docs.google.com/forms/d/{form_id}/edit")
}

/// `forms.create` only accepts the title; everything else goes through
/// `batchUpdate`.
pub fn create_form_body(title: &str) -> Value {
    json!({
      "info": {
        "title": title,
        "documentTitle": title,
      }
    })
}

pub fn batch_update_body(description: &str, questions: &[Question]) -> Value {
    let mut requests: Vec<Value> = Vec::new();
    if !description.trim().is_empty() {
        requests.push(json!({
          "updateFormInfo": {
            "info": { "description": description },
            "updateMask": "description",
          }
        }));
    }
    for (idx, question) in questions.iter().enumerate() {
        requests.push(create_item_request(idx, question));
    }
    json!({ "requests": requests })
}

pub fn create_item_request(idx: usize, question: &Question) -> Value {
    let mut body = json!({ "required": question.required });
    match question.question_type {
        QuestionType::Text => body["textQuestion"] = json!({ "paragraph": false }),
        QuestionType::Paragraph => body["textQuestion"] = json!({ "paragraph": true }),
        QuestionType::MultipleChoice => body["choiceQuestion"] = choice_body("RADIO", question),
        QuestionType::Checkbox => body["choiceQuestion"] = choice_body("CHECKBOX", question),
        QuestionType::Dropdown => body["choiceQuestion"] = choice_body("DROP_DOWN", question),
    }

    let title = if question.title.trim().is_empty() {
        format!("Question {}", idx + 1)
    } else {
        question.title.clone()
    };

    json!({
      "createItem": {
        "item": {
          "title": title,
          "questionItem": { "question": body },
        },
        "location": { "index": idx },
      }
    })
}

fn choice_body(kind: &str, question: &Question) -> Value {
    let options = question
        .options
        .iter()
        .map(|o| json!({ "value": o }))
        .collect::<Vec<Value>>();
    json!({ "type": kind, "options": options })
}

fn public_permission() -> Value {
    json!({ "type": "anyone", "role": "reader" })
}

fn owner_permission(email: &str) -> Value {
    json!({ "type": "user", "role": "writer", "emailAddress": email })
}
