use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ExternalServiceError};
use crate::google::forms::{FormCreator, FormRequest};
use crate::notify::{ApprovalNotice, Notifier};
use crate::questions::{parse_questions, Question};
use crate::store::SurveyRepository;
use crate::util::text::non_empty;

use super::approval::{validate_and_apply_approval, ApprovalError};
use super::transitions::{check_transition, TransitionError};
use super::types::{NewSurvey, Survey, SurveyFilter, SurveyPage, SurveyPatch, SurveyStatus, WarningItem};

pub const FORM_CREATION_FAILED: &str = "FORM_CREATION_FAILED";
pub const EMAIL_NOT_SENT: &str = "EMAIL_NOT_SENT";

#[derive(Debug, Clone)]
pub struct CreatedSurvey {
    pub survey: Survey,
    pub questions_parsed: Vec<Question>,
    pub warnings: Vec<WarningItem>,
}

#[derive(Debug, Clone, Default)]
pub struct ApprovalRequest {
    pub recipient_email: Option<String>,
    pub custom_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub survey: Survey,
    pub email_sent: bool,
    pub warnings: Vec<WarningItem>,
}

/// Survey lifecycle on top of the injected store, forms and mail capabilities.
pub struct SurveyService {
    store: Arc<dyn SurveyRepository>,
    forms: Arc<dyn FormCreator>,
    notifier: Arc<dyn Notifier>,
}

impl SurveyService {
    pub fn new(
        store: Arc<dyn SurveyRepository>,
        forms: Arc<dyn FormCreator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            forms,
            notifier,
        }
    }

    pub async fn create(&self, new: NewSurvey) -> Result<CreatedSurvey, ApiError> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::BadRequest("Title is required".to_string()));
        }
        let questions_text = non_empty(new.questions.as_deref());
        let questions_parsed = match questions_text.as_deref() {
            Some(raw) => parse_questions(raw)?,
            None => Vec::new(),
        };

        let request = FormRequest {
            title: title.clone(),
            description: new.description.clone(),
            questions: questions_parsed.clone(),
            owner_email: new.owner_email.clone(),
        };
        let mut warnings = Vec::new();
        let form = match self.forms.create_form(&request).await {
            Ok(form) => Some(form),
            Err(err) => {
                warn!("Form creation failed for '{title}': {err}");
                warnings.push(external_warning(
                    FORM_CREATION_FAILED,
                    "Survey saved without a Google Form",
                    &err,
                ));
                None
            }
        };

        let survey = Survey {
            id: Uuid::new_v4().to_string(),
            title,
            description: new.description,
            questions: questions_text,
            status: SurveyStatus::Draft,
            created_at: Utc::now().to_rfc3339(),
            approved_at: None,
            response_count: 0,
            approver: None,
            form,
            created_by: new.created_by,
        };
        self.store.insert(survey.clone()).await?;
        info!(
            "Created survey {} with {} questions",
            survey.id,
            questions_parsed.len()
        );

        Ok(CreatedSurvey {
            survey,
            questions_parsed,
            warnings,
        })
    }

    pub async fn list(
        &self,
        filter: SurveyFilter,
        skip: usize,
        limit: usize,
    ) -> Result<SurveyPage, ApiError> {
        Ok(self.store.list(filter, skip, limit).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Survey, ApiError> {
        self.store.get(id).await?.ok_or(ApiError::NotFound)
    }

    pub async fn update(&self, id: &str, patch: SurveyPatch) -> Result<Survey, ApiError> {
        let mut survey = self.get(id).await?;
        let read_status = survey.status;

        if let Some(requested) = patch.status.as_deref() {
            let target = requested.trim().parse::<SurveyStatus>()?;
            if target == SurveyStatus::Approved {
                return Err(TransitionError::ApprovalRequired.into());
            }
            check_transition(survey.status, target)?;
            survey.status = target;
        }
        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
            }
            survey.title = title;
        }
        if let Some(description) = patch.description {
            survey.description = description;
        }
        if let Some(questions) = patch.questions {
            let questions = non_empty(Some(&questions));
            if let Some(raw) = questions.as_deref() {
                parse_questions(raw)?;
            }
            survey.questions = questions;
        }

        if !self.store.update_if_status(survey.clone(), read_status).await? {
            return Err(self.concurrent_change(id).await);
        }
        info!("Updated survey {} ({})", survey.id, survey.status);
        Ok(survey)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        if self.store.delete(id).await? {
            info!("Deleted survey {id}");
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }

    /// Approves and then notifies. A failed notification is reported, never
    /// rolled back.
    pub async fn approve(
        &self,
        id: &str,
        approver: &str,
        request: ApprovalRequest,
    ) -> Result<ApprovalOutcome, ApiError> {
        let survey = self.get(id).await?;
        let read_status = survey.status;
        let approved = validate_and_apply_approval(survey, approver, &Utc::now().to_rfc3339())?;
        if !self.store.update_if_status(approved.clone(), read_status).await? {
            return Err(self.lost_approval(id).await);
        }
        info!("Survey {} approved by {approver}", approved.id);

        let recipient = non_empty(request.recipient_email.as_deref())
            .unwrap_or_else(|| approved.created_by.clone());
        let notice = ApprovalNotice {
            recipient: recipient.clone(),
            survey_title: approved.title.clone(),
            form_url: approved
                .form
                .as_ref()
                .map(|f| f.form_url.clone())
                .unwrap_or_default(),
            approver: approver.to_string(),
            custom_message: non_empty(request.custom_message.as_deref()),
        };
        let email_sent = self.notifier.send_approval(&notice).await;

        let mut warnings = Vec::new();
        if !email_sent {
            warnings.push(WarningItem {
                code: EMAIL_NOT_SENT.to_string(),
                message: "Survey approved but the notification email was not sent".to_string(),
                details: json!({ "recipient": recipient }),
            });
        }

        Ok(ApprovalOutcome {
            survey: approved,
            email_sent,
            warnings,
        })
    }
}

impl SurveyService {
    /// Explains a conditional write that matched nothing.
    async fn concurrent_change(&self, id: &str) -> ApiError {
        match self.store.get(id).await {
            Ok(None) => ApiError::NotFound,
            Ok(Some(_)) => ApiError::Conflict(id.to_string()),
            Err(err) => err.into(),
        }
    }

    /// Another request changed the survey between the approval check and
    /// the write.
    async fn lost_approval(&self, id: &str) -> ApiError {
        match self.store.get(id).await {
            Ok(None) => ApiError::NotFound,
            Ok(Some(current)) => match current.status {
                SurveyStatus::Approved => ApprovalError::AlreadyApproved.into(),
                SurveyStatus::Archived => ApprovalError::Archived.into(),
                SurveyStatus::Draft | SurveyStatus::PendingApproval => {
                    ApiError::Conflict(id.to_string())
                }
            },
            Err(err) => err.into(),
        }
    }
}

fn external_warning(code: &str, message: &str, err: &ExternalServiceError) -> WarningItem {
    WarningItem {
        code: code.to_string(),
        message: message.to_string(),
        details: json!({ "service": err.service, "reason": err.reason }),
    }
}
