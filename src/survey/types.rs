use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::transitions::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurveyStatus {
    Draft,
    PendingApproval,
    Approved,
    Archived,
}

impl SurveyStatus {
    pub const ALL: [SurveyStatus; 4] = [
        Self::Draft,
        Self::PendingApproval,
        Self::Approved,
        Self::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending-approval",
            Self::Approved => "approved",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurveyStatus {
    type Err = TransitionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| TransitionError::UnknownStatus(value.to_string()))
    }
}

/// Link to the Google Form generated for a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormReference {
    pub form_id: String,
    pub form_url: String,
    pub edit_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Option<String>,
    pub status: SurveyStatus,
    pub created_at: String,
    pub approved_at: Option<String>,
    pub response_count: u32,
    pub approver: Option<String>,
    #[serde(flatten)]
    pub form: Option<FormReference>,
    pub created_by: String,
}

impl Survey {
    pub fn has_form(&self) -> bool {
        self.form
            .as_ref()
            .is_some_and(|f| !f.form_id.trim().is_empty() && !f.form_url.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct NewSurvey {
    pub title: String,
    pub description: String,
    pub questions: Option<String>,
    pub created_by: String,
    pub owner_email: Option<String>,
}

/// Client-supplied partial update. Approval fields, ids and timestamps are
/// not client writable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurveyFilter {
    pub status: Option<SurveyStatus>,
}

impl SurveyFilter {
    pub fn matches(&self, survey: &Survey) -> bool {
        self.status.map_or(true, |s| survey.status == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyPage {
    pub surveys: Vec<Survey>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningItem {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::{FormReference, Survey, SurveyStatus};
    use crate::survey::transitions::TransitionError;

    fn survey() -> Survey {
        Survey {
            id: "s1".to_string(),
            title: "Lunch".to_string(),
            description: String::new(),
            questions: None,
            status: SurveyStatus::PendingApproval,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            approved_at: None,
            response_count: 0,
            approver: None,
            form: Some(FormReference {
                form_id: "f1".to_string(),
                form_url: "https://docs.google.com/forms/d/e/f1/viewform".to_string(),
                edit_url: "https://docs.google.com/forms/d/f1/edit".to_string(),
            }),
            created_by: "owner@example.com".to_string(),
        }
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in SurveyStatus::ALL {
            assert_eq!(status.as_str().parse::<SurveyStatus>(), Ok(status));
        }
        assert_eq!(
            "Approved".parse::<SurveyStatus>(),
            Err(TransitionError::UnknownStatus("Approved".to_string()))
        );
    }

    #[test]
    fn survey_json_uses_frontend_field_names() {
        let value = serde_json::to_value(survey()).expect("json");
        assert_eq!(value["status"], "pending-approval");
        assert_eq!(value["createdAt"], "2026-01-01T00:00:00+00:00");
        assert_eq!(value["form_url"], "https://docs.google.com/forms/d/e/f1/viewform");
        assert!(value["approvedAt"].is_null());
        assert!(value.get("form").is_none());
    }

    #[test]
    fn blank_form_reference_does_not_count() {
        let mut s = survey();
        assert!(s.has_form());
        s.form = Some(FormReference {
            form_id: " ".to_string(),
            form_url: String::new(),
            edit_url: String::new(),
        });
        assert!(!s.has_form());
        s.form = None;
        assert!(!s.has_form());
    }
}
