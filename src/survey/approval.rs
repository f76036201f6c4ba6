use thiserror::Error;

use super::transitions::{check_transition, TransitionError};
use super::types::{Survey, SurveyStatus};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("Survey is already approved")]
    AlreadyApproved,

    #[error("Survey is archived and cannot be approved")]
    Archived,

    #[error("Survey has no Google Form URL; create the form before approving")]
    MissingFormReference,

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Checks approval preconditions and stamps the survey as approved.
///
/// Precondition order matters for the reported error: an approved survey is
/// reported as such even when it also lacks a form.
pub fn validate_and_apply_approval(
    mut survey: Survey,
    approver: &str,
    approved_at: &str,
) -> Result<Survey, ApprovalError> {
    match survey.status {
        SurveyStatus::Approved => return Err(ApprovalError::AlreadyApproved),
        SurveyStatus::Archived => return Err(ApprovalError::Archived),
        SurveyStatus::Draft | SurveyStatus::PendingApproval => {}
    }
    if !survey.has_form() {
        return Err(ApprovalError::MissingFormReference);
    }
    check_transition(survey.status, SurveyStatus::Approved)?;

    survey.status = SurveyStatus::Approved;
    survey.approved_at = Some(approved_at.to_string());
    survey.approver = Some(approver.to_string());
    Ok(survey)
}
