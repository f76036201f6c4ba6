//! Survey records, their status lifecycle and the service tying them to
//! storage, Google Forms and email.

pub mod approval;
pub mod service;
pub mod transitions;
pub mod types;

pub use approval::{validate_and_apply_approval, ApprovalError};
pub use service::{ApprovalOutcome, ApprovalRequest, CreatedSurvey, SurveyService};
pub use transitions::{check_transition, is_transition_allowed, TransitionError};
pub use types::{FormReference, NewSurvey, Survey, SurveyFilter, SurveyPage, SurveyPatch, SurveyStatus, WarningItem};
