use thiserror::Error;

use super::types::SurveyStatus;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Unknown survey status '{0}'")]
    UnknownStatus(String),

    #[error("Invalid status transition from '{from}' to '{to}'")]
    Illegal { from: SurveyStatus, to: SurveyStatus },

    #[error("Surveys can only be moved to 'approved' through the approve endpoint")]
    ApprovalRequired,
}

/// Destinations reachable from `from`. `archived` is terminal and no state
/// lists itself.
pub fn allowed_targets(from: SurveyStatus) -> &'static [SurveyStatus] {
    match from {
        SurveyStatus::Draft => &[
            SurveyStatus::PendingApproval,
            SurveyStatus::Approved,
            SurveyStatus::Archived,
        ],
        SurveyStatus::PendingApproval => &[
            SurveyStatus::Draft,
            SurveyStatus::Approved,
            SurveyStatus::Archived,
        ],
        SurveyStatus::Approved => &[SurveyStatus::Archived],
        SurveyStatus::Archived => &[],
    }
}

pub fn is_transition_allowed(from: SurveyStatus, to: SurveyStatus) -> bool {
    allowed_targets(from).contains(&to)
}

pub fn check_transition(from: SurveyStatus, to: SurveyStatus) -> Result<(), TransitionError> {
    if is_transition_allowed(from, to) {
        Ok(())
    } else {
        Err(TransitionError::Illegal { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::{check_transition, is_transition_allowed, TransitionError};
    use crate::survey::types::SurveyStatus::{self, *};

    #[test]
    fn table_matches_lifecycle() {
        assert!(is_transition_allowed(Draft, Archived));
        assert!(!is_transition_allowed(Archived, Draft));
        assert!(!is_transition_allowed(Approved, PendingApproval));
        assert!(is_transition_allowed(PendingApproval, Draft));
        assert!(is_transition_allowed(Draft, Approved));
        assert!(is_transition_allowed(Approved, Archived));
        assert!(!is_transition_allowed(Approved, Draft));
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in SurveyStatus::ALL {
            assert!(!is_transition_allowed(status, status), "{status}");
        }
    }

    #[test]
    fn archived_is_terminal() {
        for to in SurveyStatus::ALL {
            assert!(!is_transition_allowed(Archived, to));
        }
    }

    #[test]
    fn illegal_move_names_both_ends() {
        let err = check_transition(Approved, Draft).expect_err("illegal");
        assert_eq!(
            err,
            TransitionError::Illegal {
                from: Approved,
                to: Draft
            }
        );
        assert!(err.to_string().to_lowercase().contains("invalid"));
        assert!(err.to_string().contains("'approved'"));
    }

    #[test]
    fn unknown_stored_status_is_distinct_from_illegal_move() {
        let err = "published".parse::<SurveyStatus>().expect_err("unknown");
        assert!(matches!(err, TransitionError::UnknownStatus(ref s) if s == "published"));
    }
}
