use serde::{Deserialize, Serialize};

use super::super::domain::{Application, ApplicationStatus};
use crate::locale::{Locale, MessageKey};
use crate::workflows::WorkflowError;

/// Score percentage at or above which an application meets requirements.
pub const PASSING_THRESHOLD_PCT: f64 = 70.0;

/// Advisory outcome derived from the score percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Meets,
    DoesNotMeet,
}

impl Recommendation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Recommendation::Meets => "meets",
            Recommendation::DoesNotMeet => "does_not_meet",
        }
    }

    pub const fn label(self, locale: Locale) -> &'static str {
        match self {
            Recommendation::Meets => locale.text(MessageKey::MeetsRequirements),
            Recommendation::DoesNotMeet => locale.text(MessageKey::DoesNotMeetRequirements),
        }
    }
}

pub fn recommendation(percentage: f64) -> Recommendation {
    if percentage >= PASSING_THRESHOLD_PCT {
        Recommendation::Meets
    } else {
        Recommendation::DoesNotMeet
    }
}

/// Reviewer's terminal action on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
        }
    }

    pub const fn target_status(self) -> ApplicationStatus {
        match self {
            ReviewAction::Approve => ApplicationStatus::Approved,
            ReviewAction::Reject => ApplicationStatus::Rejected,
        }
    }

    /// Whether the action goes against the engine's recommendation.
    pub fn contradicts(self, recommendation: Recommendation) -> bool {
        matches!(
            (self, recommendation),
            (ReviewAction::Approve, Recommendation::DoesNotMeet)
                | (ReviewAction::Reject, Recommendation::Meets)
        )
    }
}

/// Move a pending application to its terminal status. Evidence and criteria are untouched.
pub fn decide(application: &Application, action: ReviewAction) -> Result<Application, WorkflowError> {
    if application.status.is_terminal() {
        return Err(WorkflowError::InvalidTransition {
            status: application.status.label(),
            action: action.label(),
        });
    }

    let mut decided = application.clone();
    decided.status = action.target_status();
    Ok(decided)
}
