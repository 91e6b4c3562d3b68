//! Application review: evidence verification, weighted criterion scoring, and decisions.

pub mod domain;
pub mod evaluation;
pub mod evidence;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Applicant, Application, ApplicationId, ApplicationStatus, ApplicationSubmission,
    CredentialKind, DateRange, EvidenceDetail, EvidenceItem, EvidenceKind, Priority,
};
pub use evaluation::{
    recommendation, Criteria, Criterion, CriterionId, EvaluationConfig, EvaluationEngine,
    EvaluationOutcome, Recommendation, ReviewAction, PASSING_THRESHOLD_PCT,
};
pub use evidence::{set_evidence_verified, VerificationPolicy};
pub use repository::{ApplicationRecord, ApplicationRepository, ApplicationStatusView, ReviewDecision};
pub use router::review_router;
pub use service::{ReviewService, ReviewServiceError};
