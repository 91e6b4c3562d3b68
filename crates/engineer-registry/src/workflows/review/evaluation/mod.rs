mod config;
mod criteria;
mod policy;
mod rubric;

pub use config::EvaluationConfig;
pub use criteria::{
    max_possible_score, score_percentage, set_criterion_score, total_score, Criteria, Criterion,
    CriterionId, REQUIRED_WEIGHT_TOTAL, SCORE_BUCKETS,
};
pub use policy::{decide, recommendation, Recommendation, ReviewAction, PASSING_THRESHOLD_PCT};
pub use rubric::standard_criteria;

use super::domain::{Application, ApplicationId};
use super::evidence::set_evidence_verified;
use crate::locale::Locale;
use crate::workflows::WorkflowError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stateless evaluator applying the configured verification policy to applications.
pub struct EvaluationEngine {
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn score(&self, application: &Application) -> EvaluationOutcome {
        let criteria = application.criteria.as_slice();
        let total = total_score(criteria);
        let max = max_possible_score(criteria);
        let percentage = score_percentage(criteria);
        let verified_evidence = application.verified_evidence();

        EvaluationOutcome {
            application_id: application.id.clone(),
            total_score: total,
            max_possible_score: max,
            percentage,
            recommendation: recommendation(percentage),
            unscored: criteria
                .iter()
                .filter(|criterion| criterion.score.is_none())
                .map(|criterion| criterion.id.clone())
                .collect(),
            verified_evidence,
            unverified_evidence: application.evidence.len() - verified_evidence,
            experience_months: application.experience_months(application.submitted_on),
            criteria: criteria.to_vec(),
        }
    }

    pub fn score_criterion(
        &self,
        application: &Application,
        criterion_id: &CriterionId,
        raw_score: u16,
    ) -> Result<Application, WorkflowError> {
        ensure_open(application, "score criteria")?;
        let criteria = set_criterion_score(&application.criteria, criterion_id, raw_score)?;
        debug!(
            application_id = %application.id.0,
            criterion = %criterion_id.0,
            raw_score,
            "criterion scored"
        );

        let mut updated = application.clone();
        updated.criteria = criteria;
        Ok(updated)
    }

    pub fn verify_evidence(
        &self,
        application: &Application,
        index: usize,
        verified: bool,
    ) -> Result<Application, WorkflowError> {
        ensure_open(application, "verify evidence")?;
        let evidence = set_evidence_verified(
            &application.evidence,
            index,
            verified,
            self.config.verification_policy,
        )?;

        let mut updated = application.clone();
        updated.evidence = evidence;
        Ok(updated)
    }

    pub fn decide(
        &self,
        application: &Application,
        action: ReviewAction,
    ) -> Result<Application, WorkflowError> {
        decide(application, action)
    }
}

pub(crate) fn ensure_open(
    application: &Application,
    action: &'static str,
) -> Result<(), WorkflowError> {
    if application.status.is_terminal() {
        return Err(WorkflowError::InvalidTransition {
            status: application.status.label(),
            action,
        });
    }
    Ok(())
}

/// Evaluation output describing the aggregate score and outstanding review work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub application_id: ApplicationId,
    pub total_score: u32,
    pub max_possible_score: u32,
    pub percentage: f64,
    pub recommendation: Recommendation,
    pub unscored: Vec<CriterionId>,
    pub verified_evidence: usize,
    pub unverified_evidence: usize,
    /// Claimed experience as of the submission date.
    pub experience_months: u32,
    pub criteria: Vec<Criterion>,
}

impl EvaluationOutcome {
    /// All criteria scored and all evidence verified.
    pub fn is_complete(&self) -> bool {
        self.unscored.is_empty() && self.unverified_evidence == 0
    }

    pub fn summary(&self, locale: Locale) -> String {
        format!(
            "{}/{} ({:.1}%): {}",
            self.total_score,
            self.max_possible_score,
            self.percentage,
            self.recommendation.label(locale)
        )
    }
}
