use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::domain::{Application, ApplicationId, ApplicationStatus, ApplicationSubmission};
use super::evaluation::{
    ensure_open, standard_criteria, CriterionId, EvaluationConfig, EvaluationEngine,
    EvaluationOutcome, ReviewAction,
};
use super::evidence::attach_document;
use super::repository::{ApplicationRecord, ApplicationRepository, ReviewDecision};
use crate::auth::{
    require_role, AccessError, CurrentActor, READ_ROLES, REVIEW_ROLES, SUBMISSION_ROLES,
};
use crate::listing::{apply_query, ListQuery, Page, DEFAULT_PAGE_SIZE};
use crate::uploads::{UploadError, UploadPolicy, UploadedFile};
use crate::workflows::{RepositoryError, WorkflowError};


/// Service composing the evaluation engine with the application repository.
pub struct ReviewService<R> {
    repository: Arc<R>,
    engine: Arc<EvaluationEngine>,
    page_size: usize,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("APP-{id:06}"))
}

impl<R> ReviewService<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: EvaluationConfig) -> Self {
        Self {
            repository,
            engine: Arc::new(EvaluationEngine::new(config)),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// File a new application in `pending` with unverified evidence and the standard rubric.
    ///
    /// Documents only arrive through [`Self::attach_document`], so any carried in the submission
    /// are dropped.
    pub fn submit(
        &self,
        actor: &CurrentActor,
        submission: ApplicationSubmission,
        submitted_on: NaiveDate,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        require_role(actor.role, SUBMISSION_ROLES)?;
        submission.validate()?;

        let evidence = submission
            .evidence
            .into_iter()
            .map(|mut item| {
                item.verified = false;
                item.document = None;
                item
            })
            .collect();

        let application = Application {
            id: next_application_id(),
            applicant: submission.applicant,
            credential: submission.credential,
            priority: submission.priority,
            status: ApplicationStatus::Pending,
            submitted_on,
            evidence,
            criteria: standard_criteria(submission.credential),
        };

        let stored = self.repository.insert(ApplicationRecord::new(application))?;
        info!(
            application_id = %stored.id().0,
            credential = stored.application.credential.label(),
            actor = %actor.id,
            "application submitted"
        );
        Ok(stored)
    }

    pub fn get(
        &self,
        actor: &CurrentActor,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        require_role(actor.role, READ_ROLES)?;
        self.load(application_id)
    }

    /// Review queue, optionally restricted to one status.
    pub fn queue(
        &self,
        actor: &CurrentActor,
        status: Option<ApplicationStatus>,
        query: &ListQuery,
    ) -> Result<Page<ApplicationRecord>, ReviewServiceError> {
        require_role(actor.role, READ_ROLES)?;
        let records = self
            .repository
            .list()?
            .into_iter()
            .filter(|record| status.map_or(true, |status| record.application.status == status))
            .collect();
        Ok(apply_query(records, query, self.page_size))
    }

    pub fn evaluate(
        &self,
        actor: &CurrentActor,
        application_id: &ApplicationId,
    ) -> Result<EvaluationOutcome, ReviewServiceError> {
        require_role(actor.role, READ_ROLES)?;
        let record = self.load(application_id)?;
        Ok(self.engine.score(&record.application))
    }

    pub fn score_criterion(
        &self,
        actor: &CurrentActor,
        application_id: &ApplicationId,
        criterion_id: &CriterionId,
        raw_score: u16,
        expected_version: Option<u64>,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        require_role(actor.role, REVIEW_ROLES)?;
        let mut record = self.load_versioned(application_id, expected_version)?;
        let current = record.version;

        record.application =
            self.engine
                .score_criterion(&record.application, criterion_id, raw_score)?;
        self.store(record, current)
    }

    pub fn verify_evidence(
        &self,
        actor: &CurrentActor,
        application_id: &ApplicationId,
        index: usize,
        verified: bool,
        expected_version: Option<u64>,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        require_role(actor.role, REVIEW_ROLES)?;
        let mut record = self.load_versioned(application_id, expected_version)?;
        let current = record.version;

        record.application = self
            .engine
            .verify_evidence(&record.application, index, verified)?;
        info!(
            application_id = %application_id.0,
            index,
            verified,
            actor = %actor.id,
            "evidence verification updated"
        );
        self.store(record, current)
    }

    pub fn attach_document(
        &self,
        actor: &CurrentActor,
        application_id: &ApplicationId,
        index: usize,
        file: &UploadedFile,
        policy: &UploadPolicy,
        expected_version: Option<u64>,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        require_role(actor.role, SUBMISSION_ROLES)?;
        let document = policy.accept(file)?;
        let mut record = self.load_versioned(application_id, expected_version)?;
        let current = record.version;

        ensure_open(&record.application, "attach documents")?;
        record.application.evidence = attach_document(&record.application.evidence, index, document)?;
        self.store(record, current)
    }

    /// Approve or reject. Feedback is mandatory and persisted with the decision.
    pub fn decide(
        &self,
        actor: &CurrentActor,
        application_id: &ApplicationId,
        action: ReviewAction,
        feedback: &str,
        decided_on: NaiveDate,
        expected_version: Option<u64>,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        require_role(actor.role, REVIEW_ROLES)?;
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(WorkflowError::invalid("feedback is required to decide an application").into());
        }

        let mut record = self.load_versioned(application_id, expected_version)?;
        let current = record.version;
        let outcome = self.engine.score(&record.application);

        record.application = match self.engine.decide(&record.application, action) {
            Ok(application) => application,
            Err(err) => {
                warn!(
                    application_id = %application_id.0,
                    action = action.label(),
                    status = record.application.status.label(),
                    "rejected decision on closed application"
                );
                return Err(err.into());
            }
        };

        if action.contradicts(outcome.recommendation) {
            warn!(
                application_id = %application_id.0,
                action = action.label(),
                percentage = outcome.percentage,
                "decision overrides scoring recommendation"
            );
        }

        record.decision = Some(ReviewDecision {
            action,
            feedback: feedback.to_string(),
            decided_by: actor.id.clone(),
            decided_on,
            score_percentage: outcome.percentage,
            recommendation: outcome.recommendation,
        });

        let stored = self.store(record, current)?;
        info!(
            application_id = %application_id.0,
            status = stored.application.status.label(),
            actor = %actor.id,
            "application decided"
        );
        Ok(stored)
    }

    fn load(&self, application_id: &ApplicationId) -> Result<ApplicationRecord, ReviewServiceError> {
        self.repository
            .fetch(application_id)?
            .ok_or_else(|| WorkflowError::not_found("application", application_id.0.clone()).into())
    }

    fn load_versioned(
        &self,
        application_id: &ApplicationId,
        expected_version: Option<u64>,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        let record = self.load(application_id)?;
        match expected_version {
            Some(expected) if expected != record.version => {
                Err(RepositoryError::VersionMismatch {
                    expected,
                    found: record.version,
                }
                .into())
            }
            _ => Ok(record),
        }
    }

    fn store(
        &self,
        record: ApplicationRecord,
        expected_version: u64,
    ) -> Result<ApplicationRecord, ReviewServiceError> {
        Ok(self.repository.update(record, expected_version)?)
    }
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl From<AccessError> for ReviewServiceError {
    fn from(value: AccessError) -> Self {
        Self::Workflow(WorkflowError::Unauthorized(value))
    }
}
