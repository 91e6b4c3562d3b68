use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::auth::{CurrentActor, Role};
use crate::locale::Locale;
use crate::uploads::DocumentRef;
use crate::workflows::review::domain::{
    Applicant, Application, ApplicationId, ApplicationStatus, ApplicationSubmission,
    CredentialKind, DateRange, EvidenceDetail, EvidenceItem, Priority,
};
use crate::workflows::review::evaluation::{
    set_criterion_score, standard_criteria, CriterionId, EvaluationConfig,
};
use crate::workflows::review::repository::{ApplicationRecord, ApplicationRepository};
use crate::workflows::review::{review_router, ReviewService};
use crate::workflows::RepositoryError;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn reviewer() -> CurrentActor {
    CurrentActor::new("rev-001", "Dr. Hana Saleh", Role::Reviewer)
}

pub(super) fn registrar() -> CurrentActor {
    CurrentActor::new("reg-001", "Khalid Mansour", Role::Registrar)
}

pub(super) fn applicant_actor() -> CurrentActor {
    CurrentActor::new("eng-042", "Mariam Youssef", Role::Applicant)
}

pub(super) fn certificate() -> DocumentRef {
    DocumentRef {
        name: "bsc-civil.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        size_bytes: 240_000,
    }
}

pub(super) fn evidence() -> Vec<EvidenceItem> {
    vec![
        EvidenceItem::new(EvidenceDetail::Education {
            institution: "University of Jordan".to_string(),
            qualification: "BSc".to_string(),
            field_of_study: "Civil Engineering".to_string(),
            period: DateRange::closed(date(2010, 9, 1), date(2014, 6, 30)).expect("valid range"),
        })
        .with_document(certificate()),
        EvidenceItem::new(EvidenceDetail::Experience {
            organization: "Consolidated Contractors".to_string(),
            position: "Site Engineer".to_string(),
            period: DateRange::ongoing(date(2014, 9, 1)),
            responsibilities: "Structural supervision of mid-rise residential blocks".to_string(),
        }),
        EvidenceItem::new(EvidenceDetail::Document {
            title: "Professional indemnity certificate".to_string(),
            issuer: "Arab Insurance Group".to_string(),
            issued_on: Some(date(2023, 1, 10)),
        }),
    ]
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        applicant: Applicant {
            name: "Mariam Youssef".to_string(),
            email: "mariam.youssef@example.org".to_string(),
            discipline: "Civil".to_string(),
        },
        credential: CredentialKind::Registration,
        priority: Priority::Normal,
        evidence: evidence(),
    }
}

pub(super) fn application() -> Application {
    Application {
        id: ApplicationId("APP-T00001".to_string()),
        applicant: submission().applicant,
        credential: CredentialKind::Registration,
        priority: Priority::Normal,
        status: ApplicationStatus::Pending,
        submitted_on: date(2024, 2, 12),
        evidence: evidence(),
        criteria: standard_criteria(CredentialKind::Registration),
    }
}

/// Apply `scores` to the rubric in order.
pub(super) fn scored(mut application: Application, scores: &[u16]) -> Application {
    let ids: Vec<CriterionId> = application
        .criteria
        .iter()
        .map(|criterion| criterion.id.clone())
        .collect();
    for (id, score) in ids.iter().zip(scores) {
        application.criteria =
            set_criterion_score(&application.criteria, id, *score).expect("criterion exists");
    }
    application
}

pub(super) fn criterion_ids(application: &Application) -> Vec<CriterionId> {
    application
        .criteria
        .iter()
        .map(|criterion| criterion.id.clone())
        .collect()
}

pub(super) fn build_service() -> (ReviewService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = ReviewService::new(repository.clone(), EvaluationConfig::default());
    (service, repository)
}

pub(super) fn router_with_service(service: ReviewService<MemoryRepository>) -> axum::Router {
    review_router(Arc::new(service), Locale::En)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(record.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        mut record: ApplicationRecord,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(record.id()).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::VersionMismatch {
                expected: expected_version,
                found: stored.version,
            });
        }
        record.version = expected_version + 1;
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(records)
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _record: ApplicationRecord,
        _expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
