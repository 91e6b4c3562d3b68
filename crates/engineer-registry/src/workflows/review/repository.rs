use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, CredentialKind, Priority};
use super::evaluation::{recommendation, Recommendation, ReviewAction};
use crate::listing::{Listable, SortKey, SortValue};
use crate::locale::Locale;
use crate::workflows::RepositoryError;

/// Persisted reviewer decision, kept alongside the application it closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub action: ReviewAction,
    pub feedback: String,
    pub decided_by: String,
    pub decided_on: NaiveDate,
    pub score_percentage: f64,
    pub recommendation: Recommendation,
}

/// Repository record: the application, its optimistic-concurrency version, and any decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application: Application,
    pub version: u64,
    pub decision: Option<ReviewDecision>,
}

impl ApplicationRecord {
    pub fn new(application: Application) -> Self {
        Self {
            application,
            version: 1,
            decision: None,
        }
    }

    pub fn id(&self) -> &ApplicationId {
        &self.application.id
    }

    pub fn status_view(&self, locale: Locale) -> ApplicationStatusView {
        let percentage = self.application.criteria.score_percentage();
        let recommendation = recommendation(percentage);
        let status = self.application.status;

        ApplicationStatusView {
            application_id: self.application.id.clone(),
            applicant_name: self.application.applicant.name.clone(),
            credential: self.application.credential,
            priority: self.application.priority,
            submitted_on: self.application.submitted_on,
            status: status.label(),
            status_label: locale.text(status.message_key()),
            score_percentage: percentage,
            recommendation,
            recommendation_label: recommendation.label(locale),
            version: self.version,
            feedback: self
                .decision
                .as_ref()
                .map(|decision| decision.feedback.clone()),
        }
    }
}

impl Listable for ApplicationRecord {
    fn display_name(&self) -> &str {
        &self.application.applicant.name
    }

    fn sort_value(&self, key: SortKey) -> SortValue {
        match key {
            SortKey::Date => SortValue::Date(self.application.submitted_on),
            SortKey::Name => SortValue::Text(self.application.applicant.name.to_lowercase()),
            SortKey::Level => SortValue::Rank(self.application.credential.rank()),
            SortKey::Priority => SortValue::Rank(self.application.priority.rank()),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `update` must only succeed when the stored version equals `expected_version`, and must
/// return the record as stored with its version incremented.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(
        &self,
        record: ApplicationRecord,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Sanitized representation of an application for queue listings.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub applicant_name: String,
    pub credential: CredentialKind,
    pub priority: Priority,
    pub submitted_on: NaiveDate,
    pub status: &'static str,
    pub status_label: &'static str,
    pub score_percentage: f64,
    pub recommendation: Recommendation,
    pub recommendation_label: &'static str,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}
