use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{RegistrationId, RegistrationLevel, RegistrationRecord};
use crate::listing::{Listable, SortKey, SortValue};
use crate::locale::Locale;
use crate::workflows::RepositoryError;

/// Registration record plus its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRegistration {
    pub record: RegistrationRecord,
    pub version: u64,
}

impl StoredRegistration {
    pub fn new(record: RegistrationRecord) -> Self {
        Self { record, version: 1 }
    }

    pub fn id(&self) -> &RegistrationId {
        &self.record.id
    }

    /// Registration numbers compare case-insensitively.
    pub fn shares_number_with(&self, other: &StoredRegistration) -> bool {
        self.record
            .registration_number
            .eq_ignore_ascii_case(&other.record.registration_number)
    }

    pub fn view(&self, locale: Locale) -> RegistrationView {
        let record = &self.record;
        RegistrationView {
            id: record.id.clone(),
            registration_number: record.registration_number.clone(),
            engineer_name: record.engineer_name.clone(),
            discipline: record.discipline.clone(),
            level: record.level,
            status: record.status.label(),
            status_label: locale.text(record.status.message_key()),
            registered_on: record.registered_on,
            expires_on: record.expires_on,
            renewals: record.renewals.len(),
            version: self.version,
        }
    }
}

impl Listable for StoredRegistration {
    fn display_name(&self) -> &str {
        &self.record.engineer_name
    }

    /// `Priority` orders by expiry so the soonest lapses surface first in ascending order.
    fn sort_value(&self, key: SortKey) -> SortValue {
        match key {
            SortKey::Date => SortValue::Date(self.record.registered_on),
            SortKey::Name => SortValue::Text(self.record.engineer_name.to_lowercase()),
            SortKey::Level => SortValue::Rank(self.record.level.rank()),
            SortKey::Priority => SortValue::Date(self.record.expires_on),
        }
    }
}

/// Storage seam for the register. Same versioning contract as the application repository.
///
/// `insert` must return `Conflict` when the id or the registration number is already stored,
/// checked atomically with the write.
pub trait RegistrationRepository: Send + Sync {
    fn insert(&self, record: StoredRegistration) -> Result<StoredRegistration, RepositoryError>;
    fn update(
        &self,
        record: StoredRegistration,
        expected_version: u64,
    ) -> Result<StoredRegistration, RepositoryError>;
    fn fetch(&self, id: &RegistrationId) -> Result<Option<StoredRegistration>, RepositoryError>;
    fn list(&self) -> Result<Vec<StoredRegistration>, RepositoryError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationView {
    pub id: RegistrationId,
    pub registration_number: String,
    pub engineer_name: String,
    pub discipline: String,
    pub level: RegistrationLevel,
    pub status: &'static str,
    pub status_label: &'static str,
    pub registered_on: NaiveDate,
    pub expires_on: NaiveDate,
    pub renewals: usize,
    pub version: u64,
}
