use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::auth::{CurrentActor, Role};
use crate::locale::Locale;
use crate::workflows::registration::domain::{
    NewRegistration, RegistrationId, RegistrationLevel, RegistrationRecord, RegistrationStatus,
};
use crate::workflows::registration::repository::{RegistrationRepository, StoredRegistration};
use crate::workflows::registration::{registry_router, RegistryService};
use crate::workflows::RepositoryError;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn registrar() -> CurrentActor {
    CurrentActor::new("reg-001", "Khalid Mansour", Role::Registrar)
}

pub(super) fn reviewer() -> CurrentActor {
    CurrentActor::new("rev-001", "Dr. Hana Saleh", Role::Reviewer)
}

pub(super) fn new_registration(number: &str, name: &str) -> NewRegistration {
    NewRegistration {
        registration_number: number.to_string(),
        engineer_name: name.to_string(),
        discipline: "Mechanical".to_string(),
        level: RegistrationLevel::Professional,
        registered_on: date(2020, 1, 14),
        expires_on: date(2023, 1, 14),
    }
}

/// Active record expiring 2023-01-14.
pub(super) fn record() -> RegistrationRecord {
    RegistrationRecord::open(
        RegistrationId("REG-T00001".to_string()),
        new_registration("PE-2020-0107", "Layla Darwish"),
        "reg-001",
    )
}

pub(super) fn with_status(status: RegistrationStatus) -> RegistrationRecord {
    let mut record = record();
    record.status = status;
    record
}

pub(super) fn build_service() -> (RegistryService<MemoryRegistry>, Arc<MemoryRegistry>) {
    let repository = Arc::new(MemoryRegistry::default());
    let service = RegistryService::new(repository.clone()).with_max_renewal_years(5);
    (service, repository)
}

pub(super) fn router_with_service(service: RegistryService<MemoryRegistry>) -> axum::Router {
    registry_router(Arc::new(service), Locale::En)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRegistry {
    pub(super) records: Arc<Mutex<HashMap<RegistrationId, StoredRegistration>>>,
}

impl RegistrationRepository for MemoryRegistry {
    fn insert(&self, record: StoredRegistration) -> Result<StoredRegistration, RepositoryError> {
        let mut guard = self.records.lock().expect("registry mutex poisoned");
        if guard.contains_key(record.id())
            || guard.values().any(|stored| stored.shares_number_with(&record))
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        mut record: StoredRegistration,
        expected_version: u64,
    ) -> Result<StoredRegistration, RepositoryError> {
        let mut guard = self.records.lock().expect("registry mutex poisoned");
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

    fn fetch(&self, id: &RegistrationId) -> Result<Option<StoredRegistration>, RepositoryError> {
        let guard = self.records.lock().expect("registry mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<StoredRegistration>, RepositoryError> {
        let guard = self.records.lock().expect("registry mutex poisoned");
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(records)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
