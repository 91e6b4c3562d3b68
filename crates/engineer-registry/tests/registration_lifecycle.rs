//! Registration lifecycle scenarios exercised through the public registry service.

mod common {
    use std::collections::BTreeMap;
    use std::sync::{Arc, RwLock};

    use chrono::NaiveDate;

    use engineer_registry::auth::{CurrentActor, Role};
    use engineer_registry::workflows::registration::{
        NewRegistration, RegistrationId, RegistrationLevel, RegistrationRepository,
        RegistryService, StoredRegistration,
    };
    use engineer_registry::workflows::RepositoryError;

    pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    pub(super) fn registrar() -> CurrentActor {
        CurrentActor::new("reg-500", "Huda Saeed", Role::Registrar)
    }

    pub(super) fn registration(number: &str, name: &str, expires_on: NaiveDate) -> NewRegistration {
        NewRegistration {
            registration_number: number.to_string(),
            engineer_name: name.to_string(),
            discipline: "Civil".to_string(),
            level: RegistrationLevel::Consultant,
            registered_on: date(2018, 1, 14),
            expires_on,
        }
    }

    #[derive(Default)]
    pub(super) struct InMemoryRegister {
        records: RwLock<BTreeMap<RegistrationId, StoredRegistration>>,
    }

    impl RegistrationRepository for InMemoryRegister {
        fn insert(&self, record: StoredRegistration) -> Result<StoredRegistration, RepositoryError> {
            let mut guard = self.records.write().expect("lock");
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
            let mut guard = self.records.write().expect("lock");
            let found = guard
                .get(record.id())
                .map(|stored| stored.version)
                .ok_or(RepositoryError::NotFound)?;
            if found != expected_version {
                return Err(RepositoryError::VersionMismatch {
                    expected: expected_version,
                    found,
                });
            }
            record.version = found + 1;
            guard.insert(record.id().clone(), record.clone());
            Ok(record)
        }

        fn fetch(&self, id: &RegistrationId) -> Result<Option<StoredRegistration>, RepositoryError> {
            Ok(self.records.read().expect("lock").get(id).cloned())
        }

        fn list(&self) -> Result<Vec<StoredRegistration>, RepositoryError> {
            Ok(self.records.read().expect("lock").values().cloned().collect())
        }
    }

    pub(super) fn service() -> RegistryService<InMemoryRegister> {
        RegistryService::new(Arc::new(InMemoryRegister::default())).with_max_renewal_years(5)
    }
}

use common::*;
use engineer_registry::workflows::registration::{
    to_csv_string, HistoryAction, RegistrationStatus, RegistryServiceError,
};
use engineer_registry::workflows::{RepositoryError, WorkflowError};

#[test]
fn lapse_renew_and_revoke() {
    let service = service();
    let id = service
        .register(&registrar(), registration("PE-2018-0001", "Faris Odeh", date(2023, 1, 14)))
        .expect("registered")
        .id()
        .clone();

    let expired = service.sweep_expired(&registrar(), date(2023, 3, 1)).expect("sweep");
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].record.status, RegistrationStatus::Expired);

    let renewed = service
        .renew(&registrar(), &id, 3, date(2023, 3, 2), Some(2))
        .expect("expired records renew");
    assert_eq!(renewed.record.expires_on, date(2026, 1, 14));
    assert_eq!(renewed.record.status, RegistrationStatus::Active);
    assert_eq!(renewed.record.renewals[0].previous_expiry, date(2023, 1, 14));

    let revoked = service
        .revoke(&registrar(), &id, "Court ruling", date(2024, 7, 9), Some(3))
        .expect("revoked");
    let actions: Vec<_> = revoked.record.history.iter().map(|entry| entry.action).collect();
    assert_eq!(
        actions,
        vec![
            HistoryAction::Registered,
            HistoryAction::Expired,
            HistoryAction::Renewed,
            HistoryAction::Revoked,
        ]
    );

    for years in 1..=5 {
        assert!(service.renew(&registrar(), &id, years, date(2024, 8, 1), None).is_err());
    }
    let stored = service.get(&registrar(), &id).expect("stored");
    assert_eq!(stored.record.status, RegistrationStatus::Revoked);
}

#[test]
fn concurrent_writers_do_not_both_win() {
    let service = service();
    let id = service
        .register(&registrar(), registration("PE-2018-0002", "Maha Jaber", date(2027, 1, 14)))
        .expect("registered")
        .id()
        .clone();

    service
        .suspend(&registrar(), &id, "Complaint under review", date(2024, 2, 1), Some(1))
        .expect("first writer wins");

    match service.renew(&registrar(), &id, 1, date(2024, 2, 1), Some(1)) {
        Err(RegistryServiceError::Repository(RepositoryError::VersionMismatch { .. })) => {}
        other => panic!("expected version mismatch, got {other:?}"),
    }
}

#[test]
fn csv_export_lists_every_record() {
    let service = service();
    for (number, name) in [("PE-2018-0004", "Tariq Saleh"), ("PE-2018-0003", "Dana Hamdan")] {
        service
            .register(&registrar(), registration(number, name, date(2026, 1, 14)))
            .expect("registered");
    }

    let mut buffer = Vec::new();
    assert_eq!(service.export_csv(&registrar(), None, &mut buffer).expect("export"), 2);
    let csv = String::from_utf8(buffer).expect("utf-8");
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("PE-2018-0003,Dana Hamdan,Civil,consultant,active"));

    let empty: Vec<engineer_registry::workflows::registration::RegistrationRecord> = Vec::new();
    assert_eq!(
        to_csv_string(&empty).expect("export").lines().count(),
        1
    );
}

#[test]
fn revocation_without_reason_changes_nothing() {
    let service = service();
    let id = service
        .register(&registrar(), registration("PE-2018-0005", "Rami Nassar", date(2026, 1, 14)))
        .expect("registered")
        .id()
        .clone();

    assert!(matches!(
        service.revoke(&registrar(), &id, "", date(2024, 1, 1), None),
        Err(RegistryServiceError::Workflow(WorkflowError::ValidationFailed(_)))
    ));
    let stored = service.get(&registrar(), &id).expect("stored");
    assert_eq!(stored.record.status, RegistrationStatus::Active);
    assert_eq!(stored.version, 1);
}
