use chrono::NaiveDate;
use engineer_registry::auth::{CurrentActor, Role};
use engineer_registry::workflows::registration::{
    NewRegistration, RegistrationId, RegistrationLevel, RegistrationRepository,
    RegistryService, RegistryServiceError, StoredRegistration,
};
use engineer_registry::workflows::review::{
    ApplicationId, ApplicationRecord, ApplicationRepository,
};
use engineer_registry::workflows::RepositoryError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Records keyed by id with an optimistic version check on update.
struct VersionedStore<K, V> {
    records: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for VersionedStore<K, V> {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> VersionedStore<K, V>
where
    K: Eq + Hash + Clone + Ord,
    V: Clone,
{
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<K, V>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
    }

    /// Insert unless `key` is taken or an existing value `clashes` with the new one.
    fn insert(
        &self,
        key: K,
        value: V,
        clashes: impl Fn(&V, &V) -> bool,
    ) -> Result<V, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&key) || guard.values().any(|stored| clashes(stored, &value)) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, value.clone());
        Ok(value)
    }

    fn update(
        &self,
        key: K,
        value: V,
        expected_version: u64,
        version_of: impl Fn(&V) -> u64,
        bump: impl FnOnce(&mut V, u64),
    ) -> Result<V, RepositoryError> {
        let mut guard = self.lock()?;
        let found = guard
            .get(&key)
            .map(&version_of)
            .ok_or(RepositoryError::NotFound)?;
        if found != expected_version {
            return Err(RepositoryError::VersionMismatch {
                expected: expected_version,
                found,
            });
        }
        let mut value = value;
        bump(&mut value, found + 1);
        guard.insert(key, value.clone());
        Ok(value)
    }

    fn fetch(&self, key: &K) -> Result<Option<V>, RepositoryError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn list(&self) -> Result<Vec<V>, RepositoryError> {
        let guard = self.lock()?;
        let mut keys: Vec<&K> = guard.keys().collect();
        keys.sort();
        Ok(keys.into_iter().filter_map(|key| guard.get(key).cloned()).collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    store: Arc<VersionedStore<ApplicationId, ApplicationRecord>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.store.insert(record.id().clone(), record, |_, _| false)
    }

    fn update(
        &self,
        record: ApplicationRecord,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        self.store.update(
            record.id().clone(),
            record,
            expected_version,
            |stored| stored.version,
            |record, version| record.version = version,
        )
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.store.fetch(id)
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.store.list()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRegistrationRepository {
    store: Arc<VersionedStore<RegistrationId, StoredRegistration>>,
}

impl RegistrationRepository for InMemoryRegistrationRepository {
    fn insert(&self, record: StoredRegistration) -> Result<StoredRegistration, RepositoryError> {
        self.store
            .insert(record.id().clone(), record, StoredRegistration::shares_number_with)
    }

    fn update(
        &self,
        record: StoredRegistration,
        expected_version: u64,
    ) -> Result<StoredRegistration, RepositoryError> {
        self.store.update(
            record.id().clone(),
            record,
            expected_version,
            |stored| stored.version,
            |record, version| record.version = version,
        )
    }

    fn fetch(&self, id: &RegistrationId) -> Result<Option<StoredRegistration>, RepositoryError> {
        self.store.fetch(id)
    }

    fn list(&self) -> Result<Vec<StoredRegistration>, RepositoryError> {
        self.store.list()
    }
}

/// Actor used for seeding and CLI maintenance commands.
pub(crate) fn system_actor() -> CurrentActor {
    CurrentActor::new("system", "Registry maintenance", Role::Admin)
}

/// Load a handful of register entries spanning levels and expiry dates.
pub(crate) fn seed_registry<R>(service: &RegistryService<R>) -> Result<Vec<RegistrationId>, RegistryServiceError>
where
    R: RegistrationRepository + 'static,
{
    let seeds = [
        ("PE-2019-0042", "Omar Haddad", "Electrical", RegistrationLevel::Professional, (2019, 1, 14), (2023, 1, 14)),
        ("PE-2016-0007", "Rania Qasem", "Civil", RegistrationLevel::Consultant, (2016, 6, 1), (2026, 6, 1)),
        ("PE-2021-0315", "Tamer Aziz", "Mechanical", RegistrationLevel::Associate, (2021, 9, 20), (2024, 9, 20)),
        ("PE-2012-0101", "Lina Farah", "Chemical", RegistrationLevel::Expert, (2012, 3, 5), (2027, 3, 5)),
    ];

    let actor = system_actor();
    let mut ids = Vec::with_capacity(seeds.len());
    for (number, name, discipline, level, registered, expires) in seeds {
        let (Some(registered_on), Some(expires_on)) = (
            NaiveDate::from_ymd_opt(registered.0, registered.1, registered.2),
            NaiveDate::from_ymd_opt(expires.0, expires.1, expires.2),
        ) else {
            continue;
        };
        let stored = service.register(
            &actor,
            NewRegistration {
                registration_number: number.to_string(),
                engineer_name: name.to_string(),
                discipline: discipline.to_string(),
                level,
                registered_on,
                expires_on,
            },
        )?;
        ids.push(stored.id().clone());
    }
    Ok(ids)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engineer_registry::workflows::registration::RegistrationStatus;

    #[test]
    fn seeding_fills_the_register() {
        let service = RegistryService::new(Arc::new(InMemoryRegistrationRepository::default()));
        let ids = seed_registry(&service).expect("seeded");
        assert_eq!(ids.len(), 4);

        let stored = service.get(&system_actor(), &ids[0]).expect("stored");
        assert_eq!(stored.record.status, RegistrationStatus::Active);
    }

    #[test]
    fn stale_updates_are_refused() {
        let repository = InMemoryRegistrationRepository::default();
        let service = RegistryService::new(Arc::new(repository.clone()));
        let ids = seed_registry(&service).expect("seeded");
        let stored = repository.fetch(&ids[1]).expect("fetch").expect("present");

        repository.update(stored.clone(), 1).expect("first update");
        assert_eq!(
            repository.update(stored, 1),
            Err(RepositoryError::VersionMismatch {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn insert_refuses_a_duplicate_registration_number() {
        let repository = InMemoryRegistrationRepository::default();
        let service = RegistryService::new(Arc::new(repository.clone()));
        let ids = seed_registry(&service).expect("seeded");

        let mut clash = repository.fetch(&ids[0]).expect("fetch").expect("present");
        clash.record.id = RegistrationId("REG-CLASH".to_string());
        clash.record.registration_number = clash.record.registration_number.to_lowercase();
        assert_eq!(repository.insert(clash), Err(RepositoryError::Conflict));
    }

    #[test]
    fn parse_date_reports_the_bad_input() {
        assert!(parse_date(" 2024-02-29 ").is_ok());
        assert!(parse_date("29/02/2024").unwrap_err().contains("29/02/2024"));
    }
}
