use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::domain::{NewRegistration, RegistrationId, RegistrationRecord, RegistrationStatus};
use super::export::{write_csv, ExportError};
use super::lifecycle;
use super::repository::{RegistrationRepository, StoredRegistration};
use crate::auth::{require_role, AccessError, CurrentActor, READ_ROLES, REGISTRY_ROLES};
use crate::listing::{apply_query, ListQuery, Page, DEFAULT_PAGE_SIZE};
use crate::workflows::{RepositoryError, WorkflowError};

/// Longest renewal accepted unless configured otherwise.
pub const DEFAULT_MAX_RENEWAL_YEARS: u32 = 5;

static REGISTRATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_registration_id() -> RegistrationId {
    let id = REGISTRATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RegistrationId(format!("REG-{id:06}"))
}

/// Registrar facade over the register: lifecycle transitions, listing, and export.
pub struct RegistryService<R> {
    repository: Arc<R>,
    max_renewal_years: u32,
    page_size: usize,
}

impl<R> RegistryService<R>
where
    R: RegistrationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            max_renewal_years: DEFAULT_MAX_RENEWAL_YEARS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_max_renewal_years(mut self, years: u32) -> Self {
        self.max_renewal_years = years.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn max_renewal_years(&self) -> u32 {
        self.max_renewal_years
    }

    pub fn register(
        &self,
        actor: &CurrentActor,
        registration: NewRegistration,
    ) -> Result<StoredRegistration, RegistryServiceError> {
        require_role(actor.role, REGISTRY_ROLES)?;
        registration.validate()?;

        // The repository enforces uniqueness on insert; this check only gives a clearer error.
        let number = registration.registration_number.trim();
        if self
            .repository
            .list()?
            .iter()
            .any(|stored| stored.record.registration_number.eq_ignore_ascii_case(number))
        {
            return Err(WorkflowError::invalid(format!(
                "registration number {number} is already on the register"
            ))
            .into());
        }

        let record = RegistrationRecord::open(next_registration_id(), registration, &actor.id);
        let stored = self.repository.insert(StoredRegistration::new(record))?;
        info!(
            registration_id = %stored.id().0,
            number = %stored.record.registration_number,
            actor = %actor.id,
            "registration opened"
        );
        Ok(stored)
    }

    pub fn get(
        &self,
        actor: &CurrentActor,
        id: &RegistrationId,
    ) -> Result<StoredRegistration, RegistryServiceError> {
        require_role(actor.role, READ_ROLES)?;
        self.load(id)
    }

    pub fn list(
        &self,
        actor: &CurrentActor,
        status: Option<RegistrationStatus>,
        query: &ListQuery,
    ) -> Result<Page<StoredRegistration>, RegistryServiceError> {
        require_role(actor.role, READ_ROLES)?;
        let records = self
            .repository
            .list()?
            .into_iter()
            .filter(|stored| status.map_or(true, |status| stored.record.status == status))
            .collect();
        Ok(apply_query(records, query, self.page_size))
    }

    pub fn revoke(
        &self,
        actor: &CurrentActor,
        id: &RegistrationId,
        reason: &str,
        on: NaiveDate,
        expected_version: Option<u64>,
    ) -> Result<StoredRegistration, RegistryServiceError> {
        self.transition(actor, id, expected_version, "revoked", |record| {
            lifecycle::revoke(record, reason, &actor.id, on)
        })
    }

    /// Renew for `years`, which must fall within `1..=max_renewal_years`.
    pub fn renew(
        &self,
        actor: &CurrentActor,
        id: &RegistrationId,
        years: u32,
        on: NaiveDate,
        expected_version: Option<u64>,
    ) -> Result<StoredRegistration, RegistryServiceError> {
        require_role(actor.role, REGISTRY_ROLES)?;
        if !(1..=self.max_renewal_years).contains(&years) {
            return Err(WorkflowError::invalid(format!(
                "renewal must be between 1 and {} years, got {years}",
                self.max_renewal_years
            ))
            .into());
        }

        self.transition(actor, id, expected_version, "renewed", |record| {
            lifecycle::renew(record, years, &actor.id, on)
        })
    }

    pub fn suspend(
        &self,
        actor: &CurrentActor,
        id: &RegistrationId,
        reason: &str,
        on: NaiveDate,
        expected_version: Option<u64>,
    ) -> Result<StoredRegistration, RegistryServiceError> {
        self.transition(actor, id, expected_version, "suspended", |record| {
            lifecycle::suspend(record, reason, &actor.id, on)
        })
    }

    /// Expire every active record whose expiry date is before `as_of`.
    ///
    /// Records written concurrently are skipped and left for the next sweep.
    pub fn sweep_expired(
        &self,
        actor: &CurrentActor,
        as_of: NaiveDate,
    ) -> Result<Vec<StoredRegistration>, RegistryServiceError> {
        require_role(actor.role, REGISTRY_ROLES)?;

        let mut expired = Vec::new();
        for stored in self.repository.list()? {
            if stored.record.status != RegistrationStatus::Active || !stored.record.is_lapsed(as_of) {
                continue;
            }
            let version = stored.version;
            let record = lifecycle::mark_expired(&stored.record, &actor.id, as_of)?;
            match self
                .repository
                .update(StoredRegistration { record, version }, version)
            {
                Ok(updated) => expired.push(updated),
                Err(RepositoryError::VersionMismatch { expected, found }) => {
                    warn!(
                        registration_id = %stored.id().0,
                        expected,
                        found,
                        "record changed during expiry sweep, skipped"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(count = expired.len(), %as_of, actor = %actor.id, "expiry sweep finished");
        Ok(expired)
    }

    /// Write the register as CSV, optionally restricted to one status. Returns the row count.
    pub fn export_csv<W: Write>(
        &self,
        actor: &CurrentActor,
        status: Option<RegistrationStatus>,
        writer: W,
    ) -> Result<usize, RegistryServiceError> {
        require_role(actor.role, READ_ROLES)?;
        let mut records = self.repository.list()?;
        records.retain(|stored| status.map_or(true, |status| stored.record.status == status));
        records.sort_by(|left, right| {
            left.record
                .registration_number
                .cmp(&right.record.registration_number)
        });

        let rows = write_csv(records.iter().map(|stored| &stored.record), writer)?;
        info!(rows, actor = %actor.id, "registry exported");
        Ok(rows)
    }

    fn transition<F>(
        &self,
        actor: &CurrentActor,
        id: &RegistrationId,
        expected_version: Option<u64>,
        event: &'static str,
        apply: F,
    ) -> Result<StoredRegistration, RegistryServiceError>
    where
        F: FnOnce(&RegistrationRecord) -> Result<RegistrationRecord, WorkflowError>,
    {
        require_role(actor.role, REGISTRY_ROLES)?;
        let stored = self.load(id)?;
        let version = stored.version;
        if let Some(expected) = expected_version {
            if expected != version {
                return Err(RepositoryError::VersionMismatch {
                    expected,
                    found: version,
                }
                .into());
            }
        }

        let record = match apply(&stored.record) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    registration_id = %id.0,
                    status = stored.record.status.label(),
                    error = %err,
                    "registration transition refused"
                );
                return Err(err.into());
            }
        };

        let updated = self
            .repository
            .update(StoredRegistration { record, version }, version)?;
        info!(
            registration_id = %id.0,
            status = updated.record.status.label(),
            actor = %actor.id,
            "registration {event}"
        );
        Ok(updated)
    }

    fn load(&self, id: &RegistrationId) -> Result<StoredRegistration, RegistryServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| WorkflowError::not_found("registration", id.0.clone()).into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryServiceError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<AccessError> for RegistryServiceError {
    fn from(value: AccessError) -> Self {
        Self::Workflow(WorkflowError::Unauthorized(value))
    }
}
