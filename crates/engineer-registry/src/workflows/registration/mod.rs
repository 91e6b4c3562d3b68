//! Register of professional engineers: revocation, renewal, suspension, expiry, and export.

pub mod domain;
pub mod export;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    HistoryAction, HistoryEntry, NewRegistration, RegistrationId, RegistrationLevel,
    RegistrationRecord, RegistrationStatus, RenewalEntry,
};
pub use export::{to_csv_string, write_csv, ExportError};
pub use lifecycle::{mark_expired, renew, revoke, suspend};
pub use repository::{RegistrationRepository, RegistrationView, StoredRegistration};
pub use router::registry_router;
pub use service::{RegistryService, RegistryServiceError, DEFAULT_MAX_RENEWAL_YEARS};
