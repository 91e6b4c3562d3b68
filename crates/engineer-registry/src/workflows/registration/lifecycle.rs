//! Status transitions for registration records.
//!
//! Every function returns a new record and leaves its input untouched. Callers supply the acting
//! user and the effective date; nothing here reads the clock.

use chrono::{Months, NaiveDate};

use super::domain::{HistoryAction, HistoryEntry, RegistrationRecord, RegistrationStatus, RenewalEntry};
use crate::workflows::WorkflowError;

fn ensure_status(
    record: &RegistrationRecord,
    allowed: &[RegistrationStatus],
    action: &'static str,
) -> Result<(), WorkflowError> {
    if allowed.contains(&record.status) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            status: record.status.label(),
            action,
        })
    }
}

fn required_reason<'a>(reason: &'a str, action: &str) -> Result<&'a str, WorkflowError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(WorkflowError::invalid(format!("a reason is required to {action} a registration")));
    }
    Ok(reason)
}

fn transition(
    record: &RegistrationRecord,
    status: RegistrationStatus,
    action: HistoryAction,
    date: NaiveDate,
    by: &str,
    notes: String,
) -> RegistrationRecord {
    let mut updated = record.clone();
    updated.status = status;
    updated.history.push(HistoryEntry {
        action,
        date,
        by: by.to_string(),
        notes,
    });
    updated
}

/// Revoke from any non-revoked status. Terminal.
pub fn revoke(
    record: &RegistrationRecord,
    reason: &str,
    by: &str,
    on: NaiveDate,
) -> Result<RegistrationRecord, WorkflowError> {
    ensure_status(
        record,
        &[
            RegistrationStatus::Active,
            RegistrationStatus::Suspended,
            RegistrationStatus::Expired,
        ],
        "revoke",
    )?;
    let reason = required_reason(reason, "revoke")?;

    Ok(transition(
        record,
        RegistrationStatus::Revoked,
        HistoryAction::Revoked,
        on,
        by,
        reason.to_string(),
    ))
}

/// Extend the expiry by whole calendar years and reactivate.
///
/// The range of `years` is the caller's concern; only calendar overflow is rejected here.
pub fn renew(
    record: &RegistrationRecord,
    years: u32,
    by: &str,
    on: NaiveDate,
) -> Result<RegistrationRecord, WorkflowError> {
    ensure_status(
        record,
        &[RegistrationStatus::Active, RegistrationStatus::Expired],
        "renew",
    )?;

    let new_expiry = years
        .checked_mul(12)
        .and_then(|months| record.expires_on.checked_add_months(Months::new(months)))
        .ok_or_else(|| WorkflowError::invalid(format!("cannot extend expiry by {years} years")))?;

    let mut updated = transition(
        record,
        RegistrationStatus::Active,
        HistoryAction::Renewed,
        on,
        by,
        format!("renewed for {years} years until {new_expiry}"),
    );
    updated.renewals.push(RenewalEntry {
        previous_expiry: record.expires_on,
        new_expiry,
        years,
        renewed_on: on,
        by: by.to_string(),
    });
    updated.expires_on = new_expiry;
    Ok(updated)
}

pub fn suspend(
    record: &RegistrationRecord,
    reason: &str,
    by: &str,
    on: NaiveDate,
) -> Result<RegistrationRecord, WorkflowError> {
    ensure_status(record, &[RegistrationStatus::Active], "suspend")?;
    let reason = required_reason(reason, "suspend")?;

    Ok(transition(
        record,
        RegistrationStatus::Suspended,
        HistoryAction::Suspended,
        on,
        by,
        reason.to_string(),
    ))
}

/// Lapse an active record whose expiry date is before `as_of`.
pub fn mark_expired(
    record: &RegistrationRecord,
    by: &str,
    as_of: NaiveDate,
) -> Result<RegistrationRecord, WorkflowError> {
    ensure_status(record, &[RegistrationStatus::Active], "expire")?;
    if !record.is_lapsed(as_of) {
        return Err(WorkflowError::invalid(format!(
            "registration {} is valid until {}",
            record.registration_number, record.expires_on
        )));
    }

    Ok(transition(
        record,
        RegistrationStatus::Expired,
        HistoryAction::Expired,
        as_of,
        by,
        format!("expired on {}", record.expires_on),
    ))
}
