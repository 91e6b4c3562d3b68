use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::locale::MessageKey;
use crate::workflows::WorkflowError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(pub String);

/// Grade of professional registration, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationLevel {
    Associate,
    Professional,
    Consultant,
    Expert,
}

impl RegistrationLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RegistrationLevel::Associate => "associate",
            RegistrationLevel::Professional => "professional",
            RegistrationLevel::Consultant => "consultant",
            RegistrationLevel::Expert => "expert",
        }
    }

    pub(crate) const fn rank(self) -> u8 {
        match self {
            RegistrationLevel::Associate => 0,
            RegistrationLevel::Professional => 1,
            RegistrationLevel::Consultant => 2,
            RegistrationLevel::Expert => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Active,
    Suspended,
    Expired,
    Revoked,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RegistrationStatus::Active => "active",
            RegistrationStatus::Suspended => "suspended",
            RegistrationStatus::Expired => "expired",
            RegistrationStatus::Revoked => "revoked",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RegistrationStatus::Revoked)
    }

    pub(crate) const fn message_key(self) -> MessageKey {
        match self {
            RegistrationStatus::Active => MessageKey::Active,
            RegistrationStatus::Suspended => MessageKey::Suspended,
            RegistrationStatus::Expired => MessageKey::Expired,
            RegistrationStatus::Revoked => MessageKey::Revoked,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(RegistrationStatus::Active),
            "suspended" => Some(RegistrationStatus::Suspended),
            "expired" => Some(RegistrationStatus::Expired),
            "revoked" => Some(RegistrationStatus::Revoked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Registered,
    Suspended,
    Expired,
    Renewed,
    Revoked,
}

impl HistoryAction {
    pub const fn label(self) -> &'static str {
        match self {
            HistoryAction::Registered => "registered",
            HistoryAction::Suspended => "suspended",
            HistoryAction::Expired => "expired",
            HistoryAction::Renewed => "renewed",
            HistoryAction::Revoked => "revoked",
        }
    }
}

/// Append-only audit line on a registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub date: NaiveDate,
    pub by: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalEntry {
    pub previous_expiry: NaiveDate,
    pub new_expiry: NaiveDate,
    pub years: u32,
    pub renewed_on: NaiveDate,
    pub by: String,
}

/// Payload for entering an engineer into the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    pub registration_number: String,
    pub engineer_name: String,
    pub discipline: String,
    pub level: RegistrationLevel,
    pub registered_on: NaiveDate,
    pub expires_on: NaiveDate,
}

impl NewRegistration {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.registration_number.trim().is_empty() {
            return Err(WorkflowError::invalid("registration number is required"));
        }
        if self.engineer_name.trim().is_empty() {
            return Err(WorkflowError::invalid("engineer name is required"));
        }
        if self.expires_on <= self.registered_on {
            return Err(WorkflowError::invalid(format!(
                "expiry {} must fall after registration date {}",
                self.expires_on, self.registered_on
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub id: RegistrationId,
    pub registration_number: String,
    pub engineer_name: String,
    pub discipline: String,
    pub level: RegistrationLevel,
    pub status: RegistrationStatus,
    pub registered_on: NaiveDate,
    pub expires_on: NaiveDate,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub renewals: Vec<RenewalEntry>,
}

impl RegistrationRecord {
    /// Active record opened from `registration`, with a `registered` history line.
    pub fn open(id: RegistrationId, registration: NewRegistration, by: &str) -> Self {
        let history = vec![HistoryEntry {
            action: HistoryAction::Registered,
            date: registration.registered_on,
            by: by.to_string(),
            notes: format!("registered at {} level", registration.level.label()),
        }];

        Self {
            id,
            registration_number: registration.registration_number.trim().to_string(),
            engineer_name: registration.engineer_name.trim().to_string(),
            discipline: registration.discipline,
            level: registration.level,
            status: RegistrationStatus::Active,
            registered_on: registration.registered_on,
            expires_on: registration.expires_on,
            history,
            renewals: Vec::new(),
        }
    }

    pub fn is_lapsed(&self, as_of: NaiveDate) -> bool {
        self.expires_on < as_of
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> NewRegistration {
        NewRegistration {
            registration_number: " PE-2019-0042 ".to_string(),
            engineer_name: "Omar Haddad".to_string(),
            discipline: "Electrical".to_string(),
            level: RegistrationLevel::Professional,
            registered_on: NaiveDate::from_ymd_opt(2019, 1, 14).expect("valid"),
            expires_on: NaiveDate::from_ymd_opt(2023, 1, 14).expect("valid"),
        }
    }

    #[test]
    fn open_records_start_active_with_history() {
        let record = RegistrationRecord::open(
            RegistrationId("REG-1".to_string()),
            registration(),
            "registrar-1",
        );
        assert_eq!(record.status, RegistrationStatus::Active);
        assert_eq!(record.registration_number, "PE-2019-0042");
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].action, HistoryAction::Registered);
        assert!(record.renewals.is_empty());
    }

    #[test]
    fn expiry_must_follow_registration() {
        let mut registration = registration();
        registration.expires_on = registration.registered_on;
        assert!(registration.validate().is_err());
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(RegistrationStatus::parse("Revoked"), Some(RegistrationStatus::Revoked));
        assert_eq!(RegistrationStatus::parse("lapsed"), None);
        assert!(RegistrationStatus::Revoked.is_terminal());
        assert!(!RegistrationStatus::Expired.is_terminal());
    }
}
