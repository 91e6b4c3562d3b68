//! Page-level role gate and the explicit actor passed into every workflow operation.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Roles allowed to verify evidence, score criteria, and decide applications.
pub const REVIEW_ROLES: &[Role] = &[Role::Reviewer, Role::Admin];
/// Roles allowed to manage registration records.
pub const REGISTRY_ROLES: &[Role] = &[Role::Registrar, Role::Admin];
/// Roles allowed to file applications and attach supporting documents.
pub const SUBMISSION_ROLES: &[Role] = &[Role::Applicant, Role::Registrar, Role::Admin];
/// Roles allowed to read applications and register entries.
pub const READ_ROLES: &[Role] = &[Role::Reviewer, Role::Registrar, Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Reviewer,
    Registrar,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Reviewer => "reviewer",
            Role::Registrar => "registrar",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "applicant" => Some(Role::Applicant),
            "reviewer" => Some(Role::Reviewer),
            "registrar" => Some(Role::Registrar),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated caller. Supplied by whatever sits in front of the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentActor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl CurrentActor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("role '{}' is not permitted for this operation", role.label())]
    Forbidden { role: Role },
    #[error("request is missing actor credentials")]
    MissingActor,
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

pub fn require_role(role: Role, allowed: &[Role]) -> Result<(), AccessError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(AccessError::Forbidden { role })
    }
}

/// Build the caller from forwarded identity headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<CurrentActor, AccessError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let id = header(ACTOR_ID_HEADER).ok_or(AccessError::MissingActor)?;
    let raw_role = header(ACTOR_ROLE_HEADER).ok_or(AccessError::MissingActor)?;
    let role = Role::parse(raw_role).ok_or_else(|| AccessError::UnknownRole(raw_role.to_string()))?;
    let name = header(ACTOR_NAME_HEADER).unwrap_or(id);

    Ok(CurrentActor::new(id, name, role))
}
