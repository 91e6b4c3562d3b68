use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::evaluation::Criteria;
use crate::locale::MessageKey;
use crate::uploads::DocumentRef;
use crate::workflows::WorkflowError;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Credential an applicant is asking the registry to grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Registration,
    Certification,
    Fellowship,
}

impl CredentialKind {
    pub const fn label(self) -> &'static str {
        match self {
            CredentialKind::Registration => "registration",
            CredentialKind::Certification => "certification",
            CredentialKind::Fellowship => "fellowship",
        }
    }

    pub(crate) const fn rank(self) -> u8 {
        match self {
            CredentialKind::Registration => 0,
            CredentialKind::Certification => 1,
            CredentialKind::Fellowship => 2,
        }
    }
}

/// Queue priority assigned at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub(crate) const fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }
}

/// Application status. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    pub(crate) const fn message_key(self) -> MessageKey {
        match self {
            ApplicationStatus::Pending => MessageKey::Pending,
            ApplicationStatus::Approved => MessageKey::Approved,
            ApplicationStatus::Rejected => MessageKey::Rejected,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub name: String,
    pub email: String,
    pub discipline: String,
}

/// Period covered by an education or experience claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateRange {
    Closed { start: NaiveDate, end: NaiveDate },
    Ongoing { start: NaiveDate },
}

impl DateRange {
    pub fn closed(start: NaiveDate, end: NaiveDate) -> Result<Self, WorkflowError> {
        let range = DateRange::Closed { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn ongoing(start: NaiveDate) -> Self {
        DateRange::Ongoing { start }
    }

    pub fn start(&self) -> NaiveDate {
        match self {
            DateRange::Closed { start, .. } | DateRange::Ongoing { start } => *start,
        }
    }

    pub fn end(&self) -> Option<NaiveDate> {
        match self {
            DateRange::Closed { end, .. } => Some(*end),
            DateRange::Ongoing { .. } => None,
        }
    }

    pub fn is_ongoing(&self) -> bool {
        matches!(self, DateRange::Ongoing { .. })
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        match self {
            DateRange::Closed { start, end } if end < start => Err(WorkflowError::invalid(
                format!("period ends ({end}) before it starts ({start})"),
            )),
            _ => Ok(()),
        }
    }

    /// Completed calendar months between the start and the end (or `as_of` when ongoing).
    pub fn whole_months(&self, as_of: NaiveDate) -> u32 {
        let start = self.start();
        let end = self.end().unwrap_or(as_of);
        if end <= start {
            return 0;
        }

        let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
        if end.day() < start.day() {
            months -= 1;
        }
        months.max(0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Education,
    Experience,
    Document,
    Research,
    ContinuingEducation,
}

impl EvidenceKind {
    pub const fn label(self) -> &'static str {
        match self {
            EvidenceKind::Education => "education",
            EvidenceKind::Experience => "experience",
            EvidenceKind::Document => "document",
            EvidenceKind::Research => "research",
            EvidenceKind::ContinuingEducation => "continuing_education",
        }
    }
}

/// Descriptive, applicant-supplied part of an evidence item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceDetail {
    Education {
        institution: String,
        qualification: String,
        field_of_study: String,
        period: DateRange,
    },
    Experience {
        organization: String,
        position: String,
        period: DateRange,
        #[serde(default)]
        responsibilities: String,
    },
    Document {
        title: String,
        issuer: String,
        #[serde(default)]
        issued_on: Option<NaiveDate>,
    },
    Research {
        title: String,
        venue: String,
        published_on: NaiveDate,
        #[serde(default)]
        summary: String,
    },
    ContinuingEducation {
        provider: String,
        course: String,
        completed_on: NaiveDate,
        hours: u16,
    },
}

impl EvidenceDetail {
    pub fn kind(&self) -> EvidenceKind {
        match self {
            EvidenceDetail::Education { .. } => EvidenceKind::Education,
            EvidenceDetail::Experience { .. } => EvidenceKind::Experience,
            EvidenceDetail::Document { .. } => EvidenceKind::Document,
            EvidenceDetail::Research { .. } => EvidenceKind::Research,
            EvidenceDetail::ContinuingEducation { .. } => EvidenceKind::ContinuingEducation,
        }
    }

    pub fn period(&self) -> Option<&DateRange> {
        match self {
            EvidenceDetail::Education { period, .. } | EvidenceDetail::Experience { period, .. } => {
                Some(period)
            }
            _ => None,
        }
    }
}

/// One verifiable claim attached to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub detail: EvidenceDetail,
    #[serde(default)]
    pub document: Option<DocumentRef>,
    #[serde(default)]
    pub verified: bool,
}

impl EvidenceItem {
    pub fn new(detail: EvidenceDetail) -> Self {
        Self {
            detail,
            document: None,
            verified: false,
        }
    }

    pub fn with_document(mut self, document: DocumentRef) -> Self {
        self.document = Some(document);
        self
    }

    pub fn kind(&self) -> EvidenceKind {
        self.detail.kind()
    }
}

/// Applicant-provided request before the registry assigns an id and rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub applicant: Applicant,
    pub credential: CredentialKind,
    #[serde(default)]
    pub priority: Priority,
    pub evidence: Vec<EvidenceItem>,
}

impl ApplicationSubmission {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.applicant.name.trim().is_empty() {
            return Err(WorkflowError::invalid("applicant name is required"));
        }
        if self.evidence.is_empty() {
            return Err(WorkflowError::invalid(
                "at least one evidence item is required",
            ));
        }
        for item in &self.evidence {
            if let Some(period) = item.detail.period() {
                period.validate()?;
            }
        }
        Ok(())
    }
}

/// A request for a credential together with the reviewer's working state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: Applicant,
    pub credential: CredentialKind,
    pub priority: Priority,
    pub status: ApplicationStatus,
    pub submitted_on: NaiveDate,
    pub evidence: Vec<EvidenceItem>,
    pub criteria: Criteria,
}

impl Application {
    pub fn verified_evidence(&self) -> usize {
        self.evidence.iter().filter(|item| item.verified).count()
    }

    /// Months of professional experience claimed, counting ongoing roles up to `as_of`.
    pub fn experience_months(&self, as_of: NaiveDate) -> u32 {
        self.evidence
            .iter()
            .filter(|item| item.kind() == EvidenceKind::Experience)
            .filter_map(|item| item.detail.period())
            .map(|period| period.whole_months(as_of))
            .sum()
    }
}
