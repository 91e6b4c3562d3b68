use serde::{Deserialize, Serialize};

use super::domain::EvidenceItem;
use crate::uploads::DocumentRef;
use crate::workflows::WorkflowError;

/// Whether an evidence item needs an attached document before it can be marked verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPolicy {
    #[default]
    AllowWithoutDocument,
    RequireDocument,
}

impl VerificationPolicy {
    pub fn check(self, item: &EvidenceItem, verified: bool) -> Result<(), WorkflowError> {
        if verified && self == VerificationPolicy::RequireDocument && item.document.is_none() {
            return Err(WorkflowError::invalid(format!(
                "{} evidence cannot be verified without an attached document",
                item.kind().label()
            )));
        }
        Ok(())
    }
}

fn evidence_position(items: &[EvidenceItem], index: usize) -> Result<usize, WorkflowError> {
    if index < items.len() {
        Ok(index)
    } else {
        Err(WorkflowError::not_found("evidence item", index.to_string()))
    }
}

/// Assign the `verified` flag on one item. Assignment, not toggle: repeating a call is a no-op.
pub fn set_evidence_verified(
    items: &[EvidenceItem],
    index: usize,
    verified: bool,
    policy: VerificationPolicy,
) -> Result<Vec<EvidenceItem>, WorkflowError> {
    let position = evidence_position(items, index)?;
    policy.check(&items[position], verified)?;

    let mut updated = items.to_vec();
    updated[position].verified = verified;
    Ok(updated)
}

/// Attach or replace the document on one item; replacing a document clears prior verification.
pub fn attach_document(
    items: &[EvidenceItem],
    index: usize,
    document: DocumentRef,
) -> Result<Vec<EvidenceItem>, WorkflowError> {
    let position = evidence_position(items, index)?;

    let mut updated = items.to_vec();
    let item = &mut updated[position];
    if item.document.as_ref() != Some(&document) {
        item.verified = false;
    }
    item.document = Some(document);
    Ok(updated)
}
