use super::super::domain::CredentialKind;
use super::criteria::{Criteria, Criterion};

/// Rubric applied to every new application of `kind`.
pub fn standard_criteria(kind: CredentialKind) -> Criteria {
    let items = match kind {
        CredentialKind::Registration => vec![
            Criterion::weighted("education", "Academic qualifications", 25),
            Criterion::weighted("experience", "Professional experience", 35),
            Criterion::weighted("competence", "Technical competence", 15),
            Criterion::weighted("conduct", "Professional conduct and ethics", 15),
            Criterion::weighted("development", "Continuing professional development", 10),
        ],
        CredentialKind::Fellowship => vec![
            Criterion::weighted("achievement", "Professional achievement", 30),
            Criterion::weighted("leadership", "Engineering leadership", 25),
            Criterion::weighted("research", "Research and publications", 20),
            Criterion::weighted("service", "Service to the profession", 15),
            Criterion::weighted("development", "Continuing education", 10),
        ],
        CredentialKind::Certification => vec![
            Criterion::weighted("knowledge", "Specialist technical knowledge", 40),
            Criterion::weighted("practice", "Supervised practical experience", 30),
            Criterion::weighted("documentation", "Supporting documentation", 20),
            Criterion::weighted("ethics", "Professional ethics", 10),
        ],
    };

    Criteria::from_trusted(items)
}
