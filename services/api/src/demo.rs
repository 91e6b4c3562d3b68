use crate::infra::{
    seed_registry, system_actor, InMemoryApplicationRepository, InMemoryRegistrationRepository,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use engineer_registry::auth::{CurrentActor, Role};
use engineer_registry::error::AppError;
use engineer_registry::locale::Locale;
use engineer_registry::workflows::registration::{
    RegistrationRepository, RegistrationStatus, RegistryService,
};
use engineer_registry::workflows::review::{
    Applicant, ApplicationSubmission, CredentialKind, DateRange, EvaluationConfig, EvidenceDetail,
    EvidenceItem, Priority, Recommendation, ReviewAction, ReviewService,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Effective date for decisions and the expiry sweep (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Label language for printed summaries (en or ar)
    #[arg(long, default_value = "en")]
    pub(crate) locale: String,
    /// Years to add when renewing lapsed registrations
    #[arg(long, default_value_t = 3)]
    pub(crate) renewal_years: u32,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Write the CSV to this file instead of stdout
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
    /// Only export records with this status
    #[arg(long)]
    pub(crate) status: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        locale,
        renewal_years,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let locale = Locale::from_tag(&locale).unwrap_or_default();

    println!("Engineer registry demo ({today})");
    run_review_demo(today, locale);

    println!("\nRegister maintenance");
    let registry = RegistryService::new(Arc::new(InMemoryRegistrationRepository::default()));
    let registrar = CurrentActor::new("reg-demo", "Demo Registrar", Role::Registrar);
    let seeded = seed_registry(&registry)?;
    println!("- Seeded {} registrations", seeded.len());

    let expired = registry.sweep_expired(&registrar, today)?;
    println!("- Expiry sweep as of {today}: {} lapsed", expired.len());
    for stored in &expired {
        let view = stored.view(locale);
        println!(
            "    - {} {} expired {} -> {}",
            view.registration_number, view.engineer_name, view.expires_on, view.status_label
        );
    }

    if let Some(lapsed) = expired.first() {
        match registry.renew(&registrar, lapsed.id(), renewal_years, today, Some(lapsed.version)) {
            Ok(renewed) => {
                for renewal in &renewed.record.renewals {
                    println!(
                        "- Renewed {} for {} years: {} -> {}",
                        renewed.record.registration_number,
                        renewal.years,
                        renewal.previous_expiry,
                        renewal.new_expiry
                    );
                }
            }
            Err(err) => println!("- Renewal refused: {}", err),
        }
    }

    if let Some(target) = seeded.last() {
        let revoked = registry.revoke(
            &registrar,
            target,
            "Disciplinary board ruling on falsified site reports",
            today,
            None,
        )?;
        println!(
            "- Revoked {} ({})",
            revoked.record.registration_number,
            revoked.view(locale).status_label
        );
        println!("  History:");
        for entry in &revoked.record.history {
            println!(
                "    - {} {} by {}: {}",
                entry.date,
                entry.action.label(),
                entry.by,
                entry.notes
            );
        }

        if let Err(err) = registry.renew(&registrar, target, 1, today, None) {
            println!("  Renewal after revocation refused: {}", err);
        }
    }

    println!("\nRegister export");
    registry.export_csv(&registrar, None, io::stdout().lock())?;
    Ok(())
}

fn run_review_demo(today: NaiveDate, locale: Locale) {
    println!("\nApplication review");
    let service = ReviewService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        EvaluationConfig::default(),
    );
    let applicant = CurrentActor::new("eng-demo", "Salma Haddad", Role::Applicant);
    let reviewer = CurrentActor::new("rev-demo", "Demo Reviewer", Role::Reviewer);

    let record = match service.submit(&applicant, demo_submission(today), today) {
        Ok(record) => record,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return;
        }
    };
    let id = record.id().clone();
    println!(
        "- Received {} for {} credential -> {}",
        id.0,
        record.application.credential.label(),
        record.status_view(locale).status_label
    );

    let picks = [4, 3, 4, 2, 3];
    for (criterion, pick) in record.application.criteria.iter().zip(picks) {
        let options = criterion.score_options();
        let score = options[pick];
        println!(
            "  {} (weight {}): options {:?} -> {}",
            criterion.label, criterion.weight, options, score
        );
        if let Err(err) = service.score_criterion(&reviewer, &id, &criterion.id, score, None) {
            println!("    scoring refused: {}", err);
        }
    }
    for index in 0..record.application.evidence.len() {
        if let Err(err) = service.verify_evidence(&reviewer, &id, index, true, None) {
            println!("  verification refused: {}", err);
        }
    }

    let outcome = match service.evaluate(&reviewer, &id) {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("  Evaluation unavailable: {}", err);
            return;
        }
    };
    println!("  Evaluation: {}", outcome.summary(locale));

    let action = if outcome.recommendation == Recommendation::Meets {
        ReviewAction::Approve
    } else {
        ReviewAction::Reject
    };
    match service.decide(
        &reviewer,
        &id,
        action,
        "Evidence verified against issuing bodies",
        today,
        None,
    ) {
        Ok(decided) => {
            let view = decided.status_view(locale);
            match serde_json::to_string_pretty(&view) {
                Ok(json) => println!("  Decision payload:\n{}", json),
                Err(err) => println!("  Decision payload unavailable: {}", err),
            }
        }
        Err(err) => println!("  Decision refused: {}", err),
    }
}

fn demo_submission(today: NaiveDate) -> ApplicationSubmission {
    let graduated = today
        .checked_sub_months(chrono::Months::new(12 * 9))
        .unwrap_or(today);
    let enrolled = graduated
        .checked_sub_months(chrono::Months::new(12 * 4))
        .unwrap_or(graduated);

    let education_period = DateRange::closed(enrolled, graduated)
        .unwrap_or_else(|_| DateRange::ongoing(enrolled));

    ApplicationSubmission {
        applicant: Applicant {
            name: "Salma Haddad".to_string(),
            email: "salma.haddad@example.org".to_string(),
            discipline: "Civil".to_string(),
        },
        credential: CredentialKind::Registration,
        priority: Priority::Normal,
        evidence: vec![
            EvidenceItem::new(EvidenceDetail::Education {
                institution: "Jordan University of Science and Technology".to_string(),
                qualification: "BSc".to_string(),
                field_of_study: "Civil Engineering".to_string(),
                period: education_period,
            }),
            EvidenceItem::new(EvidenceDetail::Experience {
                organization: "Ministry of Public Works".to_string(),
                position: "Resident Engineer".to_string(),
                period: DateRange::ongoing(graduated),
                responsibilities: "Supervision of highway rehabilitation contracts".to_string(),
            }),
            EvidenceItem::new(EvidenceDetail::ContinuingEducation {
                provider: "Jordan Engineers Association".to_string(),
                course: "Seismic design to current codes".to_string(),
                completed_on: today,
                hours: 24,
            }),
        ],
    }
}

pub(crate) fn run_registry_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs { out, status } = args;
    let status = match status.as_deref() {
        None => None,
        Some(raw) => Some(RegistrationStatus::parse(raw).ok_or_else(|| {
            AppError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown status '{raw}'"),
            ))
        })?),
    };

    let registry = RegistryService::new(Arc::new(InMemoryRegistrationRepository::default()));
    seed_registry(&registry)?;
    export_to(&registry, status, out)
}

fn export_to<R>(
    registry: &RegistryService<R>,
    status: Option<RegistrationStatus>,
    out: Option<PathBuf>,
) -> Result<(), AppError>
where
    R: RegistrationRepository + 'static,
{
    let actor = system_actor();
    match out {
        Some(path) => {
            let mut file = File::create(&path)?;
            let rows = registry.export_csv(&actor, status, &mut file)?;
            file.flush()?;
            eprintln!("wrote {rows} registrations to {}", path.display());
        }
        None => {
            registry.export_csv(&actor, status, io::stdout().lock())?;
        }
    }
    Ok(())
}
