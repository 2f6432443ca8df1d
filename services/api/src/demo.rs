use crate::infra::{build_service, load_selections, start_of_day, MemoryEligibilityService};
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use clap::Args;
use recruit_ops::error::AppError;
use recruit_ops::workflows::eligibility::{
    Candidate, CandidateEligibilityStatus, CandidateExpectations, CandidateId, CandidateQuery,
    OfferDraft, OfferResponse, PolicyConfig, ScreeningBlockReason, ScreeningBlockRequest,
    ScreeningResult,
};
use recruit_ops::workflows::selections::CandidateSelection;
use std::path::PathBuf;

const DEMO_ACTOR: &str = "demo (HR)";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Leave ready candidates blocked instead of running the bulk unblock step.
    #[arg(long)]
    pub(crate) skip_unblock: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct EligibilityReportArgs {
    /// Candidate selection CSV export. Without it the scripted demo roster is used.
    #[arg(long)]
    pub(crate) selections: Option<PathBuf>,
    /// Evaluation date for the report (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_eligibility_report(
    args: EligibilityReportArgs,
    policy: PolicyConfig,
) -> Result<(), AppError> {
    let EligibilityReportArgs { selections, as_of } = args;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let now = start_of_day(as_of);

    let service = build_service(policy);
    match selections {
        Some(path) => {
            let selections = load_selections(&path)?;
            let registered = service.import_selections(&selections)?;
            println!("Imported {registered} candidates from {}", path.display());
        }
        None => seed_scenario(&service, as_of)?,
    }

    render_report(&service, now)
}

pub(crate) fn run_demo(args: DemoArgs, policy: PolicyConfig) -> Result<(), AppError> {
    let DemoArgs {
        as_of,
        skip_unblock,
    } = args;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let now = start_of_day(as_of);

    println!(
        "Internal team eligibility demo ({as_of}, blocking after {} qualifying declines)",
        policy.decline_threshold
    );
    let service = build_service(policy);
    seed_scenario(&service, as_of)?;
    render_report(&service, now)?;

    let ready = service.ready_for_unblock(now)?;
    if skip_unblock || ready.is_empty() {
        println!("\nNo bulk unblock run");
    } else {
        let mut requested = ready.clone();
        requested.push(CandidateId("CAND-D001".to_string()));
        let report = service.bulk_unblock(&requested, DEMO_ACTOR, now)?;
        println!("\nBulk unblock");
        for candidate_id in &report.unblocked {
            println!("- unblocked {candidate_id}");
        }
        for skipped in &report.skipped {
            println!("- skipped {} ({:?})", skipped.candidate_id, skipped.reason);
        }
    }

    println!("\nRecent activity");
    for event in service.recent_activity(8)? {
        println!(
            "- {} | {} | {} | {}",
            event.occurred_at.format("%Y-%m-%d"),
            event.candidate_id,
            event.kind.label(),
            event.summary
        );
    }

    Ok(())
}

fn render_report(service: &MemoryEligibilityService, now: DateTime<Utc>) -> Result<(), AppError> {
    let dashboard = service.dashboard(now)?;
    println!(
        "\nEligibility as of {} ({} candidates)",
        now.date_naive(),
        dashboard.total_candidates
    );
    for entry in &dashboard.by_status {
        println!("- {}: {}", entry.label, entry.count);
    }

    let blocked = service.blocked_candidates_view(&CandidateQuery::default(), now)?;
    if blocked.is_empty() {
        println!("\nNo blocked candidates");
    } else {
        println!("\nBlocked candidates");
    }
    for row in blocked {
        println!(
            "- {} {} | {} | {} | until {} | {}",
            row.candidate_id,
            row.name,
            row.source_label,
            row.reason,
            row.block_end.format("%Y-%m-%d"),
            row.days_remaining_text
        );
    }

    let under_review = service.list(
        &CandidateQuery {
            search: None,
            status: Some(CandidateEligibilityStatus::UnderReview),
        },
        now,
    )?;
    if !under_review.is_empty() {
        println!("\nAwaiting screening");
    }
    for projection in under_review {
        println!("- {} {}", projection.candidate_id, projection.name);
    }

    Ok(())
}

pub(crate) fn demo_selections() -> Vec<CandidateSelection> {
    [
        ("CAND-D001", "Asha Rao", "Backend Engineer", "Bengaluru", 95_000, 90_000),
        ("CAND-D002", "Ravi Kumar", "Data Analyst", "Pune", 72_000, 70_000),
        ("CAND-D003", "Meera Nair", "QA Lead", "Chennai", 88_000, 85_000),
        ("CAND-D004", "Kabir Shah", "Product Designer", "Mumbai", 99_000, 95_000),
    ]
    .into_iter()
    .map(|(code, name, job_title, location, proposed, expected)| CandidateSelection {
        selection_id: format!("sel-{}", code.to_ascii_lowercase()),
        candidate: Candidate {
            candidate_id: CandidateId(code.to_string()),
            name: name.to_string(),
            email: format!(
                "{}@example.com",
                name.split_whitespace()
                    .next()
                    .unwrap_or(code)
                    .to_ascii_lowercase()
            ),
            phone: None,
        },
        recruiter: "Arjun".to_string(),
        job_title: job_title.to_string(),
        job_description: Some(format!("{job_title} for the recruiting ops pilot")),
        job_location: Some(location.to_string()),
        proposed_salary: Some(proposed),
        expectations: Some(CandidateExpectations {
            expected_salary: expected,
            preferred_location: location.to_string(),
        }),
        selected_on: None,
    })
    .collect()
}

/// Replays a scripted history ending at `as_of`: one candidate blocked for declines, one
/// with a non-qualifying decline, one failed screening that has run its course and one
/// awaiting a screening result.
pub(crate) fn seed_scenario(
    service: &MemoryEligibilityService,
    as_of: NaiveDate,
) -> Result<(), AppError> {
    let selections = demo_selections();
    service.import_selections(&selections)?;

    let days_before =
        |days: u64| start_of_day(as_of.checked_sub_days(Days::new(days)).unwrap_or(as_of));

    // Asha turns down two offers that met both requirements.
    for days in [60, 40] {
        decline(service, &selections[0], None, days_before(days))?;
    }

    // Ravi is offered less than they asked for.
    decline(service, &selections[1], Some(60_000), days_before(30))?;

    service.record_screening(
        &selections[2].candidate.candidate_id,
        ScreeningResult::Failed,
        Some("Could not complete the practical exercise".to_string()),
        Some(ScreeningBlockRequest {
            reason: ScreeningBlockReason::FailedTechnicalAssessment,
            duration_months: Some(3),
        }),
        DEMO_ACTOR,
        days_before(100),
    )?;

    service.record_screening(
        &selections[3].candidate.candidate_id,
        ScreeningResult::Pending,
        None,
        None,
        DEMO_ACTOR,
        days_before(2),
    )?;

    Ok(())
}

fn decline(
    service: &MemoryEligibilityService,
    selection: &CandidateSelection,
    offered_salary: Option<u32>,
    at: DateTime<Utc>,
) -> Result<(), AppError> {
    let today = at.date_naive();
    let mut draft = OfferDraft::prefill(selection);
    if offered_salary.is_some() {
        draft.offered_salary = offered_salary;
    }
    draft.benefits = vec!["Health insurance".to_string()];
    draft.start_date = today.checked_add_days(Days::new(30));
    draft.offer_deadline = today.checked_add_days(Days::new(7));
    draft.offer_notes = "Shared over phone".to_string();

    let offer = service.create_offer(&draft, DEMO_ACTOR, at)?;
    service.respond_to_offer(
        &selection.candidate.candidate_id,
        &offer.offer_id,
        OfferResponse::Declined,
        DEMO_ACTOR,
        at,
    )?;
    Ok(())
}
