use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use recruit_ops::error::AppError;
use recruit_ops::workflows::eligibility::{
    EligibilityService, InMemoryActivityLog, InMemoryCandidateRepository, PolicyConfig,
};
use recruit_ops::workflows::selections::{CandidateSelection, SelectionImporter};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) type MemoryEligibilityService =
    EligibilityService<InMemoryCandidateRepository, InMemoryActivityLog>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_service(config: PolicyConfig) -> MemoryEligibilityService {
    EligibilityService::new(
        Arc::new(InMemoryCandidateRepository::default()),
        Arc::new(InMemoryActivityLog::default()),
        config,
    )
}

/// Read a selection export, logging rows that could not be imported.
pub(crate) fn load_selections(path: &Path) -> Result<Vec<CandidateSelection>, AppError> {
    let import = SelectionImporter::from_path(path)?;
    for rejected in &import.rejected {
        warn!(
            path = %path.display(),
            line = rejected.line,
            reason = %rejected.reason,
            "selection row skipped"
        );
    }
    info!(
        path = %path.display(),
        selections = import.selections.len(),
        rejected = import.rejected.len(),
        "selection export loaded"
    );
    Ok(import.selections)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
