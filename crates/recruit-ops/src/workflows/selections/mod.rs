//! Candidate selection notifications: the recruiter hand-off that seeds candidate records
//! and pre-fills offer creation.

mod parser;

use crate::workflows::eligibility::{
    Candidate, CandidateExpectations, CandidateId, CandidateRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use parser::SelectionRow;

/// `candidate_selection` record from the notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSelection {
    pub selection_id: String,
    pub candidate: Candidate,
    pub recruiter: String,
    pub job_title: String,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub job_location: Option<String>,
    #[serde(default)]
    pub proposed_salary: Option<u32>,
    #[serde(default)]
    pub expectations: Option<CandidateExpectations>,
    #[serde(default)]
    pub selected_on: Option<NaiveDate>,
}

impl CandidateSelection {
    pub fn to_record(&self) -> CandidateRecord {
        let record = CandidateRecord::new(self.candidate.clone());
        match &self.expectations {
            Some(expectations) => record.with_expectations(expectations.clone()),
            None => record,
        }
    }
}

/// Row that could not be turned into a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionImport {
    pub selections: Vec<CandidateSelection>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug)]
pub enum SelectionImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for SelectionImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionImportError::Io(err) => write!(f, "failed to read selection export: {}", err),
            SelectionImportError::Csv(err) => write!(f, "invalid selection CSV data: {}", err),
        }
    }
}

impl std::error::Error for SelectionImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SelectionImportError::Io(err) => Some(err),
            SelectionImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SelectionImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SelectionImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct SelectionImporter;

impl SelectionImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<SelectionImport, SelectionImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Blank rows are skipped; malformed rows are reported and the rest still import.
    pub fn from_reader<R: Read>(reader: R) -> Result<SelectionImport, SelectionImportError> {
        let mut import = SelectionImport::default();

        for (line, row) in parser::parse_rows(reader)? {
            if row.is_blank() {
                continue;
            }
            match selection_from_row(row) {
                Ok(selection) => import.selections.push(selection),
                Err(reason) => import.rejected.push(RejectedRow { line, reason }),
            }
        }

        Ok(import)
    }
}

fn selection_from_row(row: SelectionRow) -> Result<CandidateSelection, String> {
    let candidate_code = row
        .candidate_code
        .map(|code| code.to_ascii_uppercase())
        .ok_or("missing Candidate Code")?;
    let name = row.candidate_name.ok_or("missing Candidate Name")?;
    let email = row.email.ok_or("missing Email")?;
    let job_title = row.job_title.ok_or("missing Job Title")?;

    let proposed_salary = match row.proposed_salary.as_deref() {
        Some(raw) => Some(
            parser::parse_salary(raw).ok_or_else(|| format!("invalid Proposed Salary '{raw}'"))?,
        ),
        None => None,
    };
    let expected_salary = match row.expected_salary.as_deref() {
        Some(raw) => Some(
            parser::parse_salary(raw).ok_or_else(|| format!("invalid Expected Salary '{raw}'"))?,
        ),
        None => None,
    };
    let selected_on = match row.selected_on.as_deref() {
        Some(raw) => {
            Some(parser::parse_date(raw).ok_or_else(|| format!("invalid Selected On '{raw}'"))?)
        }
        None => None,
    };

    let expectations = match (expected_salary, row.preferred_location) {
        (Some(expected_salary), Some(preferred_location)) => Some(CandidateExpectations {
            expected_salary,
            preferred_location,
        }),
        (None, None) => None,
        _ => return Err("Expected Salary and Preferred Location must be provided together".into()),
    };

    let selection_id = row
        .selection_id
        .unwrap_or_else(|| format!("sel-{}", candidate_code.to_ascii_lowercase()));

    Ok(CandidateSelection {
        selection_id,
        candidate: Candidate {
            candidate_id: CandidateId(candidate_code),
            name,
            email,
            phone: row.phone,
        },
        recruiter: row.recruiter.unwrap_or_else(|| "unassigned".to_string()),
        job_title,
        job_description: row.job_description,
        job_location: row.job_location,
        proposed_salary,
        expectations,
        selected_on,
    })
}
