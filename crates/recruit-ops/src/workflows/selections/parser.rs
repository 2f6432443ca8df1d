use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// Raw CSV row from the candidate selection export. Numbers stay textual so bad cells
/// can be reported per line instead of failing the whole file.
#[derive(Debug, Deserialize)]
pub(crate) struct SelectionRow {
    #[serde(rename = "Selection ID", default, deserialize_with = "empty_string_as_none")]
    pub(crate) selection_id: Option<String>,
    #[serde(rename = "Candidate Code", default, deserialize_with = "empty_string_as_none")]
    pub(crate) candidate_code: Option<String>,
    #[serde(rename = "Candidate Name", default, deserialize_with = "empty_string_as_none")]
    pub(crate) candidate_name: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "empty_string_as_none")]
    pub(crate) email: Option<String>,
    #[serde(rename = "Phone", default, deserialize_with = "empty_string_as_none")]
    pub(crate) phone: Option<String>,
    #[serde(rename = "Recruiter", default, deserialize_with = "empty_string_as_none")]
    pub(crate) recruiter: Option<String>,
    #[serde(rename = "Job Title", default, deserialize_with = "empty_string_as_none")]
    pub(crate) job_title: Option<String>,
    #[serde(rename = "Job Description", default, deserialize_with = "empty_string_as_none")]
    pub(crate) job_description: Option<String>,
    #[serde(rename = "Job Location", default, deserialize_with = "empty_string_as_none")]
    pub(crate) job_location: Option<String>,
    #[serde(rename = "Proposed Salary", default, deserialize_with = "empty_string_as_none")]
    pub(crate) proposed_salary: Option<String>,
    #[serde(rename = "Expected Salary", default, deserialize_with = "empty_string_as_none")]
    pub(crate) expected_salary: Option<String>,
    #[serde(
        rename = "Preferred Location",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) preferred_location: Option<String>,
    #[serde(rename = "Selected On", default, deserialize_with = "empty_string_as_none")]
    pub(crate) selected_on: Option<String>,
}

impl SelectionRow {
    pub(crate) fn is_blank(&self) -> bool {
        [
            &self.selection_id,
            &self.candidate_code,
            &self.candidate_name,
            &self.email,
            &self.job_title,
        ]
        .iter()
        .all(|field| field.is_none())
    }
}

/// Rows paired with their line number in the source file.
pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<(u64, SelectionRow)>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(rows.len() as u64 + 2);
        let row: SelectionRow = record.deserialize(Some(&headers))?;
        rows.push((line, row));
    }

    Ok(rows)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Accepts plain integers as well as `85,000` / `₹85000` style cells.
pub(crate) fn parse_salary(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ',' | '_' | ' ' | '$' | '₹' | '€' | '£'))
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok()
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}
