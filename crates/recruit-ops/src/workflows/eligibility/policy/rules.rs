use super::super::domain::OfferRecord;

pub(crate) fn offer_decline_reason(threshold: u32) -> String {
    format!("Declined {threshold} job offers that met salary and location requirements")
}

/// Qualifying declines in `window`, counting `declined` exactly once.
pub(crate) fn qualifying_declines(window: &[OfferRecord], declined: &OfferRecord) -> u32 {
    let prior = window
        .iter()
        .filter(|offer| offer.offer_id != declined.offer_id && offer.is_qualifying_decline())
        .count() as u32;

    if declined.is_qualifying() {
        prior + 1
    } else {
        prior
    }
}

pub(crate) fn non_qualifying_rationale(declined: &OfferRecord) -> String {
    let mut gaps = Vec::new();
    if !declined.meets_salary_expectation() {
        gaps.push(format!(
            "offered salary {} was below the expected {}",
            declined.offered_salary, declined.expected_salary
        ));
    }
    if !declined.matches_preferred_location() {
        gaps.push(format!(
            "location '{}' did not match preferred '{}'",
            declined.location.trim(),
            declined.preferred_location.trim()
        ));
    }
    format!("decline does not count toward blocking: {}", gaps.join("; "))
}
