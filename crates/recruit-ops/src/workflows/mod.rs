pub mod eligibility;
pub mod selections;
