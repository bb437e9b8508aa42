use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Every problem found in a submitted form, reported together before anything is written.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Error)]
#[error("validation failed: {}", .0.join(", "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(format!("{field} is required"));
        }
    }

    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(format!("{field} is required"));
        }
        value
    }

    pub fn check_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.push("end_date must be on or after start_date");
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.0
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Trims and drops empty optional text so blank inputs are stored as NULL.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Extra commerces for an offer or event: submission order kept, duplicates and the
/// primary commerce dropped.
pub fn dedupe_additional_commerces(primary: Uuid, ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut additional = Vec::with_capacity(ids.len());
    for id in ids {
        if id != primary && !additional.contains(&id) {
            additional.push(id);
        }
    }
    additional
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_problem() {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", "  ");
        errors.require::<u8>("commerce_id", None);
        errors.check_date_range(
            NaiveDate::from_ymd_opt(2025, 5, 2),
            NaiveDate::from_ymd_opt(2025, 5, 1),
        );

        let err = errors.into_result().unwrap_err();
        assert_eq!(
            err.errors(),
            [
                "title is required",
                "commerce_id is required",
                "end_date must be on or after start_date",
            ]
        );
    }

    #[test]
    fn same_day_range_is_valid() {
        let mut errors = ValidationErrors::new();
        let day = NaiveDate::from_ymd_opt(2025, 5, 1);
        errors.check_date_range(day, day);
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(clean_optional(Some("  ".to_string())), None);
        assert_eq!(clean_optional(Some(" a ".to_string())), Some("a".to_string()));
    }
}
