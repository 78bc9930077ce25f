//! Row validation for normalized call candidates
//!
//! Applies the required-field policy (a real operator must be present) and
//! the range policy (ratings within [1, 5], no negative durations) to turn a
//! normalized candidate into a [`Record`] or a [`RejectionReason`].

use crate::app::models::{Record, RejectionReason};
use crate::constants::{
    EXCLUDED_OPERATOR_PREFIXES, EXCLUDED_OPERATOR_SENTINELS, RATING_MAX, RATING_MIN,
};
use chrono::{DateTime, Utc};

/// Normalized but not yet validated row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub operator_id: String,
    pub duration_minutes: f64,
    pub rating_attendance: Option<f64>,
    pub rating_solution: Option<f64>,
    pub pause_minutes: f64,
    pub call_count: u64,
}

/// Validate a candidate, producing a record or the first policy violated
///
/// Policies are checked in order: operator, ratings, durations. A missing
/// timestamp is accepted.
pub fn validate(candidate: CandidateRecord) -> Result<Record, RejectionReason> {
    let operator_id = candidate.operator_id.trim();
    if is_excluded_operator(operator_id) {
        return Err(RejectionReason::MissingOrExcludedOperator);
    }

    for rating in [candidate.rating_attendance, candidate.rating_solution]
        .into_iter()
        .flatten()
    {
        if !(RATING_MIN..=RATING_MAX).contains(&rating) {
            return Err(RejectionReason::RatingOutOfRange);
        }
    }

    if !is_non_negative(candidate.duration_minutes) || !is_non_negative(candidate.pause_minutes) {
        return Err(RejectionReason::NegativeDuration);
    }

    Ok(Record {
        timestamp: candidate.timestamp,
        operator_id: operator_id.to_string(),
        duration_minutes: candidate.duration_minutes,
        rating_attendance: candidate.rating_attendance,
        rating_solution: candidate.rating_solution,
        pause_minutes: candidate.pause_minutes,
        call_count: candidate.call_count,
    })
}

/// Whether an operator value is empty, a placeholder, or a disconnected agent
pub fn is_excluded_operator(operator_id: &str) -> bool {
    let trimmed = operator_id.trim();
    if trimmed.is_empty() {
        return true;
    }

    let lowered = trimmed.to_lowercase();
    EXCLUDED_OPERATOR_SENTINELS.contains(&lowered.as_str())
        || EXCLUDED_OPERATOR_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
}

fn is_non_negative(value: f64) -> bool {
    // NaN fails the comparison and is treated as invalid
    value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(operator: &str) -> CandidateRecord {
        CandidateRecord {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()),
            operator_id: operator.to_string(),
            duration_minutes: 8.5,
            rating_attendance: Some(5.0),
            rating_solution: Some(4.0),
            pause_minutes: 10.0,
            call_count: 1,
        }
    }

    #[test]
    fn test_valid_candidate_becomes_record() {
        let record = validate(candidate("  Ana Silva ")).unwrap();
        assert_eq!(record.operator_id, "Ana Silva");
        assert_eq!(record.duration_minutes, 8.5);
        assert_eq!(record.rating_attendance, Some(5.0));
        assert_eq!(record.call_count, 1);
    }

    #[test]
    fn test_missing_date_still_accepted() {
        let mut c = candidate("Ana Silva");
        c.timestamp = None;
        assert!(validate(c).is_ok());
    }

    #[test]
    fn test_absent_ratings_accepted() {
        let mut c = candidate("Ana Silva");
        c.rating_attendance = None;
        c.rating_solution = None;
        assert!(validate(c).is_ok());
    }

    #[test]
    fn test_excluded_operators() {
        for operator in [
            "",
            "   ",
            "-",
            "N/A",
            "null",
            "Agente Indisponível",
            "agent unavailable",
            "Desconectado - 4411",
            "DISCONNECTED user",
        ] {
            assert_eq!(
                validate(candidate(operator)),
                Err(RejectionReason::MissingOrExcludedOperator),
                "operator {:?} should be excluded",
                operator
            );
        }
    }

    #[test]
    fn test_operator_containing_excluded_word_is_kept() {
        assert!(!is_excluded_operator("Nadia"));
        assert!(!is_excluded_operator("João Desconectado"));
    }

    #[test]
    fn test_rating_out_of_range() {
        let mut c = candidate("Ana Silva");
        c.rating_attendance = Some(0.5);
        assert_eq!(validate(c), Err(RejectionReason::RatingOutOfRange));

        let mut c = candidate("Ana Silva");
        c.rating_solution = Some(5.5);
        assert_eq!(validate(c), Err(RejectionReason::RatingOutOfRange));
    }

    #[test]
    fn test_negative_durations() {
        let mut c = candidate("Ana Silva");
        c.duration_minutes = -1.0;
        assert_eq!(validate(c), Err(RejectionReason::NegativeDuration));

        let mut c = candidate("Ana Silva");
        c.pause_minutes = f64::NAN;
        assert_eq!(validate(c), Err(RejectionReason::NegativeDuration));
    }

    #[test]
    fn test_operator_checked_before_ranges() {
        let mut c = candidate("");
        c.rating_attendance = Some(9.0);
        c.duration_minutes = -4.0;
        assert_eq!(validate(c), Err(RejectionReason::MissingOrExcludedOperator));
    }
}
