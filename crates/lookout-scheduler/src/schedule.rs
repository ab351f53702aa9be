//! Cron parsing and next-occurrence computation
//!
//! Detector crons are standard 5-field expressions (minute resolution);
//! the underlying parser wants a seconds field, so 5-field input is
//! normalized with a leading `0`. All evaluation is in UTC.

use crate::error::{Result, SchedulerError};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// Parse a 5-field (or already seconds-qualified 6/7-field) cron expression
pub fn parse_cron(expression: &str) -> Result<Schedule> {
    let fields = expression.split_whitespace().count();
    let normalized;
    let effective = if fields == 5 {
        normalized = format!("0 {}", expression);
        normalized.as_str()
    } else {
        expression
    };
    Schedule::from_str(effective).map_err(|source| SchedulerError::Cron {
        expression: expression.to_string(),
        source,
    })
}

/// Next occurrence strictly after `after`
pub fn next_occurrence(expression: &str, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
    parse_cron(expression)?
        .after(&after)
        .next()
        .ok_or_else(|| SchedulerError::NoNextOccurrence(expression.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn five_field_expressions_are_normalized() {
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 15).unwrap();
        let next = next_occurrence("*/5 * * * *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 1, 10, 35, 0).unwrap());
    }

    #[test]
    fn six_field_expressions_pass_through() {
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 15).unwrap();
        let next = next_occurrence("30 * * * * *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 1, 10, 31, 30).unwrap());
    }

    #[test]
    fn daily_cron_rolls_to_next_day() {
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let next = next_occurrence("0 3 * * *", after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 2, 3, 0, 0).unwrap());
    }

    #[test]
    fn garbage_expression_is_an_error() {
        let after = Utc::now();
        assert!(matches!(
            next_occurrence("not a cron", after),
            Err(SchedulerError::Cron { .. })
        ));
    }
}
