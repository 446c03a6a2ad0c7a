// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// Birth-form validation
//
// Turns raw submitted fields into a `BirthInput` the calendar engine can
// trust: range checks, real days-in-month, and the hour/minute pair rule.
// All field errors are collected so the form can show them together.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::{BirthInput, BirthTime};

/// Supported birth years.
pub const YEAR_RANGE: RangeInclusive<i64> = 1900..=2100;

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1..=12) of `year`. Returns 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// A birth form field that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Month => "month",
            Field::Day => "day",
            Field::Hour => "hour",
            Field::Minute => "minute",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failures, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BirthFormErrors {
    pub errors: BTreeMap<Field, String>,
}

impl BirthFormErrors {
    fn set(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for BirthFormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in self.errors.values() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for BirthFormErrors {}

/// Birth fields as submitted, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BirthForm {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
}

fn in_range(value: Option<i64>, range: RangeInclusive<i64>) -> Option<i64> {
    value.filter(|v| range.contains(v))
}

impl BirthForm {
    pub fn date(year: i64, month: i64, day: i64) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            hour: None,
            minute: None,
        }
    }

    pub fn with_time(mut self, hour: i64, minute: i64) -> Self {
        self.hour = Some(hour);
        self.minute = Some(minute);
        self
    }

    /// Validate the form into a `BirthInput`.
    pub fn validate(&self) -> Result<BirthInput, BirthFormErrors> {
        let mut errors = BirthFormErrors::default();

        let year = in_range(self.year, YEAR_RANGE);
        if year.is_none() {
            errors.set(Field::Year, "Enter a valid year (1900–2100).");
        }
        let month = in_range(self.month, 1..=12);
        if month.is_none() {
            errors.set(Field::Month, "Month must be 1–12.");
        }
        let day = in_range(self.day, 1..=31);
        if day.is_none() {
            errors.set(Field::Day, "Day must be 1–31.");
        }

        if let (Some(y), Some(m), Some(d)) = (year, month, day) {
            let max_day = days_in_month(y as i32, m as u32);
            if d as u32 > max_day {
                errors.set(Field::Day, format!("That month has only {max_day} days."));
            }
        }

        // Hour and minute travel together: once either is given, both are required.
        let mut time = None;
        if self.hour.is_some() || self.minute.is_some() {
            let hour = in_range(self.hour, 0..=23);
            if hour.is_none() {
                errors.set(Field::Hour, "Hour must be 0–23.");
            }
            let minute = in_range(self.minute, 0..=59);
            if minute.is_none() {
                errors.set(Field::Minute, "Minute must be 0–59.");
            }
            if let (Some(h), Some(m)) = (hour, minute) {
                time = Some(BirthTime {
                    hour: h as u32,
                    minute: m as u32,
                });
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        match (year, month, day) {
            (Some(y), Some(m), Some(d)) => Ok(BirthInput {
                year: y as i32,
                month: m as u32,
                day: d as u32,
                time,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_date_without_time() {
        let input = BirthForm::date(1997, 1, 1).validate().unwrap();
        assert_eq!(input, BirthInput::new(1997, 1, 1));
    }

    #[test]
    fn accepts_date_with_time() {
        let input = BirthForm::date(1997, 1, 1).with_time(23, 30).validate().unwrap();
        assert_eq!(input, BirthInput::new(1997, 1, 1).at(23, 30));
    }

    #[test]
    fn rejects_february_30() {
        let errors = BirthForm::date(2023, 2, 30).validate().unwrap_err();
        assert_eq!(errors.get(Field::Day), Some("That month has only 28 days."));
    }

    #[test]
    fn leap_day_follows_gregorian_rule() {
        assert!(BirthForm::date(2000, 2, 29).validate().is_ok());
        assert!(BirthForm::date(2024, 2, 29).validate().is_ok());
        let errors = BirthForm::date(1900, 2, 29).validate().unwrap_err();
        assert_eq!(errors.get(Field::Day), Some("That month has only 28 days."));
    }

    #[test]
    fn out_of_range_fields_are_all_reported() {
        let form = BirthForm {
            year: Some(1899),
            month: Some(13),
            day: Some(0),
            hour: Some(24),
            minute: Some(60),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.errors.len(), 5);
        assert_eq!(errors.get(Field::Year), Some("Enter a valid year (1900–2100)."));
        assert_eq!(errors.get(Field::Month), Some("Month must be 1–12."));
        assert_eq!(errors.get(Field::Day), Some("Day must be 1–31."));
        assert_eq!(errors.get(Field::Hour), Some("Hour must be 0–23."));
        assert_eq!(errors.get(Field::Minute), Some("Minute must be 0–59."));
    }

    #[test]
    fn missing_date_fields_are_errors() {
        let errors = BirthForm::default().validate().unwrap_err();
        assert!(errors.get(Field::Year).is_some());
        assert!(errors.get(Field::Month).is_some());
        assert!(errors.get(Field::Day).is_some());
        assert!(errors.get(Field::Hour).is_none());
    }

    #[test]
    fn half_a_time_pair_is_rejected() {
        let mut form = BirthForm::date(1997, 1, 1);
        form.hour = Some(23);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get(Field::Minute), Some("Minute must be 0–59."));
        assert!(errors.get(Field::Hour).is_none());
    }

    #[test]
    fn days_in_month_table() {
        assert_eq!(days_in_month(2023, 1), 31);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 13), 0);
    }

    #[test]
    fn form_deserializes_from_json() {
        let form: BirthForm = serde_json::from_str(r#"{"year":1997,"month":1,"day":1}"#).unwrap();
        assert_eq!(form, BirthForm::date(1997, 1, 1));
    }
}
