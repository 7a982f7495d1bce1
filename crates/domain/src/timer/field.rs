//! Cron-like field masks and their matching against wall-clock time.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::ValidationError;

/// One schedule field: `"*"`, a literal integer or a `"*/N"` step pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    Any,
    Exact(u32),
    Every(u32),
}

impl FieldSpec {
    /// Parse `value` for the schedule field named `field`, whose literals
    /// must lie within `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidField`] for an unparsable value, a
    /// literal outside `range` or a zero step.
    pub fn parse(
        field: &'static str,
        value: &str,
        range: std::ops::RangeInclusive<u32>,
    ) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidField {
            field,
            value: value.to_string(),
        };
        let value = value.trim();
        if value == "*" {
            return Ok(Self::Any);
        }
        if let Some(step) = value.strip_prefix("*/") {
            return match step.parse::<u32>() {
                Ok(n) if n > 0 => Ok(Self::Every(n)),
                _ => Err(invalid()),
            };
        }
        match value.parse::<u32>() {
            Ok(n) if range.contains(&n) => Ok(Self::Exact(n)),
            _ => Err(invalid()),
        }
    }

    #[must_use]
    pub fn matches(self, component: u32) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(n) => component == n,
            Self::Every(n) => component % n == 0,
        }
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(n) => write!(f, "{n}"),
            Self::Every(n) => write!(f, "*/{n}"),
        }
    }
}

/// The six parsed fields of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub month: FieldSpec,
    /// Day of week, 0 is Sunday.
    pub week: FieldSpec,
    pub day: FieldSpec,
    pub hour: FieldSpec,
    pub minute: FieldSpec,
    pub second: FieldSpec,
}

impl Schedule {
    /// Parse the six textual fields.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError::InvalidField`] encountered.
    pub fn parse(
        month: &str,
        week: &str,
        day: &str,
        hour: &str,
        minute: &str,
        second: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            month: FieldSpec::parse("month", month, 1..=12)?,
            week: FieldSpec::parse("week", week, 0..=6)?,
            day: FieldSpec::parse("day", day, 1..=31)?,
            hour: FieldSpec::parse("hour", hour, 0..=23)?,
            minute: FieldSpec::parse("minute", minute, 0..=59)?,
            second: FieldSpec::parse("second", second, 0..=59)?,
        })
    }

    /// Whether every field holds for `at`.
    #[must_use]
    pub fn matches(&self, at: &NaiveDateTime) -> bool {
        self.month.matches(at.month())
            && self.week.matches(at.weekday().num_days_from_sunday())
            && self.day.matches(at.day())
            && self.hour.matches(at.hour())
            && self.minute.matches(at.minute())
            && self.second.matches(at.second())
    }
}
