//! Timezone-aware temporal helpers
//!
//! The scheduler does its calendar arithmetic in the invoice owner's local
//! timezone and stores instants in UTC. This module provides the `Timezone`
//! wrapper used to cross that boundary, including a deterministic policy for
//! local times that do not exist (DST gaps) or exist twice (DST folds).

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper for invoice owners
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s)
            .map(Timezone)
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Parses an IANA timezone identifier
    pub fn parse(name: &str) -> Result<Self, TemporalError> {
        Tz::from_str(name)
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(name.to_string()))
    }

    /// Returns the IANA identifier
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Converts a UTC instant to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }

    /// Returns the local calendar date of a UTC instant
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        self.to_local(utc).date_naive()
    }

    /// Resolves a local wall-clock time to a UTC instant
    ///
    /// Ambiguous times (DST fold) resolve to the earlier offset. Times inside
    /// a DST gap are shifted forward one hour and re-resolved, which lands on
    /// a valid instant for every IANA zone this system accepts.
    pub fn resolve_local(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self.0.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
            LocalResult::None => {
                let shifted = local + chrono::Duration::hours(1);
                match self.0.from_local_datetime(&shifted) {
                    LocalResult::Single(dt) => dt.with_timezone(&Utc),
                    LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
                    // Unreachable for IANA zones; treat the wall-clock time
                    // as UTC rather than panicking.
                    LocalResult::None => Utc.from_utc_datetime(&local),
                }
            }
        }
    }

    /// Gets the start of day (00:00:00) in this timezone as UTC
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_local(date.and_time(NaiveTime::MIN))
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_parse_and_name() {
        let tz = Timezone::parse("Pacific/Auckland").unwrap();
        assert_eq!(tz.name(), "Pacific/Auckland");
        assert!(Timezone::parse("Neverwhere/Nowhere").is_err());
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 2023-01-01T12:00Z is already 2023-01-02 in Auckland (UTC+13)
        let tz = Timezone::parse("Pacific/Auckland").unwrap();
        let utc = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            tz.local_date(utc),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_resolve_local_dst_gap() {
        // 2023-09-24 02:30 does not exist in Auckland (clocks jump 02:00->03:00)
        let tz = Timezone::parse("Pacific/Auckland").unwrap();
        let gap = NaiveDate::from_ymd_opt(2023, 9, 24)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = tz.resolve_local(gap);
        assert_eq!(tz.to_local(resolved).hour(), 3);
    }

    #[test]
    fn test_resolve_local_dst_fold_takes_earlier() {
        // 2023-04-02 02:30 happens twice in Auckland (clocks fall back at 03:00)
        let tz = Timezone::parse("Pacific/Auckland").unwrap();
        let fold = NaiveDate::from_ymd_opt(2023, 4, 2)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = tz.resolve_local(fold);
        // Earlier offset is still NZDT (+13)
        assert_eq!(
            resolved,
            Utc.with_ymd_and_hms(2023, 4, 1, 13, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_start_of_day() {
        let tz = Timezone::parse("Pacific/Auckland").unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        // Auckland midnight in January is 11:00 UTC the previous day
        assert_eq!(
            tz.start_of_day(date),
            Utc.with_ymd_and_hms(2023, 1, 14, 11, 0, 0).unwrap()
        );
    }
}
