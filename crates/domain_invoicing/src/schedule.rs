//! Frequency Calculator
//!
//! Computes the next occurrence of a recurring invoice. The interval is added
//! in the owner's local timezone so that "monthly" means the same local
//! calendar day (and wall-clock time) next month, regardless of UTC offset or
//! daylight saving. The result converts back to UTC for storage.

use chrono::{DateTime, Duration, Months, NaiveDateTime, Utc};

use core_kernel::Timezone;

use crate::status::Frequency;

/// Computes the next occurrence after `anchor`
///
/// The anchor converts into `tz`, one unit of the calendar interval is added
/// in local time, and the result converts back to UTC. Calendar month/year
/// addition keeps the same day-of-month, clamped to the last valid day when
/// the target month is shorter (Jan 31 + 1 month = Feb 28/29). The anchor's
/// time of day is preserved.
///
/// A missing frequency falls back to [`Frequency::default`] (monthly) rather
/// than aborting the chain.
pub fn next_occurrence(
    anchor: DateTime<Utc>,
    tz: Timezone,
    frequency: Option<Frequency>,
) -> DateTime<Utc> {
    let local = tz.to_local(anchor).naive_local();
    let next = match frequency.unwrap_or_default() {
        Frequency::Weekly => local + Duration::weeks(1),
        Frequency::Monthly => add_months(local, 1),
        Frequency::Quarterly => add_months(local, 3),
        Frequency::Yearly => add_months(local, 12),
    };
    tz.resolve_local(next)
}

/// Calendar-month addition with end-of-month clamping
fn add_months(local: NaiveDateTime, months: u32) -> NaiveDateTime {
    // checked_add_months only fails at the far edge of the representable
    // range; an invoice scheduled out there keeps its anchor.
    local
        .checked_add_months(Months::new(months))
        .unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tz(name: &str) -> Timezone {
        Timezone::parse(name).unwrap()
    }

    #[test]
    fn test_weekly_advance() {
        // 2023-01-01 + 1 week = 2023-01-08
        let anchor = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let next = next_occurrence(anchor, Timezone::default(), Some(Frequency::Weekly));
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 1, 8, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_monthly_advance_respects_local_calendar() {
        // 2023-01-01T12:00Z is 2023-01-02T01:00 in Auckland (UTC+13).
        // One local calendar month later is 2023-02-02T01:00 local, which
        // is 2023-02-01T12:00Z; the Auckland-local date of the result must
        // be exactly one month after the Auckland-local anchor.
        let auckland = tz("Pacific/Auckland");
        let anchor = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
        let next = next_occurrence(anchor, auckland, Some(Frequency::Monthly));
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 2, 1, 12, 0, 0).unwrap());
        assert_eq!(
            auckland.local_date(next),
            chrono::NaiveDate::from_ymd_opt(2023, 2, 2).unwrap()
        );
    }

    #[test]
    fn test_monthly_advance_clamps_to_month_end() {
        // Jan 31 + 1 month lands on the last day of February
        let anchor = Utc.with_ymd_and_hms(2023, 1, 31, 9, 30, 0).unwrap();
        let next = next_occurrence(anchor, Timezone::default(), Some(Frequency::Monthly));
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 2, 28, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_yearly_advance_clamps_leap_day() {
        let anchor = Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap();
        let next = next_occurrence(anchor, Timezone::default(), Some(Frequency::Yearly));
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 2, 28, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_quarterly_advance() {
        let anchor = Utc.with_ymd_and_hms(2023, 11, 30, 0, 0, 0).unwrap();
        let next = next_occurrence(anchor, Timezone::default(), Some(Frequency::Quarterly));
        // Nov 30 + 3 months clamps to Feb 29 (2024 is a leap year)
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_frequency_defaults_to_monthly() {
        let anchor = Utc.with_ymd_and_hms(2023, 5, 15, 10, 0, 0).unwrap();
        let next = next_occurrence(anchor, Timezone::default(), None);
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 6, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_monthly_advance_across_dst_preserves_wall_clock() {
        // Auckland leaves daylight saving on 2023-04-02. An invoice anchored
        // at 09:00 local in March stays at 09:00 local in April, so the UTC
        // offset shifts from +13 to +12.
        let auckland = tz("Pacific/Auckland");
        // 2023-03-15T09:00 NZDT = 2023-03-14T20:00Z
        let anchor = Utc.with_ymd_and_hms(2023, 3, 14, 20, 0, 0).unwrap();
        let next = next_occurrence(anchor, auckland, Some(Frequency::Monthly));
        // 2023-04-15T09:00 NZST = 2023-04-14T21:00Z
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 4, 14, 21, 0, 0).unwrap());
    }

    #[test]
    fn test_time_of_day_preserved() {
        let anchor = Utc.with_ymd_and_hms(2023, 7, 4, 14, 45, 30).unwrap();
        let next = next_occurrence(anchor, Timezone::default(), Some(Frequency::Weekly));
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 7, 11, 14, 45, 30).unwrap());
    }
}
