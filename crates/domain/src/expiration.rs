// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Expiration deadlines expressed in the event's time zone.
//!
//! ## Invariants
//!
//! - Working periods run Monday-Friday only (weekends are skipped)
//! - Daily working hours are wall-clock times in the event time zone
//! - Deadlines are returned as UTC instants
//! - A waiting-queue offer never expires outside a working period
//!
//! Waiting-queue offers landing outside a working period are moved to the
//! close of the next working period.

use crate::error::DomainError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Daily working hours, in the event time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingPeriod {
    start: time::Time,
    end: time::Time,
}

impl WorkingPeriod {
    /// Creates a working period.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidWorkingPeriod` if `start` is not before `end`.
    pub fn new(start: time::Time, end: time::Time) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::InvalidWorkingPeriod {
                reason: format!("start {start} must be before end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    /// Opening time.
    #[must_use]
    pub const fn start(&self) -> time::Time {
        self.start
    }

    /// Closing time.
    #[must_use]
    pub const fn end(&self) -> time::Time {
        self.end
    }

    fn naive_start(&self) -> Result<NaiveTime, DomainError> {
        to_naive_time(self.start)
    }

    fn naive_end(&self) -> Result<NaiveTime, DomainError> {
        to_naive_time(self.end)
    }
}

impl Default for WorkingPeriod {
    /// Office hours, 09:00 to 18:00.
    fn default() -> Self {
        Self {
            start: time::macros::time!(09:00),
            end: time::macros::time!(18:00),
        }
    }
}

fn to_naive_time(value: time::Time) -> Result<NaiveTime, DomainError> {
    NaiveTime::from_hms_opt(
        u32::from(value.hour()),
        u32::from(value.minute()),
        u32::from(value.second()),
    )
    .ok_or_else(|| DomainError::InvalidWorkingPeriod {
        reason: format!("invalid time {value}"),
    })
}

fn parse_zone(time_zone: &str) -> Result<Tz, DomainError> {
    time_zone
        .parse()
        .map_err(|_| DomainError::InvalidTimezone(time_zone.to_string()))
}

fn to_local(instant: OffsetDateTime, tz: Tz) -> Result<NaiveDateTime, DomainError> {
    let utc = DateTime::from_timestamp(instant.unix_timestamp(), 0).ok_or_else(|| {
        DomainError::DateArithmeticOverflow {
            operation: format!("converting {instant} to the event zone"),
        }
    })?;
    Ok(utc.with_timezone(&tz).naive_local())
}

fn from_local(local: NaiveDateTime, tz: Tz) -> Result<OffsetDateTime, DomainError> {
    // earliest() resolves DST overlaps; gaps fall back to the next valid hour
    let zoned = tz
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .ok_or_else(|| DomainError::InvalidWorkingPeriod {
            reason: format!("could not resolve {local} in zone {tz}"),
        })?;
    OffsetDateTime::from_unix_timestamp(zoned.timestamp()).map_err(|_| {
        DomainError::DateArithmeticOverflow {
            operation: format!("converting {local} back to UTC"),
        }
    })
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Adds a number of weekdays (Mon-Fri) to a date, skipping weekends.
fn add_weekdays(start: NaiveDate, weekdays: u32) -> NaiveDate {
    let mut current = start;
    let mut remaining = weekdays;

    while remaining > 0 {
        current += Duration::days(1);

        if is_weekday(current) {
            remaining -= 1;
        }
    }

    current
}

/// Expiration of a seat offered to a waiting-queue subscriber.
///
/// # Arguments
///
/// * `now` - The instant the offer is made
/// * `timeout_hours` - Nominal validity of the offer
/// * `time_zone` - The event time zone
/// * `period` - Daily working hours
///
/// # Errors
///
/// Returns an error if the time zone is unknown or the result cannot be
/// represented.
pub fn waiting_queue_expiration(
    now: OffsetDateTime,
    timeout_hours: u32,
    time_zone: &str,
    period: WorkingPeriod,
) -> Result<OffsetDateTime, DomainError> {
    let tz = parse_zone(time_zone)?;
    let candidate = now
        .checked_add(time::Duration::hours(i64::from(timeout_hours)))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("adding {timeout_hours} hours to {now}"),
        })?;
    let local = to_local(candidate, tz)?;
    let opens = period.naive_start()?;
    let closes = period.naive_end()?;

    let date = local.date();
    let time_of_day = local.time();
    if is_weekday(date) && time_of_day >= opens && time_of_day < closes {
        return Ok(candidate);
    }

    let target_date = if is_weekday(date) && time_of_day < opens {
        date
    } else {
        add_weekdays(date, 1)
    };
    from_local(target_date.and_time(closes), tz)
}

/// Deadline for a bank transfer, never later than the event start.
///
/// The deadline is the end of the day `days` working days after `now`, in
/// the event time zone.
///
/// # Errors
///
/// Returns an error if the time zone is unknown or the result cannot be
/// represented.
pub fn offline_payment_deadline(
    now: OffsetDateTime,
    days: u32,
    time_zone: &str,
    event_begin: OffsetDateTime,
) -> Result<OffsetDateTime, DomainError> {
    let tz = parse_zone(time_zone)?;
    let local = to_local(now, tz)?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(|| {
        DomainError::InvalidWorkingPeriod {
            reason: "invalid end of day".to_string(),
        }
    })?;
    let deadline = from_local(add_weekdays(local.date(), days).and_time(end_of_day), tz)?;
    Ok(deadline.min(event_begin))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::macros::{datetime, time};

    fn office_hours() -> WorkingPeriod {
        WorkingPeriod::new(time!(09:00), time!(18:00)).unwrap()
    }

    #[test]
    fn test_add_weekdays_skip_weekend() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(); // Friday
        let result = add_weekdays(start, 1);
        assert_eq!(result, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()); // Monday
    }

    #[test]
    fn test_add_weekdays_no_offset() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(); // Saturday
        assert_eq!(add_weekdays(start, 0), start);
    }

    #[test]
    fn test_invalid_working_period() {
        let result = WorkingPeriod::new(time!(18:00), time!(09:00));
        assert!(matches!(
            result,
            Err(DomainError::InvalidWorkingPeriod { .. })
        ));
    }

    #[test]
    fn test_expiration_inside_working_hours_is_kept() {
        // Monday 08:00 UTC = 09:00 Zurich (winter), +2h = 11:00
        let now = datetime!(2026-03-02 08:00 UTC);
        let result = waiting_queue_expiration(now, 2, "Europe/Zurich", office_hours()).unwrap();
        assert_eq!(result, datetime!(2026-03-02 10:00 UTC));
    }

    #[test]
    fn test_expiration_in_the_evening_moves_to_next_day_close() {
        // Monday 16:00 UTC = 17:00 Zurich, +4h = 21:00 -> Tuesday 18:00 local
        let now = datetime!(2026-03-02 16:00 UTC);
        let result = waiting_queue_expiration(now, 4, "Europe/Zurich", office_hours()).unwrap();
        assert_eq!(result, datetime!(2026-03-03 17:00 UTC));
    }

    #[test]
    fn test_expiration_on_weekend_moves_to_monday() {
        // Friday 16:00 UTC + 24h = Saturday
        let now = datetime!(2026-03-06 16:00 UTC);
        let result = waiting_queue_expiration(now, 24, "Europe/Zurich", office_hours()).unwrap();
        assert_eq!(result, datetime!(2026-03-09 17:00 UTC));
    }

    #[test]
    fn test_expiration_early_morning_closes_same_day() {
        // Tuesday 03:00 local
        let now = datetime!(2026-03-03 01:00 UTC);
        let result = waiting_queue_expiration(now, 1, "Europe/Zurich", office_hours()).unwrap();
        assert_eq!(result, datetime!(2026-03-03 17:00 UTC));
    }

    #[test]
    fn test_invalid_timezone() {
        let now = datetime!(2026-03-02 08:00 UTC);
        let result = waiting_queue_expiration(now, 1, "Mars/Olympus", office_hours());
        assert!(matches!(result, Err(DomainError::InvalidTimezone(_))));
    }

    #[test]
    fn test_offline_deadline_capped_by_event_begin() {
        let now = datetime!(2026-03-02 10:00 UTC);
        let begin = datetime!(2026-03-03 08:00 UTC);
        let deadline = offline_payment_deadline(now, 5, "Europe/Zurich", begin).unwrap();
        assert_eq!(deadline, begin);
    }

    #[test]
    fn test_offline_deadline_end_of_working_day() {
        // Friday + 1 working day = Monday, 23:59:59 Zurich
        let now = datetime!(2026-03-06 10:00 UTC);
        let begin = datetime!(2026-06-01 08:00 UTC);
        let deadline = offline_payment_deadline(now, 1, "Europe/Zurich", begin).unwrap();
        assert_eq!(deadline, datetime!(2026-03-09 22:59:59 UTC));
    }
}
