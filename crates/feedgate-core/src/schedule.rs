//! Publication schedules and time-bucket resolution.
//!
//! Upstream providers republish datasets at fixed hour-of-day marks.
//! Resolution picks the bucket the provider is expected to have data for
//! right now, minus a dataset-specific buffer compensating for
//! publication lag. Pure functions of their inputs; `now` is always
//! injected by the caller.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// A discrete publication slot: the date and time-of-day an upstream
/// snapshot is keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBucket {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Set when this bucket was produced by a fallback step.
    pub is_fallback: bool,
}

impl TimeBucket {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time,
            is_fallback: false,
        }
    }

    /// `YYYYMMDD`, the providers' `base_date` convention.
    pub fn base_date(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// `HHMM`, the providers' `base_time` convention.
    pub fn base_time(&self) -> String {
        self.time.format("%H%M").to_string()
    }

    /// Combined `YYYYMMDDHHMM` stamp, used as the bucket part of natural
    /// keys and as the mid-range `tm_fc` parameter.
    pub fn stamp(&self) -> String {
        format!("{}{}", self.base_date(), self.base_time())
    }

    /// Parse a combined `YYYYMMDDHHMM` stamp.
    pub fn parse_stamp(s: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M")
            .ok()
            .map(|dt| Self::new(dt.date(), dt.time()))
    }
}

/// Ordered hour-of-day marks at which one dataset is republished.
#[derive(Debug, Clone)]
pub struct PublicationSchedule {
    marks: Vec<NaiveTime>,
}

impl PublicationSchedule {
    /// Build a schedule from hour-of-day marks. Out-of-range hours are
    /// dropped; duplicates collapse.
    pub fn new(hours: &[u32]) -> Self {
        let mut marks: Vec<NaiveTime> = hours
            .iter()
            .filter_map(|&h| NaiveTime::from_hms_opt(h, 0, 0))
            .collect();
        marks.sort();
        marks.dedup();
        Self { marks }
    }

    /// Short-forecast publication hours.
    pub fn short_forecast() -> Self {
        Self::new(&[2, 5, 8, 11, 14, 17, 20, 23])
    }

    /// Mid-range forecast publication hours (06:00 / 18:00).
    pub fn half_day() -> Self {
        Self::new(&[6, 18])
    }

    fn last_mark(&self) -> NaiveTime {
        self.marks.last().copied().unwrap_or(NaiveTime::MIN)
    }

    /// The bucket the provider is expected to serve at `now`, after
    /// subtracting `buffer` for publication lag. Marks are inclusive:
    /// exactly at a mark resolves to that mark. When no mark on the
    /// adjusted day has passed yet, wraps to the previous day's last
    /// mark.
    pub fn resolve_current(&self, now: NaiveDateTime, buffer: Duration) -> TimeBucket {
        let adjusted = now - buffer;
        match self.marks.iter().rev().find(|m| **m <= adjusted.time()) {
            Some(&mark) => TimeBucket::new(adjusted.date(), mark),
            None => TimeBucket::new(prev_day(adjusted.date()), self.last_mark()),
        }
    }

    /// The bucket immediately prior to `bucket` in this schedule,
    /// wrapping to the previous day at the first mark. On a two-mark
    /// schedule this is a direct toggle.
    pub fn previous(&self, bucket: &TimeBucket) -> TimeBucket {
        let mut prev = match self.marks.iter().rev().find(|m| **m < bucket.time) {
            Some(&mark) => TimeBucket::new(bucket.date, mark),
            None => TimeBucket::new(prev_day(bucket.date), self.last_mark()),
        };
        prev.is_fallback = true;
        prev
    }
}

/// The nowcast variant: no discrete schedule, the provider republishes
/// hourly. Subtract the buffer and truncate to the top of the hour.
pub fn hourly_observation(now: NaiveDateTime, buffer: Duration) -> TimeBucket {
    let adjusted = now - buffer;
    let time = NaiveTime::from_hms_opt(adjusted.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
    TimeBucket::new(adjusted.date(), time)
}

fn prev_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    #[test]
    fn test_resolve_current_midday() {
        let schedule = PublicationSchedule::short_forecast();
        let bucket = schedule.resolve_current(at(2025, 3, 10, 12, 10), Duration::zero());
        assert_eq!(bucket.base_date(), "20250310");
        assert_eq!(bucket.base_time(), "1100");
    }

    #[test]
    fn test_resolve_current_wraps_to_previous_day() {
        let schedule = PublicationSchedule::short_forecast();
        let bucket = schedule.resolve_current(at(2025, 3, 10, 1, 10), Duration::zero());
        assert_eq!(bucket.base_date(), "20250309");
        assert_eq!(bucket.base_time(), "2300");
    }

    #[test]
    fn test_resolve_current_inclusive_at_mark() {
        let schedule = PublicationSchedule::short_forecast();
        let bucket = schedule.resolve_current(at(2025, 3, 10, 11, 0), Duration::zero());
        assert_eq!(bucket.base_time(), "1100");
    }

    #[test]
    fn test_resolve_current_buffer_shifts_choice() {
        let schedule = PublicationSchedule::short_forecast();
        // 11:10 with a 20-minute buffer lands before the 11:00 mark.
        let bucket = schedule.resolve_current(at(2025, 3, 10, 11, 10), Duration::minutes(20));
        assert_eq!(bucket.base_time(), "0800");
    }

    #[test]
    fn test_resolve_current_deterministic() {
        let schedule = PublicationSchedule::short_forecast();
        let now = at(2025, 3, 10, 17, 45);
        let a = schedule.resolve_current(now, Duration::minutes(20));
        let b = schedule.resolve_current(now, Duration::minutes(20));
        assert_eq!(a, b);
    }

    #[test]
    fn test_previous_toggles_half_day_schedule() {
        let schedule = PublicationSchedule::half_day();

        let morning = TimeBucket::new(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        );
        let prev = schedule.previous(&morning);
        assert_eq!(prev.base_date(), "20250309");
        assert_eq!(prev.base_time(), "1800");
        assert!(prev.is_fallback);

        let evening = TimeBucket::new(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        );
        let prev = schedule.previous(&evening);
        assert_eq!(prev.base_date(), "20250310");
        assert_eq!(prev.base_time(), "0600");
    }

    #[test]
    fn test_hourly_observation_floors_after_buffer() {
        let bucket = hourly_observation(at(2025, 3, 10, 12, 10), Duration::minutes(40));
        assert_eq!(bucket.base_date(), "20250310");
        assert_eq!(bucket.base_time(), "1100");

        // Early morning wraps to the previous day.
        let bucket = hourly_observation(at(2025, 3, 10, 0, 20), Duration::minutes(40));
        assert_eq!(bucket.base_date(), "20250309");
        assert_eq!(bucket.base_time(), "2300");
    }

    #[test]
    fn test_stamp_round_trip() {
        let bucket = TimeBucket::parse_stamp("202503101800").expect("valid stamp");
        assert_eq!(bucket.stamp(), "202503101800");
        assert!(TimeBucket::parse_stamp("2025-03-10").is_none());
    }
}
