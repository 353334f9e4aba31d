//! Date-range types for search filtering.
//!
//! A [`DateRange`] is derived from either an explicit ISO date or a relative
//! phrase ("this weekend"), then expanded by a tolerance window on both ends
//! so near-boundary events survive the datastore filter and are judged by
//! the re-scoring pass instead.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::{DATE_TOLERANCE_HOURS, DEFAULT_EVENT_WINDOW_HOURS, REFERENCE_TZ};

/// An inclusive datetime window used as a search filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub gte: DateTime<Utc>,
    pub lte: DateTime<Utc>,
}

impl DateRange {
    /// Create a range from explicit boundaries.
    pub fn new(gte: DateTime<Utc>, lte: DateTime<Utc>) -> Self {
        Self { gte, lte }
    }

    /// Range covering a single calendar day in the reference timezone.
    pub fn for_date(date: NaiveDate) -> Self {
        Self::for_dates(date, date)
    }

    /// Range covering whole calendar days from `start` through `end`
    /// (inclusive), anchored in the reference timezone.
    pub fn for_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let gte = local_midnight(start);
        let lte = local_midnight(end) + Duration::hours(DEFAULT_EVENT_WINDOW_HOURS)
            - Duration::seconds(1);
        Self { gte, lte }
    }

    /// Expand the range by `hours` on both ends.
    pub fn expanded(self, hours: i64) -> Self {
        Self {
            gte: self.gte - Duration::hours(hours),
            lte: self.lte + Duration::hours(hours),
        }
    }

    /// Expand by the default tolerance window.
    pub fn with_tolerance(self) -> Self {
        self.expanded(DATE_TOLERANCE_HOURS)
    }

    /// Whether an instant falls inside the range.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.gte && instant <= self.lte
    }

    /// How many whole days an instant falls outside the range.
    /// Zero when the instant is inside.
    pub fn days_outside(&self, instant: DateTime<Utc>) -> i64 {
        if instant < self.gte {
            (self.gte - instant).num_days().max(1)
        } else if instant > self.lte {
            (instant - self.lte).num_days().max(1)
        } else {
            0
        }
    }
}

/// Midnight of `date` in the reference timezone, as a UTC instant.
///
/// DST gaps cannot occur at midnight in the reference zone, but the
/// resolution is still defensive: an ambiguous local time takes the
/// earliest instant, a nonexistent one rolls forward an hour.
fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
    match REFERENCE_TZ.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        chrono::LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            REFERENCE_TZ
                .from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_range_covers_the_day() {
        let range = DateRange::for_date(date(2026, 6, 15));
        assert!(range.gte < range.lte);
        // June 15 20:00 Brussels is 18:00 UTC
        let evening = Utc.with_ymd_and_hms(2026, 6, 15, 18, 0, 0).unwrap();
        assert!(range.contains(evening));
        let next_day = Utc.with_ymd_and_hms(2026, 6, 16, 23, 0, 0).unwrap();
        assert!(!range.contains(next_day));
    }

    #[test]
    fn test_multi_day_range() {
        let range = DateRange::for_dates(date(2026, 6, 13), date(2026, 6, 14));
        let saturday_night = Utc.with_ymd_and_hms(2026, 6, 13, 20, 0, 0).unwrap();
        let sunday_night = Utc.with_ymd_and_hms(2026, 6, 14, 20, 0, 0).unwrap();
        assert!(range.contains(saturday_night));
        assert!(range.contains(sunday_night));
    }

    #[test]
    fn test_tolerance_expansion_widens_both_ends() {
        let base = DateRange::for_date(date(2026, 6, 15));
        let expanded = base.with_tolerance();
        assert!(expanded.gte < base.gte);
        assert!(expanded.lte > base.lte);
        assert_eq!(base.gte - expanded.gte, Duration::hours(DATE_TOLERANCE_HOURS));
    }

    #[test]
    fn test_days_outside_zero_inside() {
        let range = DateRange::for_date(date(2026, 6, 15));
        let inside = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(range.days_outside(inside), 0);
    }

    #[test]
    fn test_days_outside_after() {
        let range = DateRange::for_date(date(2026, 6, 15));
        let later = Utc.with_ymd_and_hms(2026, 6, 20, 12, 0, 0).unwrap();
        assert!(range.days_outside(later) >= 4);
    }

    #[test]
    fn test_range_spanning_dst_transition_is_monotonic() {
        // Europe/Brussels springs forward on 2026-03-29
        let range = DateRange::for_dates(date(2026, 3, 28), date(2026, 3, 30));
        assert!(range.gte < range.lte);
        let mid = Utc.with_ymd_and_hms(2026, 3, 29, 12, 0, 0).unwrap();
        assert!(range.contains(mid));
    }
}
