//! Fixed-width time buckets relative to present
//!
//! Elapsed time `present - at` is cut into slots of `width` milliseconds and
//! only the first record seen in each slot survives. Integer division
//! truncates toward zero, which is floor for past records and ceil for future
//! ones: a record exactly at present lands in bucket 0, and so does anything
//! less than one width into the future.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::error::SieveError;

/// Keeps one record per fixed-width time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucketer {
    width_ms: i64,
}

impl Bucketer {
    /// Create a bucketer; the width must be at least one millisecond
    pub fn new(width: Duration) -> Result<Self, SieveError> {
        Self::from_millis(width.num_milliseconds())
    }

    /// Create a bucketer from a width in milliseconds
    pub fn from_millis(width_ms: i64) -> Result<Self, SieveError> {
        if width_ms <= 0 {
            return Err(SieveError::InvalidBucket { millis: width_ms });
        }
        Ok(Self { width_ms })
    }

    /// One bucket per hour
    pub fn hourly() -> Self {
        Self {
            width_ms: Duration::hours(1).num_milliseconds(),
        }
    }

    /// One bucket per day
    pub fn daily() -> Self {
        Self {
            width_ms: Duration::days(1).num_milliseconds(),
        }
    }

    /// Bucket width
    pub fn width(&self) -> Duration {
        Duration::milliseconds(self.width_ms)
    }

    /// Bucket index of `at` relative to `present`
    pub fn index(&self, present: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
        (present - at).num_milliseconds() / self.width_ms
    }

    /// Start an empty occupancy table for one call
    pub fn tracker(&self, present: DateTime<Utc>) -> BucketTracker {
        BucketTracker {
            bucketer: *self,
            present,
            taken: HashSet::new(),
        }
    }

    /// Keep the first record of each bucket, preserving input order
    pub fn pick<'a, T, I, F>(&self, present: DateTime<Utc>, records: I, date: F) -> Vec<&'a T>
    where
        T: ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> DateTime<Utc>,
    {
        let mut tracker = self.tracker(present);
        records
            .into_iter()
            .filter(|record| tracker.admit(date(*record)))
            .collect()
    }
}

/// Per-call bucket occupancy, usable one record at a time
#[derive(Debug, Clone)]
pub struct BucketTracker {
    bucketer: Bucketer,
    present: DateTime<Utc>,
    taken: HashSet<i64>,
}

impl BucketTracker {
    /// Admit a timestamp if its bucket is still free
    pub fn admit(&mut self, at: DateTime<Utc>) -> bool {
        let index = self.bucketer.index(self.present, at);
        self.admit_index(index)
    }

    /// Admit a precomputed bucket index if still free
    pub fn admit_index(&mut self, index: i64) -> bool {
        let fresh = self.taken.insert(index);
        if !fresh {
            tracing::trace!(bucket = index, "Bucket already taken, dropping record");
        }
        fresh
    }

    /// Check if a bucket has been claimed
    pub fn is_taken(&self, index: i64) -> bool {
        self.taken.contains(&index)
    }

    /// Number of claimed buckets
    pub fn occupied(&self) -> usize {
        self.taken.len()
    }

    /// The present this tracker was opened with
    pub fn present(&self) -> DateTime<Utc> {
        self.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn present() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 11, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_index_rounds_toward_zero() {
        let now = present();
        let hourly = Bucketer::hourly();

        assert_eq!(hourly.index(now, now), 0);
        assert_eq!(hourly.index(now, now - Duration::minutes(59)), 0);
        assert_eq!(hourly.index(now, now - Duration::hours(1)), 1);
        assert_eq!(hourly.index(now, now - Duration::minutes(119)), 1);
        assert_eq!(hourly.index(now, now + Duration::minutes(30)), 0);
        assert_eq!(hourly.index(now, now + Duration::minutes(90)), -1);
    }

    #[test]
    fn test_rejects_degenerate_width() {
        assert!(matches!(
            Bucketer::new(Duration::zero()),
            Err(SieveError::InvalidBucket { millis: 0 })
        ));
        assert!(matches!(
            Bucketer::new(Duration::microseconds(500)),
            Err(SieveError::InvalidBucket { millis: 0 })
        ));
        assert!(Bucketer::from_millis(-1).is_err());
        assert_eq!(Bucketer::from_millis(1).unwrap().width(), Duration::milliseconds(1));
    }

    #[test]
    fn test_pick_first_wins() {
        let now = present();
        let times = vec![
            now - Duration::minutes(50),
            now - Duration::minutes(5),
            now - Duration::minutes(70),
            now - Duration::minutes(61),
        ];

        let kept = Bucketer::hourly().pick(now, &times, |t| *t);
        assert_eq!(kept, vec![&times[0], &times[2]]);
    }

    #[test]
    fn test_pick_is_stateless() {
        let now = present();
        let times: Vec<_> = (0..10).map(|i| now - Duration::minutes(i * 20)).collect();
        let daily = Bucketer::daily();

        let first = daily.pick(now, &times, |t| *t);
        let second = daily.pick(now, &times, |t| *t);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_tracker_item_mode() {
        let now = present();
        let mut tracker = Bucketer::hourly().tracker(now);

        assert!(tracker.admit(now));
        assert!(!tracker.admit(now - Duration::minutes(10)));
        assert!(tracker.admit(now - Duration::hours(3)));
        assert!(tracker.is_taken(3));
        assert!(!tracker.is_taken(1));
        assert_eq!(tracker.occupied(), 2);
        assert_eq!(tracker.present(), now);
    }
}
