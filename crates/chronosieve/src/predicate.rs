//! Time predicates anchored at a reference instant
//!
//! A predicate answers one question: given the present and a record's
//! timestamp, does the record belong? Windows look backwards only, so a
//! record stamped after the present never matches a [`Window`].

use chrono::{DateTime, Datelike, Duration, Utc, Weekday as ChronoWeekday};
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::SieveError;

/// Decides whether a timestamp is selected relative to a present instant
pub trait TimePredicate: Debug + Send + Sync {
    /// Returns true when `at` is selected with respect to `present`
    fn test(&self, present: DateTime<Utc>, at: DateTime<Utc>) -> bool;
}

impl<P: TimePredicate + ?Sized> TimePredicate for Box<P> {
    fn test(&self, present: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        (**self).test(present, at)
    }
}

impl<P: TimePredicate + ?Sized> TimePredicate for Arc<P> {
    fn test(&self, present: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        (**self).test(present, at)
    }
}

/// "Last N" window: the half-open range `(present - duration, present]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    duration: Duration,
}

impl Window {
    /// Create a window; the duration must be strictly positive
    pub fn new(duration: Duration) -> Result<Self, SieveError> {
        if duration <= Duration::zero() {
            return Err(SieveError::InvalidWindow {
                millis: duration.num_milliseconds(),
            });
        }
        Ok(Self { duration })
    }

    /// Window over the last `millis` milliseconds
    pub fn from_millis(millis: i64) -> Result<Self, SieveError> {
        Self::new(Duration::milliseconds(millis))
    }

    /// The last 24 hours
    pub fn last_24h() -> Self {
        Self {
            duration: Duration::hours(24),
        }
    }

    /// The last 7 days
    pub fn last_week() -> Self {
        Self {
            duration: Duration::weeks(1),
        }
    }

    /// Window length
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl TimePredicate for Window {
    fn test(&self, present: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        let delta = at - present;
        delta <= Duration::zero() && delta > -self.duration
    }
}

/// Same UTC calendar day as present, regardless of hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Today;

impl TimePredicate for Today {
    fn test(&self, present: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        present.date_naive() == at.date_naive()
    }
}

/// Monday through Friday in UTC; present is ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Weekday;

impl TimePredicate for Weekday {
    fn test(&self, _present: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        !matches!(at.weekday(), ChronoWeekday::Sat | ChronoWeekday::Sun)
    }
}

/// Conjunction of predicates. An empty conjunction selects everything.
#[derive(Debug, Clone, Default)]
pub struct All {
    predicates: Vec<Arc<dyn TimePredicate>>,
}

impl All {
    /// Create an empty conjunction
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate
    pub fn with(mut self, predicate: impl TimePredicate + 'static) -> Self {
        self.predicates.push(Arc::new(predicate));
        self
    }

    /// Number of combined predicates
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl TimePredicate for All {
    fn test(&self, present: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        self.predicates.iter().all(|p| p.test(present, at))
    }
}

/// Combine time predicates with logical "and"
pub fn and<I>(predicates: I) -> All
where
    I: IntoIterator<Item = Arc<dyn TimePredicate>>,
{
    All {
        predicates: predicates.into_iter().collect(),
    }
}

/// Combine unary record predicates with logical "and".
///
/// Evaluation short-circuits on the first predicate that rejects.
pub fn and_records<T, I>(predicates: I) -> impl Fn(&T) -> bool
where
    I: IntoIterator<Item = Box<dyn Fn(&T) -> bool>>,
{
    let predicates: Vec<_> = predicates.into_iter().collect();
    move |record: &T| predicates.iter().all(|p| p(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn present() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1995, 12, 17, 13, 24, 0).unwrap()
    }

    #[test]
    fn test_window_boundaries() {
        let now = present();
        let window = Window::last_24h();

        assert!(window.test(now, now));
        assert!(window.test(now, now - Duration::minutes(10)));
        assert!(window.test(now, now - Duration::hours(24) + Duration::milliseconds(1)));
        assert!(!window.test(now, now - Duration::hours(24)));
        assert!(!window.test(now, now - Duration::hours(24) - Duration::minutes(10)));
        assert!(!window.test(now, now + Duration::milliseconds(1)));
        assert!(!window.test(now, now + Duration::hours(25)));
    }

    #[test]
    fn test_window_rejects_non_positive() {
        assert!(matches!(
            Window::new(Duration::zero()),
            Err(SieveError::InvalidWindow { millis: 0 })
        ));
        assert!(matches!(
            Window::from_millis(-1000),
            Err(SieveError::InvalidWindow { millis: -1000 })
        ));
        assert_eq!(Window::from_millis(1).unwrap().duration(), Duration::milliseconds(1));
    }

    #[test]
    fn test_today_is_calendar_day() {
        let now = present();
        let at = |d, h, m, s| Utc.with_ymd_and_hms(1995, 12, d, h, m, s).unwrap();

        assert!(Today.test(now, at(17, 0, 0, 0)));
        assert!(Today.test(now, at(17, 23, 59, 59)));
        assert!(Today.test(now, at(17, 20, 20, 20)));
        assert!(!Today.test(now, at(18, 0, 0, 0)));
        assert!(!Today.test(now, at(16, 23, 59, 59)));
    }

    #[test]
    fn test_today_near_midnight() {
        let now = Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap();
        assert!(!Today.test(now, now - Duration::milliseconds(1)));
        assert!(Window::last_24h().test(now, now - Duration::milliseconds(1)));
    }

    #[test]
    fn test_weekday() {
        let now = present();
        // 2015-11-21 is a Saturday
        let saturday = Utc.with_ymd_and_hms(2015, 11, 21, 9, 0, 0).unwrap();
        let sunday = saturday + Duration::days(1);
        let monday = saturday + Duration::days(2);

        assert!(!Weekday.test(now, saturday));
        assert!(!Weekday.test(now, sunday));
        assert!(Weekday.test(now, monday));
    }

    #[test]
    fn test_all_conjunction() {
        let now = Utc.with_ymd_and_hms(2015, 11, 23, 10, 0, 0).unwrap();
        let both = All::new().with(Weekday).with(Window::last_24h());

        assert_eq!(both.len(), 2);
        assert!(both.test(now, now - Duration::hours(2)));
        // Sunday evening, inside the last 24 hours
        assert!(!both.test(now, now - Duration::hours(14)));
        assert!(All::new().test(now, now + Duration::days(300)));
    }

    #[test]
    fn test_and_records_short_circuits() {
        let positive: Box<dyn Fn(&i64) -> bool> = Box::new(|v| *v > 0);
        let even: Box<dyn Fn(&i64) -> bool> = Box::new(|v| v % 2 == 0);
        let both = and_records(vec![positive, even]);

        assert!(both(&4));
        assert!(!both(&3));
        assert!(!both(&-2));
    }
}
