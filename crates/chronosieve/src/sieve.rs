//! Record-level facade binding present and accessor
//!
//! Every sequence operation resolves present exactly once, so all rules of a
//! single [`Sieve::filter`] call agree on the reference instant.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::bucket::Bucketer;
use crate::clock::{dated_accessor, Accessor, Dated, Present};
use crate::config::SieveConfig;
use crate::predicate::{TimePredicate, Today, Weekday, Window};
use crate::rule::{Plan, Rule};

/// Filters and down-samples borrowed records of type `T`
pub struct Sieve<T> {
    present: Present,
    date: Accessor<T>,
}

impl<T: Dated + 'static> Sieve<T> {
    /// Create a sieve reading timestamps through [`Dated`]
    pub fn new(config: SieveConfig) -> Self {
        Self {
            present: config.present_policy(),
            date: dated_accessor(),
        }
    }
}

impl<T: Dated + 'static> Default for Sieve<T> {
    fn default() -> Self {
        Self::new(SieveConfig::default())
    }
}

impl<T> Sieve<T> {
    /// Create a sieve with a custom timestamp accessor
    pub fn with_accessor<F>(config: SieveConfig, date: F) -> Self
    where
        F: Fn(&T) -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            present: config.present_policy(),
            date: Arc::new(date),
        }
    }

    /// Resolve present for one call
    pub fn present(&self) -> DateTime<Utc> {
        self.present.resolve()
    }

    /// Timestamp of a record
    pub fn date_of(&self, record: &T) -> DateTime<Utc> {
        (self.date)(record)
    }

    /// Keep records matching `predicate`, in input order
    pub fn select<'a, I>(&self, predicate: &dyn TimePredicate, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let present = self.present();
        records
            .into_iter()
            .filter(|record| predicate.test(present, self.date_of(record)))
            .collect()
    }

    /// Records from the last 24 hours
    pub fn last24h<'a, I>(&self, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.select(&Window::last_24h(), records)
    }

    /// Records from the last 7 days
    pub fn last_week<'a, I>(&self, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.select(&Window::last_week(), records)
    }

    /// Records on the same UTC calendar day as present
    pub fn today<'a, I>(&self, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.select(&Today, records)
    }

    /// Records not falling on Saturday or Sunday (UTC)
    pub fn skip_weekend<'a, I>(&self, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.select(&Weekday, records)
    }

    /// First record of each bucket
    pub fn bucket<'a, I>(&self, bucketer: Bucketer, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        bucketer.pick(self.present(), records, |record: &T| self.date_of(record))
    }

    /// First record of each hour
    pub fn hourly<'a, I>(&self, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.bucket(Bucketer::hourly(), records)
    }

    /// First record of each day
    pub fn daily<'a, I>(&self, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.bucket(Bucketer::daily(), records)
    }

    /// Apply a prioritized plan
    pub fn filter<'a, I>(&self, plan: &Plan, records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        plan.apply(self.present(), records, |record: &T| self.date_of(record))
    }

    /// Apply an ad-hoc list of rules, highest priority first
    pub fn filter_rules<'a, I>(&self, rules: &[Rule], records: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.filter(&Plan::new(rules.to_vec()), records)
    }

    /// Pair a window test with a bucketer
    pub fn when(&self, when: impl TimePredicate + 'static, pick: Bucketer) -> Rule {
        Rule::new(when, pick)
    }

    /// Per-record test for any predicate, present resolved now
    pub fn test_with<P>(&self, predicate: P) -> impl Fn(&T) -> bool
    where
        P: TimePredicate + 'static,
    {
        let present = self.present();
        let date = Arc::clone(&self.date);
        move |record: &T| predicate.test(present, date(record))
    }

    /// Per-record last-24-hours test
    pub fn last24h_test(&self) -> impl Fn(&T) -> bool {
        self.test_with(Window::last_24h())
    }

    /// Per-record last-week test
    pub fn last_week_test(&self) -> impl Fn(&T) -> bool {
        self.test_with(Window::last_week())
    }

    /// Per-record same-day test
    pub fn today_test(&self) -> impl Fn(&T) -> bool {
        self.test_with(Today)
    }

    /// Per-record weekday test
    pub fn weekday_test(&self) -> impl Fn(&T) -> bool {
        self.test_with(Weekday)
    }
}

impl<T> Clone for Sieve<T> {
    fn clone(&self) -> Self {
        Self {
            present: self.present,
            date: Arc::clone(&self.date),
        }
    }
}

impl<T> fmt::Debug for Sieve<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sieve")
            .field("present", &self.present)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        key: &'static str,
        taken_at: DateTime<Utc>,
    }

    fn present() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 11, 20, 12, 0, 0).unwrap()
    }

    fn sieve() -> Sieve<Reading> {
        Sieve::with_accessor(SieveConfig::new().with_present(present()), |r: &Reading| {
            r.taken_at
        })
    }

    #[test]
    fn test_custom_accessor() {
        let now = present();
        let readings = vec![
            Reading { key: "recent", taken_at: now - Duration::minutes(1) },
            Reading { key: "old", taken_at: now - Duration::days(2) },
            Reading { key: "future", taken_at: now + Duration::days(1) },
        ];

        let kept: Vec<_> = sieve().last24h(&readings).iter().map(|r| r.key).collect();
        assert_eq!(kept, vec!["recent"]);
    }

    #[test]
    fn test_chaining_window_then_bucket() {
        let now = present();
        let readings = vec![
            Reading { key: "a", taken_at: now - Duration::minutes(5) },
            Reading { key: "b", taken_at: now - Duration::minutes(15) },
            Reading { key: "c", taken_at: now - Duration::hours(30) },
        ];

        let s = sieve();
        let kept: Vec<_> = s.hourly(s.last24h(&readings)).iter().map(|r| r.key).collect();
        assert_eq!(kept, vec!["a"]);

        let kept: Vec<_> = s.daily(&readings).iter().map(|r| r.key).collect();
        assert_eq!(kept, vec!["a", "c"]);
    }

    #[test]
    fn test_record_tests() {
        let now = present();
        let s = sieve();
        let recent = Reading { key: "r", taken_at: now - Duration::hours(30) };

        assert!(!s.last24h_test()(&recent));
        assert!(s.last_week_test()(&recent));
        assert!(!s.today_test()(&recent));
        // 2015-11-19 is a Thursday
        assert!(s.weekday_test()(&recent));
    }

    #[test]
    fn test_dated_records() {
        let now = present();
        let times = vec![now, now - Duration::days(8)];
        let s: Sieve<DateTime<Utc>> = Sieve::new(SieveConfig::new().with_present(now));
        assert_eq!(s.last_week(&times), vec![&times[0]]);
        assert_eq!(s.present(), now);
        assert!(format!("{:?}", s.clone()).contains("Fixed"));
    }
}
