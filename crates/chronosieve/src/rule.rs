//! Prioritized window/bucket rules and their combination
//!
//! A [`Plan`] is an ordered list of [`Rule`]s. Each record is claimed by the
//! first rule whose window matches it and is never seen by later rules, even
//! when that rule's bucketer throws it away. This lets overlapping windows
//! express cascading resolution ("hourly for the last day, daily for the
//! last week") without a record being selected twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::bucket::{BucketTracker, Bucketer};
use crate::predicate::{TimePredicate, Window};

/// A window test paired with a bucketer
#[derive(Clone)]
pub struct Rule {
    label: Option<String>,
    when: Arc<dyn TimePredicate>,
    pick: Bucketer,
}

impl Rule {
    /// Create a rule from a predicate and a bucketer
    pub fn new(when: impl TimePredicate + 'static, pick: Bucketer) -> Self {
        Self {
            label: None,
            when: Arc::new(when),
            pick,
        }
    }

    /// Create a rule from an already shared predicate
    pub fn from_shared(when: Arc<dyn TimePredicate>, pick: Bucketer) -> Self {
        Self {
            label: None,
            when,
            pick,
        }
    }

    /// Hourly resolution over the last 24 hours
    pub fn last_24h_hourly() -> Self {
        Self::new(Window::last_24h(), Bucketer::hourly()).with_label("last24h/hourly")
    }

    /// Daily resolution over the last week
    pub fn last_week_daily() -> Self {
        Self::new(Window::last_week(), Bucketer::daily()).with_label("lastWeek/daily")
    }

    /// Attach a label used in logs
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Rule label, if any
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The window test
    pub fn when(&self) -> &dyn TimePredicate {
        self.when.as_ref()
    }

    /// The bucketer
    pub fn pick(&self) -> Bucketer {
        self.pick
    }

    /// Check if this rule's window claims `at`
    pub fn matches(&self, present: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        self.when.test(present, at)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("when", &self.when)
            .field("pick", &self.pick)
            .finish()
    }
}

/// Order of the combined selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputOrder {
    /// All picks of rule 1, then all picks of rule 2, ...; input order within a rule
    #[default]
    Grouped,
    /// Same selection in global input order, computed in a single pass
    Input,
}

/// Ordered set of rules applied in one pass
#[derive(Debug, Clone, Default)]
pub struct Plan {
    rules: Vec<Rule>,
    order: OutputOrder,
}

impl Plan {
    /// Create a plan; rule priority is list position
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            order: OutputOrder::default(),
        }
    }

    /// Hourly for the last 24 hours, then daily for the rest of the week
    pub fn cascade() -> Self {
        Self::new(vec![Rule::last_24h_hourly(), Rule::last_week_daily()])
    }

    /// Append a lower-priority rule
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Choose the output order
    pub fn with_order(mut self, order: OutputOrder) -> Self {
        self.order = order;
        self
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Selected output order
    pub fn order(&self) -> OutputOrder {
        self.order
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over `records` against a single present
    pub fn apply<'a, T, I, F>(&self, present: DateTime<Utc>, records: I, date: F) -> Vec<&'a T>
    where
        T: ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> DateTime<Utc>,
    {
        match self.order {
            OutputOrder::Grouped => self.apply_grouped(present, records, &date),
            OutputOrder::Input => self.apply_in_input_order(present, records, &date),
        }
    }

    fn apply_grouped<'a, T, I, F>(&self, present: DateTime<Utc>, records: I, date: &F) -> Vec<&'a T>
    where
        T: ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> DateTime<Utc>,
    {
        let mut remainder: Vec<&'a T> = records.into_iter().collect();
        let mut selected = Vec::new();

        for (position, rule) in self.rules.iter().enumerate() {
            // Everything the window claims leaves the remainder, kept or not
            let (matched, rest): (Vec<&'a T>, Vec<&'a T>) = remainder
                .into_iter()
                .partition(|record| rule.matches(present, date(*record)));
            let kept = rule.pick.pick(present, matched.iter().copied(), date);

            debug!(
                rule = position,
                label = rule.label().unwrap_or("-"),
                matched = matched.len(),
                kept = kept.len(),
                remaining = rest.len(),
                "Applied rule"
            );

            selected.extend(kept);
            remainder = rest;
        }

        selected
    }

    fn apply_in_input_order<'a, T, I, F>(
        &self,
        present: DateTime<Utc>,
        records: I,
        date: &F,
    ) -> Vec<&'a T>
    where
        T: ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> DateTime<Utc>,
    {
        let mut trackers: Vec<BucketTracker> = self
            .rules
            .iter()
            .map(|rule| rule.pick.tracker(present))
            .collect();

        let selected: Vec<&'a T> = records
            .into_iter()
            .filter(|record| {
                let at = date(*record);
                match self.rules.iter().position(|rule| rule.matches(present, at)) {
                    Some(position) => trackers[position].admit(at),
                    None => false,
                }
            })
            .collect();

        debug!(
            rules = self.rules.len(),
            kept = selected.len(),
            buckets = trackers.iter().map(BucketTracker::occupied).sum::<usize>(),
            "Applied plan in input order"
        );

        selected
    }
}
