//! Configuration for sieves and declarative plans
//!
//! Plans can be described as data and built later:
//!
//! ```json
//! {
//!   "rules": [
//!     { "label": "recent", "window": "last24h", "bucket": "hourly" },
//!     { "window": { "all": ["last_week", "weekdays"] }, "bucket": { "width_millis": 86400000 } }
//!   ],
//!   "order": "grouped"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

use crate::bucket::Bucketer;
use crate::clock::Present;
use crate::error::SieveError;
use crate::predicate::{TimePredicate, Today, Weekday, Window};
use crate::rule::{OutputOrder, Plan, Rule};

/// Environment variable holding a fixed present (RFC 3339)
pub const PRESENT_ENV: &str = "CHRONOSIEVE_PRESENT";

/// Sieve configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SieveConfig {
    /// Fixed reference instant; `None` reads the wall clock on every call
    #[serde(default)]
    pub present: Option<DateTime<Utc>>,
}

impl SieveConfig {
    /// Wall-clock configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the reference instant
    pub fn with_present(mut self, present: DateTime<Utc>) -> Self {
        self.present = Some(present);
        self
    }

    /// Load from environment (`CHRONOSIEVE_PRESENT`)
    pub fn from_env() -> Result<Self, SieveError> {
        match env::var(PRESENT_ENV) {
            Ok(raw) => {
                let present = parse_present(&raw)?;
                tracing::debug!(%present, "Using fixed present from environment");
                Ok(Self {
                    present: Some(present),
                })
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Resolution policy for this configuration
    pub fn present_policy(&self) -> Present {
        Present::from_option(self.present)
    }
}

/// Parse an RFC 3339 instant into UTC
pub fn parse_present(raw: &str) -> Result<DateTime<Utc>, SieveError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| SieveError::InvalidPresent(format!("{raw:?}: {e}")))
}

/// Declarative window test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSpec {
    /// The last 24 hours
    #[serde(alias = "last_24h")]
    Last24h,
    /// The last 7 days
    #[serde(alias = "lastWeek")]
    LastWeek,
    /// Same UTC calendar day as present
    Today,
    /// Monday to Friday
    Weekdays,
    /// The last N milliseconds
    LastMillis(i64),
    /// Every listed window must match
    All(Vec<WindowSpec>),
}

impl WindowSpec {
    /// Build the predicate
    pub fn build(&self) -> Result<Arc<dyn TimePredicate>, SieveError> {
        let predicate: Arc<dyn TimePredicate> = match self {
            Self::Last24h => Arc::new(Window::last_24h()),
            Self::LastWeek => Arc::new(Window::last_week()),
            Self::Today => Arc::new(Today),
            Self::Weekdays => Arc::new(Weekday),
            Self::LastMillis(millis) => Arc::new(Window::from_millis(*millis)?),
            Self::All(specs) => {
                if specs.is_empty() {
                    return Err(SieveError::config("\"all\" needs at least one window"));
                }
                let parts = specs
                    .iter()
                    .map(WindowSpec::build)
                    .collect::<Result<Vec<_>, _>>()?;
                Arc::new(crate::predicate::and(parts))
            }
        };
        Ok(predicate)
    }
}

/// Declarative bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketSpec {
    /// One per hour
    Hourly,
    /// One per day
    Daily,
    /// Custom width in milliseconds
    WidthMillis(i64),
}

impl BucketSpec {
    /// Build the bucketer
    pub fn build(&self) -> Result<Bucketer, SieveError> {
        match self {
            Self::Hourly => Ok(Bucketer::hourly()),
            Self::Daily => Ok(Bucketer::daily()),
            Self::WidthMillis(millis) => Bucketer::from_millis(*millis),
        }
    }
}

/// Declarative rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Optional label for logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Window test
    pub window: WindowSpec,
    /// Bucket width
    pub bucket: BucketSpec,
}

impl RuleSpec {
    /// Build the rule
    pub fn build(&self) -> Result<Rule, SieveError> {
        let rule = Rule::from_shared(self.window.build()?, self.bucket.build()?);
        Ok(match &self.label {
            Some(label) => rule.with_label(label.clone()),
            None => rule,
        })
    }
}

/// Declarative plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSpec {
    /// Rules in priority order
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Output order
    #[serde(default)]
    pub order: OutputOrder,
}

impl PlanSpec {
    /// Parse a plan from JSON
    pub fn from_json(raw: &str) -> Result<Self, SieveError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Build the plan, failing on the first invalid rule
    pub fn build(&self) -> Result<Plan, SieveError> {
        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(position, spec)| {
                spec.build().map_err(|e| match e {
                    SieveError::Config(reason) => {
                        SieveError::Config(format!("rule {position}: {reason}"))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Plan::new(rules).with_order(self.order))
    }
}
