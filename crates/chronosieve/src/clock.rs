//! Reference instant and timestamp accessors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the reference instant ("present") is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Present {
    /// Read the wall clock once per filtering call
    #[default]
    WallClock,
    /// Always use this instant
    Fixed(DateTime<Utc>),
}

impl Present {
    /// Build a policy from an optional fixed instant
    pub fn from_option(present: Option<DateTime<Utc>>) -> Self {
        match present {
            Some(at) => Self::Fixed(at),
            None => Self::WallClock,
        }
    }

    /// Resolve the instant to use for one call
    pub fn resolve(&self) -> DateTime<Utc> {
        match self {
            Self::Fixed(at) => *at,
            Self::WallClock => Utc::now(),
        }
    }

    /// Check if present is pinned
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}

/// Records that carry their own timestamp.
///
/// Implementing this lets a [`Sieve`](crate::Sieve) be built without passing
/// an accessor closure.
pub trait Dated {
    /// The instant this record refers to
    fn date(&self) -> DateTime<Utc>;
}

impl Dated for DateTime<Utc> {
    fn date(&self) -> DateTime<Utc> {
        *self
    }
}

impl<T: Dated + ?Sized> Dated for &T {
    fn date(&self) -> DateTime<Utc> {
        (**self).date()
    }
}

/// Shared function extracting a timestamp from a record
pub type Accessor<T> = Arc<dyn Fn(&T) -> DateTime<Utc> + Send + Sync>;

/// Accessor that defers to [`Dated::date`]
pub fn dated_accessor<T: Dated + 'static>() -> Accessor<T> {
    Arc::new(|record: &T| record.date())
}
