//! # chronosieve
//!
//! Relative time windows and per-bucket down-sampling for timestamped records.
//!
//! ## Features
//!
//! - "Last N" windows anchored at a reference instant, plus calendar-day and
//!   weekday tests
//! - Fixed-width buckets keeping the first record seen in each slot
//! - Prioritized rule plans: each record is claimed by the first matching
//!   window, so overlapping windows never select a record twice
//! - Declarative plans loadable from JSON
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use chronosieve::{Plan, Sieve, SieveConfig};
//!
//! let now = Utc.with_ymd_and_hms(2015, 11, 20, 12, 0, 0).unwrap();
//! let sieve = Sieve::new(SieveConfig::new().with_present(now));
//!
//! let samples = vec![
//!     now - Duration::minutes(10),
//!     now - Duration::minutes(40),
//!     now - Duration::hours(30),
//!     now - Duration::hours(31),
//!     now - Duration::days(9),
//! ];
//!
//! // Hourly for the last day, daily for the rest of the week
//! let kept = sieve.filter(&Plan::cascade(), &samples);
//! assert_eq!(kept, vec![&samples[0], &samples[2]]);
//! ```
//!
//! ## Presets
//!
//! | Operation | Window | Bucket |
//! |-----------|--------|--------|
//! | `last24h` | 24 hours | - |
//! | `last_week` | 7 days | - |
//! | `today` | UTC calendar day | - |
//! | `skip_weekend` | Monday-Friday | - |
//! | `hourly` | - | 1 hour |
//! | `daily` | - | 1 day |

pub mod bucket;
pub mod clock;
pub mod config;
pub mod error;
pub mod predicate;
pub mod rule;
pub mod sieve;

pub use bucket::{BucketTracker, Bucketer};
pub use clock::{dated_accessor, Accessor, Dated, Present};
pub use config::{parse_present, BucketSpec, PlanSpec, RuleSpec, SieveConfig, WindowSpec};
pub use error::SieveError;
pub use predicate::{and, and_records, All, TimePredicate, Today, Weekday, Window};
pub use rule::{OutputOrder, Plan, Rule};
pub use sieve::Sieve;
