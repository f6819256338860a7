//! chronosieve demo: thinning out a history of readings
//!
//! Keeps one reading per hour for the last day and one per day for the rest
//! of the week, or whatever a JSON plan file asks for.
//!
//! Run with: cargo run -p sieve-demo -- -v --present 2015-11-20T12:00:00Z

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use chronosieve::{parse_present, Dated, Plan, PlanSpec, Sieve, SieveConfig};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sieve-demo", about = "Down-sample timestamped readings")]
struct Args {
    /// Fixed present (RFC 3339); defaults to CHRONOSIEVE_PRESENT, then the wall clock
    #[arg(long)]
    present: Option<String>,

    /// JSON plan file; defaults to hourly-then-daily
    #[arg(long)]
    plan: Option<PathBuf>,

    /// JSON array of readings; defaults to a synthetic series
    #[arg(long)]
    records: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// A sensor reading
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Reading {
    sensor: String,
    value: f64,
    taken_at: DateTime<Utc>,
}

impl Dated for Reading {
    fn date(&self) -> DateTime<Utc> {
        self.taken_at
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = match &args.present {
        Some(raw) => SieveConfig::new().with_present(parse_present(raw)?),
        None => SieveConfig::from_env()?,
    };
    let sieve: Sieve<Reading> = Sieve::new(config);
    let present = sieve.present();

    let plan = match &args.plan {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading plan {}", path.display()))?;
            PlanSpec::from_json(&raw)?.build()?
        }
        None => Plan::cascade(),
    };

    let readings = match &args.records {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading records {}", path.display()))?;
            serde_json::from_str::<Vec<Reading>>(&raw).context("parsing records")?
        }
        None => synthetic(present),
    };

    tracing::info!(
        %present,
        rules = plan.len(),
        readings = readings.len(),
        "Filtering readings"
    );

    let kept = sieve.filter(&plan, &readings);

    println!("Present: {}", present.to_rfc3339());
    println!("Kept {} of {} readings", kept.len(), readings.len());
    for reading in &kept {
        let age = present - reading.taken_at;
        println!(
            "  {:<8} {:>8.2}  {}  ({}h{:02}m ago)",
            reading.sensor,
            reading.value,
            reading.taken_at.to_rfc3339(),
            age.num_hours(),
            age.num_minutes() % 60
        );
    }

    Ok(())
}

/// One reading every 20 minutes over the last ten days, plus one from the future
fn synthetic(present: DateTime<Utc>) -> Vec<Reading> {
    let mut readings: Vec<Reading> = (0..10 * 24 * 3)
        .map(|i| Reading {
            sensor: format!("probe-{}", i % 3),
            value: 20.0 + (i as f64 * 0.37).sin() * 5.0,
            taken_at: present - Duration::minutes(20 * i),
        })
        .collect();
    readings.push(Reading {
        sensor: "probe-x".to_string(),
        value: 0.0,
        taken_at: present + Duration::minutes(5),
    });
    readings
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();
}
