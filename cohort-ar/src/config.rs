//! Configuration resolution for cohort-ar
//!
//! Attendance threshold priority: request → Database → ENV → TOML → default.
//! Port priority: CLI/ENV (via clap) → TOML → default.

use cohort_common::config::TomlConfig;
use cohort_common::{Error, Result};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{debug, warn};

/// Port used when neither CLI, environment nor TOML names one
pub const DEFAULT_PORT: u16 = 5731;

/// Threshold used when nothing else is configured
pub const DEFAULT_MIN_DURATION_MINUTES: f64 = 5.0;

/// Environment override for the threshold
pub const MIN_DURATION_ENV: &str = "COHORT_MIN_DURATION_MINUTES";

/// Where a resolved threshold came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Request,
    Database,
    Environment,
    Toml,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedThreshold {
    pub minutes: f64,
    pub source: ThresholdSource,
}

/// Finite and not negative
pub fn is_valid_threshold(minutes: f64) -> bool {
    minutes.is_finite() && minutes >= 0.0
}

/// Resolve the minimum attendance duration
///
/// A request override is returned untouched; the engine rejects invalid
/// values. Invalid values from the other tiers are skipped with a warning.
pub async fn resolve_min_duration(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
    request_override: Option<f64>,
) -> Result<ResolvedThreshold> {
    if let Some(minutes) = request_override {
        return Ok(ResolvedThreshold {
            minutes,
            source: ThresholdSource::Request,
        });
    }

    // Tier 1: Database (authoritative)
    let db_value = match crate::db::settings::get_min_duration_minutes(db).await {
        Ok(value) => value,
        Err(Error::Config(msg)) => {
            warn!("Ignoring stored minimum duration: {}", msg);
            None
        }
        Err(e) => return Err(e),
    };

    // Tier 2: Environment variable
    let env_value = std::env::var(MIN_DURATION_ENV).ok().and_then(|raw| {
        let parsed = raw.trim().parse::<f64>().ok();
        if parsed.is_none() {
            warn!("Ignoring {}={:?}: not a number", MIN_DURATION_ENV, raw);
        }
        parsed
    });

    // Tier 3: TOML config
    let toml_value = toml_config.min_duration_minutes;

    let candidates = [
        (db_value, ThresholdSource::Database),
        (env_value, ThresholdSource::Environment),
        (toml_value, ThresholdSource::Toml),
    ];

    let mut valid = candidates.iter().filter_map(|(value, source)| match value {
        Some(minutes) if is_valid_threshold(*minutes) => Some((*minutes, *source)),
        Some(minutes) => {
            warn!(?source, minutes, "Ignoring invalid minimum duration");
            None
        }
        None => None,
    });

    let resolved = match valid.next() {
        Some((minutes, source)) => ResolvedThreshold { minutes, source },
        None => ResolvedThreshold {
            minutes: DEFAULT_MIN_DURATION_MINUTES,
            source: ThresholdSource::Default,
        },
    };

    let shadowed = valid.count();
    if shadowed > 0 {
        debug!(
            source = ?resolved.source,
            shadowed,
            "Minimum duration configured in multiple sources, using highest priority"
        );
    }

    Ok(resolved)
}

/// Resolve the listening port
pub fn resolve_port(cli_or_env: Option<u16>, toml_config: &TomlConfig) -> u16 {
    cli_or_env.or(toml_config.port).unwrap_or(DEFAULT_PORT)
}
