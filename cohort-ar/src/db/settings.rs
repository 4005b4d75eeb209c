//! Settings database operations
//!
//! Key-value accessors over the shared `settings` table.

use cohort_common::db::MIN_DURATION_SETTING;
use cohort_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Operator-chosen attendance threshold, if one was saved
pub async fn get_min_duration_minutes(db: &Pool<Sqlite>) -> Result<Option<f64>> {
    get_setting(db, MIN_DURATION_SETTING).await
}

/// Save the attendance threshold
pub async fn set_min_duration_minutes(db: &Pool<Sqlite>, minutes: f64) -> Result<()> {
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(Error::InvalidInput(format!(
            "Minimum duration must be a non-negative number of minutes, got {}",
            minutes
        )));
    }
    set_setting(db, MIN_DURATION_SETTING, minutes).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row.and_then(|(value,)| value) {
        Some(value) => {
            let parsed = value
                .trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
