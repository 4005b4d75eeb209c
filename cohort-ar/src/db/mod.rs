//! Database access for cohort-ar
//!
//! Schema and pool setup live in `cohort_common::db`; this module holds the
//! queries the attendance service runs against the shared database.

pub mod attendance;
pub mod roster;
pub mod sessions;
pub mod settings;

use cohort_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open the shared database, creating tables on first use
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());
    cohort_common::db::init_database(db_path).await
}
