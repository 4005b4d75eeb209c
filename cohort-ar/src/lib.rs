//! cohort-ar library interface
//!
//! Attendance Reconciler: reconciles uploaded meeting-attendance exports
//! against course rosters and stores one result per enrolled student.

pub mod api;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod reconcile;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use cohort_common::config::TomlConfig;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_http::trace::TraceLayer;

use crate::reconcile::Reconciler;

/// Per-session locks serializing writes to one session's attendance
///
/// Different sessions proceed concurrently. Only sessions with a holder or
/// a waiter keep an entry; idle ones are dropped on the next acquire.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    /// Wait for exclusive access to `session_id`
    pub async fn acquire(&self, session_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            // Map holds the only reference to an idle lock
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(session_id).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared database connection pool
    pub db: SqlitePool,
    /// Module TOML config, read once at startup
    pub toml_config: Arc<TomlConfig>,
    /// Engine limits and matching policy
    pub reconciler: Reconciler,
    pub session_locks: SessionLocks,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, toml_config: TomlConfig) -> Self {
        Self {
            db,
            toml_config: Arc::new(toml_config),
            reconciler: Reconciler::default(),
            session_locks: SessionLocks::default(),
            startup_time: Utc::now(),
        }
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::attendance_routes())
        .merge(api::settings_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
