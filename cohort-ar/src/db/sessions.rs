//! Course session lookups and report-driven updates

use cohort_common::db::CourseSessionRow;
use cohort_common::time::parse_report_timestamp;
use cohort_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

use crate::reconcile::Metadata;

pub async fn load_session(pool: &SqlitePool, session_id: i64) -> Result<Option<CourseSessionRow>> {
    let session = sqlx::query_as(
        r#"
        SELECT id, course_id, session_number, title, description, scheduled_time, duration_minutes
        FROM course_sessions
        WHERE id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Copy title, overall duration and start time from a report onto the session
///
/// Only fields present (and parseable) in the metadata change. Returns
/// whether anything was written.
pub async fn apply_report_metadata(
    conn: &mut SqliteConnection,
    session_id: i64,
    metadata: &Metadata,
) -> Result<bool> {
    let title = metadata
        .get("title")
        .map(|t| t.trim())
        .filter(|t| !t.is_empty());
    let duration_minutes = metadata
        .get("duration_minutes")
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .map(|d| d as i64);
    let scheduled_time = metadata
        .get("start_time")
        .and_then(|s| parse_report_timestamp(s));

    if title.is_none() && duration_minutes.is_none() && scheduled_time.is_none() {
        return Ok(false);
    }

    let updated = sqlx::query(
        r#"
        UPDATE course_sessions SET
            title = COALESCE(?, title),
            duration_minutes = COALESCE(?, duration_minutes),
            scheduled_time = COALESCE(?, scheduled_time)
        WHERE id = ?
        "#,
    )
    .bind(title)
    .bind(duration_minutes)
    .bind(scheduled_time)
    .bind(session_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated > 0 {
        tracing::info!(
            session_id,
            title = title.unwrap_or_default(),
            ?duration_minutes,
            ?scheduled_time,
            "Updated session from report metadata"
        );
    }

    Ok(updated > 0)
}
