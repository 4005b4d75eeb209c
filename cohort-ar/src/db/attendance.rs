//! Attendance result persistence
//!
//! Results are keyed by (session, student). A reconciliation run overwrites
//! every column of an existing row; all writes of one run share a single
//! transaction so a failure leaves the previous state untouched.

use chrono::{DateTime, Utc};
use cohort_common::db::AttendanceRow;
use cohort_common::Result;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::reconcile::{AttendanceResult, Metadata};

/// Operator's manual mark for one student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ManualMark {
    pub student_id: i64,
    pub attended: bool,
}

/// Insert or fully overwrite one result
pub async fn upsert_result(conn: &mut SqliteConnection, result: &AttendanceResult) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO session_attendance (
            session_id, student_id, attended,
            first_join_time, last_leave_time, total_duration_minutes, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id, student_id) DO UPDATE SET
            attended = excluded.attended,
            first_join_time = excluded.first_join_time,
            last_leave_time = excluded.last_leave_time,
            total_duration_minutes = excluded.total_duration_minutes,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(result.session_id)
    .bind(result.student_id)
    .bind(result.attended)
    .bind(result.first_join)
    .bind(result.last_leave)
    .bind(result.total_duration_minutes)
    .bind(result.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Upsert every result in one transaction
pub async fn persist_results(pool: &SqlitePool, results: &[AttendanceResult]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for result in results {
        upsert_result(&mut tx, result).await?;
    }
    tx.commit().await?;

    debug!(rows = results.len(), "Persisted attendance results");
    Ok(())
}

/// Apply report metadata to the session and upsert results, all or nothing
pub async fn persist_import(
    pool: &SqlitePool,
    session_id: i64,
    metadata: &Metadata,
    results: &[AttendanceResult],
) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let session_updated = super::sessions::apply_report_metadata(&mut tx, session_id, metadata).await?;
    for result in results {
        upsert_result(&mut tx, result).await?;
    }
    tx.commit().await?;

    debug!(
        session_id,
        rows = results.len(),
        session_updated,
        "Persisted attendance import"
    );
    Ok(session_updated)
}

/// Stored results for a session, ordered by student id
pub async fn find_existing(pool: &SqlitePool, session_id: i64) -> Result<Vec<AttendanceResult>> {
    let rows: Vec<AttendanceRow> = sqlx::query_as(
        r#"
        SELECT session_id, student_id, attended, first_join_time, last_leave_time,
               total_duration_minutes, updated_at
        FROM session_attendance
        WHERE session_id = ?
        ORDER BY student_id
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AttendanceResult::from).collect())
}

/// Record manual marks; only `attended` changes on existing rows
pub async fn save_manual_marks(
    pool: &SqlitePool,
    session_id: i64,
    marks: &[ManualMark],
    now: DateTime<Utc>,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    for mark in marks {
        sqlx::query(
            r#"
            INSERT INTO session_attendance (session_id, student_id, attended, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(session_id, student_id) DO UPDATE SET
                attended = excluded.attended,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(mark.student_id)
        .bind(mark.attended)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    debug!(session_id, marks = marks.len(), "Saved manual attendance marks");
    Ok(())
}
