//! Session attendance API handlers
//!
//! All routes live under `/cohorts/:cohort_id/courses/:course_id/sessions/:session_id`:
//! - GET  `/students` roster with stored results
//! - POST `/attendance` manual marks
//! - POST `/attendance/import` reconcile an uploaded export
//! - GET  `/attendance/export` CSV attendance sheet

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use cohort_common::db::CourseSessionRow;
use cohort_common::human_time::format_minutes;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{error, info};

use crate::config::{resolve_min_duration, ResolvedThreshold};
use crate::db::attendance::{self as attendance_db, ManualMark};
use crate::db::{roster, sessions};
use crate::document::{read_grid, DocumentFormat};
use crate::reconcile::{AttendanceResult, AttendanceStatus, ReconciliationReport};
use crate::{ApiError, ApiResult, AppState};

/// Route parameters shared by every session endpoint
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SessionPath {
    pub cohort_id: i64,
    pub course_id: i64,
    pub session_id: i64,
}

/// One roster entry with its stored result
#[derive(Debug, Serialize)]
pub struct StudentAttendance {
    pub id: i64,
    pub display_name: String,
    pub email: Option<String>,
    pub college: Option<String>,
    pub department: Option<String>,
    pub attended: bool,
    pub status: AttendanceStatus,
    pub first_join_time: Option<NaiveDateTime>,
    pub last_leave_time: Option<NaiveDateTime>,
    pub total_duration_minutes: f64,
}

/// GET .../students response
#[derive(Debug, Serialize)]
pub struct StudentsResponse {
    pub session_id: i64,
    pub session_title: String,
    pub students: Vec<StudentAttendance>,
}

/// POST .../attendance request
#[derive(Debug, Deserialize)]
pub struct ManualMarksRequest {
    pub attendance: Vec<ManualMark>,
}

/// POST .../attendance response
#[derive(Debug, Serialize)]
pub struct ManualMarksResponse {
    pub message: String,
    pub saved: usize,
}

/// POST .../attendance/import query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
    pub min_duration_minutes: Option<f64>,
    /// RFC 3339; with `end_time` yields `overall_duration_minutes`
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// POST .../attendance/import response
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: ReconciliationReport,
    pub enrolled_count: usize,
    pub overall_duration_minutes: Option<f64>,
    pub threshold: ResolvedThreshold,
    pub session_updated: bool,
}

/// Session must exist and belong to the course in the path
async fn require_session(state: &AppState, path: &SessionPath) -> ApiResult<CourseSessionRow> {
    match sessions::load_session(&state.db, path.session_id).await? {
        Some(session) if session.course_id == path.course_id => Ok(session),
        _ => Err(cohort_common::Error::NotFound(format!(
            "Session {} not found in course {}",
            path.session_id, path.course_id
        ))
        .into()),
    }
}

/// GET .../students
pub async fn list_students(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
) -> ApiResult<Json<StudentsResponse>> {
    let session = require_session(&state, &path).await?;
    let roster = roster::load_roster(&state.db, path.cohort_id, path.course_id).await?;
    let stored: HashMap<i64, AttendanceResult> = attendance_db::find_existing(&state.db, path.session_id)
        .await?
        .into_iter()
        .map(|result| (result.student_id, result))
        .collect();

    let students = roster
        .into_iter()
        .map(|member| {
            let result = stored.get(&member.id);
            let total_duration_minutes = result.map_or(0.0, |r| r.total_duration_minutes);
            StudentAttendance {
                id: member.id,
                display_name: member.display_name,
                email: member.email,
                college: member.college,
                department: member.department,
                attended: result.is_some_and(|r| r.attended),
                status: AttendanceStatus::derive(result.map(|r| r.attended), total_duration_minutes),
                first_join_time: result.and_then(|r| r.first_join),
                last_leave_time: result.and_then(|r| r.last_leave),
                total_duration_minutes,
            }
        })
        .collect();

    Ok(Json(StudentsResponse {
        session_id: session.id,
        session_title: session.title,
        students,
    }))
}

/// POST .../attendance
///
/// Marks must name students on the session roster.
pub async fn submit_attendance(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    Json(request): Json<ManualMarksRequest>,
) -> ApiResult<Json<ManualMarksResponse>> {
    require_session(&state, &path).await?;

    let roster = roster::load_roster(&state.db, path.cohort_id, path.course_id).await?;
    let enrolled: HashSet<i64> = roster.iter().map(|m| m.id).collect();
    let unknown: Vec<String> = request
        .attendance
        .iter()
        .filter(|mark| !enrolled.contains(&mark.student_id))
        .map(|mark| mark.student_id.to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Students not on the session roster: {}",
            unknown.join(", ")
        )));
    }

    let _guard = state.session_locks.acquire(path.session_id).await;
    attendance_db::save_manual_marks(&state.db, path.session_id, &request.attendance, Utc::now())
        .await
        .inspect_err(|e| error!(session_id = path.session_id, error = %e, "Saving manual marks failed"))?;

    info!(
        session_id = path.session_id,
        marks = request.attendance.len(),
        "Manual attendance saved"
    );

    Ok(Json(ManualMarksResponse {
        message: "Attendance saved successfully".to_string(),
        saved: request.attendance.len(),
    }))
}

/// POST .../attendance/import
///
/// Body is the export itself: CSV (`text/csv`, the default), an `.xlsx`
/// workbook or a JSON grid (`application/json`). Every roster member gets a
/// result; the whole write is one transaction.
pub async fn import_attendance(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    Query(params): Query<ImportParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<ImportResponse>> {
    require_session(&state, &path).await?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let format = DocumentFormat::from_content_type(content_type)?;
    let grid = read_grid(format, &body)?;

    let _guard = state.session_locks.acquire(path.session_id).await;

    let roster = roster::load_roster(&state.db, path.cohort_id, path.course_id).await?;
    let threshold =
        resolve_min_duration(&state.db, &state.toml_config, params.min_duration_minutes).await?;

    let report = state.reconciler.reconcile(
        &roster,
        &grid,
        threshold.minutes,
        path.session_id,
        Utc::now(),
    )?;

    let session_updated = attendance_db::persist_import(
        &state.db,
        path.session_id,
        &report.extracted_metadata,
        &report.results,
    )
    .await
    .inspect_err(|e| {
        error!(session_id = path.session_id, error = %e, "Attendance import rolled back")
    })?;

    info!(
        session_id = path.session_id,
        enrolled = roster.len(),
        matched = report.success_count,
        failed = report.failed_count,
        threshold = threshold.minutes,
        source = ?threshold.source,
        "Attendance import completed"
    );

    Ok(Json(ImportResponse {
        message: "Consolidated import completed".to_string(),
        enrolled_count: roster.len(),
        overall_duration_minutes: overall_duration_minutes(
            params.start_time.as_deref(),
            params.end_time.as_deref(),
        ),
        threshold,
        session_updated,
        report,
    }))
}

/// Minutes between two RFC 3339 instants; `None` unless both parse
pub fn overall_duration_minutes(start: Option<&str>, end: Option<&str>) -> Option<f64> {
    let start = DateTime::parse_from_rfc3339(start?.trim()).ok()?;
    let end = DateTime::parse_from_rfc3339(end?.trim()).ok()?;
    Some(end.signed_duration_since(start).num_seconds() as f64 / 60.0)
}

/// GET .../attendance/export
pub async fn export_attendance(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
) -> ApiResult<impl IntoResponse> {
    let session = require_session(&state, &path).await?;
    let roster = roster::load_roster(&state.db, path.cohort_id, path.course_id).await?;
    let stored: HashMap<i64, AttendanceResult> = attendance_db::find_existing(&state.db, path.session_id)
        .await?
        .into_iter()
        .map(|result| (result.student_id, result))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let write_error = |e: csv::Error| ApiError::Internal(format!("Failed to write CSV: {}", e));

    writer
        .write_record([
            "Session",
            "Student ID",
            "Name",
            "Email",
            "College",
            "Department",
            "Attendance Status",
            "Duration",
        ])
        .map_err(write_error)?;

    for member in &roster {
        let result = stored.get(&member.id);
        let minutes = result.map_or(0.0, |r| r.total_duration_minutes);
        let status = AttendanceStatus::derive(result.map(|r| r.attended), minutes);

        writer
            .write_record([
                session.title.as_str(),
                member.id.to_string().as_str(),
                member.display_name.as_str(),
                member.email.as_deref().unwrap_or_default(),
                member.college.as_deref().unwrap_or("N/A"),
                member.department.as_deref().unwrap_or("N/A"),
                status.as_str(),
                format_minutes(minutes).as_str(),
            ])
            .map_err(write_error)?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("Failed to finish CSV: {}", e)))?;

    let disposition = format!(
        "attachment; filename=attendance_session_{}.csv",
        path.session_id
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Build session attendance routes
pub fn attendance_routes() -> Router<AppState> {
    let base = "/cohorts/:cohort_id/courses/:course_id/sessions/:session_id";
    Router::new()
        .route(&format!("{}/students", base), get(list_students))
        .route(&format!("{}/attendance", base), post(submit_attendance))
        .route(&format!("{}/attendance/import", base), post(import_attendance))
        .route(&format!("{}/attendance/export", base), get(export_attendance))
}
