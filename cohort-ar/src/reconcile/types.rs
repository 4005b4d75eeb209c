//! Reconciliation data model

use chrono::{DateTime, NaiveDateTime, Utc};
use cohort_common::db::{AttendanceRow, UserRow};
use serde::{Deserialize, Serialize};

/// Expected participant of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub id: i64,
    pub display_name: String,
    /// Account name; matched alongside the display name
    #[serde(default)]
    pub username: Option<String>,
    pub email: Option<String>,
    pub college: Option<String>,
    pub department: Option<String>,
}

impl RosterMember {
    /// Minimal member, mostly for callers that only know id and name
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            username: None,
            email: None,
            college: None,
            department: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl From<UserRow> for RosterMember {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name().to_string(),
            username: Some(user.username),
            email: user.email,
            college: user.college,
            department: user.department,
        }
    }
}

/// One join/leave segment read from the participant table
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub email: Option<String>,
    pub join_time: Option<NaiveDateTime>,
    pub leave_time: Option<NaiveDateTime>,
    pub duration_minutes: f64,
}

/// All segments of one matched member merged together
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedRecord {
    pub roster_member_id: i64,
    pub first_join: Option<NaiveDateTime>,
    pub last_leave: Option<NaiveDateTime>,
    pub total_duration_minutes: f64,
}

/// Authoritative presence determination for one (session, student) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceResult {
    pub session_id: i64,
    pub student_id: i64,
    pub attended: bool,
    pub first_join: Option<NaiveDateTime>,
    pub last_leave: Option<NaiveDateTime>,
    pub total_duration_minutes: f64,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceResult {
    pub fn status(&self) -> AttendanceStatus {
        AttendanceStatus::derive(Some(self.attended), self.total_duration_minutes)
    }
}

impl From<AttendanceRow> for AttendanceResult {
    fn from(row: AttendanceRow) -> Self {
        Self {
            session_id: row.session_id,
            student_id: row.student_id,
            attended: row.attended,
            first_join: row.first_join_time,
            last_leave: row.last_leave_time,
            total_duration_minutes: row.total_duration_minutes,
            updated_at: row.updated_at,
        }
    }
}

/// Status shown to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    /// Seen in the report, but below the duration threshold
    Failed,
    Absent,
}

impl AttendanceStatus {
    /// `attended` is `None` when no result is stored
    pub fn derive(attended: Option<bool>, total_duration_minutes: f64) -> Self {
        match attended {
            Some(true) => AttendanceStatus::Present,
            Some(false) if total_duration_minutes > 0.0 => AttendanceStatus::Failed,
            _ => AttendanceStatus::Absent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Failed => "Failed",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
