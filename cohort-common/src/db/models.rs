//! Database models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row of the `users` table as needed for rosters
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub college: Option<String>,
    pub department: Option<String>,
}

impl UserRow {
    /// Name shown to operators and matched against reports
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseSessionRow {
    pub id: i64,
    pub course_id: i64,
    pub session_number: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_time: Option<NaiveDateTime>,
    pub duration_minutes: Option<i64>,
}

/// Stored attendance for one (session, student) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRow {
    pub session_id: i64,
    pub student_id: i64,
    pub attended: bool,
    pub first_join_time: Option<NaiveDateTime>,
    pub last_leave_time: Option<NaiveDateTime>,
    pub total_duration_minutes: f64,
    pub updated_at: DateTime<Utc>,
}
