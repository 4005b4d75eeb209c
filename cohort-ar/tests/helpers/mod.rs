//! Test Helper Utilities
//!
//! Shared database fixtures for cohort-ar integration tests

#![allow(dead_code)]

use sqlx::SqlitePool;
use tempfile::TempDir;

/// Fresh on-disk database; keep the `TempDir` alive for the test's duration
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = cohort_ar::db::init_database_pool(&dir.path().join("cohort.db"))
        .await
        .unwrap();
    (dir, pool)
}

/// Cohort 1, course 1 ("Systems Programming"), session 1 ("Kickoff") and
/// three students enrolled in course 1:
/// - 1 Aditi H Nayak (aditi@college.edu)
/// - 2 Rahul Mehta (rahul@college.edu)
/// - 3 priya.s, no full name
///
/// Course 2 holds session 2 so cross-course lookups can be checked.
pub async fn seed_course(pool: &SqlitePool) {
    let statements = [
        "INSERT INTO cohorts (id, name) VALUES (1, 'Spring 2026')",
        "INSERT INTO courses (id, title) VALUES (1, 'Systems Programming'), (2, 'Databases')",
        "INSERT INTO course_sessions (id, course_id, session_number, title) VALUES (1, 1, 1, 'Kickoff')",
        "INSERT INTO course_sessions (id, course_id, session_number, title) VALUES (2, 2, 1, 'Intro')",
        r#"INSERT INTO users (id, username, full_name, email, college, department) VALUES
            (1, 'aditi', 'Aditi H Nayak', 'aditi@college.edu', 'North Campus', 'CSE'),
            (2, 'rahul', 'Rahul Mehta', 'rahul@college.edu', NULL, NULL),
            (3, 'priya.s', NULL, NULL, NULL, NULL)"#,
        "INSERT INTO enrollments (student_id, cohort_id, course_id) VALUES (1, 1, 1), (2, 1, 1), (3, 1, 1)",
    ];
    for statement in statements {
        sqlx::query(statement).execute(pool).await.unwrap();
    }
}

/// Teams-style CSV export with the given participant lines
pub fn teams_csv(participants: &[&str]) -> String {
    let mut lines = vec![
        "1. Summary",
        "Meeting title,Kickoff: Ownership and Borrowing",
        "Start time,\"02/15/26, 6:00:00 PM\"",
        "End time,\"02/15/26, 7:30:00 PM\"",
        "Overall meeting duration,1h 30m",
        "",
        "2. Participants",
        "Name,First Join,Last Leave,In-Meeting Duration,Email,Participant ID (UPN),Role",
    ];
    lines.extend_from_slice(participants);
    lines.push("");
    lines.push("3. In-Meeting Activities");
    lines.join("\n")
}
