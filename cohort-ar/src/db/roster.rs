//! Session roster lookup
//!
//! A course's roster comes from the first non-empty source:
//! 1. course enrollments within the cohort
//! 2. cohort-specific course enrollments
//! 3. active cohort membership

use cohort_common::db::UserRow;
use cohort_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

use crate::reconcile::RosterMember;

const COURSE_ENROLLMENTS: &str = r#"
    SELECT u.id, u.username, u.full_name, u.email, u.college, u.department
    FROM users u
    JOIN enrollments e ON e.student_id = u.id
    WHERE e.cohort_id = ? AND e.course_id = ?
    ORDER BY u.id
"#;

const COHORT_SPECIFIC_ENROLLMENTS: &str = r#"
    SELECT DISTINCT u.id, u.username, u.full_name, u.email, u.college, u.department
    FROM users u
    JOIN cohort_specific_enrollments cse ON cse.student_id = u.id
    WHERE cse.course_id = ?
    ORDER BY u.id
"#;

const ACTIVE_COHORT_MEMBERS: &str = r#"
    SELECT u.id, u.username, u.full_name, u.email, u.college, u.department
    FROM users u
    JOIN user_cohorts uc ON uc.user_id = u.id
    WHERE uc.cohort_id = ? AND uc.is_active = 1
    ORDER BY u.id
"#;

/// Roster for a (cohort, course) pair, ordered by student id; may be empty
pub async fn load_roster(
    pool: &SqlitePool,
    cohort_id: i64,
    course_id: i64,
) -> Result<Vec<RosterMember>> {
    let sources = [
        ("course_enrollment", COURSE_ENROLLMENTS, vec![cohort_id, course_id]),
        ("cohort_specific_enrollment", COHORT_SPECIFIC_ENROLLMENTS, vec![course_id]),
        ("cohort_membership", ACTIVE_COHORT_MEMBERS, vec![cohort_id]),
    ];

    for (source, sql, params) in sources {
        let users = fetch_users(pool, sql, &params).await?;
        if !users.is_empty() {
            debug!(cohort_id, course_id, source, members = users.len(), "Loaded roster");
            return Ok(users.into_iter().map(RosterMember::from).collect());
        }
    }

    debug!(cohort_id, course_id, "Roster is empty");
    Ok(Vec::new())
}

async fn fetch_users(pool: &SqlitePool, sql: &str, params: &[i64]) -> Result<Vec<UserRow>> {
    let mut query = sqlx::query_as::<_, UserRow>(sql);
    for param in params {
        query = query.bind(*param);
    }
    Ok(query.fetch_all(pool).await?)
}
