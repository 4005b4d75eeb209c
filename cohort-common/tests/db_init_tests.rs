//! Unit tests for database initialization
//!
//! Tests cover:
//! - Automatic database creation with default schema
//! - Re-opening an existing database
//! - Schema version bookkeeping
//! - Threshold setting left unset for lower configuration tiers

use cohort_common::db::init::{init_database, MIN_DURATION_SETTING, SCHEMA_VERSION};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("data").join("cohort.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cohort.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("cohort.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in [
        "cohort_specific_enrollments",
        "cohorts",
        "course_sessions",
        "courses",
        "enrollments",
        "schema_version",
        "session_attendance",
        "settings",
        "user_cohorts",
        "users",
    ] {
        assert!(tables.iter().any(|t| t == expected), "Missing table {}", expected);
    }
}

#[tokio::test]
async fn test_schema_version_recorded_once() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cohort.db");
    init_database(&db_path).await.unwrap();
    let pool = init_database(&db_path).await.unwrap();

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(&pool)
        .await
        .unwrap();

    assert_eq!(versions, vec![SCHEMA_VERSION]);
}

#[tokio::test]
async fn test_min_duration_setting_not_seeded() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("cohort.db")).await.unwrap();

    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(MIN_DURATION_SETTING)
            .fetch_optional(&pool)
            .await
            .unwrap();

    assert!(value.is_none());
}

#[tokio::test]
async fn test_attendance_unique_per_session_and_student() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("cohort.db")).await.unwrap();

    sqlx::query("INSERT INTO users (id, username) VALUES (1, 'student1')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO courses (id, title) VALUES (1, 'Rust 101')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO course_sessions (id, course_id, title) VALUES (1, 1, 'Intro')")
        .execute(&pool)
        .await
        .unwrap();

    let insert = "INSERT INTO session_attendance (session_id, student_id, attended) VALUES (1, 1, 1)";
    sqlx::query(insert).execute(&pool).await.unwrap();
    let duplicate = sqlx::query(insert).execute(&pool).await;

    assert!(duplicate.is_err(), "Second row for the same pair must be rejected");
}
