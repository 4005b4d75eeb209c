//! Reconciliation engine integration tests
//!
//! Drives the public engine API end to end on realistic export grids.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use cohort_ar::reconcile::duration::parse_duration_text;
use cohort_ar::reconcile::{
    reconcile, AmbiguityPolicy, CellValue, Grid, MatchPolicy, Reconciler, RosterMember,
    ScanLimits,
};

fn grid(rows: &[&[&str]]) -> Grid {
    Grid::new(
        rows.iter()
            .map(|row| row.iter().map(|cell| CellValue::from_raw(cell)).collect())
            .collect(),
    )
}

const HEADER: &[&str] = &[
    "Name",
    "First Join",
    "Last Leave",
    "In-Meeting Duration",
    "Email",
    "Participant ID (UPN)",
    "Role",
];

/// Teams-style export: summary block, then participants from row 8
fn export(participants: &[&[&str]]) -> Grid {
    let mut rows: Vec<&[&str]> = vec![
        &["1. Summary"],
        &["Meeting title", "Systems Programming Kickoff"],
        &["Attended participants", "4"],
        &["Start time", "02/15/26, 6:00:00 PM"],
        &["End time", "02/15/26, 7:30:00 PM"],
        &["Overall meeting duration", "1h 30m"],
        &[""],
        &["2. Participants"],
        HEADER,
    ];
    rows.extend_from_slice(participants);
    rows.push(&[""]);
    rows.push(&["3. In-Meeting Activities"]);
    grid(&rows)
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 15)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn roster() -> Vec<RosterMember> {
    vec![
        RosterMember::new(1, "Aditi H Nayak").with_email("aditi@college.edu"),
        RosterMember::new(2, "Rahul Mehta").with_email("rahul@college.edu"),
        RosterMember::new(3, "Priya Sharma"),
        RosterMember::new(4, "Nayak"),
    ]
}

#[test]
fn test_reconcile_is_idempotent() {
    // Given: the same roster, export, threshold and timestamp
    let stamp = Utc.with_ymd_and_hms(2026, 2, 15, 20, 0, 0).unwrap();
    let grid = export(&[
        &["Aditi Nayak", "02/15/26, 6:01:00 PM", "02/15/26, 7:29:00 PM", "1h 28m", "aditi@college.edu", "", "Attendee"],
        &["Rahul Mehta", "02/15/26, 6:05:00 PM", "02/15/26, 6:07:00 PM", "2m", "", "", "Attendee"],
    ]);
    let engine = Reconciler::default();

    // When: reconciling twice
    let first = engine.reconcile(&roster(), &grid, 5.0, 1, stamp).unwrap();
    let second = engine.reconcile(&roster(), &grid, 5.0, 1, stamp).unwrap();

    // Then: reports are identical
    assert_eq!(first, second);
}

#[test]
fn test_every_roster_member_gets_exactly_one_result() {
    let grid = export(&[
        &["Aditi Nayak", "", "", "40m", "", "", ""],
        &["Aditi Nayak", "", "", "5m", "", "", ""],
        &["Stranger Danger", "", "", "60m", "", "", ""],
    ]);

    let report = reconcile(&roster(), &grid, 5.0).unwrap();

    let ids: Vec<i64> = report.results.iter().map(|r| r.student_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.unmatched_names, vec!["Stranger Danger".to_string()]);
}

#[test]
fn test_results_cover_roster_when_nothing_matches() {
    let grid = export(&[&["Someone Else", "", "", "60m", "", "", ""]]);

    let report = reconcile(&roster(), &grid, 5.0).unwrap();

    assert_eq!(report.results.len(), 4);
    assert!(report.results.iter().all(|r| !r.attended));
    assert!(report.results.iter().all(|r| r.total_duration_minutes == 0.0));
}

#[test]
fn test_duration_formats() {
    let close = |a: f64, b: f64| (a - b).abs() < 1e-9;

    assert!(close(parse_duration_text("1h 27m 29s"), 87.0 + 29.0 / 60.0));
    assert!(close(parse_duration_text("46m 5s"), 46.0 + 5.0 / 60.0));
    assert!(close(parse_duration_text("01:12:45"), 72.75));
    assert!(close(parse_duration_text("75"), 75.0));
    assert_eq!(parse_duration_text(""), 0.0);
    assert_eq!(parse_duration_text("garbage"), 0.0);
}

#[test]
fn test_threshold_is_inclusive() {
    let grid = export(&[
        &["Rahul Mehta", "", "", "10m", "", "", ""],
        &["Priya Sharma", "", "", "9m 59s", "", "", ""],
    ]);

    let report = reconcile(&roster(), &grid, 10.0).unwrap();

    let rahul = report.results.iter().find(|r| r.student_id == 2).unwrap();
    let priya = report.results.iter().find(|r| r.student_id == 3).unwrap();
    assert!(rahul.attended);
    assert!(!priya.attended);
    assert!(priya.total_duration_minutes > 9.9);
}

#[test]
fn test_email_match_wins_over_name() {
    // Given: a display name that matches nobody, but a roster email
    let grid = export(&[&["R. M. (laptop)", "", "", "50m", "RAHUL@college.edu", "", ""]]);

    let report = reconcile(&roster(), &grid, 5.0).unwrap();

    let rahul = report.results.iter().find(|r| r.student_id == 2).unwrap();
    assert!(rahul.attended);
    assert_eq!(rahul.total_duration_minutes, 50.0);
    assert!(report.unmatched_names.is_empty());
}

#[test]
fn test_token_subset_needs_two_shared_tokens() {
    let grid = export(&[
        &["Aditi Nayak", "", "", "30m", "", "", ""],
        &["Rahul Nayak", "", "", "30m", "", "", ""],
    ]);

    let report = reconcile(&roster(), &grid, 5.0).unwrap();

    let aditi = report.results.iter().find(|r| r.student_id == 1).unwrap();
    let nayak = report.results.iter().find(|r| r.student_id == 4).unwrap();
    assert!(aditi.attended);
    assert!(!nayak.attended);
    assert_eq!(nayak.total_duration_minutes, 0.0);
    assert_eq!(report.unmatched_names, vec!["Rahul Nayak".to_string()]);
}

#[test]
fn test_segments_consolidate_per_member() {
    // Given: two segments for one member, joins out of order
    let grid = export(&[
        &["Priya Sharma", "02/15/26, 6:40:00 PM", "02/15/26, 7:15:00 PM", "35m", "", "", ""],
        &["Priya Sharma", "02/15/26, 6:05:00 PM", "02/15/26, 6:15:00 PM", "10m", "", "", ""],
    ]);

    let report = reconcile(&roster(), &grid, 40.0).unwrap();

    let priya = report.results.iter().find(|r| r.student_id == 3).unwrap();
    assert_eq!(priya.total_duration_minutes, 45.0);
    assert_eq!(priya.first_join, Some(at(18, 5)));
    assert_eq!(priya.last_leave, Some(at(19, 15)));
    assert!(priya.attended);
    assert_eq!(report.success_count, 1);
}

#[test]
fn test_summary_metadata_is_extracted() {
    let report = reconcile(&roster(), &export(&[]), 5.0).unwrap();

    let metadata = &report.extracted_metadata;
    assert_eq!(metadata.get("title").map(String::as_str), Some("Systems Programming Kickoff"));
    assert_eq!(metadata.get("duration_minutes").map(String::as_str), Some("90"));
    assert!(metadata.contains_key("start_time"));
    assert!(metadata.contains_key("end_time"));
    assert_eq!(report.warnings, vec!["no participant rows found below the header".to_string()]);
}

#[test]
fn test_header_outside_window_falls_back_to_first_row() {
    // Given: a header window too small to reach the participants section
    let engine = Reconciler::new(
        ScanLimits {
            header_window: 4,
            ..ScanLimits::default()
        },
        MatchPolicy::default(),
    );
    let grid = export(&[&["Priya Sharma", "", "", "30m", "", "", ""]]);

    let report = engine.reconcile(&roster(), &grid, 5.0, 1, Utc::now()).unwrap();

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("participants section not found"));
}

#[test]
fn test_ambiguous_rows_reported_under_report_policy() {
    let roster = vec![
        RosterMember::new(10, "Arjun Kumar"),
        RosterMember::new(11, "Arjun Kumar Rao"),
        RosterMember::new(12, "Arjun Kumar Iyer"),
    ];
    let grid = export(&[&["Kumar Arjun", "", "", "30m", "", "", ""]]);
    let engine = Reconciler::new(
        ScanLimits::default(),
        MatchPolicy {
            ambiguity: AmbiguityPolicy::Report,
            ..MatchPolicy::default()
        },
    );

    let report = engine.reconcile(&roster, &grid, 5.0, 1, Utc::now()).unwrap();

    // "kumar arjun" is not an exact or compact name match; all three share
    // both tokens, so no one is credited.
    assert_eq!(report.ambiguous_names.len(), 1);
    assert_eq!(report.ambiguous_names[0].candidate_ids, vec![10, 11, 12]);
    assert!(report.results.iter().all(|r| !r.attended));
    assert_eq!(report.failed_count, 1);
}
