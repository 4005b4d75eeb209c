//! Attendance decisions
//!
//! Produces exactly one result per roster member. A member absent from the
//! report is marked absent with no timestamps and zero minutes, whatever was
//! stored for the session before.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::types::{AttendanceResult, ConsolidatedRecord, RosterMember};

/// Apply the threshold (inclusive) to every roster member, in roster order
pub fn decide(
    roster: &[RosterMember],
    records: &[ConsolidatedRecord],
    threshold_minutes: f64,
    session_id: i64,
    updated_at: DateTime<Utc>,
) -> Vec<AttendanceResult> {
    let by_member: HashMap<i64, &ConsolidatedRecord> = records
        .iter()
        .map(|record| (record.roster_member_id, record))
        .collect();

    roster
        .iter()
        .map(|member| match by_member.get(&member.id) {
            Some(record) => AttendanceResult {
                session_id,
                student_id: member.id,
                attended: record.total_duration_minutes >= threshold_minutes,
                first_join: record.first_join,
                last_leave: record.last_leave,
                total_duration_minutes: record.total_duration_minutes,
                updated_at,
            },
            None => AttendanceResult {
                session_id,
                student_id: member.id,
                attended: false,
                first_join: None,
                last_leave: None,
                total_duration_minutes: 0.0,
                updated_at,
            },
        })
        .collect()
}
