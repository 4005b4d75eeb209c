//! Segment consolidation
//!
//! A participant who drops and rejoins appears on several rows. Their
//! segments collapse into one [`ConsolidatedRecord`]: earliest join, latest
//! leave, summed duration.

use std::collections::HashMap;

use super::types::{ConsolidatedRecord, ReportRow, RosterMember};

/// Merge matched (member, row) pairs, one record per member in first-seen order
pub fn consolidate<'a, I>(pairs: I) -> Vec<ConsolidatedRecord>
where
    I: IntoIterator<Item = (&'a RosterMember, &'a ReportRow)>,
{
    let mut records: Vec<ConsolidatedRecord> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for (member, row) in pairs {
        let duration = row.duration_minutes.max(0.0);

        match positions.get(&member.id) {
            Some(&position) => {
                let record = &mut records[position];
                record.first_join = earliest(record.first_join, row.join_time);
                record.last_leave = latest(record.last_leave, row.leave_time);
                record.total_duration_minutes += duration;
            }
            None => {
                positions.insert(member.id, records.len());
                records.push(ConsolidatedRecord {
                    roster_member_id: member.id,
                    first_join: row.join_time,
                    last_leave: row.leave_time,
                    total_duration_minutes: duration,
                });
            }
        }
    }

    records
}

fn earliest<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn segment(join: Option<NaiveDateTime>, leave: Option<NaiveDateTime>, minutes: f64) -> ReportRow {
        ReportRow {
            name: "Aditi Nayak".to_string(),
            email: None,
            join_time: join,
            leave_time: leave,
            duration_minutes: minutes,
        }
    }

    #[test]
    fn test_reconnect_segments_are_merged() {
        let aditi = RosterMember::new(1, "Aditi H Nayak");
        let first = segment(Some(at(18, 0)), Some(at(18, 10)), 10.0);
        let second = segment(Some(at(18, 20)), Some(at(18, 55)), 35.0);

        let records = consolidate([(&aditi, &second), (&aditi, &first)]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].roster_member_id, 1);
        assert_eq!(records[0].first_join, Some(at(18, 0)));
        assert_eq!(records[0].last_leave, Some(at(18, 55)));
        assert!((records[0].total_duration_minutes - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_timestamps_keep_observed_ones() {
        let aditi = RosterMember::new(1, "Aditi H Nayak");
        let untimed = segment(None, None, 5.0);
        let timed = segment(Some(at(9, 0)), None, 5.0);

        let records = consolidate([(&aditi, &untimed), (&aditi, &timed)]);
        assert_eq!(records[0].first_join, Some(at(9, 0)));
        assert_eq!(records[0].last_leave, None);
        assert!((records[0].total_duration_minutes - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_without_timestamps_still_produces_record() {
        let rahul = RosterMember::new(2, "Rahul Sharma");
        let row = segment(None, None, 0.0);

        let records = consolidate([(&rahul, &row)]);
        assert_eq!(records.len(), 1);
        assert!(records[0].first_join.is_none());
        assert_eq!(records[0].total_duration_minutes, 0.0);
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let a = RosterMember::new(1, "A");
        let b = RosterMember::new(2, "B");
        let row = segment(None, None, 1.0);

        let records = consolidate([(&b, &row), (&a, &row), (&b, &row)]);
        let ids: Vec<i64> = records.iter().map(|r| r.roster_member_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!((records[0].total_duration_minutes - 2.0).abs() < 1e-9);
    }
}
