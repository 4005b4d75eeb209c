//! Attendance reconciliation engine
//!
//! Pure, synchronous pipeline from a decoded export grid and a roster to one
//! [`AttendanceResult`] per roster member:
//!
//! grid → [`scanner`] → [`extract`] (with [`duration`]) → [`resolver`]
//! → [`consolidator`] → [`decision`]
//!
//! The engine performs no I/O. Callers persist the results and serialize
//! runs for the same session.

pub mod cell;
pub mod consolidator;
pub mod decision;
pub mod duration;
pub mod extract;
pub mod resolver;
pub mod scanner;
pub mod types;

pub use cell::{CellValue, Grid};
pub use resolver::{AmbiguityPolicy, MatchPolicy, MatchTier, Resolution, Suggestion};
pub use scanner::{Metadata, ScanLimits, StructureWarning};
pub use types::{AttendanceResult, AttendanceStatus, ConsolidatedRecord, ReportRow, RosterMember};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use resolver::IdentityResolver;

/// Unmatched names kept in a report; the count is never capped
pub const MAX_UNMATCHED_NAMES: usize = 15;

/// Input the engine cannot work with at all
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("attendance document contains no data")]
    EmptyGrid,

    #[error("minimum duration must be a non-negative number of minutes, got {0}")]
    InvalidThreshold(f64),
}

/// Row that satisfied the token-subset tier for several members
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousRow {
    pub report_name: String,
    pub candidate_ids: Vec<i64>,
}

/// Results plus diagnostics for operators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub results: Vec<AttendanceResult>,
    /// Roster members matched by at least one row
    pub success_count: usize,
    /// Report rows that matched nobody (ambiguous rows included)
    pub failed_count: usize,
    pub unmatched_names: Vec<String>,
    pub extracted_metadata: Metadata,
    pub warnings: Vec<String>,
    pub ambiguous_names: Vec<AmbiguousRow>,
    pub suggestions: Vec<Suggestion>,
}

/// Engine configured with scan limits and a matching policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    pub limits: ScanLimits,
    pub policy: MatchPolicy,
}

impl Reconciler {
    pub fn new(limits: ScanLimits, policy: MatchPolicy) -> Self {
        Self { limits, policy }
    }

    /// Reconcile one session's export against its roster
    ///
    /// Every result carries `session_id` and the same `updated_at`, so equal
    /// inputs produce equal reports.
    pub fn reconcile(
        &self,
        roster: &[RosterMember],
        grid: &Grid,
        threshold_minutes: f64,
        session_id: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<ReconciliationReport, ReconcileError> {
        if !threshold_minutes.is_finite() || threshold_minutes < 0.0 {
            return Err(ReconcileError::InvalidThreshold(threshold_minutes));
        }
        if grid.is_empty() {
            return Err(ReconcileError::EmptyGrid);
        }

        let scan = scanner::scan_document(grid, &self.limits);
        let mut warnings: Vec<String> = scan.warning.iter().map(ToString::to_string).collect();

        let rows = extract::extract_rows(grid, scan.header_row_index);
        if rows.is_empty() {
            warnings.push("no participant rows found below the header".to_string());
        }

        let resolver = IdentityResolver::new(roster, self.policy);
        let mut matched = Vec::new();
        let mut failed_count = 0;
        let mut unmatched_names = Vec::new();
        let mut ambiguous_names = Vec::new();
        let mut suggestions: Vec<Suggestion> = Vec::new();

        for row in &rows {
            match resolver.resolve(row) {
                Resolution::Matched { member_index, tier } => {
                    debug!(
                        session_id,
                        report_name = %row.name,
                        student_id = roster[member_index].id,
                        ?tier,
                        "Matched report row"
                    );
                    matched.push((&roster[member_index], row));
                }
                Resolution::Ambiguous { candidate_ids } => {
                    debug!(session_id, report_name = %row.name, ?candidate_ids, "Ambiguous report row");
                    failed_count += 1;
                    ambiguous_names.push(AmbiguousRow {
                        report_name: row.name.clone(),
                        candidate_ids,
                    });
                }
                Resolution::Unmatched => {
                    debug!(session_id, report_name = %row.name, "Unmatched report row");
                    failed_count += 1;
                    if unmatched_names.len() < MAX_UNMATCHED_NAMES {
                        unmatched_names.push(row.name.clone());
                    }
                    if !suggestions.iter().any(|s| s.report_name == row.name) {
                        suggestions.extend(resolver.suggest(row));
                    }
                }
            }
        }

        let records = consolidator::consolidate(matched);
        let results = decision::decide(roster, &records, threshold_minutes, session_id, updated_at);

        info!(
            session_id,
            roster = roster.len(),
            rows = rows.len(),
            matched = records.len(),
            failed = failed_count,
            attended = results.iter().filter(|r| r.attended).count(),
            "Reconciled attendance report"
        );

        Ok(ReconciliationReport {
            results,
            success_count: records.len(),
            failed_count,
            unmatched_names,
            extracted_metadata: scan.metadata,
            warnings,
            ambiguous_names,
            suggestions,
        })
    }
}

/// Reconcile with default limits and policy, session 0, stamped now
pub fn reconcile(
    roster: &[RosterMember],
    grid: &Grid,
    threshold_minutes: f64,
) -> Result<ReconciliationReport, ReconcileError> {
    Reconciler::default().reconcile(roster, grid, threshold_minutes, 0, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let roster = vec![RosterMember::new(1, "A")];
        assert_eq!(reconcile(&roster, &Grid::default(), 5.0), Err(ReconcileError::EmptyGrid));

        let blank = Grid::new(vec![row(&["", " "])]);
        assert_eq!(reconcile(&roster, &blank, 5.0), Err(ReconcileError::EmptyGrid));
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let grid = Grid::new(vec![row(&["Name"]), row(&["A"])]);
        assert!(matches!(
            reconcile(&[], &grid, -1.0),
            Err(ReconcileError::InvalidThreshold(_))
        ));
        assert!(matches!(
            reconcile(&[], &grid, f64::NAN),
            Err(ReconcileError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_headerless_grid_warns_and_uses_row_zero() {
        let roster = vec![RosterMember::new(1, "Aditi Nayak")];
        let grid = Grid::new(vec![
            row(&["Name", "Duration"]),
            row(&["Aditi Nayak", "30"]),
        ]);

        let report = reconcile(&roster, &grid, 5.0).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.results[0].attended);
        assert_eq!(report.success_count, 1);
    }

    #[test]
    fn test_unmatched_names_are_capped() {
        let mut rows = vec![row(&["Participants"]), row(&["Name", "Email", "Duration"])];
        rows.extend((0..20).map(|i| row(&[format!("Visitor {}", i).as_str(), "", "5"])));
        let grid = Grid::new(rows);

        let report = reconcile(&[], &grid, 5.0).unwrap();
        assert_eq!(report.failed_count, 20);
        assert_eq!(report.unmatched_names.len(), MAX_UNMATCHED_NAMES);
        assert!(report.results.is_empty());
    }

    #[test]
    fn test_ambiguous_rows_count_as_failed_when_reported() {
        let roster = vec![
            RosterMember::new(10, "Arjun Kumar Rao"),
            RosterMember::new(11, "Arjun Kumar Reddy"),
        ];
        let grid = Grid::new(vec![
            row(&["Participants"]),
            row(&["Name", "Email", "Duration"]),
            row(&["Arjun Kumar", "", "40"]),
        ]);
        let reconciler = Reconciler::new(
            ScanLimits::default(),
            MatchPolicy {
                ambiguity: AmbiguityPolicy::Report,
                ..MatchPolicy::default()
            },
        );

        let report = reconciler.reconcile(&roster, &grid, 5.0, 1, Utc::now()).unwrap();
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.success_count, 0);
        assert_eq!(report.ambiguous_names[0].candidate_ids, vec![10, 11]);
        assert!(report.unmatched_names.is_empty());
        assert!(report.results.iter().all(|r| !r.attended));
    }
}
