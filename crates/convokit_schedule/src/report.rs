//! Extraction report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::{EnumWarningKind, SpecCellWarning};

/// Aggregate counters and diagnostics for one extraction run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportExtract {
    /// Body rows visited.
    pub cnt_rows_scanned: u64,
    /// Body cells visited (session columns only).
    pub cnt_cells_scanned: u64,
    /// Marker cells turned into records.
    pub cnt_markers: u64,
    /// Distinct professors with at least one record.
    pub cnt_professors: u64,
    /// Non-fatal findings collected during the scan.
    pub warnings: Vec<SpecCellWarning>,
}

impl ReportExtract {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Warnings of one kind.
    pub fn warnings_of(&self, kind: EnumWarningKind) -> Vec<&SpecCellWarning> {
        self.warnings.iter().filter(|w| w.kind == kind).collect()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_scanned".to_string(), self.cnt_rows_scanned);
        dict_counts.insert("cnt_cells_scanned".to_string(), self.cnt_cells_scanned);
        dict_counts.insert("cnt_markers".to_string(), self.cnt_markers);
        dict_counts.insert("cnt_professors".to_string(), self.cnt_professors);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} rows={} cells={} markers={} professors={} warnings={}",
            dict_counts["cnt_rows_scanned"],
            dict_counts["cnt_cells_scanned"],
            dict_counts["cnt_markers"],
            dict_counts["cnt_professors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportExtract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[EXTRACT]"))
    }
}

/// Mutable accumulator for extraction statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportExtractBuilder {
    /// See [`ReportExtract::cnt_rows_scanned`].
    pub cnt_rows_scanned: u64,
    /// See [`ReportExtract::cnt_cells_scanned`].
    pub cnt_cells_scanned: u64,
    /// See [`ReportExtract::cnt_markers`].
    pub cnt_markers: u64,
    /// See [`ReportExtract::warnings`].
    pub warnings: Vec<SpecCellWarning>,
}

impl ReportExtractBuilder {
    /// Increment scanned-row count by one.
    pub fn add_row_scanned(&mut self) {
        self.cnt_rows_scanned += 1;
    }

    /// Increment scanned-cell count by one.
    pub fn add_cell_scanned(&mut self) {
        self.cnt_cells_scanned += 1;
    }

    /// Increment marker count by one.
    pub fn add_marker(&mut self) {
        self.cnt_markers += 1;
    }

    /// Add one cell-scoped warning.
    pub fn add_warning(
        &mut self,
        kind: EnumWarningKind,
        row_idx: usize,
        col_idx: usize,
        professor: &str,
        detail: String,
    ) {
        self.warnings.push(SpecCellWarning {
            kind,
            row_idx,
            col_idx,
            professor: professor.to_string(),
            detail,
        });
    }

    /// Finalize builder into immutable report.
    pub fn build(self, cnt_professors: u64) -> ReportExtract {
        ReportExtract {
            cnt_rows_scanned: self.cnt_rows_scanned,
            cnt_cells_scanned: self.cnt_cells_scanned,
            cnt_markers: self.cnt_markers,
            cnt_professors,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_extract_to_dict_and_format() {
        let mut builder = ReportExtractBuilder::default();
        builder.add_row_scanned();
        builder.add_cell_scanned();
        builder.add_cell_scanned();
        builder.add_marker();
        builder.add_warning(
            EnumWarningKind::UnrecognizedCell,
            7,
            2,
            "Dr. A",
            "note".to_string(),
        );
        let report = builder.build(1);

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_cells_scanned"], 2);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[EXTRACT]");
        assert_eq!(
            txt,
            "[EXTRACT] rows=1 cells=2 markers=1 professors=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
        assert_eq!(
            report.warnings[0].to_string(),
            "[unrecognized_cell] row=7 col=2 professor=\"Dr. A\": note"
        );
    }
}
