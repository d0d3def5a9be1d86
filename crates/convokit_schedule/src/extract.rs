//! Marker scan and positional header join.

use tracing::{debug, info, warn};

use crate::normalize::{NormalizedGrid, normalize_grid};
use crate::report::{ReportExtract, ReportExtractBuilder};
use crate::schedule::{AssignmentRecord, ScheduleIndex};
use crate::spec::{
    EnumCellClass, EnumHeaderField, EnumWarningKind, MarkerPolicy, RawGrid, ScheduleError,
    SpecExtractOptions,
};
use crate::util::classify_cell;

/// Schedule plus the diagnostics gathered while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExtractOutput {
    /// Professor -> ordered assignments.
    pub schedule: ScheduleIndex,
    /// Counters and warnings.
    pub report: ReportExtract,
}

/// Header texts of one session column.
#[derive(Debug, Clone)]
struct SpecColumnHeader {
    subject: String,
    date: String,
    time: String,
    level: String,
}

impl SpecColumnHeader {
    fn derive_missing_fields(&self) -> Vec<EnumHeaderField> {
        EnumHeaderField::ALL
            .into_iter()
            .filter(|field| self.text_of(*field).is_empty())
            .collect()
    }

    fn text_of(&self, field: EnumHeaderField) -> &str {
        match field {
            EnumHeaderField::Subject => &self.subject,
            EnumHeaderField::Date => &self.date,
            EnumHeaderField::Time => &self.time,
            EnumHeaderField::Level => &self.level,
        }
    }
}

/// Normalize `raw_grid` with `options.layout`, then extract with `options.policy`.
pub fn build_schedule(
    raw_grid: &RawGrid,
    options: &SpecExtractOptions,
) -> Result<SpecExtractOutput, ScheduleError> {
    let normalized = normalize_grid(raw_grid, &options.layout)?;
    extract_schedule(&normalized, options)
}

/// Extract assignments with the built-in policy in `options.policy`.
///
/// The layout stored in `normalized` governs the join; `options.layout` is only
/// read by [`build_schedule`].
pub fn extract_schedule(
    normalized: &NormalizedGrid,
    options: &SpecExtractOptions,
) -> Result<SpecExtractOutput, ScheduleError> {
    extract_schedule_with(normalized, &options.policy, options)
}

/// Extract assignments with any [`MarkerPolicy`].
///
/// Body rows are scanned in order and, within a row, session columns left to
/// right. Each marker at `(x, y)` is joined with the date/time/level/subject
/// headers at column `y` and appended to the list of the professor in row `x`.
/// Fails only in strict mode, on the first marker column with an empty header.
pub fn extract_schedule_with<P>(
    normalized: &NormalizedGrid,
    policy: &P,
    options: &SpecExtractOptions,
) -> Result<SpecExtractOutput, ScheduleError>
where
    P: MarkerPolicy + ?Sized,
{
    let layout = normalized.layout();
    let l_cols_scan = layout.derive_scan_columns(normalized.n_cols());

    let l_headers: Vec<SpecColumnHeader> = (0..normalized.n_cols())
        .map(|n_col| SpecColumnHeader {
            subject: normalized.header_text(EnumHeaderField::Subject, n_col),
            date: normalized.header_text(EnumHeaderField::Date, n_col),
            time: normalized.header_text(EnumHeaderField::Time, n_col),
            level: normalized.header_text(EnumHeaderField::Level, n_col),
        })
        .collect();

    let mut schedule = ScheduleIndex::new();
    let mut builder_report = ReportExtractBuilder::default();

    for (n_body_row, row) in normalized.body().iter().enumerate() {
        builder_report.add_row_scanned();
        let n_row_idx = layout.row_body_start + n_body_row;
        let c_professor = normalized.professor_text(n_body_row);

        for &n_col in &l_cols_scan {
            builder_report.add_cell_scanned();

            let location = match classify_cell(&row[n_col], policy, &options.tokens_missing) {
                EnumCellClass::Blank | EnumCellClass::Missing => continue,
                EnumCellClass::Unrecognized(c_text) => {
                    if options.if_collect_unrecognized {
                        builder_report.add_warning(
                            EnumWarningKind::UnrecognizedCell,
                            n_row_idx,
                            n_col,
                            &c_professor,
                            c_text,
                        );
                    }
                    continue;
                }
                EnumCellClass::Marker { location } => location,
            };

            let header = &l_headers[n_col];
            let l_fields_missing = header.derive_missing_fields();
            if let Some(field) = l_fields_missing.first() {
                if options.if_strict_headers {
                    return Err(ScheduleError::MissingHeaderValue {
                        row_idx: layout.row_of(*field),
                        col_idx: n_col,
                        field: *field,
                    });
                }
                builder_report.add_warning(
                    EnumWarningKind::MissingHeaderValue,
                    n_row_idx,
                    n_col,
                    &c_professor,
                    l_fields_missing
                        .iter()
                        .map(|field| field.name())
                        .collect::<Vec<_>>()
                        .join(", "),
                );
            }
            if c_professor.is_empty() {
                builder_report.add_warning(
                    EnumWarningKind::MissingProfessor,
                    n_row_idx,
                    n_col,
                    &c_professor,
                    "marker row has no professor name".to_string(),
                );
            }

            builder_report.add_marker();
            schedule.push(
                c_professor.clone(),
                AssignmentRecord {
                    subject: header.subject.clone(),
                    date: header.date.clone(),
                    time: header.time.clone(),
                    level: header.level.clone(),
                    location,
                },
            );
        }
    }

    let report = builder_report.build(schedule.len() as u64);
    for warning in &report.warnings {
        debug!("{warning}");
    }
    if report.warning_count() > 0 {
        warn!(
            warnings = report.warning_count(),
            "extraction finished with warnings"
        );
    }
    info!(
        rows = report.cnt_rows_scanned,
        markers = report.cnt_markers,
        professors = report.cnt_professors,
        "schedule extracted"
    );

    Ok(SpecExtractOutput { schedule, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EnumMarkerPolicy, SpecGridLayout};

    const HEADER_ROWS: [[&str; 6]; 6] = [
        ["", "2024-06-10", "", "2024-06-11", "", ""],
        ["", "08:30", "10:30", "08:30", "", ""],
        ["", "", "", "", "", ""],
        ["", "S2", "S4", "S6", "", ""],
        ["", "Algebra", "Physics", "Analysis", "", ""],
        ["", "", "", "", "", ""],
    ];

    fn build_grid(body: &[[&str; 6]]) -> RawGrid {
        let l_rows: Vec<Vec<&str>> = HEADER_ROWS
            .iter()
            .chain(body.iter())
            .map(|row| row.to_vec())
            .collect();
        RawGrid::from_text_rows(&l_rows).expect("grid")
    }

    fn presence_options() -> SpecExtractOptions {
        SpecExtractOptions {
            policy: EnumMarkerPolicy::presence(),
            ..SpecExtractOptions::default()
        }
    }

    #[test]
    fn presence_policy_records_only_sentinel_column() {
        let raw = build_grid(&[["Dr. A", "", "*", "", "", ""]]);
        let output = build_schedule(&raw, &presence_options()).expect("extract");

        let l_records = output.schedule.get("Dr. A").expect("Dr. A");
        assert_eq!(
            l_records,
            &[AssignmentRecord {
                subject: "Physics".to_string(),
                date: "2024-06-10".to_string(),
                time: "10:30".to_string(),
                level: "S4".to_string(),
                location: None,
            }]
        );
    }

    #[test]
    fn location_policy_records_location_text() {
        let raw = build_grid(&[["Dr. B", "", "Room12", "", "", ""]]);

        let output = build_schedule(&raw, &SpecExtractOptions::default()).expect("extract");
        let l_records = output.schedule.get("Dr. B").expect("Dr. B");
        assert_eq!(l_records.len(), 1);
        assert_eq!(l_records[0].location.as_deref(), Some("Room12"));

        let output = build_schedule(&raw, &presence_options()).expect("extract");
        assert!(output.schedule.is_empty());
        assert_eq!(output.report.cnt_markers, 0);
    }

    #[test]
    fn location_policy_skips_text_without_trailing_digit() {
        let raw = build_grid(&[["Dr. C", "see note", "Amphi", "B12", "", ""]]);
        let output = build_schedule(&raw, &SpecExtractOptions::default()).expect("extract");

        let l_records = output.schedule.get("Dr. C").expect("Dr. C");
        assert_eq!(l_records.len(), 1);
        assert_eq!(l_records[0].subject, "Analysis");
        assert_eq!(
            output
                .report
                .warnings_of(EnumWarningKind::UnrecognizedCell)
                .len(),
            2
        );
    }

    #[test]
    fn trailing_reserved_columns_are_not_scanned() {
        let raw = build_grid(&[["Dr. D", "", "", "", "R1", "R2"]]);
        let output = build_schedule(&raw, &SpecExtractOptions::default()).expect("extract");
        assert!(output.schedule.is_empty());
        assert_eq!(output.report.cnt_cells_scanned, 3);
    }

    #[test]
    fn leading_marker_without_professor_is_kept_and_warned() {
        let raw = build_grid(&[
            ["", "*", "", "", "", ""],
            ["Dr. E", "", "*", "", "", ""],
        ]);
        let output = build_schedule(&raw, &presence_options()).expect("extract");

        let l_records = output.schedule.get("").expect("unnamed row");
        assert_eq!(l_records.len(), 1);
        assert_eq!(l_records[0].subject, "Algebra");
        let l_warnings = output
            .report
            .warnings_of(EnumWarningKind::MissingProfessor);
        assert_eq!(l_warnings.len(), 1);
        assert_eq!(l_warnings[0].row_idx, 6);
        assert_eq!(l_warnings[0].col_idx, 1);
        assert!(l_warnings[0].professor.is_empty());
        assert_eq!(output.schedule.get("Dr. E").map(|l| l.len()), Some(1));
    }

    #[test]
    fn unrecognized_cells_are_dropped_silently_when_not_collected() {
        let raw = build_grid(&[["Dr. C", "see note", "Amphi", "B12", "", ""]]);
        let options = SpecExtractOptions {
            if_collect_unrecognized: false,
            ..SpecExtractOptions::default()
        };
        let output = build_schedule(&raw, &options).expect("extract");

        assert_eq!(output.schedule.get("Dr. C").map(|l| l.len()), Some(1));
        assert!(
            output
                .report
                .warnings_of(EnumWarningKind::UnrecognizedCell)
                .is_empty()
        );
        assert_eq!(output.report.cnt_cells_scanned, 3);
    }

    #[test]
    fn repeated_names_and_merged_rows_accumulate_in_scan_order() {
        let raw = build_grid(&[
            ["Dr. A", "", "", "*", "", ""],
            ["", "*", "", "", "", ""],
            ["Dr. B", "", "*", "", "", ""],
            ["Dr. A", "", "*", "", "", ""],
        ]);
        let output = build_schedule(&raw, &presence_options()).expect("extract");

        assert_eq!(output.schedule.professors(), vec!["Dr. A", "Dr. B"]);
        let l_subjects: Vec<&str> = output
            .schedule
            .get("Dr. A")
            .expect("Dr. A")
            .iter()
            .map(|r| r.subject.as_str())
            .collect();
        assert_eq!(l_subjects, vec!["Analysis", "Algebra", "Physics"]);
        assert_eq!(output.report.cnt_professors, 2);
    }

    #[test]
    fn records_match_headers_at_marker_column() {
        // Each marker carries its own column index as location code.
        let raw = build_grid(&[
            ["Dr. A", "1", "2", "3", "", ""],
            ["Dr. B", "", "2", "", "", ""],
        ]);
        let normalized = normalize_grid(&raw, &SpecGridLayout::default()).expect("normalize");
        let output =
            extract_schedule(&normalized, &SpecExtractOptions::default()).expect("extract");

        assert_eq!(output.schedule.count_records(), 4);
        for (_, records) in output.schedule.iter() {
            for record in records {
                let n_col: usize = record
                    .location
                    .as_deref()
                    .and_then(|loc| loc.parse().ok())
                    .expect("location");
                for field in EnumHeaderField::ALL {
                    let c_expected = normalized.header_text(field, n_col);
                    let c_actual = match field {
                        EnumHeaderField::Subject => &record.subject,
                        EnumHeaderField::Date => &record.date,
                        EnumHeaderField::Time => &record.time,
                        EnumHeaderField::Level => &record.level,
                    };
                    assert_eq!(c_actual, &c_expected);
                }
            }
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let raw = build_grid(&[
            ["Dr. A", "1", "", "3", "", ""],
            ["Dr. B", "", "4", "", "", ""],
        ]);
        let first = build_schedule(&raw, &SpecExtractOptions::default()).expect("extract");
        let second = build_schedule(&raw, &SpecExtractOptions::default()).expect("extract");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_header_warns_or_fails_in_strict_mode() {
        let mut l_rows: Vec<Vec<&str>> = HEADER_ROWS.iter().map(|row| row.to_vec()).collect();
        l_rows[0] = vec!["", "", "", "", "", ""];
        l_rows.push(vec!["Dr. E", "A1", "", "", "", ""]);
        let raw = RawGrid::from_text_rows(&l_rows).expect("grid");

        let output = build_schedule(&raw, &SpecExtractOptions::default()).expect("extract");
        let l_warnings = output
            .report
            .warnings_of(EnumWarningKind::MissingHeaderValue);
        assert_eq!(l_warnings.len(), 1);
        assert_eq!(l_warnings[0].detail, "date");
        assert_eq!(output.schedule.count_records(), 1);

        let options = SpecExtractOptions {
            if_strict_headers: true,
            ..SpecExtractOptions::default()
        };
        let err = build_schedule(&raw, &options).expect_err("strict");
        assert_eq!(
            err,
            ScheduleError::MissingHeaderValue {
                row_idx: 0,
                col_idx: 1,
                field: EnumHeaderField::Date
            }
        );
    }

    #[test]
    fn missing_tokens_are_silent_absence() {
        let raw = build_grid(&[["Dr. F", "N/A", "-", "", "", ""]]);
        let output = build_schedule(&raw, &SpecExtractOptions::default()).expect("extract");
        assert!(output.schedule.is_empty());
        assert_eq!(output.report.warning_count(), 0);
    }

    struct LowercaseRoomPolicy;

    impl MarkerPolicy for LowercaseRoomPolicy {
        fn classify_text(&self, text: &str) -> EnumCellClass {
            match text.strip_prefix("room:") {
                Some(room) => EnumCellClass::Marker {
                    location: Some(room.to_string()),
                },
                None => EnumCellClass::Unrecognized(text.to_string()),
            }
        }
    }

    #[test]
    fn custom_policy_drives_the_same_scan() {
        let raw = build_grid(&[["Dr. G", "room:east", "", "", "", ""]]);
        let normalized = normalize_grid(&raw, &SpecGridLayout::default()).expect("normalize");
        let output = extract_schedule_with(
            &normalized,
            &LowercaseRoomPolicy,
            &SpecExtractOptions::default(),
        )
        .expect("extract");
        let l_records = output.schedule.get("Dr. G").expect("Dr. G");
        assert_eq!(l_records[0].location.as_deref(), Some("east"));
        assert_eq!(l_records[0].subject, "Algebra");
    }
}
