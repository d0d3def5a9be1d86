//! Grid, layout, marker-policy and option models plus top-level error types.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::conf::{
    C_MARKER_PRESENCE_DEFAULT, N_COL_PROFESSOR, N_COLS_TRAILING_RESERVED, N_ROW_BODY_START,
    N_ROW_DATE, N_ROW_LEVEL, N_ROW_SUBJECT, N_ROW_TIME, TUP_TOKENS_MISSING,
};
use crate::util::render_cell_text;

////////////////////////////////////////////////////////////////////////////////
// #region CellAndGrid

/// One spreadsheet cell as read from the source file.
///
/// Typed values keep their type until they are rendered at the record boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank cell.
    #[default]
    Empty,
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date with time of day.
    DateTime(NaiveDateTime),
}

impl EnumCellValue {
    /// Build a cell from text; blank text becomes [`EnumCellValue::Empty`].
    pub fn from_text(text: impl AsRef<str>) -> Self {
        let c_text = text.as_ref();
        if c_text.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(c_text.to_string())
        }
    }

    /// `true` for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_cell_text(self))
    }
}

/// Rectangular cell table, rows x columns, zero-based.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGrid {
    l_rows: Vec<Vec<EnumCellValue>>,
    n_cols: usize,
}

impl RawGrid {
    /// Build a grid, rejecting rows whose width differs from the first row.
    pub fn new(rows: Vec<Vec<EnumCellValue>>) -> Result<Self, ScheduleError> {
        let n_cols = rows.first().map_or(0, Vec::len);
        if let Some((row_idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n_cols)
        {
            return Err(ScheduleError::MisalignedGrid {
                row_idx,
                width: row.len(),
                width_expected: n_cols,
            });
        }
        Ok(Self {
            l_rows: rows,
            n_cols,
        })
    }

    /// Build a grid from plain text rows (`""` becomes an empty cell).
    pub fn from_text_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, ScheduleError> {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(EnumCellValue::from_text).collect())
                .collect(),
        )
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.l_rows.len()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Cell at `(row_idx, col_idx)`.
    pub fn get(&self, row_idx: usize, col_idx: usize) -> Option<&EnumCellValue> {
        self.l_rows.get(row_idx).and_then(|row| row.get(col_idx))
    }

    /// One full row.
    pub fn row(&self, row_idx: usize) -> Option<&[EnumCellValue]> {
        self.l_rows.get(row_idx).map(Vec::as_slice)
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<EnumCellValue>] {
        &self.l_rows
    }

    pub(crate) fn into_rows(self) -> Vec<Vec<EnumCellValue>> {
        self.l_rows
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Layout

/// Header rows joined positionally against marker columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumHeaderField {
    /// Exam date.
    Date,
    /// Exam time.
    Time,
    /// Academic level.
    Level,
    /// Subject.
    Subject,
}

impl EnumHeaderField {
    /// All fields in record order.
    pub const ALL: [EnumHeaderField; 4] = [Self::Subject, Self::Date, Self::Time, Self::Level];

    /// Lower-case field name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Level => "level",
            Self::Subject => "subject",
        }
    }
}

impl fmt::Display for EnumHeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Positions of the header rows, body and reserved columns in a timetable grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGridLayout {
    /// Exam date row (forward-filled).
    pub row_date: usize,
    /// Exam time row (forward-filled).
    pub row_time: usize,
    /// Academic level row.
    pub row_level: usize,
    /// Subject row.
    pub row_subject: usize,
    /// First body row; every row before it is header/metadata.
    pub row_body_start: usize,
    /// Professor-name column (forward-filled from `row_body_start`).
    pub col_professor: usize,
    /// Trailing columns excluded from the marker scan.
    pub n_cols_trailing_reserved: usize,
}

impl Default for SpecGridLayout {
    fn default() -> Self {
        Self {
            row_date: N_ROW_DATE,
            row_time: N_ROW_TIME,
            row_level: N_ROW_LEVEL,
            row_subject: N_ROW_SUBJECT,
            row_body_start: N_ROW_BODY_START,
            col_professor: N_COL_PROFESSOR,
            n_cols_trailing_reserved: N_COLS_TRAILING_RESERVED,
        }
    }
}

impl SpecGridLayout {
    /// Number of header/metadata rows.
    pub fn n_rows_header(&self) -> usize {
        self.row_body_start
    }

    /// Row index holding `field`.
    pub fn row_of(&self, field: EnumHeaderField) -> usize {
        match field {
            EnumHeaderField::Date => self.row_date,
            EnumHeaderField::Time => self.row_time,
            EnumHeaderField::Level => self.row_level,
            EnumHeaderField::Subject => self.row_subject,
        }
    }

    /// Column indices visited by the marker scan for a grid `n_cols` wide.
    pub fn derive_scan_columns(&self, n_cols: usize) -> Vec<usize> {
        let n_col_end = n_cols.saturating_sub(self.n_cols_trailing_reserved);
        (0..n_col_end)
            .filter(|col_idx| *col_idx != self.col_professor)
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MarkerPolicy

/// Result of interpreting one body cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCellClass {
    /// Empty or whitespace-only.
    Blank,
    /// Explicit "no assignment" token.
    Missing,
    /// Assignment, optionally carrying a location code.
    Marker {
        /// Location text under location-coded policies.
        location: Option<String>,
    },
    /// Non-empty text that is not a marker under the active policy.
    Unrecognized(String),
}

/// Interpret the canonical text of a non-blank, non-missing body cell.
pub trait MarkerPolicy {
    /// Classify `text` as a marker or as unrecognized content.
    fn classify_text(&self, text: &str) -> EnumCellClass;
}

/// Built-in marker policies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnumMarkerPolicy {
    /// Cell equal to `sentinel` means "assigned"; no location recorded.
    Presence {
        /// Sentinel text, compared after trimming.
        sentinel: String,
    },
    /// Cell whose text ends in a numeric character (any script) is the assigned location.
    #[default]
    LocationCoded,
}

impl EnumMarkerPolicy {
    /// Presence policy with the default `*` sentinel.
    pub fn presence() -> Self {
        Self::Presence {
            sentinel: C_MARKER_PRESENCE_DEFAULT.to_string(),
        }
    }

    /// Short policy name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Presence { .. } => "presence",
            Self::LocationCoded => "location",
        }
    }
}

impl MarkerPolicy for EnumMarkerPolicy {
    fn classify_text(&self, text: &str) -> EnumCellClass {
        match self {
            Self::Presence { sentinel } => {
                if text == sentinel.trim() {
                    EnumCellClass::Marker { location: None }
                } else {
                    EnumCellClass::Unrecognized(text.to_string())
                }
            }
            Self::LocationCoded => {
                if text.chars().last().is_some_and(char::is_numeric) {
                    EnumCellClass::Marker {
                        location: Some(text.to_string()),
                    }
                } else {
                    EnumCellClass::Unrecognized(text.to_string())
                }
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Options for one normalize + extract run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExtractOptions {
    /// Grid layout used for normalization.
    pub layout: SpecGridLayout,
    /// Marker policy selected by the caller.
    pub policy: EnumMarkerPolicy,
    /// Texts treated as explicit absence (exact match after trimming).
    pub tokens_missing: Vec<String>,
    /// Collect non-marker body text as warnings.
    pub if_collect_unrecognized: bool,
    /// Fail instead of warning when a marker column has an empty header value.
    pub if_strict_headers: bool,
}

impl Default for SpecExtractOptions {
    fn default() -> Self {
        Self {
            layout: SpecGridLayout::default(),
            policy: EnumMarkerPolicy::default(),
            tokens_missing: TUP_TOKENS_MISSING.iter().map(ToString::to_string).collect(),
            if_collect_unrecognized: true,
            if_strict_headers: false,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WarningsAndErrors

/// Non-fatal extraction finding category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumWarningKind {
    /// Non-empty body cell that is not a marker.
    UnrecognizedCell,
    /// Marker column with an empty date/time/level/subject after filling.
    MissingHeaderValue,
    /// Marker row with no professor name after filling.
    MissingProfessor,
}

impl EnumWarningKind {
    /// Snake-case kind name.
    pub fn name(self) -> &'static str {
        match self {
            Self::UnrecognizedCell => "unrecognized_cell",
            Self::MissingHeaderValue => "missing_header_value",
            Self::MissingProfessor => "missing_professor",
        }
    }
}

/// One cell-scoped warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCellWarning {
    /// Warning category.
    pub kind: EnumWarningKind,
    /// Grid row index.
    pub row_idx: usize,
    /// Grid column index.
    pub col_idx: usize,
    /// Professor of the row (may be empty).
    pub professor: String,
    /// Cell text or the names of the missing fields.
    pub detail: String,
}

impl fmt::Display for SpecCellWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] row={} col={} professor={:?}: {}",
            self.kind.name(),
            self.row_idx,
            self.col_idx,
            self.professor,
            self.detail
        )
    }
}

/// Errors that abort a normalize/extract run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Grid too small or layout indices outside the grid.
    MalformedInput(String),
    /// Row width differs from the first row.
    MisalignedGrid {
        /// Offending row.
        row_idx: usize,
        /// Its width.
        width: usize,
        /// Width of row 0.
        width_expected: usize,
    },
    /// Header cell still empty at a marker column (strict mode only).
    MissingHeaderValue {
        /// Header row index.
        row_idx: usize,
        /// Marker column index.
        col_idx: usize,
        /// Header field.
        field: EnumHeaderField,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput(msg) => write!(f, "Malformed timetable grid: {msg}"),
            Self::MisalignedGrid {
                row_idx,
                width,
                width_expected,
            } => write!(
                f,
                "Misaligned timetable grid: row {row_idx} has {width} columns, \
                 expected {width_expected}"
            ),
            Self::MissingHeaderValue {
                row_idx,
                col_idx,
                field,
            } => write!(
                f,
                "Missing {field} header value at row {row_idx}, column {col_idx}"
            ),
        }
    }
}

impl std::error::Error for ScheduleError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
