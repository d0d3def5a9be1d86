//! Shared XLSX specification models and IO errors.

use std::fmt;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use convokit_schedule::ScheduleError;

use crate::conf::{
    C_ACADEMIC_YEAR_DEFAULT, C_FILE_STEM_CONVOCATIONS, C_FMT_DATE_FILE, C_PERIOD_DEFAULT,
    C_PLACE_DEFAULT, C_SESSION_DEFAULT, C_SIGNATORY_DEFAULT, N_COLS_INDEX_SKIPPED,
    N_ROWS_TITLE_SKIPPED,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment (`left`, `center`, `right`).
    pub align: Option<String>,
    /// Vertical alignment (`vcenter`).
    pub valign: Option<String>,
    /// Thin border on all sides.
    pub border: Option<bool>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying the non-`None` fields of `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: patch.font_name.or_else(|| self.font_name.clone()),
            font_size: patch.font_size.or(self.font_size),
            bold: patch.bold.or(self.bold),
            align: patch.align.or_else(|| self.align.clone()),
            valign: patch.valign.or_else(|| self.valign.clone()),
            border: patch.border.or(self.border),
            text_wrap: patch.text_wrap.or(self.text_wrap),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReadOptions

/// Where the timetable grid sits inside the worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxReadOptions {
    /// Sheet to read; the first sheet when `None`.
    pub sheet_name: Option<String>,
    /// Title-block rows dropped above the grid.
    pub n_rows_title_skipped: usize,
    /// Leading columns dropped before the grid.
    pub n_cols_index_skipped: usize,
}

impl Default for SpecXlsxReadOptions {
    fn default() -> Self {
        Self {
            sheet_name: None,
            n_rows_title_skipped: N_ROWS_TITLE_SKIPPED,
            n_cols_index_skipped: N_COLS_INDEX_SKIPPED,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LetterSpecification

/// Parameters printed in every convocation letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConvocationLetter {
    /// Exam session label (e.g. `Normale`, `Rattrapage`).
    pub session: String,
    /// Semester label (e.g. `Printemps`, `Automne`).
    pub period: String,
    /// Academic year label (`20XX/20YY`).
    pub academic_year: String,
    /// Place printed before the issue date.
    pub place: String,
    /// Closing signatory.
    pub signatory: String,
    /// Issue date.
    pub date_issued: NaiveDate,
    /// Image centered above the addressee line (png, jpeg, gif or bmp).
    pub path_logo: Option<PathBuf>,
}

impl Default for SpecConvocationLetter {
    fn default() -> Self {
        Self {
            session: C_SESSION_DEFAULT.to_string(),
            period: C_PERIOD_DEFAULT.to_string(),
            academic_year: C_ACADEMIC_YEAR_DEFAULT.to_string(),
            place: C_PLACE_DEFAULT.to_string(),
            signatory: C_SIGNATORY_DEFAULT.to_string(),
            date_issued: Local::now().date_naive(),
            path_logo: None,
        }
    }
}

impl SpecConvocationLetter {
    /// Default workbook file name, `invitations_profs_YYYY_MM_DD.xlsx`.
    pub fn derive_file_name(&self) -> String {
        format!(
            "{C_FILE_STEM_CONVOCATIONS}_{}.xlsx",
            self.date_issued.format(C_FMT_DATE_FILE)
        )
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// One worksheet emitted by a write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetEntry {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Logical source of the sheet (professor name or requested name).
    pub source: String,
    /// Rows written.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
}

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheets produced by the write call.
    pub sheets: Vec<SpecSheetEntry>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised while reading or writing spreadsheet files.
#[derive(Debug)]
pub enum XlsxIoError {
    /// Workbook could not be opened.
    Open { path: String, message: String },
    /// Requested sheet does not exist.
    SheetNotFound {
        sheet_name: String,
        sheets_available: Vec<String>,
    },
    /// Workbook has no worksheet.
    NoSheets { path: String },
    /// Worksheet range could not be read.
    Read { sheet_name: String, message: String },
    /// DataFrame or IPC conversion failure.
    DataFrame(String),
    /// Workbook write failure.
    Write(String),
    /// Write attempted after `close()`.
    Closed,
    /// Grid normalization/extraction failure.
    Schedule(ScheduleError),
}

impl fmt::Display for XlsxIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, message } => write!(f, "Failed to open workbook {path}: {message}"),
            Self::SheetNotFound {
                sheet_name,
                sheets_available,
            } => write!(
                f,
                "Sheet not found: {sheet_name:?} (available: {sheets_available:?})"
            ),
            Self::NoSheets { path } => write!(f, "Workbook has no sheets: {path}"),
            Self::Read {
                sheet_name,
                message,
            } => write!(f, "Failed to read sheet {sheet_name:?}: {message}"),
            Self::DataFrame(msg) => write!(f, "DataFrame conversion failed: {msg}"),
            Self::Write(msg) => write!(f, "{msg}"),
            Self::Closed => write!(f, "Cannot write after close()."),
            Self::Schedule(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for XlsxIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schedule(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ScheduleError> for XlsxIoError {
    fn from(err: ScheduleError) -> Self {
        Self::Schedule(err)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_format_overlay_prefers_patch() {
        let base = SpecCellFormat {
            font_name: Some("Arial".to_string()),
            bold: Some(false),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        });
        assert_eq!(merged.font_name.as_deref(), Some("Arial"));
        assert_eq!(merged.bold, Some(true));
    }

    #[test]
    fn letter_file_name_uses_issue_date() {
        let letter = SpecConvocationLetter {
            date_issued: NaiveDate::from_ymd_opt(2024, 6, 3).expect("date"),
            ..Default::default()
        };
        assert_eq!(letter.derive_file_name(), "invitations_profs_2024_06_03.xlsx");
        assert_eq!(letter.session, "Normale");
    }

    #[test]
    fn schedule_error_converts_and_keeps_source() {
        let err: XlsxIoError = ScheduleError::MalformedInput("short".to_string()).into();
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "Malformed timetable grid: short");
    }
}
