//! Command-line arguments and their mapping onto library options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use convokit_io_xlsx::conf::{
    C_ACADEMIC_YEAR_DEFAULT, C_PERIOD_DEFAULT, C_PLACE_DEFAULT, C_SESSION_DEFAULT,
    C_SIGNATORY_DEFAULT, N_COLS_INDEX_SKIPPED, N_ROWS_TITLE_SKIPPED,
};
use convokit_io_xlsx::{SpecConvocationLetter, SpecXlsxReadOptions};
use convokit_schedule::{
    C_MARKER_PRESENCE_DEFAULT, EnumMarkerPolicy, N_COLS_TRAILING_RESERVED, SpecExtractOptions,
    SpecGridLayout,
};

/// Marker policy selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnumPolicyArg {
    /// A sentinel cell (default `*`) marks an assignment.
    Presence,
    /// A cell ending in a digit marks an assignment and names the room.
    Location,
}

#[derive(Debug, Parser)]
#[command(
    name = "convokit",
    version,
    about = "Extract exam-invigilation assignments from a timetable workbook and write \
             convocation letters"
)]
pub struct Args {
    /// Timetable workbook (xlsx, xls, xlsb or ods).
    #[arg(short, long)]
    pub input: PathBuf,
    /// Worksheet name; the first sheet when omitted.
    #[arg(long)]
    pub sheet: Option<String>,
    /// How body cells mark an assignment.
    #[arg(long, value_enum, default_value_t = EnumPolicyArg::Location)]
    pub policy: EnumPolicyArg,
    /// Sentinel text for the presence policy.
    #[arg(long, default_value = C_MARKER_PRESENCE_DEFAULT)]
    pub sentinel: String,
    /// Title rows above the grid.
    #[arg(long, default_value_t = N_ROWS_TITLE_SKIPPED)]
    pub skip_rows: usize,
    /// Leading index columns before the grid.
    #[arg(long, default_value_t = N_COLS_INDEX_SKIPPED)]
    pub index_cols: usize,
    /// Trailing metadata columns excluded from the marker scan.
    #[arg(long, default_value_t = N_COLS_TRAILING_RESERVED)]
    pub trailing_cols: usize,
    /// Fail when a marker column has an empty date/time/level/subject header.
    #[arg(long)]
    pub strict: bool,

    /// Exam session label.
    #[arg(long, default_value = C_SESSION_DEFAULT)]
    pub session: String,
    /// Semester label.
    #[arg(long, default_value = C_PERIOD_DEFAULT)]
    pub period: String,
    /// Academic year label (20XX/20YY).
    #[arg(long, default_value = C_ACADEMIC_YEAR_DEFAULT)]
    pub academic_year: String,
    /// Place printed before the issue date.
    #[arg(long, default_value = C_PLACE_DEFAULT)]
    pub place: String,
    /// Closing signatory.
    #[arg(long, default_value = C_SIGNATORY_DEFAULT)]
    pub signatory: String,
    /// Issue date (YYYY-MM-DD); today when omitted.
    #[arg(long)]
    pub date_issued: Option<String>,
    /// Logo image placed above each letter.
    #[arg(long)]
    pub logo: Option<PathBuf>,

    /// Letters workbook; `invitations_profs_<date>.xlsx` when omitted.
    #[arg(long)]
    pub out_xlsx: Option<PathBuf>,
    /// Schedule and report as JSON.
    #[arg(long)]
    pub out_json: Option<PathBuf>,
    /// Normalized grid workbook for auditing the forward-fill.
    #[arg(long)]
    pub audit_out: Option<PathBuf>,
}

impl Args {
    pub fn derive_read_options(&self) -> SpecXlsxReadOptions {
        SpecXlsxReadOptions {
            sheet_name: self.sheet.clone(),
            n_rows_title_skipped: self.skip_rows,
            n_cols_index_skipped: self.index_cols,
        }
    }

    pub fn derive_extract_options(&self) -> SpecExtractOptions {
        let policy = match self.policy {
            EnumPolicyArg::Presence => EnumMarkerPolicy::Presence {
                sentinel: self.sentinel.clone(),
            },
            EnumPolicyArg::Location => EnumMarkerPolicy::LocationCoded,
        };
        SpecExtractOptions {
            layout: SpecGridLayout {
                n_cols_trailing_reserved: self.trailing_cols,
                ..SpecGridLayout::default()
            },
            policy,
            if_strict_headers: self.strict,
            ..SpecExtractOptions::default()
        }
    }

    pub fn derive_letter(&self) -> Result<SpecConvocationLetter> {
        let mut letter = SpecConvocationLetter {
            session: self.session.clone(),
            period: self.period.clone(),
            academic_year: self.academic_year.clone(),
            place: self.place.clone(),
            signatory: self.signatory.clone(),
            path_logo: self.logo.clone(),
            ..SpecConvocationLetter::default()
        };
        if let Some(c_date) = &self.date_issued {
            letter.date_issued = NaiveDate::parse_from_str(c_date, "%Y-%m-%d")
                .with_context(|| format!("invalid --date-issued {c_date:?}, expected YYYY-MM-DD"))?;
        }
        Ok(letter)
    }
}
