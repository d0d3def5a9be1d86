//! Timetable layout constants.

/// Header row carrying the exam date of each session column.
pub const N_ROW_DATE: usize = 0;
/// Header row carrying the exam time of each session column.
pub const N_ROW_TIME: usize = 1;
/// Header row carrying the academic level of each session column.
pub const N_ROW_LEVEL: usize = 3;
/// Header row carrying the subject of each session column.
pub const N_ROW_SUBJECT: usize = 4;
/// First body row (professor x session grid).
pub const N_ROW_BODY_START: usize = 6;
/// Column holding professor names in the body.
pub const N_COL_PROFESSOR: usize = 0;
/// Trailing columns that carry per-professor metadata, not sessions.
pub const N_COLS_TRAILING_RESERVED: usize = 2;

/// Presence sentinel used by `EnumMarkerPolicy::Presence` when none is given.
pub const C_MARKER_PRESENCE_DEFAULT: &str = "*";
/// Cell texts that explicitly mean "no assignment".
pub const TUP_TOKENS_MISSING: [&str; 4] = ["N/A", "NA", "n/a", "-"];

/// Canonical date rendering.
pub const C_FMT_DATE: &str = "%Y-%m-%d";
/// Canonical time rendering.
pub const C_FMT_TIME: &str = "%H:%M";
/// Canonical date-time rendering (non-midnight).
pub const C_FMT_DATETIME: &str = "%Y-%m-%d %H:%M";

/// Largest magnitude rendered as an integer when a number has no fraction.
pub const N_NUMBER_INTEGRAL_TEXT_MAX: f64 = 1e15;

