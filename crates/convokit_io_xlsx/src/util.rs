//! Stateless helper utilities used by the reader and writer kernels.

use std::collections::BTreeSet;

use calamine::{Data, ExcelDateTime};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use convokit_schedule::EnumCellValue;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};

const N_SECS_PER_DAY: i64 = 86_400;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert one calamine cell into a grid cell.
///
/// Serial date-times become chrono values via calamine. Error cells keep
/// their Excel error text.
pub fn convert_data_to_cell_value(data: &Data) -> EnumCellValue {
    match data {
        Data::Empty => EnumCellValue::Empty,
        Data::String(s) => EnumCellValue::from_text(s),
        Data::Float(n) => EnumCellValue::Number(*n),
        Data::Int(n) => EnumCellValue::Number(*n as f64),
        Data::Bool(b) => EnumCellValue::Bool(*b),
        Data::Error(err) => EnumCellValue::Text(err.to_string()),
        Data::DateTime(dt) => convert_excel_datetime_to_cell_value(dt),
        Data::DateTimeIso(s) => convert_iso_text_to_cell_value(s),
        Data::DurationIso(s) => EnumCellValue::from_text(s),
    }
}

/// Convert a calamine date-time cell to a date, time or date-time cell.
///
/// Calendar conversion is delegated to calamine, which honours the workbook's
/// 1900/1904 date system. Serials below one day are times of day, whole days are
/// dates. Durations under one day become times; longer ones render as `H:MM`.
pub fn convert_excel_datetime_to_cell_value(dt: &ExcelDateTime) -> EnumCellValue {
    if dt.is_duration() {
        return match dt.as_duration() {
            Some(duration) => convert_duration_to_cell_value(duration),
            None => EnumCellValue::Number(dt.as_f64()),
        };
    }

    let Some(datetime) = dt.as_datetime() else {
        return EnumCellValue::Number(dt.as_f64());
    };
    let time = datetime.time();
    if dt.as_f64() < 1.0 {
        EnumCellValue::Time(time)
    } else if time == NaiveTime::MIN {
        EnumCellValue::Date(datetime.date())
    } else {
        EnumCellValue::DateTime(datetime)
    }
}

fn convert_duration_to_cell_value(duration: TimeDelta) -> EnumCellValue {
    let n_secs_total = duration.num_seconds();
    if (0..N_SECS_PER_DAY).contains(&n_secs_total)
        && let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt(n_secs_total as u32, 0)
    {
        return EnumCellValue::Time(time);
    }
    let n_mins_total = duration.num_minutes();
    let c_sign = if n_mins_total < 0 { "-" } else { "" };
    let n_mins_abs = n_mins_total.abs();
    EnumCellValue::Text(format!("{c_sign}{}:{:02}", n_mins_abs / 60, n_mins_abs % 60))
}

/// Parse ISO-8601 date/time text (as produced for ODS cells), falling back to text.
pub fn convert_iso_text_to_cell_value(text: &str) -> EnumCellValue {
    let c_text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(c_text, "%Y-%m-%dT%H:%M:%S%.f") {
        return EnumCellValue::DateTime(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(c_text, "%Y-%m-%d") {
        return EnumCellValue::Date(date);
    }
    if let Ok(time) = NaiveTime::parse_from_str(c_text, "%H:%M:%S%.f") {
        return EnumCellValue::Time(time);
    }
    EnumCellValue::from_text(text)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Return `name` or the first free `name__N` variant, registering it in `set_names`.
///
/// Names compare case-insensitively, as Excel does.
pub fn derive_unique_sheet_name(name: &str, set_names: &mut BTreeSet<String>) -> String {
    if set_names.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 4))
        .collect();

    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if set_names.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Layout

/// Estimate displayed width units for a text (non-ASCII counts wider).
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

/// Column width fitting the widest text, clamped to `(min, max)` plus padding.
pub fn derive_column_width<'a, I>(texts: I, bounds: (usize, usize)) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    let (n_min, n_max) = bounds;
    let n_widest = texts
        .into_iter()
        .map(estimate_unicode_string_width)
        .max()
        .unwrap_or(0);
    (n_widest + 2).clamp(n_min, n_max) as f64
}

pub(crate) fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
