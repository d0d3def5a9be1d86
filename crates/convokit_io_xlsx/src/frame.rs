//! Polars DataFrame bridge for grids and schedules (IPC transport).

use std::io::Cursor;

use convokit_schedule::{EnumCellValue, RawGrid, ScheduleIndex};
use polars::prelude::{AnyValue, Column, DataFrame, IpcReader, IpcWriter, SerReader, SerWriter};

use crate::spec::XlsxIoError;

/// Long-table column names of a schedule frame.
pub const TUP_SCHEDULE_COLUMNS: [&str; 6] =
    ["professor", "subject", "date", "time", "level", "location"];

/// Treat every frame row as a grid row and every column as a grid column.
///
/// Column names are ignored; nulls become empty cells.
pub fn derive_raw_grid_from_dataframe(df: &DataFrame) -> Result<RawGrid, XlsxIoError> {
    let n_height = df.height();
    let l_cols = df.get_columns();

    let mut l_rows = vec![Vec::with_capacity(l_cols.len()); n_height];
    for col in l_cols {
        for (n_row, row) in l_rows.iter_mut().enumerate() {
            let value = col.get(n_row).map_err(|err| {
                XlsxIoError::DataFrame(format!("Failed to read cell value: {err}"))
            })?;
            row.push(derive_cell_value_from_any_value(value));
        }
    }

    Ok(RawGrid::new(l_rows)?)
}

/// Read a grid from Polars IPC bytes.
pub fn read_raw_grid_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<RawGrid, XlsxIoError> {
    let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
    derive_raw_grid_from_dataframe(&df)
}

/// Flatten a schedule into one row per assignment, professors in encounter order.
pub fn convert_schedule_to_dataframe(schedule: &ScheduleIndex) -> Result<DataFrame, XlsxIoError> {
    let n_records = schedule.count_records();
    let mut l_professor = Vec::with_capacity(n_records);
    let mut l_subject = Vec::with_capacity(n_records);
    let mut l_date = Vec::with_capacity(n_records);
    let mut l_time = Vec::with_capacity(n_records);
    let mut l_level = Vec::with_capacity(n_records);
    let mut l_location: Vec<Option<String>> = Vec::with_capacity(n_records);

    for (professor, records) in schedule.iter() {
        for record in records {
            l_professor.push(professor.to_string());
            l_subject.push(record.subject.clone());
            l_date.push(record.date.clone());
            l_time.push(record.time.clone());
            l_level.push(record.level.clone());
            l_location.push(record.location.clone());
        }
    }

    let [c_professor, c_subject, c_date, c_time, c_level, c_location] = TUP_SCHEDULE_COLUMNS;
    DataFrame::new(vec![
        Column::new(c_professor.into(), l_professor),
        Column::new(c_subject.into(), l_subject),
        Column::new(c_date.into(), l_date),
        Column::new(c_time.into(), l_time),
        Column::new(c_level.into(), l_level),
        Column::new(c_location.into(), l_location),
    ])
    .map_err(|err| XlsxIoError::DataFrame(format!("Failed to build schedule frame: {err}")))
}

/// Serialize a schedule frame to Polars IPC bytes.
pub fn write_schedule_ipc_bytes(schedule: &ScheduleIndex) -> Result<Vec<u8>, XlsxIoError> {
    let mut df = convert_schedule_to_dataframe(schedule)?;
    let mut v_buf = Vec::new();
    IpcWriter::new(&mut v_buf)
        .finish(&mut df)
        .map_err(|err| XlsxIoError::DataFrame(format!("Failed to write IPC bytes: {err}")))?;
    Ok(v_buf)
}

pub(crate) fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, XlsxIoError> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| XlsxIoError::DataFrame(format!("Failed to read IPC DataFrame bytes: {err}")))
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::Empty,
        AnyValue::String(val) => EnumCellValue::from_text(val),
        AnyValue::StringOwned(val) => EnumCellValue::from_text(val.as_str()),
        AnyValue::Boolean(val) => EnumCellValue::Bool(val),
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::from_text(value.to_string()),
    }
}
