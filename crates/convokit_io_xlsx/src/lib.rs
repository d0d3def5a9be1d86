//! `convokit_io_xlsx` v1:
//! Spreadsheet IO around the schedule extraction kernel.
//!
//! Module layout:
//! - `conf`   : Excel limits, letter boilerplate and format presets
//! - `spec`   : formats, read options, letter parameters, reports and errors
//! - `util`   : pure helper functions (cell conversion, sheet names, widths)
//! - `reader` : calamine worksheet reader
//! - `frame`  : Polars DataFrame / IPC bridge
//! - `writer` : rust_xlsxwriter letter and audit writer
pub mod conf;
pub mod frame;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

#[cfg(test)]
mod testing;

pub use conf::{
    N_COLS_INDEX_SKIPPED, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_ROWS_TITLE_SKIPPED, TUP_EXCEL_ILLEGAL,
};
pub use frame::{
    TUP_SCHEDULE_COLUMNS, convert_schedule_to_dataframe, derive_raw_grid_from_dataframe,
    read_raw_grid_from_ipc_bytes, write_schedule_ipc_bytes,
};
pub use reader::{derive_raw_grid_from_range, read_raw_grid};
pub use spec::{
    SpecCellFormat, SpecConvocationLetter, SpecSheetEntry, SpecXlsxReadOptions, SpecXlsxReport,
    XlsxIoError,
};
pub use util::{
    convert_data_to_cell_value, convert_excel_datetime_to_cell_value, derive_unique_sheet_name,
    sanitize_sheet_name,
};
pub use writer::XlsxWriter;
