//! Workbook reader: one worksheet to a [`RawGrid`].

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use convokit_schedule::{EnumCellValue, RawGrid};
use tracing::{debug, info};

use crate::spec::{SpecXlsxReadOptions, XlsxIoError};
use crate::util::convert_data_to_cell_value;

/// Read the timetable grid of one worksheet (xlsx, xls, xlsb or ods).
///
/// Cells are addressed from A1, so blank leading rows/columns count toward the
/// skipped title block and index column.
pub fn read_raw_grid(
    path_file_in: &Path,
    options: &SpecXlsxReadOptions,
) -> Result<RawGrid, XlsxIoError> {
    let c_path = path_file_in.to_string_lossy().to_string();
    let mut workbook = open_workbook_auto(path_file_in).map_err(|err| XlsxIoError::Open {
        path: c_path.clone(),
        message: err.to_string(),
    })?;

    let l_sheet_names = workbook.sheet_names();
    let sheet_name = match &options.sheet_name {
        Some(name) => {
            if !l_sheet_names.iter().any(|n| n == name) {
                return Err(XlsxIoError::SheetNotFound {
                    sheet_name: name.clone(),
                    sheets_available: l_sheet_names,
                });
            }
            name.clone()
        }
        None => l_sheet_names
            .first()
            .cloned()
            .ok_or(XlsxIoError::NoSheets { path: c_path })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| XlsxIoError::Read {
            sheet_name: sheet_name.clone(),
            message: err.to_string(),
        })?;

    let grid = derive_raw_grid_from_range(
        &range,
        options.n_rows_title_skipped,
        options.n_cols_index_skipped,
    )?;
    info!(
        sheet = %sheet_name,
        rows = grid.n_rows(),
        cols = grid.n_cols(),
        "timetable grid read"
    );
    Ok(grid)
}

/// Build a grid from a calamine range, dropping the first `n_rows_skipped` rows
/// and `n_cols_skipped` columns (absolute sheet positions).
pub fn derive_raw_grid_from_range(
    range: &Range<Data>,
    n_rows_skipped: usize,
    n_cols_skipped: usize,
) -> Result<RawGrid, XlsxIoError> {
    let Some((n_row_end, n_col_end)) = range.end() else {
        debug!("worksheet is empty");
        return Ok(RawGrid::default());
    };
    let n_rows_sheet = n_row_end as usize + 1;
    let n_cols_sheet = n_col_end as usize + 1;

    let l_rows: Vec<Vec<EnumCellValue>> = (n_rows_skipped..n_rows_sheet)
        .map(|n_row| {
            (n_cols_skipped..n_cols_sheet)
                .map(|n_col| {
                    range
                        .get_value((n_row as u32, n_col as u32))
                        .map(convert_data_to_cell_value)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    debug!(
        rows_skipped = n_rows_skipped,
        cols_skipped = n_cols_skipped,
        "sheet range converted"
    );
    Ok(RawGrid::new(l_rows)?)
}
