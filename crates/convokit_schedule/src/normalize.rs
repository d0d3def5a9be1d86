//! Header normalization: forward-fill of merged-cell regions.

use tracing::debug;

use crate::spec::{EnumCellValue, EnumHeaderField, RawGrid, ScheduleError, SpecGridLayout};
use crate::util::{fill_forward_cells, render_cell_text, validate_grid_layout};

/// Timetable grid after forward-fill, plus the layout used to fill it.
///
/// Header rows stay addressable by column index; [`Self::body`] exposes the
/// professor x session rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGrid {
    grid: RawGrid,
    layout: SpecGridLayout,
}

impl NormalizedGrid {
    /// Full normalized grid, header rows included.
    pub fn grid(&self) -> &RawGrid {
        &self.grid
    }

    /// Layout the grid was normalized with.
    pub fn layout(&self) -> &SpecGridLayout {
        &self.layout
    }

    /// Number of rows in the full grid.
    pub fn n_rows(&self) -> usize {
        self.grid.n_rows()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.grid.n_cols()
    }

    /// Header row holding `field`.
    pub fn header_row(&self, field: EnumHeaderField) -> &[EnumCellValue] {
        // Layout was validated against the grid at construction.
        &self.grid.rows()[self.layout.row_of(field)]
    }

    /// Canonical text of `field` at `col_idx` (empty when out of range).
    pub fn header_text(&self, field: EnumHeaderField, col_idx: usize) -> String {
        self.header_row(field)
            .get(col_idx)
            .map(render_cell_text)
            .unwrap_or_default()
    }

    /// Body rows, from the first post-header row onward.
    pub fn body(&self) -> &[Vec<EnumCellValue>] {
        &self.grid.rows()[self.layout.row_body_start..]
    }

    /// Canonical professor name of body row `body_row_idx`.
    pub fn professor_text(&self, body_row_idx: usize) -> String {
        self.body()
            .get(body_row_idx)
            .and_then(|row| row.get(self.layout.col_professor))
            .map(render_cell_text)
            .unwrap_or_default()
    }

    /// Whole grid rendered to canonical text.
    pub fn to_text_rows(&self) -> Vec<Vec<String>> {
        self.grid
            .rows()
            .iter()
            .map(|row| row.iter().map(render_cell_text).collect())
            .collect()
    }
}

/// Forward-fill the date and time header rows and the professor column.
///
/// The input grid is not touched; the result owns a fresh copy. Leading blanks in
/// each line stay blank.
pub fn normalize_grid(
    raw_grid: &RawGrid,
    layout: &SpecGridLayout,
) -> Result<NormalizedGrid, ScheduleError> {
    validate_grid_layout(layout, raw_grid.n_rows(), raw_grid.n_cols())?;

    let mut l_rows = raw_grid.clone().into_rows();

    for field in [EnumHeaderField::Date, EnumHeaderField::Time] {
        let n_row_idx = layout.row_of(field);
        let n_filled = fill_forward_cells(l_rows[n_row_idx].iter_mut());
        debug!(row = n_row_idx, filled = n_filled, "forward-filled {field} header row");
    }

    let n_col_professor = layout.col_professor;
    let n_filled = fill_forward_cells(
        l_rows[layout.row_body_start..]
            .iter_mut()
            .map(|row| &mut row[n_col_professor]),
    );
    debug!(
        col = n_col_professor,
        filled = n_filled,
        "forward-filled professor column"
    );

    Ok(NormalizedGrid {
        grid: RawGrid::new(l_rows)?,
        layout: layout.clone(),
    })
}
