//! Stateless helpers shared by the normalizer and the extractor.

use chrono::Timelike;

use crate::conf::{C_FMT_DATE, C_FMT_DATETIME, C_FMT_TIME, N_NUMBER_INTEGRAL_TEXT_MAX};
use crate::spec::{
    EnumCellClass, EnumCellValue, EnumHeaderField, MarkerPolicy, ScheduleError, SpecGridLayout,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellTextRendering

/// Render a cell to its canonical text.
///
/// Dates render as `YYYY-MM-DD`, times as `HH:MM`, integral numbers without a
/// fraction and text trimmed.
pub fn render_cell_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::Empty => String::new(),
        EnumCellValue::Text(s) => s.trim().to_string(),
        EnumCellValue::Number(n) => render_number_text(*n),
        EnumCellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        EnumCellValue::Date(d) => d.format(C_FMT_DATE).to_string(),
        EnumCellValue::Time(t) => t.format(C_FMT_TIME).to_string(),
        EnumCellValue::DateTime(dt) => {
            let t = dt.time();
            if t.hour() == 0 && t.minute() == 0 && t.second() == 0 {
                dt.date().format(C_FMT_DATE).to_string()
            } else {
                dt.format(C_FMT_DATETIME).to_string()
            }
        }
    }
}

fn render_number_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < N_NUMBER_INTEGRAL_TEXT_MAX {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ForwardFill

/// Forward-fill a copy of `line`.
///
/// Blank cells take the nearest preceding non-blank value; leading blanks stay
/// blank.
pub fn fill_forward(line: &[EnumCellValue]) -> Vec<EnumCellValue> {
    let mut l_filled = line.to_vec();
    fill_forward_cells(l_filled.iter_mut());
    l_filled
}

/// Forward-fill cells in iteration order, returning the number of cells filled.
pub fn fill_forward_cells<'a, I>(cells: I) -> usize
where
    I: IntoIterator<Item = &'a mut EnumCellValue>,
{
    let mut value_last: Option<EnumCellValue> = None;
    let mut n_filled = 0usize;
    for cell in cells {
        if cell.is_blank() {
            if let Some(value) = &value_last {
                *cell = value.clone();
                n_filled += 1;
            }
        } else {
            value_last = Some(cell.clone());
        }
    }
    n_filled
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Validation

/// Check that `layout` addresses a grid of `n_rows` x `n_cols`.
pub fn validate_grid_layout(
    layout: &SpecGridLayout,
    n_rows: usize,
    n_cols: usize,
) -> Result<(), ScheduleError> {
    if n_rows < layout.n_rows_header() {
        return Err(ScheduleError::MalformedInput(format!(
            "grid has {n_rows} rows; expected at least {} header/metadata rows.",
            layout.n_rows_header()
        )));
    }

    for field in EnumHeaderField::ALL {
        let n_row_idx = layout.row_of(field);
        if n_row_idx >= layout.row_body_start {
            return Err(ScheduleError::MalformedInput(format!(
                "{field} row {n_row_idx} is not above the body start row {}.",
                layout.row_body_start
            )));
        }
    }

    if layout.col_professor >= n_cols {
        return Err(ScheduleError::MalformedInput(format!(
            "professor column {} is outside a grid of {n_cols} columns.",
            layout.col_professor
        )));
    }

    if layout.derive_scan_columns(n_cols).is_empty() {
        return Err(ScheduleError::MalformedInput(format!(
            "zero usable session columns (width={n_cols}, trailing reserved={}).",
            layout.n_cols_trailing_reserved
        )));
    }

    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellClassification

/// Classify one body cell: blank, explicit missing token, then `policy`.
pub fn classify_cell<P>(
    value: &EnumCellValue,
    policy: &P,
    tokens_missing: &[String],
) -> EnumCellClass
where
    P: MarkerPolicy + ?Sized,
{
    if value.is_blank() {
        return EnumCellClass::Blank;
    }
    let c_text = render_cell_text(value);
    if tokens_missing.iter().any(|token| token.trim() == c_text) {
        return EnumCellClass::Missing;
    }
    policy.classify_text(&c_text)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;

    use super::*;
    use crate::spec::EnumMarkerPolicy;

    fn text(s: &str) -> EnumCellValue {
        EnumCellValue::from_text(s)
    }

    #[test]
    fn fill_forward_keeps_leading_gap_and_fills_rest() {
        let line = vec![text(""), text("2024-06-10"), text(""), text("2024-06-11")];
        let l_filled: Vec<String> = fill_forward(&line).iter().map(render_cell_text).collect();
        assert_eq!(l_filled, vec!["", "2024-06-10", "2024-06-10", "2024-06-11"]);
    }

    #[test]
    fn fill_forward_treats_whitespace_as_blank() {
        let line = vec![text("A"), EnumCellValue::Text("  ".to_string()), text("B")];
        assert_eq!(fill_forward(&line), vec![text("A"), text("A"), text("B")]);
    }

    #[test]
    fn fill_forward_cells_counts_filled() {
        let mut line = vec![text(""), text("x"), text(""), text("")];
        assert_eq!(fill_forward_cells(line.iter_mut()), 2);
    }

    #[test]
    fn render_typed_values_canonically() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 10).expect("date");
        let t = NaiveTime::from_hms_opt(8, 30, 0).expect("time");
        assert_eq!(render_cell_text(&EnumCellValue::Date(d)), "2024-06-10");
        assert_eq!(render_cell_text(&EnumCellValue::Time(t)), "08:30");
        assert_eq!(
            render_cell_text(&EnumCellValue::DateTime(d.and_hms_opt(0, 0, 0).expect("dt"))),
            "2024-06-10"
        );
        assert_eq!(
            render_cell_text(&EnumCellValue::DateTime(d.and_time(t))),
            "2024-06-10 08:30"
        );
        assert_eq!(render_cell_text(&EnumCellValue::Number(12.0)), "12");
        assert_eq!(render_cell_text(&EnumCellValue::Number(1.5)), "1.5");
        assert_eq!(render_cell_text(&text("  S1 ")), "S1");
    }

    #[test]
    fn classify_cell_checks_missing_tokens_before_policy() {
        let tokens = vec!["N/A".to_string()];
        let policy = EnumMarkerPolicy::LocationCoded;
        assert_eq!(
            classify_cell(&text(" N/A "), &policy, &tokens),
            EnumCellClass::Missing
        );
        assert_eq!(classify_cell(&text(" "), &policy, &tokens), EnumCellClass::Blank);
        assert_eq!(
            classify_cell(&EnumCellValue::Number(12.0), &policy, &tokens),
            EnumCellClass::Marker {
                location: Some("12".to_string())
            }
        );
    }

    #[test]
    fn validate_layout_rejects_short_and_narrow_grids() {
        let layout = SpecGridLayout::default();
        assert!(matches!(
            validate_grid_layout(&layout, 5, 10),
            Err(ScheduleError::MalformedInput(_))
        ));
        assert!(matches!(
            validate_grid_layout(&layout, 6, 3),
            Err(ScheduleError::MalformedInput(_))
        ));
        assert!(validate_grid_layout(&layout, 6, 4).is_ok());
    }

    fn arb_line() -> impl Strategy<Value = Vec<EnumCellValue>> {
        prop::collection::vec(
            prop_oneof![
                Just(EnumCellValue::Empty),
                "[a-c]{1,2}".prop_map(EnumCellValue::Text),
            ],
            0..16,
        )
    }

    proptest! {
        #[test]
        fn fill_forward_is_idempotent(line in arb_line()) {
            let l_once = fill_forward(&line);
            prop_assert_eq!(fill_forward(&l_once), l_once);
        }

        #[test]
        fn fill_forward_never_fills_leading_gap(line in arb_line()) {
            let l_filled = fill_forward(&line);
            let n_first = line.iter().position(|c| !c.is_blank()).unwrap_or(line.len());
            prop_assert!(l_filled[..n_first].iter().all(EnumCellValue::is_blank));
            prop_assert!(l_filled[n_first..].iter().all(|c| !c.is_blank()));
        }
    }
}
