//! XLSX writer kernel for convocation letters and normalized-grid audits.

use std::collections::BTreeSet;
use std::path::PathBuf;

use convokit_schedule::{
    AssignmentRecord, EnumCellValue, NormalizedGrid, ScheduleIndex, render_cell_text,
};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet, XlsxError};
use tracing::{debug, info};

use crate::conf::{
    C_FMT_DATE_ISSUED, C_LETTER_ADDRESSEE_PREFIX, C_LETTER_GREETING, C_LETTER_SUBJECT,
    C_LETTER_TABLE_HEADER_LOCATION, C_LETTER_THANKS, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_AUDIT_COL_WIDTH_BOUNDS, TUP_LETTER_COL_WIDTHS, TUP_LETTER_TABLE_HEADER,
    derive_default_xlsx_formats, derive_letter_body_text,
};
use crate::spec::{
    SpecCellFormat, SpecConvocationLetter, SpecSheetEntry, SpecXlsxReport, XlsxIoError,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_column_width, derive_unique_sheet_name,
    sanitize_sheet_name,
};

const N_ROW_HEIGHT_LETTER_BODY: f64 = 48.0;
/// Tallest row Excel accepts, in pixels (409 pt).
const N_ROW_HEIGHT_PX_MAX: f64 = 545.0;

/// Resolved `rust_xlsxwriter` formats shared by every sheet of one writer.
struct SpecResolvedFormats {
    text: Format,
    paragraph: Format,
    right: Format,
    table: Format,
    header: Format,
}

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmts: SpecResolvedFormats,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path with the default format presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: PathBuf) -> Self {
        let dict_fmt = derive_default_xlsx_formats();
        let derive_format = |key: &str| {
            derive_rust_xlsx_format(&dict_fmt.get(key).cloned().unwrap_or_default())
        };

        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmts: SpecResolvedFormats {
                text: derive_format("text"),
                paragraph: derive_format("paragraph"),
                right: derive_format("right"),
                table: derive_format("table"),
                header: derive_format("header"),
            },
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return immutable snapshot of per-call write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(|err| XlsxIoError::Write(derive_xlsx_error_text(err)))?;
        self.if_closed = true;
        info!(file = %self.file_out(), "workbook saved");
        Ok(())
    }

    /// Write the normalized grid to one sheet, header rows in header format.
    ///
    /// Numbers and booleans keep their type; every other cell is written as its
    /// canonical text.
    pub fn write_audit_grid(
        &mut self,
        normalized: &NormalizedGrid,
        sheet_name: &str,
    ) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }
        self.write_audit_sheet(normalized, sheet_name)
            .map_err(XlsxIoError::Write)
    }

    /// Write one convocation letter sheet per professor, in schedule order.
    pub fn write_convocations(
        &mut self,
        schedule: &ScheduleIndex,
        letter: &SpecConvocationLetter,
    ) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }
        self.write_letter_sheets(schedule, letter)
            .map_err(XlsxIoError::Write)
    }

    fn write_audit_sheet(
        &mut self,
        normalized: &NormalizedGrid,
        sheet_name: &str,
    ) -> Result<(), String> {
        let n_rows = normalized.n_rows();
        let n_cols = normalized.n_cols();
        if n_rows > N_NROWS_EXCEL_MAX || n_cols > N_NCOLS_EXCEL_MAX {
            return Err(format!(
                "grid {n_rows}x{n_cols} exceeds Excel sheet limits \
                 {N_NROWS_EXCEL_MAX}x{N_NCOLS_EXCEL_MAX}."
            ));
        }

        let mut report = SpecXlsxReport::default();
        let sheet_name_unique = derive_unique_sheet_name(
            &sanitize_sheet_name(sheet_name, "_"),
            &mut self.set_sheet_names_existing,
        );
        if sheet_name_unique != sheet_name {
            report.warn(format!(
                "sheet name {sheet_name:?} written as {sheet_name_unique:?}"
            ));
        }

        let n_row_body_start = normalized.layout().row_body_start;
        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&sheet_name_unique)
            .map_err(derive_xlsx_error_text)?;

        let mut l_texts_by_col: Vec<Vec<String>> = vec![Vec::with_capacity(n_rows); n_cols];
        for (n_row, row) in normalized.grid().rows().iter().enumerate() {
            let fmt = if n_row < n_row_body_start {
                &self.fmts.header
            } else {
                &self.fmts.text
            };
            for (n_col, value) in row.iter().enumerate() {
                write_cell_value(worksheet, n_row, n_col, value, fmt)?;
                l_texts_by_col[n_col].push(render_cell_text(value));
            }
        }

        for (n_col, l_texts) in l_texts_by_col.iter().enumerate() {
            let n_width =
                derive_column_width(l_texts.iter().map(String::as_str), TUP_AUDIT_COL_WIDTH_BOUNDS);
            worksheet
                .set_column_width(cast_col_num(n_col)?, n_width)
                .map_err(derive_xlsx_error_text)?;
        }
        worksheet
            .set_freeze_panes(
                cast_row_num(usize::min(n_row_body_start, n_rows))?,
                cast_col_num(usize::min(normalized.layout().col_professor + 1, n_cols))?,
            )
            .map_err(derive_xlsx_error_text)?;

        report.sheets.push(SpecSheetEntry {
            sheet_name: sheet_name_unique,
            source: sheet_name.to_string(),
            n_rows,
            n_cols,
        });
        debug!(rows = n_rows, cols = n_cols, "audit grid written");
        self.l_reports.push(report);
        Ok(())
    }

    fn write_letter_sheets(
        &mut self,
        schedule: &ScheduleIndex,
        letter: &SpecConvocationLetter,
    ) -> Result<(), String> {
        let mut report = SpecXlsxReport::default();
        if schedule.is_empty() {
            report.warn("schedule has no assignments; no letter sheet written");
        }

        let if_with_location = schedule.has_locations();
        let mut l_header: Vec<&str> = TUP_LETTER_TABLE_HEADER.to_vec();
        if if_with_location {
            l_header.push(C_LETTER_TABLE_HEADER_LOCATION);
        }
        let n_cols = l_header.len();
        let c_body =
            derive_letter_body_text(&letter.session, &letter.period, &letter.academic_year);
        let image_logo = letter
            .path_logo
            .as_ref()
            .map(|path_logo| {
                Image::new(path_logo).map_err(|err| {
                    format!("logo {}: {}", path_logo.display(), derive_xlsx_error_text(err))
                })
            })
            .transpose()?;
        let c_place_date = format!(
            "{} le: {}",
            letter.place,
            letter.date_issued.format(C_FMT_DATE_ISSUED)
        );

        for (professor, records) in schedule.iter() {
            let sheet_name_unique = derive_unique_sheet_name(
                &sanitize_sheet_name(professor, "_"),
                &mut self.set_sheet_names_existing,
            );
            if sheet_name_unique != professor {
                report.warn(format!(
                    "professor {professor:?} written to sheet {sheet_name_unique:?}"
                ));
            }

            let worksheet = self.workbook.add_worksheet();
            worksheet
                .set_name(&sheet_name_unique)
                .map_err(derive_xlsx_error_text)?;
            for (n_col, n_width) in TUP_LETTER_COL_WIDTHS.iter().take(n_cols).enumerate() {
                worksheet
                    .set_column_width(cast_col_num(n_col)?, *n_width)
                    .map_err(derive_xlsx_error_text)?;
            }

            let mut n_row = 0usize;
            if let Some(image) = &image_logo {
                insert_logo(worksheet, image, n_cols)?;
                n_row += 2;
            }
            let c_addressee = format!("{C_LETTER_ADDRESSEE_PREFIX}{professor}");
            write_paragraph(worksheet, n_row, n_cols, &c_addressee, &self.fmts.text)?;
            n_row += 2;
            write_paragraph(worksheet, n_row, n_cols, C_LETTER_SUBJECT, &self.fmts.text)?;
            n_row += 1;
            write_paragraph(worksheet, n_row, n_cols, C_LETTER_GREETING, &self.fmts.text)?;
            n_row += 1;
            write_paragraph(worksheet, n_row, n_cols, &c_body, &self.fmts.paragraph)?;
            worksheet
                .set_row_height(cast_row_num(n_row)?, N_ROW_HEIGHT_LETTER_BODY)
                .map_err(derive_xlsx_error_text)?;
            n_row += 2;

            for (n_col, c_label) in l_header.iter().enumerate() {
                worksheet
                    .write_string_with_format(
                        cast_row_num(n_row)?,
                        cast_col_num(n_col)?,
                        *c_label,
                        &self.fmts.header,
                    )
                    .map_err(derive_xlsx_error_text)?;
            }
            n_row += 1;

            for record in records {
                write_record_row(worksheet, n_row, record, n_cols, &self.fmts.table)?;
                n_row += 1;
            }
            n_row += 1;

            write_paragraph(worksheet, n_row, n_cols, C_LETTER_THANKS, &self.fmts.text)?;
            n_row += 3;
            write_paragraph(worksheet, n_row, n_cols, &c_place_date, &self.fmts.right)?;
            n_row += 2;
            write_paragraph(worksheet, n_row, n_cols, &letter.signatory, &self.fmts.right)?;

            report.sheets.push(SpecSheetEntry {
                sheet_name: sheet_name_unique,
                source: professor.to_string(),
                n_rows: n_row + 1,
                n_cols,
            });
        }

        info!(
            letters = report.sheets.len(),
            with_location = if_with_location,
            "convocation letters written"
        );
        self.l_reports.push(report);
        Ok(())
    }
}

/// Center `image` over the first `n_cols` letter columns in row 0.
fn insert_logo(worksheet: &mut Worksheet, image: &Image, n_cols: usize) -> Result<(), String> {
    // Excel column width unit: 7 px per char plus 5 px padding.
    let n_width_px: f64 = TUP_LETTER_COL_WIDTHS
        .iter()
        .take(n_cols)
        .map(|n_width| n_width * 7.0 + 5.0)
        .sum();
    let n_offset_x = ((n_width_px - image.width()) / 2.0).max(0.0) as u32;
    let n_height_px = image.height().clamp(1.0, N_ROW_HEIGHT_PX_MAX) as u16;

    worksheet
        .set_row_height_pixels(0, n_height_px)
        .map_err(derive_xlsx_error_text)?;
    worksheet
        .insert_image_with_offset(0, 0, image, n_offset_x, 0)
        .map_err(derive_xlsx_error_text)?;
    Ok(())
}

fn write_paragraph(
    worksheet: &mut Worksheet,
    row_idx: usize,
    n_cols: usize,
    text: &str,
    format: &Format,
) -> Result<(), String> {
    let n_row = cast_row_num(row_idx)?;
    if n_cols > 1 {
        worksheet
            .merge_range(n_row, 0, n_row, cast_col_num(n_cols - 1)?, text, format)
            .map_err(derive_xlsx_error_text)?;
    } else {
        worksheet
            .write_string_with_format(n_row, 0, text, format)
            .map_err(derive_xlsx_error_text)?;
    }
    Ok(())
}

fn write_record_row(
    worksheet: &mut Worksheet,
    row_idx: usize,
    record: &AssignmentRecord,
    n_cols: usize,
    format: &Format,
) -> Result<(), String> {
    let l_values = [
        record.subject.as_str(),
        record.date.as_str(),
        record.time.as_str(),
        record.level.as_str(),
        record.location.as_deref().unwrap_or_default(),
    ];
    let n_row = cast_row_num(row_idx)?;
    for (n_col, c_value) in l_values.iter().take(n_cols).enumerate() {
        worksheet
            .write_string_with_format(n_row, cast_col_num(n_col)?, *c_value, format)
            .map_err(derive_xlsx_error_text)?;
    }
    Ok(())
}

fn write_cell_value(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::Empty => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) if val.is_finite() => {
            worksheet
                .write_number_with_format(n_row, n_col, *val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Bool(val) => {
            worksheet
                .write_boolean_with_format(n_row, n_col, *val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        _ => {
            worksheet
                .write_string_with_format(n_row, n_col, render_cell_text(value), format)
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    for val in [&spec.align, &spec.valign].into_iter().flatten() {
        if let Some(align) = derive_format_align(val) {
            format = format.set_align(align);
        }
    }

    if spec.border.unwrap_or(false) {
        format = format.set_border(FormatBorder::Thin);
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "vcenter" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use calamine::{Data, Reader, open_workbook_auto};
    use chrono::NaiveDate;
    use convokit_schedule::{RawGrid, SpecGridLayout, normalize_grid};

    use super::*;
    use crate::testing::{TestDir, V_PNG_1X1};

    fn record(subject: &str, location: Option<&str>) -> AssignmentRecord {
        AssignmentRecord {
            subject: subject.to_string(),
            date: "2024-06-10".to_string(),
            time: "08:30".to_string(),
            level: "S2".to_string(),
            location: location.map(ToString::to_string),
        }
    }

    fn letter() -> SpecConvocationLetter {
        SpecConvocationLetter {
            date_issued: NaiveDate::from_ymd_opt(2024, 6, 3).expect("date"),
            ..Default::default()
        }
    }

    fn read_cell(path: &Path, sheet_name: &str, pos: (u32, u32)) -> Option<String> {
        let mut workbook = open_workbook_auto(path).expect("open");
        let range = workbook.worksheet_range(sheet_name).expect("sheet");
        range.get_value(pos).map(|data| match data {
            Data::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    #[test]
    fn convocations_write_one_sheet_per_professor() {
        let tmp = TestDir::new();
        let path_out = tmp.path().join("letters.xlsx");

        let mut schedule = ScheduleIndex::new();
        schedule.push("Dr. A", record("Physics", None));
        schedule.push("Dr. B/C", record("Algebra", None));
        schedule.push("Dr. A", record("Analysis", None));

        let mut writer = XlsxWriter::new(path_out.clone());
        writer
            .write_convocations(&schedule, &letter())
            .expect("write");
        writer.close().expect("close");

        let l_reports = writer.report();
        assert_eq!(l_reports.len(), 1);
        let l_sheet_names: Vec<&str> = l_reports[0]
            .sheets
            .iter()
            .map(|s| s.sheet_name.as_str())
            .collect();
        assert_eq!(l_sheet_names, vec!["Dr. A", "Dr. B_C"]);
        assert_eq!(l_reports[0].sheets[0].n_cols, 4);
        assert_eq!(l_reports[0].warnings.len(), 1);

        assert_eq!(
            read_cell(&path_out, "Dr. A", (0, 0)).as_deref(),
            Some("A Mme/ Mr: Dr. A")
        );
        assert_eq!(read_cell(&path_out, "Dr. A", (6, 0)).as_deref(), Some("Module"));
        assert_eq!(read_cell(&path_out, "Dr. A", (8, 0)).as_deref(), Some("Analysis"));
        assert_eq!(read_cell(&path_out, "Dr. A", (6, 4)), None);
    }

    #[test]
    fn convocations_add_location_column_when_present() {
        let tmp = TestDir::new();
        let path_out = tmp.path().join("letters.xlsx");

        let mut schedule = ScheduleIndex::new();
        schedule.push("Dr. B", record("Physics", Some("Room12")));

        let mut writer = XlsxWriter::new(path_out.clone());
        writer
            .write_convocations(&schedule, &letter())
            .expect("write");
        writer.close().expect("close");

        assert_eq!(read_cell(&path_out, "Dr. B", (6, 4)).as_deref(), Some("Local"));
        assert_eq!(read_cell(&path_out, "Dr. B", (7, 4)).as_deref(), Some("Room12"));
        assert_eq!(
            read_cell(&path_out, "Dr. B", (12, 0)).as_deref(),
            Some("Ait Melloul le: 03-06-2024")
        );
    }

    #[test]
    fn audit_grid_round_trips_filled_values() {
        let tmp = TestDir::new();
        let path_out = tmp.path().join("audit.xlsx");

        let raw = RawGrid::from_text_rows(&[
            vec!["", "2024-06-10", "", "x", "y"],
            vec!["", "08:30", "", "", ""],
            vec!["", "", "", "", ""],
            vec!["", "S2", "S4", "", ""],
            vec!["", "Algebra", "Physics", "", ""],
            vec!["", "", "", "", ""],
            vec!["Dr. A", "*", "", "", ""],
            vec!["", "", "*", "", ""],
        ])
        .expect("grid");
        let normalized = normalize_grid(&raw, &SpecGridLayout::default()).expect("normalize");

        let mut writer = XlsxWriter::new(path_out.clone());
        writer
            .write_audit_grid(&normalized, "normalized")
            .expect("write");
        writer.close().expect("close");

        assert_eq!(
            read_cell(&path_out, "normalized", (0, 2)).as_deref(),
            Some("2024-06-10")
        );
        assert_eq!(
            read_cell(&path_out, "normalized", (7, 0)).as_deref(),
            Some("Dr. A")
        );
    }

    #[test]
    fn convocations_embed_logo_above_addressee() {
        let tmp = TestDir::new();
        let path_logo = tmp.path().join("logo.png");
        std::fs::write(&path_logo, V_PNG_1X1).expect("write logo");
        let path_out = tmp.path().join("letters.xlsx");

        let mut schedule = ScheduleIndex::new();
        schedule.push("Dr. A", record("Physics", None));
        let letter = SpecConvocationLetter {
            path_logo: Some(path_logo),
            ..letter()
        };

        let mut writer = XlsxWriter::new(path_out.clone());
        writer.write_convocations(&schedule, &letter).expect("write");
        writer.close().expect("close");

        assert_eq!(read_cell(&path_out, "Dr. A", (0, 0)), None);
        assert_eq!(
            read_cell(&path_out, "Dr. A", (2, 0)).as_deref(),
            Some("A Mme/ Mr: Dr. A")
        );
        assert_eq!(read_cell(&path_out, "Dr. A", (8, 0)).as_deref(), Some("Module"));

        let v_xlsx = std::fs::read(&path_out).expect("read xlsx");
        let c_media = b"xl/media/image1.png";
        assert!(v_xlsx.windows(c_media.len()).any(|w| w == c_media));
    }

    #[test]
    fn convocations_fail_on_unreadable_logo() {
        let tmp = TestDir::new();
        let letter = SpecConvocationLetter {
            path_logo: Some(tmp.path().join("missing.png")),
            ..letter()
        };
        let mut schedule = ScheduleIndex::new();
        schedule.push("Dr. A", record("Physics", None));

        let mut writer = XlsxWriter::new(tmp.path().join("letters.xlsx"));
        let err = writer
            .write_convocations(&schedule, &letter)
            .expect_err("missing logo");
        assert!(matches!(err, XlsxIoError::Write(msg) if msg.contains("missing.png")));
    }

    #[test]
    fn close_is_idempotent_and_blocks_writes() {
        let tmp = TestDir::new();
        let path_out = tmp.path().join("empty.xlsx");

        let mut writer = XlsxWriter::new(path_out.clone());
        writer
            .write_convocations(&ScheduleIndex::new(), &letter())
            .expect("write");
        writer.close().expect("close");
        writer.close().expect("close again");
        assert!(path_out.exists());
        assert_eq!(writer.report()[0].warnings.len(), 1);

        let err = writer
            .write_convocations(&ScheduleIndex::new(), &letter())
            .expect_err("closed");
        assert!(matches!(err, XlsxIoError::Closed));
    }
}
