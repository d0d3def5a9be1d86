//! XLSX constants, convocation boilerplate and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Title-block rows above the timetable grid.
pub const N_ROWS_TITLE_SKIPPED: usize = 3;
/// Leading row-number column dropped before the grid starts.
pub const N_COLS_INDEX_SKIPPED: usize = 1;

/// Default session label.
pub const C_SESSION_DEFAULT: &str = "Normale";
/// Default period label.
pub const C_PERIOD_DEFAULT: &str = "Printemps";
/// Default academic-year label.
pub const C_ACADEMIC_YEAR_DEFAULT: &str = "2023/2024";
/// Default place printed next to the issue date.
pub const C_PLACE_DEFAULT: &str = "Ait Melloul";
/// Default signatory line.
pub const C_SIGNATORY_DEFAULT: &str = "Le doyen";

/// Addressee line prefix.
pub const C_LETTER_ADDRESSEE_PREFIX: &str = "A Mme/ Mr: ";
/// Letter subject line.
pub const C_LETTER_SUBJECT: &str = "Objet: Convocation aux surveillances des Examens";
/// Letter greeting.
pub const C_LETTER_GREETING: &str = "Cher(e) collègue,";
/// Closing thanks.
pub const C_LETTER_THANKS: &str = "Nous vous remercions de votre précieuse collaboration";
/// Issue-date rendering on the place/date line.
pub const C_FMT_DATE_ISSUED: &str = "%d-%m-%Y";
/// Date suffix of the default output file name.
pub const C_FMT_DATE_FILE: &str = "%Y_%m_%d";
/// Default output file stem.
pub const C_FILE_STEM_CONVOCATIONS: &str = "invitations_profs";

/// Assignment table header labels.
pub const TUP_LETTER_TABLE_HEADER: [&str; 4] = ["Module", "Date", "Horaire", "Niveau"];
/// Optional location column label.
pub const C_LETTER_TABLE_HEADER_LOCATION: &str = "Local";

/// Column widths of the letter sheet (Module, Date, Horaire, Niveau, Local).
pub const TUP_LETTER_COL_WIDTHS: [f64; 5] = [36.0, 14.0, 12.0, 12.0, 14.0];
/// Width bounds used for audit-grid column sizing.
pub const TUP_AUDIT_COL_WIDTH_BOUNDS: (usize, usize) = (8, 40);

/// Body sentence inviting the professor to invigilate.
pub fn derive_letter_body_text(session: &str, period: &str, academic_year: &str) -> String {
    format!(
        "Nous vous saurions gré de bien vouloir prendre toutes les dispositions nécessaires \
         pour assurer la surveillance des épreuves écrites de la session {session} de \
         {period} {academic_year} aux jours et horaires indiqués ci-dessous:"
    )
}

/// Build default named format presets used by [`crate::writer::XlsxWriter`].
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Arial".to_string()),
        font_size: Some(12),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert("text".to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        "paragraph".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            text_wrap: Some(true),
            align: Some("left".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "right".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("right".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "table".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            border: Some(true),
            text_wrap: Some(true),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "header".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            border: Some(true),
            bold: Some(true),
            align: Some("center".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}
