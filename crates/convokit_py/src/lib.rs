use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use convokit_io_xlsx::{
    N_COLS_INDEX_SKIPPED, N_ROWS_TITLE_SKIPPED, SpecConvocationLetter, SpecXlsxReadOptions,
    XlsxIoError, XlsxWriter, read_raw_grid, read_raw_grid_from_ipc_bytes,
    write_schedule_ipc_bytes,
};
use convokit_schedule::conf::C_FMT_DATE;
use convokit_schedule::{
    AssignmentRecord, C_MARKER_PRESENCE_DEFAULT, EnumMarkerPolicy, N_COLS_TRAILING_RESERVED,
    RawGrid, ReportExtract, ScheduleError, SpecExtractOptions, SpecExtractOutput, SpecGridLayout,
    build_schedule,
};
use pyo3::exceptions::{PyFileNotFoundError, PyKeyError, PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "convokit.schedule.extract.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "AssignmentRecord")]
#[derive(Debug, Clone)]
struct PyAssignmentRecord {
    #[pyo3(get)]
    subject: String,
    #[pyo3(get)]
    date: String,
    #[pyo3(get)]
    time: String,
    #[pyo3(get)]
    level: String,
    #[pyo3(get)]
    location: Option<String>,
}

impl From<&AssignmentRecord> for PyAssignmentRecord {
    fn from(record: &AssignmentRecord) -> Self {
        Self {
            subject: record.subject.clone(),
            date: record.date.clone(),
            time: record.time.clone(),
            level: record.level.clone(),
            location: record.location.clone(),
        }
    }
}

#[pymethods]
impl PyAssignmentRecord {
    fn to_dict(&self) -> BTreeMap<String, Option<String>> {
        let mut dict_record = BTreeMap::new();
        dict_record.insert("subject".to_string(), Some(self.subject.clone()));
        dict_record.insert("date".to_string(), Some(self.date.clone()));
        dict_record.insert("time".to_string(), Some(self.time.clone()));
        dict_record.insert("level".to_string(), Some(self.level.clone()));
        dict_record.insert("location".to_string(), self.location.clone());
        dict_record
    }

    fn __repr__(&self) -> String {
        format!(
            "AssignmentRecord(subject={:?}, date={:?}, time={:?}, level={:?}, location={:?})",
            self.subject, self.date, self.time, self.level, self.location
        )
    }
}

#[pyclass(name = "ScheduleResult")]
#[derive(Debug, Clone)]
struct PyScheduleResult {
    /// `(professor, records)` in first-encounter order.
    l_entries: Vec<(String, Vec<PyAssignmentRecord>)>,
    v_ipc_schedule: Vec<u8>,
    #[pyo3(get)]
    cnt_rows_scanned: u64,
    #[pyo3(get)]
    cnt_cells_scanned: u64,
    #[pyo3(get)]
    cnt_markers: u64,
    #[pyo3(get)]
    cnt_professors: u64,
    #[pyo3(get)]
    warnings: Vec<String>,
}

impl PyScheduleResult {
    fn try_from_output(output: SpecExtractOutput) -> Result<Self, XlsxIoError> {
        let v_ipc_schedule = write_schedule_ipc_bytes(&output.schedule)?;
        let ReportExtract {
            cnt_rows_scanned,
            cnt_cells_scanned,
            cnt_markers,
            cnt_professors,
            warnings,
        } = output.report;
        Ok(Self {
            l_entries: output
                .schedule
                .iter()
                .map(|(professor, records)| {
                    (
                        professor.to_string(),
                        records.iter().map(PyAssignmentRecord::from).collect(),
                    )
                })
                .collect(),
            v_ipc_schedule,
            cnt_rows_scanned,
            cnt_cells_scanned,
            cnt_markers,
            cnt_professors,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        })
    }
}

#[pymethods]
impl PyScheduleResult {
    #[getter]
    fn professors(&self) -> Vec<String> {
        self.l_entries.iter().map(|(p, _)| p.clone()).collect()
    }

    #[getter]
    fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Records of one professor.
    fn get(&self, professor: &str) -> PyResult<Vec<PyAssignmentRecord>> {
        self.l_entries
            .iter()
            .find(|(p, _)| p == professor)
            .map(|(_, records)| records.clone())
            .ok_or_else(|| PyKeyError::new_err(professor.to_string()))
    }

    /// Professor -> records, in first-encounter order.
    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict_schedule = PyDict::new(py);
        for (professor, records) in &self.l_entries {
            dict_schedule.set_item(professor, records.clone())?;
        }
        Ok(dict_schedule)
    }

    /// Long-table schedule as Polars IPC bytes (`pl.read_ipc(io.BytesIO(...))`).
    fn to_ipc_bytes<'py>(&self, py: Python<'py>) -> Bound<'py, PyBytes> {
        PyBytes::new(py, &self.v_ipc_schedule)
    }

    #[pyo3(signature = (prefix = "[EXTRACT]"))]
    fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} rows={} cells={} markers={} professors={} warnings={}",
            self.cnt_rows_scanned,
            self.cnt_cells_scanned,
            self.cnt_markers,
            self.cnt_professors,
            self.warning_count()
        )
    }

    fn __len__(&self) -> usize {
        self.l_entries.len()
    }

    fn __str__(&self) -> String {
        self.format("[EXTRACT]")
    }
}

fn parse_rule_policy(value: &str, sentinel: &str) -> PyResult<EnumMarkerPolicy> {
    match value {
        "presence" => Ok(EnumMarkerPolicy::Presence {
            sentinel: sentinel.to_string(),
        }),
        "location" => Ok(EnumMarkerPolicy::LocationCoded),
        _ => Err(PyValueError::new_err(format!(
            "Invalid marker policy: `{value}`. Expected one of: ['presence', 'location']"
        ))),
    }
}

fn derive_extract_options(
    rule_policy: &str,
    sentinel: &str,
    n_cols_trailing_reserved: usize,
    if_strict_headers: bool,
) -> PyResult<SpecExtractOptions> {
    Ok(SpecExtractOptions {
        layout: SpecGridLayout {
            n_cols_trailing_reserved,
            ..SpecGridLayout::default()
        },
        policy: parse_rule_policy(rule_policy, sentinel)?,
        if_strict_headers,
        ..SpecExtractOptions::default()
    })
}

fn parse_date_issued(value: &str) -> PyResult<NaiveDate> {
    NaiveDate::parse_from_str(value, C_FMT_DATE).map_err(|err| {
        PyValueError::new_err(format!(
            "Invalid date_issued: `{value}` ({err}). Expected YYYY-MM-DD"
        ))
    })
}

fn map_schedule_error(exception: ScheduleError) -> PyErr {
    PyValueError::new_err(exception.to_string())
}

fn map_xlsx_io_error(exception: XlsxIoError) -> PyErr {
    match exception {
        XlsxIoError::Open { .. } => PyFileNotFoundError::new_err(exception.to_string()),
        XlsxIoError::SheetNotFound { .. } => PyKeyError::new_err(exception.to_string()),
        XlsxIoError::Schedule(err) => map_schedule_error(err),
        XlsxIoError::DataFrame(_) => PyValueError::new_err(exception.to_string()),
        XlsxIoError::NoSheets { .. }
        | XlsxIoError::Read { .. }
        | XlsxIoError::Write(_)
        | XlsxIoError::Closed => PyOSError::new_err(exception.to_string()),
    }
}

fn run_extract(
    raw_grid: &RawGrid,
    options: &SpecExtractOptions,
) -> Result<PyScheduleResult, XlsxIoError> {
    let output = build_schedule(raw_grid, options)?;
    PyScheduleResult::try_from_output(output)
}

#[pyfunction(name = "extract_schedule")]
#[pyo3(signature = (
    file_in,
    sheet_name = None,
    rule_policy = "location",
    sentinel = C_MARKER_PRESENCE_DEFAULT,
    n_rows_title_skipped = N_ROWS_TITLE_SKIPPED,
    n_cols_index_skipped = N_COLS_INDEX_SKIPPED,
    n_cols_trailing_reserved = N_COLS_TRAILING_RESERVED,
    if_strict_headers = false
))]
#[allow(clippy::too_many_arguments)]
fn extract_schedule_py(
    py: Python<'_>,
    file_in: String,
    sheet_name: Option<String>,
    rule_policy: &str,
    sentinel: &str,
    n_rows_title_skipped: usize,
    n_cols_index_skipped: usize,
    n_cols_trailing_reserved: usize,
    if_strict_headers: bool,
) -> PyResult<PyScheduleResult> {
    let spec_read_options = SpecXlsxReadOptions {
        sheet_name,
        n_rows_title_skipped,
        n_cols_index_skipped,
    };
    let spec_extract_options = derive_extract_options(
        rule_policy,
        sentinel,
        n_cols_trailing_reserved,
        if_strict_headers,
    )?;

    let result = py.allow_threads(|| {
        let raw_grid = read_raw_grid(&PathBuf::from(&file_in), &spec_read_options)?;
        run_extract(&raw_grid, &spec_extract_options)
    });
    result.map_err(map_xlsx_io_error)
}

#[pyfunction(name = "extract_schedule_from_ipc")]
#[pyo3(signature = (
    v_ipc_df,
    rule_policy = "location",
    sentinel = C_MARKER_PRESENCE_DEFAULT,
    n_cols_trailing_reserved = N_COLS_TRAILING_RESERVED,
    if_strict_headers = false
))]
fn extract_schedule_from_ipc_py(
    py: Python<'_>,
    v_ipc_df: Vec<u8>,
    rule_policy: &str,
    sentinel: &str,
    n_cols_trailing_reserved: usize,
    if_strict_headers: bool,
) -> PyResult<PyScheduleResult> {
    let spec_extract_options = derive_extract_options(
        rule_policy,
        sentinel,
        n_cols_trailing_reserved,
        if_strict_headers,
    )?;

    let result = py.allow_threads(|| {
        let raw_grid = read_raw_grid_from_ipc_bytes(&v_ipc_df)?;
        run_extract(&raw_grid, &spec_extract_options)
    });
    result.map_err(map_xlsx_io_error)
}

#[pyfunction(name = "write_convocations")]
#[pyo3(signature = (
    file_in,
    file_out = None,
    sheet_name = None,
    rule_policy = "location",
    sentinel = C_MARKER_PRESENCE_DEFAULT,
    session = None,
    period = None,
    academic_year = None,
    place = None,
    signatory = None,
    date_issued = None,
    logo = None,
    n_cols_trailing_reserved = N_COLS_TRAILING_RESERVED,
    if_strict_headers = false
))]
#[allow(clippy::too_many_arguments)]
fn write_convocations_py(
    py: Python<'_>,
    file_in: String,
    file_out: Option<String>,
    sheet_name: Option<String>,
    rule_policy: &str,
    sentinel: &str,
    session: Option<String>,
    period: Option<String>,
    academic_year: Option<String>,
    place: Option<String>,
    signatory: Option<String>,
    date_issued: Option<String>,
    logo: Option<String>,
    n_cols_trailing_reserved: usize,
    if_strict_headers: bool,
) -> PyResult<(String, PyScheduleResult)> {
    let spec_read_options = SpecXlsxReadOptions {
        sheet_name,
        ..SpecXlsxReadOptions::default()
    };
    let spec_extract_options = derive_extract_options(
        rule_policy,
        sentinel,
        n_cols_trailing_reserved,
        if_strict_headers,
    )?;
    let mut spec_letter = SpecConvocationLetter::default();
    if let Some(v) = session {
        spec_letter.session = v;
    }
    if let Some(v) = period {
        spec_letter.period = v;
    }
    if let Some(v) = academic_year {
        spec_letter.academic_year = v;
    }
    if let Some(v) = place {
        spec_letter.place = v;
    }
    if let Some(v) = signatory {
        spec_letter.signatory = v;
    }
    if let Some(c_date) = date_issued {
        spec_letter.date_issued = parse_date_issued(&c_date)?;
    }
    spec_letter.path_logo = logo.map(PathBuf::from);
    let path_file_out = PathBuf::from(file_out.unwrap_or_else(|| spec_letter.derive_file_name()));

    let result = py.allow_threads(|| {
        let raw_grid = read_raw_grid(&PathBuf::from(&file_in), &spec_read_options)?;
        let output = build_schedule(&raw_grid, &spec_extract_options)?;

        let mut writer = XlsxWriter::new(path_file_out.clone());
        writer.write_convocations(&output.schedule, &spec_letter)?;
        writer.close()?;
        PyScheduleResult::try_from_output(output)
    });
    let result = result.map_err(map_xlsx_io_error)?;
    Ok((path_file_out.to_string_lossy().to_string(), result))
}

#[pymodule]
fn _convokit_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyAssignmentRecord>()?;
    module.add_class::<PyScheduleResult>()?;
    module.add_function(wrap_pyfunction!(extract_schedule_py, module)?)?;
    module.add_function(wrap_pyfunction!(extract_schedule_from_ipc_py, module)?)?;
    module.add_function(wrap_pyfunction!(write_convocations_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}

