//! `convokit_schedule` v1:
//! Grid-to-schedule extraction kernel.
//!
//! Module layout:
//! - `conf`      : layout constants and default presets
//! - `spec`      : grid/layout/policy models, options and errors
//! - `util`      : pure helper functions (rendering, forward-fill, classification)
//! - `normalize` : header and professor-column forward-fill
//! - `extract`   : marker scan and positional header join
//! - `schedule`  : per-professor assignment index
//! - `report`    : run-time report model
pub mod conf;
pub mod extract;
pub mod normalize;
pub mod report;
pub mod schedule;
pub mod spec;
pub mod util;

pub use conf::{
    C_MARKER_PRESENCE_DEFAULT, N_COL_PROFESSOR, N_COLS_TRAILING_RESERVED, N_ROW_BODY_START,
    N_ROW_DATE, N_ROW_LEVEL, N_ROW_SUBJECT, N_ROW_TIME, TUP_TOKENS_MISSING,
};
pub use extract::{SpecExtractOutput, build_schedule, extract_schedule, extract_schedule_with};
pub use normalize::{NormalizedGrid, normalize_grid};
pub use report::{ReportExtract, ReportExtractBuilder};
pub use schedule::{AssignmentRecord, ScheduleIndex};
pub use spec::{
    EnumCellClass, EnumCellValue, EnumHeaderField, EnumMarkerPolicy, EnumWarningKind,
    MarkerPolicy, RawGrid, ScheduleError, SpecCellWarning, SpecExtractOptions, SpecGridLayout,
};
pub use util::{classify_cell, fill_forward, fill_forward_cells, render_cell_text};
