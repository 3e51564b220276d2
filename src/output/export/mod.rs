//! Data export
//!
//! Export functions accept the model (or a solver result) directly and write
//! plain CSV that pandas, MATLAB or a spreadsheet can read.

pub mod csv;

pub use csv::{CsvConfig, export_cell_summary_csv, export_group_history_csv};
