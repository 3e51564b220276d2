//! Output module for population balance state
//!
//! - **Checkpoint**: exact save/restore of a model (configuration, clock and
//!   every number-density value)
//! - **Export**: CSV data export of derived fields for external analysis
//!
//! # Architecture
//!
//! ```text
//! output/
//! ├── mod.rs              ← This file
//! ├── checkpoint.rs       ← Restartable state
//! └── export/             ← Data export
//!     ├── mod.rs
//!     └── csv.rs
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use popbal_rs::output::{read_checkpoint, write_checkpoint};
//!
//! write_checkpoint(&model, "state.csv")?;
//! let restored = read_checkpoint("state.csv", &ModelRegistry::with_builtin())?;
//! ```
//!
//! Both file kinds share the same layout: a block of `# Key: value` comment
//! lines followed by a comma-separated table with one row per cell.

pub mod checkpoint;
pub mod export;

pub use checkpoint::{parse_checkpoint, read_checkpoint, write_checkpoint};
pub use export::{CsvConfig, export_cell_summary_csv, export_group_history_csv};
