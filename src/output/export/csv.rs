//! CSV export of population balance results
//!
//! # Features
//!
//! - **Per-cell summary**: total volume fraction, total number density,
//!   interfacial area density and Sauter-mean diameter of every cell
//! - **Group history**: cell-averaged number density of every group along a
//!   solver trajectory
//! - **Metadata support**: optional `#` header with model and clock
//! - **Validation**: NaN/Inf values are rejected before the file is created
//!
//! # Example
//!
//! ```rust,ignore
//! use popbal_rs::output::export::{export_cell_summary_csv, CsvConfig};
//!
//! export_cell_summary_csv(&model, "summary.csv", Some(&CsvConfig::default().with_metadata()))?;
//! ```
//!
//! **Output** (`summary.csv`):
//! ```csv
//! # Population Balance Data
//! # Generated: 2026-10-19T15:30:00+00:00
//! # Model: column
//! # Time: 1e0
//! #
//! cell,alpha,n_total,a_i,d32
//! 0,1.000000e-3,2.000000e5,4.100000e1,1.463415e-4
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use nalgebra::DVector;

use crate::error::{PbeError, PbeResult};
use crate::models::PopulationBalanceModel;
use crate::physics::PhysicalQuantity;
use crate::solver::SimulationResult;

// =============================================================================
// Configuration Structures
// =============================================================================

/// Configuration for CSV export
///
/// ```rust
/// use popbal_rs::output::CsvConfig;
///
/// let config = CsvConfig::default().delimiter(';').precision(10);
/// assert_eq!(config.delimiter, ';');
/// ```
#[derive(Clone, Debug)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Significant digits after the point, in scientific notation (default: 6)
    pub precision: usize,

    /// Include the `#` metadata header (default: false)
    pub include_metadata: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            precision: 6,
            include_metadata: false,
        }
    }
}

impl CsvConfig {
    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: set precision
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder pattern: enable metadata
    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn write_metadata_header<W: Write>(
    out: &mut W,
    model: &PopulationBalanceModel,
    extra: &[(&str, String)],
) -> PbeResult<()> {
    writeln!(out, "# Population Balance Data")?;
    writeln!(out, "# Generated: {}", Utc::now().to_rfc3339())?;
    writeln!(out, "# Model: {}", model.name())?;
    writeln!(out, "# Time: {:e}", model.time())?;
    writeln!(out, "# Step: {}", model.step())?;
    writeln!(out, "# Breakup: {}", model.breakup_model().name())?;
    writeln!(out, "# Daughter: {}", model.daughter_model().name())?;
    for (key, value) in extra {
        writeln!(out, "# {}: {}", key, value)?;
    }
    writeln!(out, "#")?;
    Ok(())
}

fn format_number(value: f64, config: &CsvConfig) -> String {
    format!("{:.prec$e}", value, prec = config.precision)
}

fn check_finite(what: &str, values: &DVector<f64>) -> PbeResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(cell) => Err(PbeError::Export(format!(
            "NaN or Inf detected in {} at cell {}",
            what, cell
        ))),
        None => Ok(()),
    }
}

// =============================================================================
// Export Functions
// =============================================================================

/// Export the per-cell aggregate moments of `model`
///
/// Columns: `cell`, `alpha` (total volume fraction), `n_total`, `a_i`
/// (interfacial area density) and `d32` (Sauter-mean diameter).
///
/// # Errors
///
/// - Non-finite aggregate in any cell
/// - File creation errors
pub fn export_cell_summary_csv<P: AsRef<Path>>(
    model: &PopulationBalanceModel,
    output_path: P,
    configuration: Option<&CsvConfig>,
) -> PbeResult<()> {
    // ============================= Validation =============================

    let columns = [
        ("alpha", model.total_volume_fraction()),
        ("n_total", model.total_number_density()),
        ("a_i", model.interfacial_area_density()),
        ("d32", model.sauter_mean_diameter()),
    ];
    for (name, values) in &columns {
        check_finite(name, values)?;
    }

    // ============================= Configuration ==========================

    let binding = CsvConfig::default();
    let configuration = configuration.unwrap_or(&binding);
    let delimiter = configuration.delimiter;

    // ============================= Write ==================================

    let mut out = BufWriter::new(File::create(output_path)?);

    if configuration.include_metadata {
        write_metadata_header(&mut out, model, &[("Cells", model.n_cells().to_string())])?;
    }

    write!(out, "cell")?;
    for (name, _) in &columns {
        write!(out, "{}{}", delimiter, name)?;
    }
    writeln!(out)?;

    for cell in 0..model.n_cells() {
        write!(out, "{}", cell)?;
        for (_, values) in &columns {
            write!(out, "{}{}", delimiter, format_number(values[cell], configuration))?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

/// Export the cell-averaged number density of every group along a trajectory
///
/// Every stored state of `result` must carry a
/// [`NumberDensity`](PhysicalQuantity::NumberDensity) matrix (`cells × groups`),
/// as produced by solving a [`PopulationBalanceModel`] scenario.
///
/// Columns: `time`, `group_0`, `group_1`, ...
pub fn export_group_history_csv<P: AsRef<Path>>(
    result: &SimulationResult,
    output_path: P,
    configuration: Option<&CsvConfig>,
) -> PbeResult<()> {
    // ============================= Validation =============================

    if result.is_empty() {
        return Err(PbeError::Export(
            "Empty data: the trajectory holds no state".to_string(),
        ));
    }

    let mut rows = Vec::with_capacity(result.len());
    for (index, (time, state)) in result
        .time_points
        .iter()
        .zip(result.state_trajectory.iter())
        .enumerate()
    {
        let density = state
            .get(PhysicalQuantity::NumberDensity)
            .and_then(|data| data.try_as_matrix())
            .ok_or_else(|| {
                PbeError::Export(format!(
                    "State {} has no number-density matrix",
                    index
                ))
            })?;

        if density.nrows() == 0 {
            return Err(PbeError::Export(format!("State {} has no cells", index)));
        }

        let means = density.row_mean().transpose();
        check_finite(&format!("state {}", index), &means)?;
        rows.push((*time, means));
    }

    let n_groups = rows[0].1.len();
    if let Some((_, means)) = rows.iter().find(|(_, means)| means.len() != n_groups) {
        return Err(PbeError::SizeMismatch {
            what: "groups along the trajectory".to_string(),
            expected: n_groups,
            found: means.len(),
        });
    }

    // ============================= Configuration ==========================

    let binding = CsvConfig::default();
    let configuration = configuration.unwrap_or(&binding);
    let delimiter = configuration.delimiter;

    // ============================= Write ==================================

    let mut out = BufWriter::new(File::create(output_path)?);

    if configuration.include_metadata {
        writeln!(out, "# Population Balance Trajectory")?;
        writeln!(out, "# Generated: {}", Utc::now().to_rfc3339())?;
        if let Some(solver) = result.get_metadata("solver") {
            writeln!(out, "# Solver: {}", solver)?;
        }
        writeln!(out, "#")?;
    }

    write!(out, "time")?;
    for group in 0..n_groups {
        write!(out, "{}group_{}", delimiter, group)?;
    }
    writeln!(out)?;

    for (time, means) in &rows {
        write!(out, "{}", format_number(*time, configuration))?;
        for value in means.iter() {
            write!(out, "{}{}", delimiter, format_number(*value, configuration))?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
