//! Restartable checkpoints
//!
//! A checkpoint is a CSV file with a `#` header carrying the clock, the
//! array sizes and the configuration as a single JSON line, followed by the
//! number-density arena, one row per cell:
//!
//! ```text
//! # Population Balance Checkpoint
//! # Generated: 2026-10-19T15:30:00+00:00
//! # Time: 2.5e-1
//! # Step: 25
//! # Cells: 2
//! # Groups: 3
//! # Config: {"name":"column","groups":{...},...}
//! #
//! cell,group_0,group_1,group_2
//! 0,0e0,2e1,1e1
//! 1,0e0,2e1,1e1
//! ```
//!
//! The case name lives only inside the JSON line, where it is escaped.
//! Values use the shortest representation that parses back to the same
//! `f64`, so a restored model holds bit-identical fields. Flow fields belong
//! to the flow solver and are not stored: a restored model starts quiescent.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use log::debug;
use nalgebra::DMatrix;

use crate::config::PopulationBalanceConfig;
use crate::error::{PbeError, PbeResult};
use crate::models::groups::first_inadmissible;
use crate::models::{ModelRegistry, PopulationBalanceModel};

const TITLE: &str = "Population Balance Checkpoint";

/// Write `model` to `path`
pub fn write_checkpoint<P: AsRef<Path>>(model: &PopulationBalanceModel, path: P) -> PbeResult<()> {
    let path = path.as_ref();
    let density = model.groups().number_density();

    let mut out = BufWriter::new(File::create(path)?);

    // ============================= Header =================================

    writeln!(out, "# {}", TITLE)?;
    writeln!(out, "# Generated: {}", Utc::now().to_rfc3339())?;
    writeln!(out, "# Time: {:e}", model.time())?;
    writeln!(out, "# Step: {}", model.step())?;
    writeln!(out, "# Cells: {}", density.nrows())?;
    writeln!(out, "# Groups: {}", density.ncols())?;
    writeln!(out, "# Config: {}", model.config().to_json()?)?;
    writeln!(out, "#")?;

    // ============================= Table ==================================

    write!(out, "cell")?;
    for group in 0..density.ncols() {
        write!(out, ",group_{}", group)?;
    }
    writeln!(out)?;

    for (cell, row) in density.row_iter().enumerate() {
        write!(out, "{}", cell)?;
        for value in row.iter() {
            write!(out, ",{:e}", value)?;
        }
        writeln!(out)?;
    }

    out.flush()?;

    debug!(
        "Checkpoint of '{}' at t = {:e} written to {}",
        model.name(),
        model.time(),
        path.display()
    );
    Ok(())
}

/// Restore a model from the checkpoint at `path`
///
/// Model keys in the embedded configuration are resolved through `registry`,
/// so checkpoints of runs that used custom models need the same registrations.
pub fn read_checkpoint<P: AsRef<Path>>(
    path: P,
    registry: &ModelRegistry,
) -> PbeResult<PopulationBalanceModel> {
    let contents = fs::read_to_string(path)?;
    parse_checkpoint(&contents, registry)
}

/// Restore a model from checkpoint text
pub fn parse_checkpoint(
    contents: &str,
    registry: &ModelRegistry,
) -> PbeResult<PopulationBalanceModel> {
    // ============================= Split ==================================

    let mut header: HashMap<&str, &str> = HashMap::new();
    let mut columns: Option<&str> = None;
    let mut rows: Vec<(usize, &str)> = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if let Some((key, value)) = comment.trim_start().split_once(": ") {
                header.insert(key, value);
            }
            continue;
        }
        match columns {
            None => columns = Some(line),
            Some(_) => rows.push((index + 1, line)),
        }
    }

    let field = |key: &str| {
        header
            .get(key)
            .copied()
            .ok_or_else(|| PbeError::Checkpoint(format!("missing '{}' header line", key)))
    };

    // ============================= Header =================================

    let config = PopulationBalanceConfig::from_json_str(field("Config")?)?;
    let time: f64 = parse_value(field("Time")?, "Time")?;
    let step: usize = parse_value(field("Step")?, "Step")?;
    let n_cells: usize = parse_value(field("Cells")?, "Cells")?;
    let n_groups: usize = parse_value(field("Groups")?, "Groups")?;

    if !time.is_finite() || time < 0.0 {
        return Err(PbeError::Checkpoint(format!(
            "time must be finite and non-negative, got {}",
            time
        )));
    }

    // ============================= Table ==================================

    let columns = columns.ok_or_else(|| PbeError::Checkpoint("missing column header".to_string()))?;
    let found = columns.split(',').count();
    if found != n_groups + 1 {
        return Err(PbeError::Checkpoint(format!(
            "column header has {} columns, expected {} (cell + {} groups)",
            found,
            n_groups + 1,
            n_groups
        )));
    }

    if rows.len() != n_cells {
        return Err(PbeError::Checkpoint(format!(
            "found {} data rows, expected {} cells",
            rows.len(),
            n_cells
        )));
    }

    let mut density = DMatrix::zeros(n_cells, n_groups);
    for (cell, (line_number, row)) in rows.iter().enumerate() {
        let mut values = row.split(',');

        let label: usize = parse_value(values.next().unwrap_or_default(), "cell index")?;
        if label != cell {
            return Err(PbeError::Checkpoint(format!(
                "line {}: expected cell {}, found {}",
                line_number, cell, label
            )));
        }

        let parsed = values
            .map(|value| parse_value::<f64>(value, "number density"))
            .collect::<PbeResult<Vec<f64>>>()?;
        if parsed.len() != n_groups {
            return Err(PbeError::Checkpoint(format!(
                "line {}: {} values for {} groups",
                line_number,
                parsed.len(),
                n_groups
            )));
        }

        for (group, value) in parsed.into_iter().enumerate() {
            density[(cell, group)] = value;
        }
    }

    if let Some((group, cell, value)) = first_inadmissible(&density) {
        return Err(PbeError::Checkpoint(format!(
            "line {}: number density of group {} is {}, expected a finite non-negative value",
            rows[cell].0, group, value
        )));
    }

    // ============================= Rebuild ================================

    let mut model = PopulationBalanceModel::from_config(&config, registry, n_cells)?;
    model.set_number_density(density)?;
    model.set_clock(time, step);

    debug!(
        "Restored '{}' at t = {:e} (step {}) with {} cells",
        model.name(),
        time,
        step,
        n_cells
    );
    Ok(model)
}

fn parse_value<T>(value: &str, what: &str) -> PbeResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| PbeError::Checkpoint(format!("cannot parse {} from '{}': {}", what, value, e)))
}

// =================================================================================================
// Tests
// =================================================================================================
