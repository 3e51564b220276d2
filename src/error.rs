//! Error types
//!
//! Every fallible operation of the crate returns [`PbeResult`]. Configuration
//! errors are raised before any time stepping and always name the offending
//! model and/or group index.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PbeError {
    #[error("Group set must contain at least one group")]
    EmptyGroupSet,

    #[error("Group {index}: representative volume must be positive and finite, got {volume}")]
    NonPositiveVolume { index: usize, volume: f64 },

    #[error(
        "Group {index}: volumes must be strictly increasing, v[{index}] = {current} does not exceed v[{}] = {previous}",
        .index - 1
    )]
    NonIncreasingVolumes {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("Unknown {family} '{name}' (available: {})", .available.join(", "))]
    UnknownModel {
        family: &'static str,
        name: String,
        available: Vec<String>,
    },

    #[error("Model '{model}': missing required parameter '{parameter}'")]
    MissingParameter { model: String, parameter: String },

    #[error("Model '{model}': invalid parameter '{parameter}' = {value} ({reason})")]
    InvalidParameter {
        model: String,
        parameter: String,
        value: f64,
        reason: String,
    },

    #[error("Size mismatch for {what}: expected {expected}, found {found}")]
    SizeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "Daughter distribution '{model}' does not conserve volume for parent group {parent}: relative residual {residual:e}"
    )]
    ConservationViolated {
        model: String,
        parent: usize,
        residual: f64,
    },

    #[error("Numerical failure in {quantity} at step {step}: {message}")]
    Numerical {
        step: usize,
        quantity: String,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PbeResult<T> = Result<T, PbeError>;
