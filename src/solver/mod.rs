//! Numerical solvers
//!
//! This module provides the generic time integrators used to advance any
//! [`PhysicalModel`](crate::physics::PhysicalModel), the population balance
//! included.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! 1. **Scenario** (`Scenario`) - WHAT to solve
//!    - Physical model (equations)
//!    - Initial state
//!
//! 2. **Configuration** (`SolverConfiguration`) - HOW to solve
//!    - Solver type (time evolution)
//!    - Numerical parameters (total time, time steps, output interval)
//!
//! 3. **Solver** (`Solver` trait) - The numerical method
//!    - Applies the numerical scheme
//!    - Returns the solution
//!    - Independent of physics
//!
//! # Module Organization
//!
//! - **`traits`**: `Solver`, `SolverType`, `SolverConfiguration`, `SimulationResult`
//! - **`scenario`**: `Scenario` (model + initial state)
//! - **`methods`**: `EulerSolver`, `RK4Solver`
//!
//! # Quick Start Example
//!
//! ```rust
//! use popbal_rs::config::PopulationBalanceConfig;
//! use popbal_rs::models::{ModelRegistry, PopulationBalanceModel};
//! use popbal_rs::solver::{EulerSolver, Scenario, Solver, SolverConfiguration};
//!
//! let config = PopulationBalanceConfig::from_json_str(r#"{
//!     "groups": { "rule": "geometricVolume", "count": 4, "minVolume": 1.0, "ratio": 2.0 },
//!     "breakupRateModel": { "model": "powerLaw", "C": 0.1, "power": 1.0 },
//!     "daughterDistributionModel": { "model": "uniformBinary" },
//!     "initialNumberDensity": [0.0, 0.0, 0.0, 1.0]
//! }"#).unwrap();
//! let model = PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 8).unwrap();
//!
//! // 1. WHAT to solve
//! let scenario = Scenario::from_model(Box::new(model));
//!
//! // 2. HOW to solve
//! let configuration = SolverConfiguration::time_evolution(1.0, 100);
//!
//! // 3. Solve
//! let result = EulerSolver::new().solve(&scenario, &configuration).unwrap();
//! assert_eq!(result.len(), 101);
//! ```
//!
//! # Error Handling
//!
//! All solver methods return [`PbeResult`](crate::error::PbeResult). Common errors:
//! - Invalid configuration (negative time, zero steps)
//! - Invalid scenario (empty or non-finite initial state)
//! - Numerical instability (NaN or Inf values), reported with the step index
//! - States the model rejects through
//!   [`PhysicalModel::check_state`](crate::physics::PhysicalModel::check_state),
//!   such as a negative number density

// =================================================================================================
// Module Declarations
// =================================================================================================
mod methods;
mod scenario;
mod traits;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Cells (or elements, for [`PhysicalData::apply()`](crate::physics::PhysicalData::apply))
/// from which work goes to rayon
const DEFAULT_PARALLEL_THRESHOLD: usize = 999;

// A performance hint only: relaxed loads are enough.
static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Size from which source assembly and `PhysicalData::apply()` run in parallel
///
/// Only consulted when the crate is built with the `parallel` feature.
/// Below the threshold, work stays on the calling thread.
///
/// ```rust
/// use popbal_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Change the parallel threshold for the whole process
///
/// Results do not depend on it, only run time does.
///
/// # Panics
///
/// Panics when `threshold == 0`.
///
/// ```rust
/// use popbal_rs::solver::{parallel_threshold, set_parallel_threshold};
///
/// let previous = parallel_threshold();
/// set_parallel_threshold(10_000);
/// assert_eq!(parallel_threshold(), 10_000);
/// set_parallel_threshold(previous);
/// ```
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{SimulationResult, Solver, SolverConfiguration, SolverType};

pub use scenario::Scenario;

pub use methods::{EulerSolver, RK4Solver};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::error::{PbeError, PbeResult};
use crate::physics::PhysicalState;

/// Validate physical state for numerical issues
///
/// Checks that the state does not contain NaN or Inf values, which would
/// indicate numerical instability or errors in the physics computation.
///
/// # Arguments
///
/// * `state` - Physical state to validate
/// * `step` - Current time step (for error reporting)
///
/// # Example
///
/// ```rust,ignore
/// validate_state(&state, 42)?;  // Validates state at step 42
/// ```
pub(crate) fn validate_state(state: &PhysicalState, step: usize) -> PbeResult<()> {
    for (quantity, data) in &state.quantities {
        // NaN can arise from 0/0, Inf - Inf, or other undefined operations
        if data.values().any(|x| x.is_nan()) {
            return Err(PbeError::Numerical {
                step,
                quantity: quantity.to_string(),
                message: "NaN detected; try reducing the time step".to_string(),
            });
        }

        // Inf indicates overflow or division by zero
        if data.values().any(|x| x.is_infinite()) {
            return Err(PbeError::Numerical {
                step,
                quantity: quantity.to_string(),
                message: "Infinity detected; try reducing the time step or check the model for division by zero"
                    .to_string(),
            });
        }
    }

    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
