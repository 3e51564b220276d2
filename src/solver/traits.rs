//! Numerical solver traits and types
//!
//! # Design Philosophy
//!
//! - Central enum `SolverType` defines the type of numerical solution
//! - `SolverConfiguration` carries the `SolverType` and its parameters
//! - `SimulationResult` holds the trajectory plus free-form metadata
//!
//! A solver never knows which physics it integrates: it only calls
//! [`PhysicalModel::compute_physics`](crate::physics::PhysicalModel::compute_physics).

use std::collections::HashMap;

use crate::error::{PbeError, PbeResult};
use crate::physics::PhysicalState;
use crate::solver::Scenario;

// =================================================================================================
// Solver type
// =================================================================================================

/// Type of numerical solution method
///
/// # Examples
///
/// ```rust
/// use popbal_rs::solver::SolverType;
///
/// let solver_type = SolverType::TimeEvolution {
///     total_time: 10.0,
///     time_steps: 1000,
/// };
/// assert_eq!(solver_type.name(), "TimeEvolution");
/// ```
#[derive(Clone, Debug)]
pub enum SolverType {
    /// Fixed-step time integration over `[0, total_time]`
    ///
    /// Used by: Euler, Runge-Kutta
    TimeEvolution { total_time: f64, time_steps: usize },
}

impl SolverType {
    /// Get name identifier
    pub fn name(&self) -> &str {
        match self {
            SolverType::TimeEvolution { .. } => "TimeEvolution",
        }
    }

    /// Validate that parameters are meaningful
    pub fn validate(&self) -> PbeResult<()> {
        match self {
            SolverType::TimeEvolution {
                total_time,
                time_steps,
            } => {
                if !(*total_time > 0.0 && total_time.is_finite()) {
                    return Err(PbeError::InvalidConfiguration(format!(
                        "Total time must be positive, got {}",
                        total_time
                    )));
                }
                if *time_steps == 0 {
                    return Err(PbeError::InvalidConfiguration(
                        "TimeSteps must be greater than 0".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

// =================================================================================================
// Solver configuration
// =================================================================================================

/// Configuration for numerical solver
#[derive(Clone, Debug)]
pub struct SolverConfiguration {
    /// Type of solver and its parameters
    pub solver_type: SolverType,

    /// Keep every n-th state in the trajectory (the final state is always kept)
    pub output_interval: usize,
}

impl SolverConfiguration {
    /// Create a new configuration with a given solver type
    pub fn new(solver_type: SolverType) -> Self {
        Self {
            solver_type,
            output_interval: 1,
        }
    }

    /// Create a time evolution configuration
    pub fn time_evolution(total_time: f64, time_steps: usize) -> Self {
        Self::new(SolverType::TimeEvolution {
            total_time,
            time_steps,
        })
    }

    /// Builder pattern: store only every `interval`-th step
    pub fn with_output_interval(mut self, interval: usize) -> Self {
        self.output_interval = interval;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> PbeResult<()> {
        if self.output_interval == 0 {
            return Err(PbeError::InvalidConfiguration(
                "Output interval must be at least 1".to_string(),
            ));
        }
        self.solver_type.validate()
    }

    /// `(total_time, time_steps)` of the time evolution
    pub(crate) fn time_evolution_parameters(&self) -> (f64, usize) {
        let SolverType::TimeEvolution {
            total_time,
            time_steps,
        } = self.solver_type;
        (total_time, time_steps)
    }
}

// =================================================================================================
// Simulation result
// =================================================================================================

/// Outcome of a solver run
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// Times of the stored states
    pub time_points: Vec<f64>,

    /// Stored states, aligned with `time_points`
    pub state_trajectory: Vec<PhysicalState>,

    /// State at the end of the run
    pub final_state: PhysicalState,

    /// Diagnostics (solver name, dt, ...)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    pub fn new(
        time_points: Vec<f64>,
        state_trajectory: Vec<PhysicalState>,
        final_state: PhysicalState,
    ) -> Self {
        Self {
            time_points,
            state_trajectory,
            final_state,
            metadata: HashMap::new(),
        }
    }

    /// Number of stored states
    pub fn len(&self) -> usize {
        self.time_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_points.is_empty()
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

// =================================================================================================
// Solver trait
// =================================================================================================

/// Numerical method advancing a [`Scenario`]
pub trait Solver {
    /// Run the method on `scenario` with `config`
    fn solve(&self, scenario: &Scenario, config: &SolverConfiguration) -> PbeResult<SimulationResult>;

    /// Name of the method
    fn name(&self) -> &str;
}
