//! Simulation scenario definition
//!
//! A scenario combines a physical model with the state it starts from.
use crate::error::{PbeError, PbeResult};
use crate::physics::traits::{PhysicalModel, PhysicalState};
use crate::solver::validate_state;

/// Simulation scenario
///
/// The same scenario can be solved with different numerical methods.
/// This is the "WHAT to solve" (not "HOW to solve").
///
/// # Examples
///
/// ```rust,ignore
/// let initial = model.setup_initial_state();
/// let scenario = Scenario::new(Box::new(model), initial);
///
/// let euler = EulerSolver::new().solve(&scenario, &config)?;
/// let rk4 = RK4Solver::new().solve(&scenario, &config)?;
/// ```
pub struct Scenario {
    /// Physical model (equations)
    pub model: Box<dyn PhysicalModel>,

    /// State at t = 0
    pub initial_state: PhysicalState,
}

impl Scenario {
    /// Create a scenario
    pub fn new(model: Box<dyn PhysicalModel>, initial_state: PhysicalState) -> Self {
        Self {
            model,
            initial_state,
        }
    }

    /// Scenario starting from the model's own initial state
    pub fn from_model(model: Box<dyn PhysicalModel>) -> Self {
        let initial_state = model.setup_initial_state();
        Self::new(model, initial_state)
    }

    /// Initial state must carry data and be finite
    pub fn validate(&self) -> PbeResult<()> {
        if self.initial_state.is_empty() {
            return Err(PbeError::InvalidConfiguration(format!(
                "Scenario '{}' has an empty initial state",
                self.get_model_name()
            )));
        }
        validate_state(&self.initial_state, 0)
    }

    /// Get model name
    pub fn get_model_name(&self) -> &str {
        self.model.name()
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.get_model_name())
            .field("points", &self.model.points())
            .field("quantities", &self.initial_state.available_quantities())
            .finish()
    }
}

// ================================================================================================
// Tests
// ================================================================================================
