//! Runge-Kutta 4 (RK4) numerical solver
//!
//! # Mathematical Background
//!
//! ```text
//! k₁ = f(yₙ, tₙ)
//! k₂ = f(yₙ + dt/2 * k₁, tₙ + dt/2)
//! k₃ = f(yₙ + dt/2 * k₂, tₙ + dt/2)
//! k₄ = f(yₙ + dt * k₃, tₙ + dt)
//!
//! yₙ₊₁ = yₙ + dt/6 * (k₁ + 2k₂ + 2k₃ + k₄)
//! ```
//!
//! # Characteristics
//!
//! - **Order**: Fourth-order accurate
//! - **Complexity**: 4 function evaluations per step
//!
//! Every stage is a linear combination of right-hand sides that each
//! conserve volume, so RK4 also keeps the total dispersed volume of a
//! breakup-only population balance constant to round-off.
//!
//! | Method | Order | Evals/Step |
//! |--------|-------|------------|
//! | Euler  | 1     | 1          |
//! | RK4    | 4     | 4          |
//!
//! # Example
//!
//! ```rust,ignore
//! use popbal_rs::solver::{RK4Solver, Solver, SolverConfiguration};
//!
//! let solver = RK4Solver::new();
//! let config = SolverConfiguration::time_evolution(10.0, 100);
//! let result = solver.solve(&scenario, &config)?;
//! ```

use log::debug;

use crate::error::PbeResult;
use crate::physics::PhysicalState;
use crate::solver::{Scenario, SimulationResult, Solver, SolverConfiguration, validate_state};

/// Classical fourth-order Runge-Kutta solver
#[derive(Debug, Clone, Copy, Default)]
pub struct RK4Solver;

impl RK4Solver {
    /// Create a new RK4 solver
    ///
    /// ```rust
    /// use popbal_rs::solver::{RK4Solver, Solver};
    ///
    /// assert_eq!(RK4Solver::new().name(), "Runge-Kutta 4");
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the model at `state` with the stage time written to metadata
    fn stage(scenario: &Scenario, mut state: PhysicalState, t: f64) -> PhysicalState {
        state.set_metadata("time".to_string(), t);
        scenario.model.compute_physics(&state)
    }
}

impl Solver for RK4Solver {
    fn solve(&self, scenario: &Scenario, config: &SolverConfiguration) -> PbeResult<SimulationResult> {
        // ====== Step 1: Validation ======

        config.validate()?;
        scenario.validate()?;

        let (total_time, time_steps) = config.time_evolution_parameters();

        // ====== Step 2: Setup ======

        let dt = total_time / (time_steps as f64);
        let mut state = scenario.initial_state.clone();

        let stored = time_steps / config.output_interval + 2;
        let mut time_points = Vec::with_capacity(stored);
        let mut state_trajectory = Vec::with_capacity(stored);

        time_points.push(0.0);
        state_trajectory.push(state.clone());

        debug!(
            "Runge-Kutta 4 on '{}': {} steps, dt = {:e}",
            scenario.get_model_name(),
            time_steps,
            dt
        );

        // ====== Step 3: Time Integration ======

        for step in 0..time_steps {
            let t = (step as f64) * dt;

            // ====== RK4 Stages ======

            let k1 = Self::stage(scenario, state.clone(), t);
            let k2 = Self::stage(scenario, state.clone() + k1.clone() * (dt / 2.0), t + dt / 2.0);
            let k3 = Self::stage(scenario, state.clone() + k2.clone() * (dt / 2.0), t + dt / 2.0);
            let k4 = Self::stage(scenario, state.clone() + k3.clone() * dt, t + dt);

            // ====== RK4 Update ======

            let weighted_slope = k1 + k2 * 2.0 + k3 * 2.0 + k4;
            state = state + weighted_slope * (dt / 6.0);

            let t_next = (step as f64 + 1.0) * dt;
            state.set_metadata("time".to_string(), t_next);

            // ====== Validation ======

            validate_state(&state, step + 1)?;
            scenario.model.check_state(&state, step + 1, dt)?;

            // ====== Storage ======

            let last = step + 1 == time_steps;
            if (step + 1) % config.output_interval == 0 || last {
                time_points.push(t_next);
                state_trajectory.push(state.clone());
            }
        }

        // ====== Step 4: Build Result ======

        let mut result = SimulationResult::new(time_points, state_trajectory, state);

        result.add_metadata("solver", "Runge-Kutta 4");
        result.add_metadata("time steps", &time_steps.to_string());
        result.add_metadata("dt", &dt.to_string());
        result.add_metadata("total time", &total_time.to_string());

        Ok(result)
    }

    fn name(&self) -> &str {
        "Runge-Kutta 4"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
