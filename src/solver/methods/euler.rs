//! Forward Euler numerical solver
//!
//! # Mathematical Background
//!
//! The Forward Euler method is the simplest explicit time-stepping scheme
//! for ordinary differential equations `dy/dt = f(y, t)`:
//!
//! ```text
//! y_{n+1} = y_n + dt * f(y_n, t_n)
//! ```
//!
//! # Characteristics
//!
//! - **Order**: First-order accurate (error ~ O(dt))
//! - **Stability**: Conditionally stable (requires small time steps)
//! - **Complexity**: 1 function evaluation per step
//!
//! For a population balance driven by breakup only, one Euler step is
//! exactly the explicit source update: it conserves the total dispersed
//! volume to round-off because `Σ_i source_i v_i = 0` holds for every
//! right-hand side evaluation. It requires `dt · rate_max < 1` to keep
//! number densities non-negative.
//!
//! # Example
//!
//! ```rust,ignore
//! use popbal_rs::solver::{EulerSolver, Solver, SolverConfiguration};
//!
//! let solver = EulerSolver;
//! let config = SolverConfiguration::time_evolution(10.0, 1000);
//! let result = solver.solve(&scenario, &config)?;
//! ```

use log::debug;

use crate::error::PbeResult;
use crate::physics::PhysicalState;
use crate::solver;
use crate::solver::{Scenario, SimulationResult, Solver, SolverConfiguration};

// =================================================================================================
// Forward Euler Solver
// =================================================================================================

/// Forward Euler time-stepping solver
///
/// # Algorithm
///
/// 1. Start with initial state y_0
/// 2. For each time step n = 0, 1, 2, ..., N-1:
///    - Compute physics: k = f(y_n)
///    - Update state: y_{n+1} = y_n + dt * k
///    - Store trajectory point (every `output_interval` steps)
/// 3. Return the trajectory
///
/// # Stability
///
/// For linear problems dy/dt = λy, the stability condition is
/// `|1 + λ * dt| ≤ 1`. For breakup, λ is minus the largest breakup rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerSolver;

impl EulerSolver {
    /// Create a new Forward Euler solver
    ///
    /// # Example
    ///
    /// ```rust
    /// use popbal_rs::solver::{EulerSolver, Solver};
    ///
    /// let solver = EulerSolver::new();
    /// assert_eq!(solver.name(), "Forward Euler");
    /// ```
    pub fn new() -> Self {
        Self
    }
}

impl Solver for EulerSolver {
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
            "Forward Euler on '{}': {} steps, dt = {:e}",
            scenario.get_model_name(),
            time_steps,
            dt
        );

        // ====== Step 3: Time Integration ======

        for step in 0..time_steps {
            let t = dt * step as f64;
            state.set_metadata("time".to_string(), t);

            // y_{n+1} = y_n + dt * f(y_n, t_n)
            let physics: PhysicalState = scenario.model.compute_physics(&state);
            state = state + physics * dt;

            // Time computed from the index to avoid accumulating round-off
            let t_next = (step as f64 + 1.0) * dt;
            state.set_metadata("time".to_string(), t_next);

            solver::validate_state(&state, step + 1)?;
            scenario.model.check_state(&state, step + 1, dt)?;

            let last = step + 1 == time_steps;
            if (step + 1) % config.output_interval == 0 || last {
                time_points.push(t_next);
                state_trajectory.push(state.clone());
            }
        }

        // ====== Step 4: Build Result ======

        let mut result = SimulationResult::new(time_points, state_trajectory, state);

        result.add_metadata("solver", "Forward Euler");
        result.add_metadata("time steps", &time_steps.to_string());
        result.add_metadata("dt", &dt.to_string());
        result.add_metadata("total time", &total_time.to_string());

        Ok(result)
    }

    fn name(&self) -> &str {
        "Forward Euler"
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PbeError;
    use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity};
    use crate::solver::SolverConfiguration;

    // ====== Mock Models for Testing ======

    /// dn/dt = -k * n, analytical solution n(t) = n_0 exp(-k t)
    struct ExponentialDecay {
        points: usize,
        decay_rate: f64,
    }

    impl PhysicalModel for ExponentialDecay {
        fn points(&self) -> usize {
            self.points
        }

        fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
            let mut result = state.clone();
            if let Some(n) = result.get_mut(PhysicalQuantity::NumberDensity) {
                n.apply(|y| -self.decay_rate * y);
            }
            result
        }

        fn setup_initial_state(&self) -> PhysicalState {
            PhysicalState::new(
                PhysicalQuantity::NumberDensity,
                PhysicalData::uniform_matrix(self.points, 2, 1.0),
            )
        }

        fn name(&self) -> &str {
            "Exponential Decay"
        }
    }

    /// dn/dt = c
    struct ConstantGrowth {
        points: usize,
        growth_rate: f64,
    }

    impl PhysicalModel for ConstantGrowth {
        fn points(&self) -> usize {
            self.points
        }

        fn compute_physics(&self, _state: &PhysicalState) -> PhysicalState {
            PhysicalState::new(
                PhysicalQuantity::NumberDensity,
                PhysicalData::uniform_matrix(self.points, 2, self.growth_rate),
            )
        }

        fn setup_initial_state(&self) -> PhysicalState {
            PhysicalState::new(
                PhysicalQuantity::NumberDensity,
                PhysicalData::uniform_matrix(self.points, 2, 0.0),
            )
        }

        fn name(&self) -> &str {
            "Constant Growth"
        }
    }

    fn growth_scenario(points: usize, growth_rate: f64) -> Scenario {
        Scenario::from_model(Box::new(ConstantGrowth {
            points,
            growth_rate,
        }))
    }

    // ====== Configuration Tests ======

    #[test]
    fn test_euler_accepts_time_evolution() {
        let result = EulerSolver::new().solve(
            &growth_scenario(10, 1.0),
            &SolverConfiguration::time_evolution(10.0, 100),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_euler_rejects_zero_output_interval() {
        let config = SolverConfiguration::time_evolution(1.0, 10).with_output_interval(0);
        let err = EulerSolver::new()
            .solve(&growth_scenario(10, 1.0), &config)
            .unwrap_err();
        assert!(matches!(err, PbeError::InvalidConfiguration(_)));
    }

    // ====== Numerical Accuracy Tests ======

    #[test]
    fn test_euler_constant_growth_is_exact() {
        let total_time = 10.0;
        let result = EulerSolver::new()
            .solve(
                &growth_scenario(5, 2.0),
                &SolverConfiguration::time_evolution(total_time, 100),
            )
            .unwrap();

        assert!((result.time_points.last().unwrap() - total_time).abs() < 1e-10);

        let n = result
            .final_state
            .get(PhysicalQuantity::NumberDensity)
            .unwrap()
            .as_matrix();
        assert!((n[(0, 0)] - 20.0).abs() < 1e-10);
        assert_eq!(result.final_state.get_metadata("time"), Some(total_time));
    }

    #[test]
    fn test_euler_exponential_decay_first_order() {
        let scenario = Scenario::from_model(Box::new(ExponentialDecay {
            points: 3,
            decay_rate: 1.0,
        }));

        let error = |steps: usize| {
            let result = EulerSolver::new()
                .solve(&scenario, &SolverConfiguration::time_evolution(1.0, steps))
                .unwrap();
            let n = result
                .final_state
                .get(PhysicalQuantity::NumberDensity)
                .unwrap()
                .as_matrix()[(0, 0)];
            (n - (-1.0_f64).exp()).abs()
        };

        // Halving dt roughly halves the error
        let ratio = error(100) / error(200);
        assert!(ratio > 1.8 && ratio < 2.2, "ratio = {}", ratio);
    }

    #[test]
    fn test_euler_output_interval() {
        let config = SolverConfiguration::time_evolution(1.0, 10).with_output_interval(4);
        let result = EulerSolver::new()
            .solve(&growth_scenario(1, 1.0), &config)
            .unwrap();

        // t = 0, 0.4, 0.8 and the final state at 1.0
        assert_eq!(result.len(), 4);
        assert!((result.time_points[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_euler_detects_overflow() {
        let scenario = growth_scenario(1, f64::MAX);
        let err = EulerSolver::new()
            .solve(&scenario, &SolverConfiguration::time_evolution(10.0, 10))
            .unwrap_err();
        assert!(matches!(err, PbeError::Numerical { .. }));
    }

    #[test]
    fn test_euler_metadata() {
        let result = EulerSolver::new()
            .solve(&growth_scenario(1, 1.0), &SolverConfiguration::time_evolution(1.0, 4))
            .unwrap();
        assert_eq!(result.get_metadata("solver"), Some("Forward Euler"));
        assert_eq!(result.get_metadata("time steps"), Some("4"));
    }
}
