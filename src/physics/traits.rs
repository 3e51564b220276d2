//! Physical models traits and types
//!
//! This module defines the core API for physical models:
//! - `PhysicalModel`: trait for all physical models
//! - `PhysicalState`: flexible state container
//! - `PhysicalQuantity`: type-safe quantity identifiers

use crate::error::PbeResult;
use crate::physics::PhysicalData;
use std::collections::HashMap;
use std::fmt;

// =================================================================================================
// Physical quantities (Type-safe Identifiers)
// =================================================================================================

/// Known physical quantities (type-safe enum)
///
/// States are keyed by quantity rather than by free-form strings so that
/// lookups stay type-checked.
///
/// # Example
/// ```
/// use popbal_rs::physics::{PhysicalData, PhysicalQuantity, PhysicalState};
///
/// let mut state = PhysicalState::empty();
/// state.set(PhysicalQuantity::NumberDensity, PhysicalData::uniform_matrix(100, 4, 0.0));
/// assert!(state.get(PhysicalQuantity::NumberDensity).is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalQuantity {
    /// Number density per group \[1/m³\], stored as a (cell, group) matrix
    NumberDensity,
}

impl fmt::Display for PhysicalQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalQuantity::NumberDensity => write!(f, "number density"),
        }
    }
}

// =================================================================================================
// Physical State (Flexible State Container)
// =================================================================================================

/// Physical state of the system
///
/// This structure contains all physical quantities at a given time or iteration.
/// For the population balance it carries the number-density arena, but any
/// additional quantity can be attached.
///
/// # Example
/// ```
/// use popbal_rs::physics::{PhysicalData, PhysicalQuantity, PhysicalState};
///
/// let mut state = PhysicalState::new(
///     PhysicalQuantity::NumberDensity,
///     PhysicalData::uniform_matrix(10, 3, 0.0),
/// );
/// state.set_metadata("time".to_string(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct PhysicalState {
    /// Physical quantities stored in a dictionary
    pub(crate) quantities: HashMap<PhysicalQuantity, PhysicalData>,

    /// Scalar metadata (optional, e.g. time)
    metadata: HashMap<String, f64>,
}

impl PhysicalState {
    /// Create a new state with primary quantity
    pub fn new(quantity: PhysicalQuantity, value: PhysicalData) -> Self {
        let mut quantities = HashMap::new();
        quantities.insert(quantity, value);

        Self {
            quantities,
            metadata: HashMap::new(),
        }
    }

    /// Create an empty state
    pub fn empty() -> Self {
        Self {
            quantities: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Get a quantity by type
    pub fn get(&self, quantity: PhysicalQuantity) -> Option<&PhysicalData> {
        self.quantities.get(&quantity)
    }

    /// Get mutable reference to a quantity
    pub fn get_mut(&mut self, quantity: PhysicalQuantity) -> Option<&mut PhysicalData> {
        self.quantities.get_mut(&quantity)
    }

    /// Set a quantity
    pub fn set(&mut self, quantity: PhysicalQuantity, value: PhysicalData) {
        self.quantities.insert(quantity, value);
    }

    /// List of available physical state quantities
    pub fn available_quantities(&self) -> Vec<PhysicalQuantity> {
        self.quantities.keys().cloned().collect()
    }

    /// True when the state carries no quantity at all
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Get a metadata
    pub fn get_metadata(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).copied()
    }

    /// Set a metadata
    pub fn set_metadata(&mut self, key: String, value: f64) {
        self.metadata.insert(key, value);
    }
}

// Operator overloading for numerical operations

impl std::ops::Add for PhysicalState {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        for (quantity, value) in rhs.quantities {
            match self.quantities.remove(&quantity) {
                Some(existing) => {
                    self.quantities.insert(quantity, existing + value);
                }
                None => {
                    self.quantities.insert(quantity, value);
                }
            }
        }
        self
    }
}

impl std::ops::Mul<f64> for PhysicalState {
    type Output = Self;

    fn mul(mut self, scalar: f64) -> Self::Output {
        let quantities = std::mem::take(&mut self.quantities);
        self.quantities = quantities
            .into_iter()
            .map(|(quantity, data)| (quantity, data * scalar))
            .collect();
        self
    }
}

// =================================================================================================
// Physical Model Trait
// =================================================================================================

/// Trait for physical models
///
/// # Responsibility
/// Computes the right-hand side of a system at a given state.
/// Does NOT integrate it (that's the Solver's job).
///
/// The model provides the "physics" (source terms), the Solver provides
/// the "numerics" (method to advance them).
pub trait PhysicalModel: Send + Sync {
    /// Number of mesh cells
    ///
    /// Used by the solver to allocate vectors
    fn points(&self) -> usize;

    /// Computes the physics at a given state
    ///
    /// Returns the time derivative f(y) of dy/dt = f(y). The returned state
    /// carries the same quantities as the input. The input state is a
    /// read-only snapshot: implementations must not depend on any value
    /// written during the same evaluation.
    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState;

    /// Creates the initial state for this physical model
    fn setup_initial_state(&self) -> PhysicalState;

    /// Name of the model (used to display and logging)
    fn name(&self) -> &str;

    /// Description of the model (option)
    fn description(&self) -> Option<&str> {
        None
    }

    /// Model-specific admissibility of a state produced by a solver
    ///
    /// Solvers call it after every step, once the state is known to be
    /// finite. `step` and `dt` only feed the diagnostic.
    fn check_state(&self, _state: &PhysicalState, _step: usize, _dt: f64) -> PbeResult<()> {
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_physical_state() {
        let physics = PhysicalState::empty();

        assert_eq!(physics.quantities.len(), 0);
        assert_eq!(physics.metadata.len(), 0);
        assert!(physics.is_empty());
    }

    #[test]
    fn test_new_physical_state() {
        let quantity = PhysicalQuantity::NumberDensity;
        let physics = PhysicalState::new(quantity, PhysicalData::from_vec(vec![1.0, 2.0]));

        assert_eq!(physics.quantities.len(), 1);
        assert!(physics.available_quantities().contains(&quantity));
        assert_eq!(physics.get(quantity).unwrap().len(), 2);
    }

    #[test]
    fn test_metadata() {
        let mut physics = PhysicalState::new(
            PhysicalQuantity::NumberDensity,
            PhysicalData::uniform_matrix(2, 2, 1.0),
        );

        physics.set_metadata("time".to_string(), 10.0);
        assert_eq!(physics.get_metadata("time").unwrap(), 10.0);
        assert!(physics.get_metadata("dt").is_none());
    }

    #[test]
    fn test_addition() {
        let state_one = PhysicalState::new(
            PhysicalQuantity::NumberDensity,
            PhysicalData::from_vec(vec![780.0, 1024.0]),
        );
        let state_two = PhysicalState::new(
            PhysicalQuantity::NumberDensity,
            PhysicalData::from_vec(vec![230.0, -24.0]),
        );

        let sum = state_one.clone() + state_two;
        let merged = PhysicalState::empty() + state_one;

        let n = sum.get(PhysicalQuantity::NumberDensity).unwrap().as_vector();
        assert_eq!(n[0], 1010.0);
        assert_eq!(n[1], 1000.0);

        // A quantity missing on the left is taken from the right
        assert_eq!(merged.available_quantities(), vec![PhysicalQuantity::NumberDensity]);
        assert_eq!(
            merged.get(PhysicalQuantity::NumberDensity).unwrap().as_vector()[1],
            1024.0
        );
    }

    #[test]
    fn test_multiplication() {
        let state = PhysicalState::new(
            PhysicalQuantity::NumberDensity,
            PhysicalData::uniform_matrix(2, 3, 2.0),
        );

        let scaled = state * 10.0;
        let matrix = scaled.get(PhysicalQuantity::NumberDensity).unwrap().as_matrix();
        assert!(matrix.iter().all(|&x| x == 20.0));
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!(PhysicalQuantity::NumberDensity.to_string(), "number density");
    }
}
