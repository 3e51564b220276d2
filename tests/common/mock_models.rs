//! Mock models for testing
//!
//! - `ExponentialDecay` has a known analytical solution, for solver accuracy
//! - `LargeOnly` and `LeakyDaughter` plug into the model registry, to exercise
//!   runtime registration and the construction-time checks

use std::sync::Arc;

use popbal_rs::config::ModelSelection;
use popbal_rs::error::PbeResult;
use popbal_rs::models::{
    BreakupRateModel, CellContext, DaughterDistributionModel, Group, GroupSet, ModelRegistry,
};
use popbal_rs::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};

// =================================================================================================
// Exponential Decay: dn/dt = -k*n
// =================================================================================================

/// Exponential decay model: dn/dt = -k*n
///
/// Analytical solution: n(t) = n₀ * exp(-k*t). The state is a single
/// per-cell field.
pub struct ExponentialDecay {
    pub points: usize,
    pub decay_rate: f64,
}

impl ExponentialDecay {
    pub fn new(points: usize, decay_rate: f64) -> Self {
        Self { points, decay_rate }
    }

    pub fn analytical_solution(&self, t: f64, n0: f64) -> f64 {
        n0 * (-self.decay_rate * t).exp()
    }
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
            PhysicalData::uniform_vector(self.points, 1.0),
        )
    }

    fn name(&self) -> &str {
        "Exponential Decay"
    }
}

// =================================================================================================
// Breakup of every group except the smallest
// =================================================================================================

/// Constant rate `C` for groups `1..N`, zero for group 0
///
/// The smallest group is a pure sink under breakup; switching its rate off
/// gives a population whose total volume is conserved exactly in time.
#[derive(Debug, Clone, Copy)]
pub struct LargeOnly {
    pub coefficient: f64,
}

impl BreakupRateModel for LargeOnly {
    fn name(&self) -> &str {
        "largeOnly"
    }

    fn rate(&self, group: &Group, _context: &CellContext<'_>) -> f64 {
        if group.index == 0 {
            0.0
        } else {
            self.coefficient
        }
    }
}

// =================================================================================================
// Daughter distribution that loses volume
// =================================================================================================

/// One fragment of the next smaller group per event, whatever the parent
#[derive(Debug, Clone, Copy)]
pub struct LeakyDaughter;

impl DaughterDistributionModel for LeakyDaughter {
    fn name(&self) -> &str {
        "leaky"
    }

    fn nominal_fragments(&self) -> f64 {
        1.0
    }

    fn fragment_count(&self, i: usize, k: usize, _groups: &GroupSet) -> f64 {
        assert!(i < k);
        if i + 1 == k { 1.0 } else { 0.0 }
    }
}

/// Built-in registry plus `largeOnly` (breakup, parameter `C`) and `leaky` (daughter)
pub fn registry_with_mocks() -> ModelRegistry {
    let mut registry = ModelRegistry::with_builtin();

    registry.register_breakup("largeOnly", |selection: &ModelSelection| -> PbeResult<Arc<dyn BreakupRateModel>> {
        selection.allow_only(&["C"])?;
        Ok(Arc::new(LargeOnly {
            coefficient: selection.require_non_negative("C")?,
        }))
    });
    registry.register_daughter("leaky", |_: &ModelSelection| -> PbeResult<Arc<dyn DaughterDistributionModel>> {
        Ok(Arc::new(LeakyDaughter))
    });

    registry
}
