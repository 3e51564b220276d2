//! Breakup rate closures
//!
//! A breakup rate model gives, for one group in one cell, the frequency
//! \[1/s\] at which a particle of that group breaks.
//!
//! # Available Models
//!
//! | key | rate |
//! |-----|------|
//! | `exponential` | `C · exp(exponent · v)` |
//! | `powerLaw` | `C · v^power` |
//! | `coulaloglouTavlarides` | turbulent breakup, see [`CoulaloglouTavlarides`] |
//!
//! Rates are never clamped by the orchestrator: a variant that needs a
//! limiting policy implements it itself and documents it.

use std::fmt;

use nalgebra::DVector;

use crate::config::ModelSelection;
use crate::error::PbeResult;
use crate::models::flow::{CellContext, FlowFields};
use crate::models::groups::{Group, GroupSet};
use crate::models::shape::ShapeModel;

/// Breakup frequency of a group
pub trait BreakupRateModel: Send + Sync + fmt::Debug {
    /// Registry key
    fn name(&self) -> &str;

    /// Breakup rate of `group` in the cell described by `context`, `>= 0`
    fn rate(&self, group: &Group, context: &CellContext<'_>) -> f64;

    /// Rate of `group` in every cell, against the current number densities
    fn rate_field(
        &self,
        group: &Group,
        groups: &GroupSet,
        flow: &FlowFields,
        shape: &dyn ShapeModel,
    ) -> DVector<f64> {
        DVector::from_fn(groups.n_cells(), |cell, _| {
            let context = CellContext::new(cell, flow, shape, groups.total_volume_fraction(cell));
            self.rate(group, &context)
        })
    }
}

// =================================================================================================
// Exponential
// =================================================================================================

/// `rate = C · exp(exponent · v)`, spatially uniform
#[derive(Debug, Clone, Copy)]
pub struct Exponential {
    coefficient: f64,
    exponent: f64,
}

impl Exponential {
    pub fn new(coefficient: f64, exponent: f64) -> Self {
        assert!(
            coefficient >= 0.0,
            "Breakup coefficient must not be negative, got {}",
            coefficient
        );
        Self {
            coefficient,
            exponent,
        }
    }

    /// Parameters: `C >= 0`, `exponent`
    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&["C", "exponent"])?;
        Ok(Self::new(
            selection.require_non_negative("C")?,
            selection.require("exponent")?,
        ))
    }
}

impl BreakupRateModel for Exponential {
    fn name(&self) -> &str {
        "exponential"
    }

    fn rate(&self, group: &Group, _context: &CellContext<'_>) -> f64 {
        self.coefficient * (self.exponent * group.volume).exp()
    }
}

// =================================================================================================
// Power law
// =================================================================================================

/// `rate = C · v^power`, spatially uniform
#[derive(Debug, Clone, Copy)]
pub struct PowerLaw {
    coefficient: f64,
    power: f64,
}

impl PowerLaw {
    pub fn new(coefficient: f64, power: f64) -> Self {
        assert!(
            coefficient >= 0.0,
            "Breakup coefficient must not be negative, got {}",
            coefficient
        );
        Self { coefficient, power }
    }

    /// Parameters: `C >= 0`, `power`
    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&["C", "power"])?;
        Ok(Self::new(
            selection.require_non_negative("C")?,
            selection.require("power")?,
        ))
    }
}

impl BreakupRateModel for PowerLaw {
    fn name(&self) -> &str {
        "powerLaw"
    }

    fn rate(&self, group: &Group, _context: &CellContext<'_>) -> f64 {
        self.coefficient * group.volume.powf(self.power)
    }
}

// =================================================================================================
// Coulaloglou & Tavlarides
// =================================================================================================

/// Turbulent breakup of drops (Coulaloglou & Tavlarides, 1977)
///
/// ```text
/// rate = C1 ε^(1/3) / ((1 + φ) d^(2/3))
///        · exp(-C2 σ (1 + φ)² / (ρ_d ε^(2/3) d^(5/3)))
/// ```
///
/// with `ε` the local dissipation, `φ` the local dispersed fraction, `d` the
/// shape-model diameter, `σ` the surface tension and `ρ_d` the dispersed
/// density.
///
/// Limiting policy: cells with `ε <= 0` have zero rate.
///
/// Parameters: `C1` (default 0.00481), `C2` (default 0.08),
/// `sigma` \[N/m\] (default 0.07).
#[derive(Debug, Clone, Copy)]
pub struct CoulaloglouTavlarides {
    c1: f64,
    c2: f64,
    surface_tension: f64,
}

impl CoulaloglouTavlarides {
    pub const DEFAULT_C1: f64 = 0.00481;
    pub const DEFAULT_C2: f64 = 0.08;
    pub const DEFAULT_SURFACE_TENSION: f64 = 0.07;

    pub fn new(c1: f64, c2: f64, surface_tension: f64) -> Self {
        assert!(c1 >= 0.0, "C1 must not be negative, got {}", c1);
        assert!(c2 >= 0.0, "C2 must not be negative, got {}", c2);
        assert!(
            surface_tension > 0.0,
            "Surface tension must be positive, got {}",
            surface_tension
        );
        Self {
            c1,
            c2,
            surface_tension,
        }
    }

    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&["C1", "C2", "sigma"])?;
        let c1 = selection.get_or("C1", Self::DEFAULT_C1);
        let c2 = selection.get_or("C2", Self::DEFAULT_C2);
        let sigma = selection.get_or("sigma", Self::DEFAULT_SURFACE_TENSION);

        if !(c1 >= 0.0 && c1.is_finite()) {
            return Err(selection.invalid("C1", c1, "must be finite and non-negative"));
        }
        if !(c2 >= 0.0 && c2.is_finite()) {
            return Err(selection.invalid("C2", c2, "must be finite and non-negative"));
        }
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(selection.invalid("sigma", sigma, "must be positive"));
        }

        Ok(Self::new(c1, c2, sigma))
    }
}

impl BreakupRateModel for CoulaloglouTavlarides {
    fn name(&self) -> &str {
        "coulaloglouTavlarides"
    }

    fn rate(&self, group: &Group, context: &CellContext<'_>) -> f64 {
        let epsilon = context.turbulent_dissipation();
        if epsilon <= 0.0 {
            return 0.0;
        }

        let d = context.diameter(group);
        let crowding = 1.0 + context.dispersed_fraction;

        let frequency = self.c1 * epsilon.cbrt() / (crowding * d.powf(2.0 / 3.0));
        let surface_energy = self.c2 * self.surface_tension * crowding * crowding
            / (context.dispersed_density() * epsilon.powf(2.0 / 3.0) * d.powf(5.0 / 3.0));

        frequency * (-surface_energy).exp()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
