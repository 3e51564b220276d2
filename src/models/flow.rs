//! Per-cell flow fields supplied by the surrounding solver
//!
//! Turbulence and thermophysics are external: they only hand the population
//! balance a few per-cell fields. [`CellContext`] bundles what one closure
//! evaluation may read for one cell.

use nalgebra::DVector;

use crate::error::{PbeError, PbeResult};
use crate::models::groups::Group;
use crate::models::shape::ShapeModel;

/// Fields of the continuous and dispersed phases, one value per cell
#[derive(Debug, Clone, PartialEq)]
pub struct FlowFields {
    /// Turbulent dissipation rate ε \[m²/s³\]
    pub turbulent_dissipation: DVector<f64>,

    /// Continuous phase density \[kg/m³\]
    pub continuous_density: DVector<f64>,

    /// Continuous phase dynamic viscosity \[Pa·s\]
    pub continuous_viscosity: DVector<f64>,

    /// Dispersed phase density \[kg/m³\]
    pub dispersed_density: DVector<f64>,
}

impl FlowFields {
    /// Spatially uniform fields
    pub fn uniform(
        n_cells: usize,
        turbulent_dissipation: f64,
        continuous_density: f64,
        continuous_viscosity: f64,
        dispersed_density: f64,
    ) -> Self {
        Self {
            turbulent_dissipation: DVector::from_element(n_cells, turbulent_dissipation),
            continuous_density: DVector::from_element(n_cells, continuous_density),
            continuous_viscosity: DVector::from_element(n_cells, continuous_viscosity),
            dispersed_density: DVector::from_element(n_cells, dispersed_density),
        }
    }

    /// Water-like fluids at rest (ε = 0)
    pub fn quiescent(n_cells: usize) -> Self {
        Self::uniform(n_cells, 0.0, 1000.0, 1.0e-3, 1000.0)
    }

    pub fn n_cells(&self) -> usize {
        self.turbulent_dissipation.len()
    }

    /// Check every field has `n_cells` finite entries in its physical range
    ///
    /// Densities and viscosity must be positive, ε must not be negative.
    pub fn validate(&self, n_cells: usize) -> PbeResult<()> {
        let fields = [
            ("turbulent dissipation", &self.turbulent_dissipation, false),
            ("continuous density", &self.continuous_density, true),
            ("continuous viscosity", &self.continuous_viscosity, true),
            ("dispersed density", &self.dispersed_density, true),
        ];

        for (what, field, strictly_positive) in fields {
            if field.len() != n_cells {
                return Err(PbeError::SizeMismatch {
                    what: what.to_string(),
                    expected: n_cells,
                    found: field.len(),
                });
            }
            if let Some(cell) = field.iter().position(|x| !x.is_finite()) {
                return Err(PbeError::InvalidConfiguration(format!(
                    "{} is not finite in cell {}",
                    what, cell
                )));
            }
            let out_of_range = |x: &f64| if strictly_positive { *x <= 0.0 } else { *x < 0.0 };
            if let Some(cell) = field.iter().position(out_of_range) {
                return Err(PbeError::InvalidConfiguration(format!(
                    "{} must be {} in cell {}, got {}",
                    what,
                    if strictly_positive { "positive" } else { "non-negative" },
                    cell,
                    field[cell]
                )));
            }
        }

        Ok(())
    }
}

/// Everything a closure may read for one cell
#[derive(Clone, Copy)]
pub struct CellContext<'a> {
    pub cell: usize,
    pub flow: &'a FlowFields,
    pub shape: &'a dyn ShapeModel,

    /// Local dispersed volume fraction `Σ_i n_i v_i` of the start-of-step snapshot
    pub dispersed_fraction: f64,
}

impl<'a> CellContext<'a> {
    pub fn new(
        cell: usize,
        flow: &'a FlowFields,
        shape: &'a dyn ShapeModel,
        dispersed_fraction: f64,
    ) -> Self {
        Self {
            cell,
            flow,
            shape,
            dispersed_fraction,
        }
    }

    #[inline]
    pub fn turbulent_dissipation(&self) -> f64 {
        self.flow.turbulent_dissipation[self.cell]
    }

    #[inline]
    pub fn continuous_density(&self) -> f64 {
        self.flow.continuous_density[self.cell]
    }

    #[inline]
    pub fn continuous_viscosity(&self) -> f64 {
        self.flow.continuous_viscosity[self.cell]
    }

    #[inline]
    pub fn dispersed_density(&self) -> f64 {
        self.flow.dispersed_density[self.cell]
    }

    /// Diameter of `group` in this cell
    #[inline]
    pub fn diameter(&self, group: &Group) -> f64 {
        self.shape.diameter(group, self.cell)
    }

    /// Surface area of `group` in this cell
    #[inline]
    pub fn area(&self, group: &Group) -> f64 {
        self.shape.area(group, self.cell)
    }
}

impl std::fmt::Debug for CellContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellContext")
            .field("cell", &self.cell)
            .field("shape", &self.shape.name())
            .field("dispersed fraction", &self.dispersed_fraction)
            .finish()
    }
}
