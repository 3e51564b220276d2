//! Shape closures: group volume → diameter and surface area
//!
//! # Available Models
//!
//! - [`Spherical`] (`spherical`): `d = (6v/π)^(1/3)`, `a = πd² = 6v/d`
//! - [`NonSpherical`] (`nonSpherical`): spherical diameter, area scaled by a
//!   constant `factor`
//!
//! Volumes are validated when the [`GroupSet`](crate::models::GroupSet) is
//! built, so evaluation never sees a non-positive volume.

use std::f64::consts::PI;
use std::fmt;

use nalgebra::DVector;

use crate::config::ModelSelection;
use crate::error::PbeResult;
use crate::models::groups::Group;

/// Geometric closure of a group
///
/// The cell index lets variants carry per-cell state (e.g. a transported
/// shape parameter); both built-in variants ignore it.
pub trait ShapeModel: Send + Sync + fmt::Debug {
    /// Registry key
    fn name(&self) -> &str;

    /// Equivalent diameter \[m\]
    fn diameter(&self, group: &Group, cell: usize) -> f64;

    /// Surface area of one particle \[m²\]
    fn area(&self, group: &Group, cell: usize) -> f64;

    /// Diameter of `group` in every cell
    fn diameter_field(&self, group: &Group, n_cells: usize) -> DVector<f64> {
        DVector::from_fn(n_cells, |cell, _| self.diameter(group, cell))
    }
}

// =================================================================================================
// Spherical
// =================================================================================================

/// Volume-equivalent sphere
#[derive(Debug, Clone, Copy, Default)]
pub struct Spherical;

impl Spherical {
    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&[])?;
        Ok(Self)
    }

    #[inline]
    pub fn diameter_of(volume: f64) -> f64 {
        (6.0 * volume / PI).cbrt()
    }

    #[inline]
    pub fn area_of(volume: f64) -> f64 {
        6.0 * volume / Self::diameter_of(volume)
    }
}

impl ShapeModel for Spherical {
    fn name(&self) -> &str {
        "spherical"
    }

    fn diameter(&self, group: &Group, _cell: usize) -> f64 {
        Self::diameter_of(group.volume)
    }

    fn area(&self, group: &Group, _cell: usize) -> f64 {
        Self::area_of(group.volume)
    }
}

// =================================================================================================
// Non-spherical
// =================================================================================================

/// Sphere-equivalent diameter with a constant area correction
///
/// Parameters: `factor > 0` (ratio of the actual to the spherical area).
#[derive(Debug, Clone, Copy)]
pub struct NonSpherical {
    sphere: Spherical,
    factor: f64,
}

impl NonSpherical {
    pub fn new(factor: f64) -> Self {
        assert!(
            factor > 0.0 && factor.is_finite(),
            "Area factor must be positive, got {}",
            factor
        );
        Self {
            sphere: Spherical,
            factor,
        }
    }

    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&["factor"])?;
        Ok(Self::new(selection.require_positive("factor")?))
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl ShapeModel for NonSpherical {
    fn name(&self) -> &str {
        "nonSpherical"
    }

    fn diameter(&self, group: &Group, cell: usize) -> f64 {
        self.sphere.diameter(group, cell)
    }

    fn area(&self, group: &Group, cell: usize) -> f64 {
        self.factor * self.sphere.area(group, cell)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
