//! Coalescence kernels
//!
//! Coalescence is the mirror image of breakup: two particles of groups `i`
//! and `j` merge into one of volume `v_i + v_j`. A kernel gives the pair
//! rate coefficient `K_ij` \[m³/s\]; the orchestrator turns it into the
//! event rate `s_ij K_ij n_i n_j` (`s_ii = 1/2`) and places the product with
//! [`GroupSet::apportion`](crate::models::GroupSet::apportion) over all
//! groups.
//!
//! # Available Models
//!
//! - `constant`: `K = C`
//! - `hydrodynamic`: `K = C (d_i + d_j)³`, diameters from the shape model

use std::fmt;

use crate::config::ModelSelection;
use crate::error::PbeResult;
use crate::models::flow::CellContext;
use crate::models::groups::Group;

/// Pair rate coefficient of coalescence, symmetric in its arguments
pub trait CoalescenceRateModel: Send + Sync + fmt::Debug {
    /// Registry key
    fn name(&self) -> &str;

    /// `K_ij >= 0`
    fn kernel(&self, first: &Group, second: &Group, context: &CellContext<'_>) -> f64;
}

/// `K = C`
#[derive(Debug, Clone, Copy)]
pub struct ConstantKernel {
    coefficient: f64,
}

impl ConstantKernel {
    pub fn new(coefficient: f64) -> Self {
        assert!(
            coefficient >= 0.0,
            "Coalescence coefficient must not be negative, got {}",
            coefficient
        );
        Self { coefficient }
    }

    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&["C"])?;
        Ok(Self::new(selection.require_non_negative("C")?))
    }
}

impl CoalescenceRateModel for ConstantKernel {
    fn name(&self) -> &str {
        "constant"
    }

    fn kernel(&self, _first: &Group, _second: &Group, _context: &CellContext<'_>) -> f64 {
        self.coefficient
    }
}

/// `K = C (d_i + d_j)³`
#[derive(Debug, Clone, Copy)]
pub struct HydrodynamicKernel {
    coefficient: f64,
}

impl HydrodynamicKernel {
    pub fn new(coefficient: f64) -> Self {
        assert!(
            coefficient >= 0.0,
            "Coalescence coefficient must not be negative, got {}",
            coefficient
        );
        Self { coefficient }
    }

    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&["C"])?;
        Ok(Self::new(selection.require_non_negative("C")?))
    }
}

impl CoalescenceRateModel for HydrodynamicKernel {
    fn name(&self) -> &str {
        "hydrodynamic"
    }

    fn kernel(&self, first: &Group, second: &Group, context: &CellContext<'_>) -> f64 {
        let reach = context.diameter(first) + context.diameter(second);
        self.coefficient * reach.powi(3)
    }
}
