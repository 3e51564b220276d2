//! Daughter (fragment) distributions
//!
//! A daughter distribution says how many group-`i` particles one breakup of
//! a group-`k` particle produces: `N_ik`, defined for `v_i < v_k` only.
//! Every variant must conserve volume, `Σ_i N_ik v_i = v_k`; the
//! orchestrator checks this for every parent at construction.
//!
//! # Available Models
//!
//! ## `uniformBinary`
//!
//! Two fragments of exactly `v_k / 2`, placed with
//! [`GroupSet::apportion`] on groups `0..k`. Exact hits and lever-rule
//! splits conserve number (`Σ_i N_ik = 2`). When `v_k / 2` lies outside
//! `[v_0, v_{k-1}]` the fragments are lumped into the edge group by volume
//! and the parent is reported by [`DaughterDistributionModel::lumps_fragments`].
//!
//! ## `uniform`
//!
//! Binary breakup with a uniform daughter density `β(v | v_k) = 2 / v_k` on
//! `(0, v_k)`, projected on the groups below `k` with the same hat weights
//! as the lever rule (fixed-pivot projection):
//!
//! ```text
//! N_ik = ∫ β(v | v_k) w_i(v) dv
//! ```
//!
//! The tails `(0, v_0)` and `(v_{k-1}, v_k)` are projected with the volume
//! weights `v / v_0` and `v / v_{k-1}`. Volume is therefore conserved
//! exactly, while `Σ_i N_ik` deviates from 2 by construction of the
//! projection.

use std::fmt;

use crate::config::ModelSelection;
use crate::error::PbeResult;
use crate::models::groups::GroupSet;

/// Number of fragments per breakup event, per daughter group
pub trait DaughterDistributionModel: Send + Sync + fmt::Debug {
    /// Registry key
    fn name(&self) -> &str;

    /// Fragments produced per breakup event
    fn nominal_fragments(&self) -> f64;

    /// `N_ik`: group-`i` particles produced by one breakup of a group-`k` particle
    ///
    /// # Panics
    ///
    /// Calling it with `i >= k` is a contract violation.
    fn fragment_count(&self, i: usize, k: usize, groups: &GroupSet) -> f64;

    /// True when parent `k` cannot be split without lumping, i.e. when its
    /// fragments do not conserve number
    fn lumps_fragments(&self, _k: usize, _groups: &GroupSet) -> bool {
        false
    }
}

#[inline]
fn assert_daughter_below_parent(i: usize, k: usize, groups: &GroupSet) {
    assert!(
        i < k && k < groups.len(),
        "fragment count requested for daughter group {} of parent group {} (N = {})",
        i,
        k,
        groups.len()
    );
}

// =================================================================================================
// Uniform binary
// =================================================================================================

/// Two equal fragments of half the parent volume
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformBinary;

impl UniformBinary {
    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&[])?;
        Ok(Self)
    }
}

impl DaughterDistributionModel for UniformBinary {
    fn name(&self) -> &str {
        "uniformBinary"
    }

    fn nominal_fragments(&self) -> f64 {
        2.0
    }

    fn fragment_count(&self, i: usize, k: usize, groups: &GroupSet) -> f64 {
        assert_daughter_below_parent(i, k, groups);
        let fragment = 0.5 * groups.volume(k);
        2.0 * groups.apportion(fragment, k).weight_of(i)
    }

    fn lumps_fragments(&self, k: usize, groups: &GroupSet) -> bool {
        k > 0 && groups.apportion(0.5 * groups.volume(k), k).is_lumped()
    }
}

// =================================================================================================
// Uniform (continuous)
// =================================================================================================

/// Panels per linear piece in the Simpson rule
const SIMPSON_PANELS: usize = 8;

/// Uniform daughter density projected on the group grid
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl Uniform {
    pub fn from_selection(selection: &ModelSelection) -> PbeResult<Self> {
        selection.allow_only(&[])?;
        Ok(Self)
    }

    /// Daughter number density of a parent of volume `parent`
    #[inline]
    fn density(&self, v: f64, parent: f64) -> f64 {
        if (0.0..=parent).contains(&v) { 2.0 / parent } else { 0.0 }
    }
}

impl DaughterDistributionModel for Uniform {
    fn name(&self) -> &str {
        "uniform"
    }

    fn nominal_fragments(&self) -> f64 {
        2.0
    }

    fn fragment_count(&self, i: usize, k: usize, groups: &GroupSet) -> f64 {
        assert_daughter_below_parent(i, k, groups);

        let v = groups.volumes();
        let parent = v[k];
        let last = k - 1;
        let beta = |x: f64| self.density(x, parent);

        let mut count = 0.0;

        // (0, v_0): lumped into group 0 by volume
        if i == 0 {
            count += simpson(|x| beta(x) * x / v[0], 0.0, v[0]);
        }

        // Rising flank of the hat
        if i > 0 {
            let (lo, hi) = (v[i - 1], v[i]);
            count += simpson(|x| beta(x) * (x - lo) / (hi - lo), lo, hi);
        }

        // Falling flank of the hat
        if i < last {
            let (lo, hi) = (v[i], v[i + 1]);
            count += simpson(|x| beta(x) * (hi - x) / (hi - lo), lo, hi);
        }

        // (v_{k-1}, v_k): lumped into group k-1 by volume
        if i == last {
            count += simpson(|x| beta(x) * x / v[last], v[last], parent);
        }

        count
    }
}

/// Composite Simpson rule on `[a, b]`
fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64) -> f64 {
    let h = (b - a) / SIMPSON_PANELS as f64;
    let mut sum = f(a) + f(b);
    for panel in 1..SIMPSON_PANELS {
        let weight = if panel % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(a + panel as f64 * h);
    }
    sum * h / 3.0
}

// =================================================================================================
// Tests
// =================================================================================================
