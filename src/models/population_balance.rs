//! Population balance orchestrator
//!
//! [`PopulationBalanceModel`] owns the [`GroupSet`] and one shared instance
//! per model family. Once per outer step it assembles, cell by cell and
//! against one start-of-step snapshot of the number densities:
//!
//! ```text
//! death_i = rate_i · n_i
//! birth_i = Σ_{k > i} N_ik · rate_k · n_k
//! source_i = birth_i - death_i
//! ```
//!
//! plus, when a coalescence kernel is configured, the pair terms
//! `s_ij K_ij n_i n_j` with the merged particle placed on the grid by
//! [`GroupSet::apportion`].
//!
//! The fragment matrix `N_ik` depends on the group volumes only and is
//! computed once at construction, where volume conservation of the daughter
//! distribution is verified for every parent.
//!
//! The smallest group has no daughter group: its breakup is a pure sink
//! (this is what makes a single-group set decay monotonically).
//!
//! # Example
//!
//! ```rust
//! use popbal_rs::config::PopulationBalanceConfig;
//! use popbal_rs::models::{ModelRegistry, PopulationBalanceModel};
//!
//! let config = PopulationBalanceConfig::from_json_str(r#"{
//!     "groups": { "rule": "explicit", "volumes": [1.0, 2.0, 4.0] },
//!     "breakupRateModel": { "model": "exponential", "C": 1.0, "exponent": 0.0 },
//!     "daughterDistributionModel": { "model": "uniformBinary" },
//!     "initialNumberDensity": [0.0, 0.0, 10.0]
//! }"#).unwrap();
//!
//! let model = PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 1).unwrap();
//! let sources = model.assemble_sources();
//!
//! assert_eq!(sources.net_at(0, 1), 20.0);
//! assert_eq!(sources.net_at(0, 2), -10.0);
//! ```

use std::sync::Arc;

use log::{debug, info, trace, warn};
use nalgebra::{DMatrix, DVector};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{PopulationBalanceConfig, SourceTreatment};
use crate::error::{PbeError, PbeResult};
use crate::models::breakup::BreakupRateModel;
use crate::models::coalescence::CoalescenceRateModel;
use crate::models::daughter::DaughterDistributionModel;
use crate::models::flow::{CellContext, FlowFields};
use crate::models::groups::{GroupSet, Placement, first_inadmissible};
use crate::models::registry::ModelRegistry;
use crate::models::shape::ShapeModel;
use crate::models::sources::GroupSources;
use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};

#[cfg(feature = "parallel")]
use crate::solver::parallel_threshold;

/// Relative tolerance of the fragment volume balance `Σ_i N_ik v_i = v_k`
pub const CONSERVATION_TOLERANCE: f64 = 1e-10;

// =================================================================================================
// Coalescence capability
// =================================================================================================

/// Coalescence kernel plus the precomputed placement of every merged pair
#[derive(Debug, Clone)]
pub struct Coalescence {
    kernel: Arc<dyn CoalescenceRateModel>,

    /// Placement of `v_i + v_j`, row-major over `i <= j`
    products: Vec<Placement>,
    n_groups: usize,
}

impl Coalescence {
    fn new(kernel: Arc<dyn CoalescenceRateModel>, groups: &GroupSet) -> Self {
        let n = groups.len();
        let mut products = Vec::with_capacity(n * (n + 1) / 2);

        for i in 0..n {
            for j in i..n {
                let merged = groups.volume(i) + groups.volume(j);
                products.push(groups.apportion(merged, n));
            }
        }

        let lumped = products.iter().filter(|p| p.is_lumped()).count();
        if lumped > 0 {
            debug!(
                "Coalescence '{}': {} pair products exceed the largest group and are lumped",
                kernel.name(),
                lumped
            );
        }

        Self {
            kernel,
            products,
            n_groups: n,
        }
    }

    pub fn kernel(&self) -> &Arc<dyn CoalescenceRateModel> {
        &self.kernel
    }

    /// Placement of the particle formed by merging groups `i` and `j`
    pub fn product(&self, i: usize, j: usize) -> &Placement {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        // Rows 0..i hold n, n-1, ..., n-i+1 pairs
        let offset = i * self.n_groups - i * (i.saturating_sub(1)) / 2;
        &self.products[offset + (j - i)]
    }
}

/// Sources of one cell
struct CellSources {
    birth: Vec<f64>,
    death: Vec<f64>,
    rate: Vec<f64>,
}

// =================================================================================================
// Orchestrator
// =================================================================================================

/// Discretized population balance over a set of mesh cells
#[derive(Debug, Clone)]
pub struct PopulationBalanceModel {
    config: PopulationBalanceConfig,
    groups: GroupSet,
    flow: FlowFields,

    breakup: Arc<dyn BreakupRateModel>,
    daughter: Arc<dyn DaughterDistributionModel>,
    shape: Arc<dyn ShapeModel>,
    coalescence: Option<Coalescence>,

    /// N_ik, zero on and below the diagonal
    fragments: DMatrix<f64>,

    time: f64,
    step: usize,
}

impl PopulationBalanceModel {
    /// Build the model for `n_cells` cells
    ///
    /// Every configuration error is reported here, before any stepping:
    /// bad group volumes, unknown model keys, missing parameters, size
    /// mismatches and daughter distributions that do not conserve volume.
    ///
    /// Flow fields start [`quiescent`](FlowFields::quiescent); the solver
    /// coupling replaces them with [`set_flow_fields`](Self::set_flow_fields).
    pub fn from_config(
        config: &PopulationBalanceConfig,
        registry: &ModelRegistry,
        n_cells: usize,
    ) -> PbeResult<Self> {
        config.validate()?;

        let mut groups = GroupSet::new(&config.groups.volumes()?, n_cells)?;
        if let Some(initial) = &config.initial_number_density {
            groups.set_uniform(initial)?;
        }

        let breakup = registry.create_breakup(&config.breakup_rate_model)?;
        let daughter = registry.create_daughter(&config.daughter_distribution_model)?;
        let shape = registry.create_shape(&config.shape_model)?;
        let coalescence = match &config.coalescence_rate_model {
            Some(selection) => Some(Coalescence::new(
                registry.create_coalescence(selection)?,
                &groups,
            )),
            None => None,
        };

        let fragments = fragment_matrix(daughter.as_ref(), &groups)?;

        info!(
            "Population balance '{}': {} groups in {} cells, breakup '{}', daughter '{}', shape '{}', coalescence {}",
            config.name,
            groups.len(),
            n_cells,
            breakup.name(),
            daughter.name(),
            shape.name(),
            coalescence
                .as_ref()
                .map_or("none", |c| c.kernel.name())
        );

        Ok(Self {
            config: config.clone(),
            groups,
            flow: FlowFields::quiescent(n_cells),
            breakup,
            daughter,
            shape,
            coalescence,
            fragments,
            time: 0.0,
            step: 0,
        })
    }

    // ========================================= Accessors =========================================

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &PopulationBalanceConfig {
        &self.config
    }

    pub fn groups(&self) -> &GroupSet {
        &self.groups
    }

    pub fn n_cells(&self) -> usize {
        self.groups.n_cells()
    }

    pub fn flow(&self) -> &FlowFields {
        &self.flow
    }

    pub fn breakup_model(&self) -> &Arc<dyn BreakupRateModel> {
        &self.breakup
    }

    pub fn daughter_model(&self) -> &Arc<dyn DaughterDistributionModel> {
        &self.daughter
    }

    pub fn shape_model(&self) -> &Arc<dyn ShapeModel> {
        &self.shape
    }

    /// True when a coalescence kernel is configured
    pub fn has_coalescence(&self) -> bool {
        self.coalescence.is_some()
    }

    pub fn coalescence(&self) -> Option<&Coalescence> {
        self.coalescence.as_ref()
    }

    /// Fragment matrix `N_ik` (daughter `i`, parent `k`)
    pub fn fragment_matrix(&self) -> &DMatrix<f64> {
        &self.fragments
    }

    pub fn source_treatment(&self) -> SourceTreatment {
        self.config.source_treatment
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub(crate) fn set_clock(&mut self, time: f64, step: usize) {
        self.time = time;
        self.step = step;
    }

    // ========================================= Mutation ==========================================

    /// Replace the per-cell flow fields
    pub fn set_flow_fields(&mut self, flow: FlowFields) -> PbeResult<()> {
        flow.validate(self.n_cells())?;
        self.flow = flow;
        Ok(())
    }

    /// Replace the whole number-density arena (`cells × groups`)
    pub fn set_number_density(&mut self, number_density: DMatrix<f64>) -> PbeResult<()> {
        self.groups.set_number_density(number_density)
    }

    /// Replace the number density of one group
    pub fn set_group_number_density(&mut self, group: usize, field: &DVector<f64>) -> PbeResult<()> {
        self.groups.set_group_number_density(group, field)
    }

    // ========================================= Assembly ==========================================

    /// Birth and death sources of the current fields
    pub fn assemble_sources(&self) -> GroupSources {
        self.assemble_from(self.groups.number_density())
    }

    /// Birth and death sources of an arbitrary snapshot `[cell, group]`
    ///
    /// Every cell only reads its own row of `snapshot`, and results go to
    /// fresh matrices, so cells are independent.
    ///
    /// # Panics
    ///
    /// When the snapshot shape differs from the arena, or when a closure
    /// returns a negative or non-finite rate.
    pub fn assemble_from(&self, snapshot: &DMatrix<f64>) -> GroupSources {
        #[cfg(feature = "parallel")]
        let parallel_from = parallel_threshold();
        #[cfg(not(feature = "parallel"))]
        let parallel_from = usize::MAX;

        self.assemble_cells(snapshot, parallel_from)
    }

    /// Assembly that hands cells to rayon once `n_cells >= parallel_from`
    #[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
    fn assemble_cells(&self, snapshot: &DMatrix<f64>, parallel_from: usize) -> GroupSources {
        assert_eq!(
            snapshot.shape(),
            self.groups.number_density().shape(),
            "Number density snapshot must be cells × groups"
        );

        let n_cells = snapshot.nrows();
        let n_groups = snapshot.ncols();

        #[cfg(feature = "parallel")]
        let per_cell: Vec<CellSources> = if n_cells >= parallel_from {
            (0..n_cells)
                .into_par_iter()
                .map(|cell| self.cell_sources(cell, snapshot))
                .collect()
        } else {
            (0..n_cells)
                .map(|cell| self.cell_sources(cell, snapshot))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let per_cell: Vec<CellSources> = (0..n_cells)
            .map(|cell| self.cell_sources(cell, snapshot))
            .collect();

        let mut birth = DMatrix::zeros(n_cells, n_groups);
        let mut death = DMatrix::zeros(n_cells, n_groups);
        let mut rate = DMatrix::zeros(n_cells, n_groups);

        for (cell, sources) in per_cell.into_iter().enumerate() {
            for group in 0..n_groups {
                birth[(cell, group)] = sources.birth[group];
                death[(cell, group)] = sources.death[group];
                rate[(cell, group)] = sources.rate[group];
            }
        }

        GroupSources::from_parts(birth, death, rate)
    }

    fn cell_sources(&self, cell: usize, snapshot: &DMatrix<f64>) -> CellSources {
        let groups = self.groups.groups();
        let n_groups = groups.len();
        let n: Vec<f64> = snapshot.row(cell).iter().copied().collect();

        let dispersed_fraction: f64 = n.iter().zip(self.groups.volumes()).map(|(n, v)| n * v).sum();
        let context = CellContext::new(cell, &self.flow, self.shape.as_ref(), dispersed_fraction);

        // ====== Breakup ======

        let rates: Vec<f64> = groups
            .iter()
            .map(|group| {
                let rate = self.breakup.rate(group, &context);
                assert!(
                    rate >= 0.0 && rate.is_finite(),
                    "Breakup rate model '{}' returned {} for group {} in cell {}",
                    self.breakup.name(),
                    rate,
                    group.index,
                    cell
                );
                rate
            })
            .collect();

        let mut death: Vec<f64> = rates.iter().zip(&n).map(|(r, n)| r * n).collect();
        let mut rate = rates.clone();
        let mut birth = vec![0.0; n_groups];

        for (i, birth_i) in birth.iter_mut().enumerate() {
            *birth_i = (i + 1..n_groups)
                .map(|k| self.fragments[(i, k)] * rates[k] * n[k])
                .sum();
        }

        // ====== Coalescence ======

        if let Some(coalescence) = &self.coalescence {
            for i in 0..n_groups {
                for j in i..n_groups {
                    let kernel = coalescence.kernel.kernel(&groups[i], &groups[j], &context);
                    assert!(
                        kernel >= 0.0 && kernel.is_finite(),
                        "Coalescence rate model '{}' returned {} for groups ({}, {}) in cell {}",
                        coalescence.kernel.name(),
                        kernel,
                        i,
                        j,
                        cell
                    );

                    // Each partner dies at K n_other
                    rate[i] += kernel * n[j];
                    death[i] += kernel * n[i] * n[j];
                    if i != j {
                        rate[j] += kernel * n[i];
                        death[j] += kernel * n[i] * n[j];
                    }

                    let symmetry = if i == j { 0.5 } else { 1.0 };
                    let events = symmetry * kernel * n[i] * n[j];
                    if events != 0.0 {
                        coalescence
                            .product(i, j)
                            .for_each_share(|target, weight| birth[target] += events * weight);
                    }
                }
            }
        }

        CellSources { birth, death, rate }
    }

    // ===================================== Built-in stepping =====================================

    /// Advance the owned fields by `dt` with the configured source treatment
    ///
    /// - `explicit`: `n + dt · (birth - death)`; a negative result is a
    ///   numerical error (reduce `dt`), never clamped
    /// - `linearizedImplicit`: `(n + dt · birth) / (1 + dt · rate)`
    ///
    /// Returns the sources used for the step.
    pub fn solve_step(&mut self, dt: f64) -> PbeResult<GroupSources> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(PbeError::InvalidConfiguration(format!(
                "time step must be positive, got {}",
                dt
            )));
        }

        let sources = self.assemble_sources();
        let current = self.groups.number_density();
        let step = self.step + 1;

        let updated = match self.config.source_treatment {
            SourceTreatment::Explicit => current + sources.net() * dt,
            SourceTreatment::LinearizedImplicit => {
                let mut updated = current.clone();
                for ((n, birth), rate) in updated
                    .iter_mut()
                    .zip(sources.birth().iter())
                    .zip(sources.death_rate().iter())
                {
                    *n = (*n + dt * birth) / (1.0 + dt * rate);
                }
                updated
            }
        };

        check_number_density(&updated, step, dt)?;

        let volume_residual = sources
            .volume_source(self.groups.volumes())
            .iter()
            .fold(0.0_f64, |max, x| max.max(x.abs()));
        trace!(
            "{}: step {} (dt = {:e}), max |volume source| = {:e}",
            self.config.name,
            step,
            dt,
            volume_residual
        );

        self.groups.set_number_density(updated)?;
        self.time += dt;
        self.step = step;

        Ok(sources)
    }

    // ===================================== Aggregate moments =====================================

    /// `Σ_i n_i` per cell
    pub fn total_number_density(&self) -> DVector<f64> {
        DVector::from_fn(self.n_cells(), |cell, _| self.groups.total_number_density(cell))
    }

    /// `Σ_i n_i v_i` per cell
    pub fn total_volume_fraction(&self) -> DVector<f64> {
        DVector::from_fn(self.n_cells(), |cell, _| self.groups.total_volume_fraction(cell))
    }

    /// Volume fraction of one group
    pub fn volume_fraction(&self, group: usize) -> DVector<f64> {
        self.groups.volume_fraction(group)
    }

    /// Interfacial area density `Σ_i n_i a_i` \[1/m\]
    pub fn interfacial_area_density(&self) -> DVector<f64> {
        let n = self.groups.number_density();
        DVector::from_fn(self.n_cells(), |cell, _| {
            self.groups
                .groups()
                .iter()
                .map(|group| n[(cell, group.index)] * self.shape.area(group, cell))
                .sum()
        })
    }

    /// Sauter-mean diameter `d32 = 6 α / a_int`; 0 in cells without dispersed phase
    pub fn sauter_mean_diameter(&self) -> DVector<f64> {
        let alpha = self.total_volume_fraction();
        let area = self.interfacial_area_density();
        alpha.zip_map(&area, |alpha, area| if area > 0.0 { 6.0 * alpha / area } else { 0.0 })
    }

    /// Shape-model diameter of one group in every cell
    pub fn group_diameter(&self, group: usize) -> DVector<f64> {
        self.shape
            .diameter_field(self.groups.group(group), self.n_cells())
    }

    /// Breakup rate of one group in every cell
    pub fn breakup_rate(&self, group: usize) -> DVector<f64> {
        self.breakup.rate_field(
            self.groups.group(group),
            &self.groups,
            &self.flow,
            self.shape.as_ref(),
        )
    }
}

// =================================================================================================
// Helpers
// =================================================================================================

/// `N_ik` for every parent, with the volume balance checked
fn fragment_matrix(
    daughter: &dyn DaughterDistributionModel,
    groups: &GroupSet,
) -> PbeResult<DMatrix<f64>> {
    let n = groups.len();
    let mut fragments = DMatrix::zeros(n, n);

    for k in 1..n {
        let parent = groups.volume(k);
        let mut volume = 0.0;

        for i in 0..k {
            let count = daughter.fragment_count(i, k, groups);
            assert!(
                count >= 0.0 && count.is_finite(),
                "Daughter distribution '{}' returned {} fragments of group {} for parent group {}",
                daughter.name(),
                count,
                i,
                k
            );
            fragments[(i, k)] = count;
            volume += count * groups.volume(i);
        }

        let residual = (volume - parent).abs() / parent;
        if residual > CONSERVATION_TOLERANCE {
            return Err(PbeError::ConservationViolated {
                model: daughter.name().to_string(),
                parent: k,
                residual,
            });
        }

        if daughter.lumps_fragments(k, groups) {
            let number: f64 = fragments.column(k).sum();
            warn!(
                "Daughter distribution '{}': fragments of group {} fall outside groups 0..{} and are lumped; \
                 {} fragments per event instead of {}",
                daughter.name(),
                k,
                k - 1,
                number,
                daughter.nominal_fragments()
            );
        }
    }

    debug!(
        "Fragment matrix of '{}' over {} groups: {} non-zero entries",
        daughter.name(),
        n,
        fragments.iter().filter(|&&x| x != 0.0).count()
    );

    Ok(fragments)
}

fn check_number_density(number_density: &DMatrix<f64>, step: usize, dt: f64) -> PbeResult<()> {
    match first_inadmissible(number_density) {
        Some((group, cell, value)) => Err(PbeError::Numerical {
            step,
            quantity: format!("number density of group {}", group),
            message: format!(
                "value {} in cell {} (dt = {:e}); reduce the time step or use linearizedImplicit",
                value, cell, dt
            ),
        }),
        None => Ok(()),
    }
}

// =================================================================================================
// Physical model
// =================================================================================================

impl PhysicalModel for PopulationBalanceModel {
    fn points(&self) -> usize {
        self.n_cells()
    }

    /// d n / dt = birth - death of the snapshot carried by `state`
    fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
        let snapshot = state
            .get(PhysicalQuantity::NumberDensity)
            .expect("Number density is required")
            .as_matrix();

        PhysicalState::new(
            PhysicalQuantity::NumberDensity,
            PhysicalData::Matrix(self.assemble_from(snapshot).net()),
        )
    }

    fn setup_initial_state(&self) -> PhysicalState {
        let mut state = PhysicalState::new(
            PhysicalQuantity::NumberDensity,
            PhysicalData::Matrix(self.groups.number_density().clone()),
        );
        state.set_metadata("time".to_string(), self.time);
        state
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn description(&self) -> Option<&str> {
        Some("Discretized population balance with breakup and optional coalescence")
    }

    /// Number densities must stay non-negative, exactly as in [`solve_step`](Self::solve_step)
    fn check_state(&self, state: &PhysicalState, step: usize, dt: f64) -> PbeResult<()> {
        match state.get(PhysicalQuantity::NumberDensity) {
            Some(PhysicalData::Matrix(number_density)) => check_number_density(number_density, step, dt),
            _ => Err(PbeError::Numerical {
                step,
                quantity: PhysicalQuantity::NumberDensity.to_string(),
                message: "state carries no (cell, group) number-density arena".to_string(),
            }),
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
