//! Population balance models
//!
//! The orchestrator [`PopulationBalanceModel`] implements the
//! [`PhysicalModel`](crate::physics::PhysicalModel) trait, so the generic
//! solvers can advance it; it also offers its own one-step update
//! ([`PopulationBalanceModel::solve_step`]) for coupling with an external
//! flow solver.
//!
//! # Model Families
//!
//! Each family is a trait with several variants, selected at run time by
//! key through the [`ModelRegistry`]:
//!
//! | family | trait | keys |
//! |--------|-------|------|
//! | breakup rate | [`BreakupRateModel`] | `exponential`, `powerLaw`, `coulaloglouTavlarides` |
//! | daughter distribution | [`DaughterDistributionModel`] | `uniformBinary`, `uniform` |
//! | shape | [`ShapeModel`] | `spherical`, `nonSpherical` |
//! | coalescence rate | [`CoalescenceRateModel`] | `constant`, `hydrodynamic` |
//!
//! # Data
//!
//! - [`GroupSet`]: size groups and the `cells × groups` number-density arena
//! - [`FlowFields`]: per-cell fields supplied by the flow solver
//! - [`GroupSources`]: birth/death sources of one assembly

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod breakup;
pub mod coalescence;
pub mod daughter;
pub mod flow;
pub mod groups;
pub mod population_balance;
pub mod registry;
pub mod shape;
pub mod sources;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use breakup::{BreakupRateModel, CoulaloglouTavlarides, Exponential, PowerLaw};
pub use coalescence::{CoalescenceRateModel, ConstantKernel, HydrodynamicKernel};
pub use daughter::{DaughterDistributionModel, Uniform, UniformBinary};
pub use flow::{CellContext, FlowFields};
pub use groups::{Group, GroupSet, Placement};
pub use population_balance::{Coalescence, PopulationBalanceModel};
pub use registry::ModelRegistry;
pub use shape::{NonSpherical, ShapeModel, Spherical};
pub use sources::GroupSources;
