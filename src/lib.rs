//! popbal-rs: Discretized Population Balance Engine
//!
//! Tracks the size distribution of a dispersed phase (bubbles, droplets,
//! particles) carried by a continuous flow. The distribution is discretized
//! into size groups; breakup and optional coalescence move number density
//! between groups while conserving the total dispersed volume.
//!
//! # Architecture
//!
//! popbal-rs is built on two core principles:
//!
//! 1. **Separation of Physics and Numerics**
//!    - The population balance model assembles sources (what to solve)
//!    - Numerical solvers provide time integration (how to solve)
//!
//! 2. **Pluggable closures**
//!    - Breakup rate, daughter distribution, shape and coalescence laws are
//!      traits selected by key through a [`ModelRegistry`](models::ModelRegistry)
//!    - Every configuration error is reported at construction, before stepping
//!
//! # Quick Start
//!
//! ```rust
//! use popbal_rs::prelude::*;
//!
//! # fn main() -> PbeResult<()> {
//! // 1. Configure the population balance
//! let config = PopulationBalanceConfig::from_json_str(r#"{
//!     "name": "column",
//!     "groups": { "rule": "explicit", "volumes": [1.0, 2.0, 4.0] },
//!     "breakupRateModel": { "model": "exponential", "C": 1.0, "exponent": 0.0 },
//!     "daughterDistributionModel": { "model": "uniformBinary" },
//!     "initialNumberDensity": [0.0, 0.0, 10.0]
//! }"#)?;
//!
//! // 2. Build the model for a 4-cell mesh
//! let mut model = PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 4)?;
//!
//! // 3. Sources for the flow solver, or a step of the built-in update
//! let sources = model.assemble_sources();
//! assert_eq!(sources.net_at(0, 1), 20.0);
//!
//! model.solve_step(0.01)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Serializable configuration tree
//! - [`error`]: Crate error type
//! - [`models`]: Size groups, model families and the orchestrator
//! - [`physics`]: Generic physical model interface used by the solvers
//! - [`solver`]: Numerical solvers (methods)
//! - [`output`]: Checkpoints and CSV export

// Core modules
pub mod config;
pub mod error;
pub mod physics;

pub mod models;
pub mod output;
pub mod solver;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use popbal_rs::prelude::*;
    //! ```
    pub use crate::config::{GroupsConfig, ModelSelection, PopulationBalanceConfig, SourceTreatment};
    pub use crate::error::{PbeError, PbeResult};
    pub use crate::models::{
        BreakupRateModel, CoalescenceRateModel, DaughterDistributionModel, FlowFields, GroupSet,
        GroupSources, ModelRegistry, PopulationBalanceModel, ShapeModel,
    };
    pub use crate::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
    pub use crate::solver::{
        EulerSolver, RK4Solver, Scenario, SimulationResult, Solver, SolverConfiguration,
        SolverType,
    };
}
