//! Physical models
//!
//! This module provides the generic model layer shared by everything that can
//! be advanced in time: a model computes right-hand sides from a state
//! snapshot, a solver integrates them.
//!
//! # Core Concepts
//!
//! - **Physical Model**: Computes dy/dt at a given state
//! - **Physical State**: Container for all physical quantities (number density, ...)
//! - **Physical Quantity**: Type-safe identifier for physical variables
//!
//! # Architecture
//!
//! Physical models are **separate from numerical solvers**:
//! - The model provides the **source terms** (physics)
//! - The solver provides the **method** to advance them (numerics)
//!
//! The population balance orchestrator
//! ([`PopulationBalanceModel`](crate::models::PopulationBalanceModel)) is the
//! main implementation.
//!
//! # Implementing a New Physical Model
//!
//! ```rust
//! use popbal_rs::physics::{PhysicalData, PhysicalModel, PhysicalQuantity, PhysicalState};
//!
//! struct Decay {
//!     cells: usize,
//! }
//!
//! impl PhysicalModel for Decay {
//!     fn points(&self) -> usize {
//!         self.cells
//!     }
//!
//!     fn compute_physics(&self, state: &PhysicalState) -> PhysicalState {
//!         state.clone() * -0.5
//!     }
//!
//!     fn setup_initial_state(&self) -> PhysicalState {
//!         PhysicalState::new(
//!             PhysicalQuantity::NumberDensity,
//!             PhysicalData::uniform_matrix(self.cells, 1, 1.0),
//!         )
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Decay"
//!     }
//! }
//! ```

// module declaration
pub mod data;
pub mod traits;

// re-export commonly used types for convenience
pub use data::PhysicalData;
pub use traits::{PhysicalModel, PhysicalQuantity, PhysicalState};
