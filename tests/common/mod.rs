//! Common utilities for integration tests

#![allow(dead_code)]

pub mod mock_models;
pub mod test_helpers;

// Re-export commonly used items
pub use mock_models::{ExponentialDecay, LargeOnly, LeakyDaughter, registry_with_mocks};
pub use test_helpers::{arena_volume, breakup_config, number_density, relative_error, total_volume};
