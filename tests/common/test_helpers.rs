//! Helper functions for integration tests

use nalgebra::DMatrix;
use popbal_rs::config::{GroupsConfig, ModelSelection, PopulationBalanceConfig, SourceTreatment};
use popbal_rs::models::PopulationBalanceModel;
use popbal_rs::physics::{PhysicalQuantity, PhysicalState};

/// Explicit-volume configuration with a constant breakup rate `C` (exponent 0)
pub fn breakup_config(volumes: &[f64], initial: &[f64], rate: f64) -> PopulationBalanceConfig {
    PopulationBalanceConfig {
        name: "test".to_string(),
        groups: GroupsConfig::Explicit {
            volumes: volumes.to_vec(),
            count: None,
        },
        breakup_rate_model: ModelSelection::new("exponential")
            .with("C", rate)
            .with("exponent", 0.0),
        daughter_distribution_model: ModelSelection::new("uniformBinary"),
        shape_model: ModelSelection::new("spherical"),
        coalescence_rate_model: None,
        initial_number_density: Some(initial.to_vec()),
        source_treatment: SourceTreatment::Explicit,
    }
}

/// Total dispersed volume `Σ_cells Σ_i n_i v_i` of a model
pub fn total_volume(model: &PopulationBalanceModel) -> f64 {
    model.total_volume_fraction().sum()
}

/// Total dispersed volume of a number-density arena
pub fn arena_volume(density: &DMatrix<f64>, volumes: &[f64]) -> f64 {
    density
        .row_iter()
        .map(|row| row.iter().zip(volumes).map(|(n, v)| n * v).sum::<f64>())
        .sum()
}

/// Number-density arena carried by a solver state
pub fn number_density(state: &PhysicalState) -> &DMatrix<f64> {
    state
        .get(PhysicalQuantity::NumberDensity)
        .expect("state carries number density")
        .as_matrix()
}

/// Relative error |a - b| / |b|, absolute when `b` is zero
pub fn relative_error(computed: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-300 {
        computed.abs()
    } else {
        (computed - expected).abs() / expected.abs()
    }
}
