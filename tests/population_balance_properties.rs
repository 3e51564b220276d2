//! Physical properties of the discretization
//!
//! Volume conservation of every daughter distribution, the lever rule, the
//! degenerate single-group case, closed-form rates and shapes, and the
//! end-to-end sources of a three-group breakup cascade.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use popbal_rs::config::{GroupsConfig, ModelSelection, PopulationBalanceConfig};
use popbal_rs::error::PbeError;
use popbal_rs::models::{
    CoalescenceRateModel, DaughterDistributionModel, GroupSet, ModelRegistry, PopulationBalanceModel, ShapeModel,
    Spherical, Uniform, UniformBinary,
};

mod common;
use common::{breakup_config, registry_with_mocks, total_volume};

fn build(config: &PopulationBalanceConfig, n_cells: usize) -> PopulationBalanceModel {
    PopulationBalanceModel::from_config(config, &ModelRegistry::with_builtin(), n_cells).unwrap()
}

fn with_daughter(mut config: PopulationBalanceConfig, daughter: &str) -> PopulationBalanceConfig {
    config.daughter_distribution_model = ModelSelection::new(daughter);
    config
}

/// Irregular grid: exact hits, lever-rule splits and lumping all occur
const IRREGULAR: [f64; 6] = [1.0, 1.7, 3.0, 5.0, 7.0, 20.0];

// =================================================================================================
// Group set
// =================================================================================================

#[test]
fn test_non_increasing_volumes_rejected() {
    let err = GroupSet::new(&[1.0, 1.0, 2.0], 1).unwrap_err();
    assert!(matches!(err, PbeError::NonIncreasingVolumes { index: 1, .. }));

    assert!(GroupSet::new(&[1.0, 2.0, 4.0], 1).is_ok());
}

#[test]
fn test_invalid_volumes_reported_at_construction() {
    let config = breakup_config(&[1.0, -2.0, 4.0], &[0.0; 3], 1.0);
    let err = PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 1).unwrap_err();
    assert!(matches!(err, PbeError::NonPositiveVolume { index: 1, .. }));
}

// =================================================================================================
// Daughter distributions
// =================================================================================================

#[test]
fn test_every_daughter_conserves_volume_for_every_parent() {
    for daughter in ["uniformBinary", "uniform"] {
        let model = build(&with_daughter(breakup_config(&IRREGULAR, &[0.0; 6], 1.0), daughter), 1);
        let fragments = model.fragment_matrix();

        for k in 1..IRREGULAR.len() {
            let volume: f64 = (0..k).map(|i| fragments[(i, k)] * IRREGULAR[i]).sum();
            assert_relative_eq!(volume, IRREGULAR[k], max_relative = 1e-10);
        }
    }
}

#[test]
fn test_uniform_binary_conserves_number_inside_the_grid() {
    let groups = GroupSet::new(&IRREGULAR, 1).unwrap();
    let daughter = UniformBinary;

    // v_k / 2 = 1.5, 2.5, 3.5 lie within [v_0, v_{k-1}] for k = 2, 3, 4
    for k in 2..5 {
        let number: f64 = (0..k).map(|i| daughter.fragment_count(i, k, &groups)).sum();
        assert_relative_eq!(number, 2.0, max_relative = 1e-14);
        assert!(!daughter.lumps_fragments(k, &groups));
    }

    // v_5 / 2 = 10 exceeds v_4 = 7: lumped by volume, number is not conserved
    assert!(daughter.lumps_fragments(5, &groups));
    assert_relative_eq!(daughter.fragment_count(4, 5, &groups), 20.0 / 7.0, max_relative = 1e-14);
}

#[test]
fn test_uniform_binary_lever_rule() {
    let groups = GroupSet::new(&IRREGULAR, 1).unwrap();

    // Parent 7: fragment 3.5 between 3 and 5, weights 0.75 / 0.25 per fragment
    assert_relative_eq!(UniformBinary.fragment_count(2, 4, &groups), 1.5, max_relative = 1e-14);
    assert_relative_eq!(UniformBinary.fragment_count(3, 4, &groups), 0.5, max_relative = 1e-14);
    assert_eq!(UniformBinary.fragment_count(1, 4, &groups), 0.0);
}

#[test]
fn test_uniform_binary_sum_is_two_on_doubling_grid() {
    let model = build(&breakup_config(&[1.0, 2.0, 4.0, 8.0, 16.0], &[0.0; 5], 1.0), 1);
    for k in 1..5 {
        assert_eq!(model.fragment_matrix().column(k).sum(), 2.0);
        assert_eq!(model.fragment_matrix()[(k - 1, k)], 2.0);
    }
}

#[test]
fn test_uniform_spreads_fragments_over_smaller_groups() {
    let groups = GroupSet::new(&[1.0, 2.0, 3.0, 4.0], 1).unwrap();
    let uniform = Uniform;

    let counts: Vec<f64> = (0..3).map(|i| uniform.fragment_count(i, 3, &groups)).collect();
    assert!(counts.iter().all(|&n| n > 0.0));

    let volume: f64 = counts.iter().zip([1.0, 2.0, 3.0]).map(|(n, v)| n * v).sum();
    assert_relative_eq!(volume, 4.0, max_relative = 1e-12);
    assert!(!uniform.lumps_fragments(3, &groups));
}

#[test]
#[should_panic(expected = "fragment count requested")]
fn test_fragment_count_above_parent_is_a_contract_violation() {
    let groups = GroupSet::new(&[1.0, 2.0, 4.0], 1).unwrap();
    UniformBinary.fragment_count(2, 1, &groups);
}

#[test]
fn test_volume_losing_daughter_is_rejected() {
    let config = with_daughter(breakup_config(&[1.0, 2.0, 4.0], &[0.0; 3], 1.0), "leaky");
    let err = PopulationBalanceModel::from_config(&config, &registry_with_mocks(), 1).unwrap_err();

    match err {
        PbeError::ConservationViolated { model, parent, .. } => {
            assert_eq!(model, "leaky");
            assert_eq!(parent, 1);
        }
        other => panic!("unexpected error {other}"),
    }
}

// =================================================================================================
// Rates and shape
// =================================================================================================

#[test]
fn test_exponential_rate_closed_form() {
    let mut config = breakup_config(&[1.0, 2.0], &[0.0; 2], 2.0);
    config.breakup_rate_model = ModelSelection::new("exponential")
        .with("C", 2.0)
        .with("exponent", 1.0);
    let model = build(&config, 3);

    for rate in model.breakup_rate(1).iter() {
        assert_relative_eq!(*rate, 2.0 * 2.0_f64.exp(), max_relative = 1e-14);
    }
}

#[test]
fn test_spherical_shape_at_unit_radius() {
    let groups = GroupSet::new(&[4.0 / 3.0 * PI], 1).unwrap();
    let group = groups.group(0);

    assert_relative_eq!(Spherical.diameter(group, 0), 2.0, max_relative = 1e-12);
    assert_relative_eq!(Spherical.area(group, 0), 4.0 * PI, max_relative = 1e-12);
}

#[test]
fn test_non_spherical_scales_area_only() {
    let mut config = breakup_config(&[4.0 / 3.0 * PI], &[1.0], 0.0);
    config.shape_model = ModelSelection::new("nonSpherical").with("factor", 1.5);
    let model = build(&config, 2);

    assert_relative_eq!(model.group_diameter(0)[1], 2.0, max_relative = 1e-12);
    assert_relative_eq!(model.interfacial_area_density()[0], 6.0 * PI, max_relative = 1e-12);
}

// =================================================================================================
// Orchestrator
// =================================================================================================

#[test]
fn test_three_group_cascade_sources() {
    let model = build(&breakup_config(&[1.0, 2.0, 4.0], &[0.0, 0.0, 10.0], 1.0), 4);
    let sources = model.assemble_sources();

    for cell in 0..4 {
        assert_eq!(sources.birth()[(cell, 1)], 20.0);
        assert_eq!(sources.death()[(cell, 2)], 10.0);
        assert_eq!(sources.net_at(cell, 0), 0.0);
        assert_eq!(sources.net_at(cell, 1), 20.0);
        assert_eq!(sources.net_at(cell, 2), -10.0);
    }

    // 20 · 2 - 10 · 4 = 0
    assert!(sources.volume_source(model.groups().volumes()).iter().all(|&s| s == 0.0));
}

#[test]
fn test_single_group_is_a_pure_sink() {
    let mut model = build(&breakup_config(&[1.0], &[4.0], 0.5), 2);
    assert_eq!(model.fragment_matrix().shape(), (1, 1));
    assert_eq!(model.fragment_matrix()[(0, 0)], 0.0);

    let sources = model.solve_step(0.1).unwrap();
    assert_eq!(sources.birth()[(0, 0)], 0.0);
    assert_eq!(sources.death()[(0, 0)], 2.0);
    assert_relative_eq!(model.groups().number_density()[(1, 0)], 3.8, max_relative = 1e-14);
}

#[test]
fn test_explicit_step_conserves_volume_without_smallest_group() {
    let mut model = build(&breakup_config(&[1.0, 2.0, 4.0, 8.0], &[0.0, 3.0, 2.0, 1.0], 0.7), 3);

    // Group 0 starts empty, so its sink term vanishes during the first step
    let before = total_volume(&model);
    model.solve_step(0.01).unwrap();
    assert_relative_eq!(total_volume(&model), before, max_relative = 1e-14);
}

#[test]
fn test_coalescence_is_optional() {
    let mut config = breakup_config(&[1.0, 2.0, 4.0], &[1.0, 1.0, 1.0], 0.0);
    assert!(!build(&config, 1).has_coalescence());

    config.coalescence_rate_model = Some(ModelSelection::new("hydrodynamic").with("C", 0.1));
    let model = build(&config, 1);
    assert!(model.has_coalescence());
    assert_eq!(model.coalescence().map(|c| c.kernel().name()), Some("hydrodynamic"));

    // Breakup switched off: the volume source comes from coalescence alone and vanishes
    let sources = model.assemble_sources();
    assert_relative_eq!(
        sources.volume_source(model.groups().volumes())[0],
        0.0,
        epsilon = 1e-12
    );
}

#[test]
fn test_geometric_diameter_grid() {
    let mut config = breakup_config(&[1.0], &[0.0], 1.0);
    config.groups = GroupsConfig::GeometricDiameter {
        count: 5,
        min_diameter: 1.0e-4,
        max_diameter: 1.6e-3,
    };
    config.initial_number_density = None;
    let model = build(&config, 1);

    assert_eq!(model.groups().len(), 5);
    assert_relative_eq!(model.group_diameter(0)[0], 1.0e-4, max_relative = 1e-12);
    assert_relative_eq!(model.group_diameter(4)[0], 1.6e-3, max_relative = 1e-12);

    // Diameter ratio 2 gives a volume ratio of 8
    let volumes = model.groups().volumes();
    assert_relative_eq!(volumes[1] / volumes[0], 8.0, max_relative = 1e-12);
}
