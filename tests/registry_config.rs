//! Configuration loading and model selection
//!
//! A case is described by JSON; every error in it must surface when the
//! model is built, naming the model, parameter or group involved.

use std::fs;

use nalgebra::DVector;
use popbal_rs::config::PopulationBalanceConfig;
use popbal_rs::error::PbeError;
use popbal_rs::models::{FlowFields, ModelRegistry, PopulationBalanceModel};
use tempfile::tempdir;

mod common;
use common::registry_with_mocks;

const CASE: &str = r#"{
    "name": "bubbleColumn",
    "groups": { "rule": "geometricVolume", "count": 6, "minVolume": 1.0e-10, "ratio": 2.0 },
    "breakupRateModel": { "model": "coulaloglouTavlarides" },
    "daughterDistributionModel": { "model": "uniformBinary" },
    "shapeModel": { "model": "spherical" },
    "coalescenceRateModel": { "model": "constant", "C": 1.0e-12 },
    "initialNumberDensity": [1.0e7, 1.0e7, 1.0e7, 1.0e7, 1.0e7, 1.0e7],
    "sourceTreatment": "linearizedImplicit"
}"#;

fn case_with(key: &str, replacement: &str) -> PopulationBalanceConfig {
    let mut value: serde_json::Value = serde_json::from_str(CASE).unwrap();
    value[key] = serde_json::from_str(replacement).unwrap();
    serde_json::from_value(value).unwrap()
}

fn build_err(config: &PopulationBalanceConfig) -> PbeError {
    PopulationBalanceModel::from_config(config, &ModelRegistry::with_builtin(), 2).unwrap_err()
}

// =================================================================================================
// Loading
// =================================================================================================

#[test]
fn test_load_case_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("case.json");
    fs::write(&path, CASE).unwrap();

    let config = PopulationBalanceConfig::from_file(&path).unwrap();
    let model = PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 5).unwrap();

    assert_eq!(model.name(), "bubbleColumn");
    assert_eq!(model.groups().len(), 6);
    assert_eq!(model.n_cells(), 5);
    assert_eq!(model.breakup_model().name(), "coulaloglouTavlarides");
    assert!(model.has_coalescence());
}

#[test]
fn test_config_json_round_trip() {
    let config = PopulationBalanceConfig::from_json_str(CASE).unwrap();
    let again = PopulationBalanceConfig::from_json_str(&config.to_json().unwrap()).unwrap();
    assert_eq!(config, again);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = PopulationBalanceConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PbeError::Io(_)));
}

// =================================================================================================
// Construction-time errors
// =================================================================================================

#[test]
fn test_unknown_key_in_every_family() {
    let cases = [
        ("breakupRateModel", "breakup rate model"),
        ("daughterDistributionModel", "daughter distribution model"),
        ("shapeModel", "shape model"),
        ("coalescenceRateModel", "coalescence rate model"),
    ];

    for (key, family_label) in cases {
        let err = build_err(&case_with(key, r#"{ "model": "nope" }"#));
        match err {
            PbeError::UnknownModel {
                family,
                name,
                available,
            } => {
                assert_eq!(family, family_label);
                assert_eq!(name, "nope");
                assert!(!available.is_empty());
            }
            other => panic!("{key}: unexpected error {other}"),
        }
    }
}

#[test]
fn test_missing_parameter_names_model() {
    let err = build_err(&case_with("breakupRateModel", r#"{ "model": "powerLaw", "C": 1.0 }"#));
    assert_eq!(
        err.to_string(),
        "Model 'powerLaw': missing required parameter 'power'"
    );
}

#[test]
fn test_stray_parameter_names_model_and_key() {
    let cases = [
        (
            "breakupRateModel",
            r#"{ "model": "coulaloglouTavlarides", "c1": 5.0, "Sigma": 0.01 }"#,
            "coulaloglouTavlarides",
            "Sigma",
        ),
        (
            "breakupRateModel",
            r#"{ "model": "exponential", "C": 1.0, "exponent": 0.0, "expnent": 3.0 }"#,
            "exponential",
            "expnent",
        ),
        (
            "daughterDistributionModel",
            r#"{ "model": "uniformBinary", "bogus": 1.0 }"#,
            "uniformBinary",
            "bogus",
        ),
        (
            "coalescenceRateModel",
            r#"{ "model": "constant", "C": 1.0e-12, "c": 2.0 }"#,
            "constant",
            "c",
        ),
    ];

    for (key, selection, expected_model, expected_parameter) in cases {
        match build_err(&case_with(key, selection)) {
            PbeError::InvalidParameter { model, parameter, .. } => {
                assert_eq!(model, expected_model);
                assert_eq!(parameter, expected_parameter);
            }
            other => panic!("{selection}: unexpected error {other}"),
        }
    }
}

#[test]
fn test_invalid_parameter_is_rejected() {
    let err = build_err(&case_with("shapeModel", r#"{ "model": "nonSpherical", "factor": -1.0 }"#));
    assert!(matches!(err, PbeError::InvalidParameter { .. }));
}

#[test]
fn test_initial_density_size_mismatch() {
    let err = build_err(&case_with("initialNumberDensity", "[1.0, 2.0]"));
    assert!(matches!(
        err,
        PbeError::SizeMismatch {
            expected: 6,
            found: 2,
            ..
        }
    ));
}

// =================================================================================================
// Runtime registration and flow coupling
// =================================================================================================

#[test]
fn test_runtime_registered_model_is_selectable() {
    let config = case_with("breakupRateModel", r#"{ "model": "largeOnly", "C": 3.0 }"#);

    assert!(PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 1).is_err());

    let model = PopulationBalanceModel::from_config(&config, &registry_with_mocks(), 1).unwrap();
    assert_eq!(model.breakup_rate(0)[0], 0.0);
    assert_eq!(model.breakup_rate(5)[0], 3.0);
    assert!(registry_with_mocks().available_breakup().contains(&"largeOnly".to_string()));
}

#[test]
fn test_turbulence_drives_coulaloglou_tavlarides() {
    let config = PopulationBalanceConfig::from_json_str(CASE).unwrap();
    let mut model = PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 2).unwrap();

    // Quiescent flow: no breakup
    assert!(model.breakup_rate(5).iter().all(|&r| r == 0.0));

    let mut flow = FlowFields::uniform(2, 0.0, 1000.0, 1.0e-3, 800.0);
    flow.turbulent_dissipation = DVector::from_vec(vec![0.0, 0.5]);
    model.set_flow_fields(flow).unwrap();

    let rates = model.breakup_rate(5);
    assert_eq!(rates[0], 0.0);
    assert!(rates[1] > 0.0);

    // Larger particles break up faster in the same turbulence
    assert!(model.breakup_rate(5)[1] > model.breakup_rate(0)[1]);
}

#[test]
fn test_flow_fields_must_match_mesh() {
    let config = PopulationBalanceConfig::from_json_str(CASE).unwrap();
    let mut model = PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 2).unwrap();

    let err = model.set_flow_fields(FlowFields::quiescent(3)).unwrap_err();
    assert!(matches!(err, PbeError::SizeMismatch { .. }));
}

#[test]
fn test_unphysical_flow_fields_are_rejected() {
    let config = PopulationBalanceConfig::from_json_str(CASE).unwrap();
    let mut model = PopulationBalanceModel::from_config(&config, &ModelRegistry::with_builtin(), 1).unwrap();

    let err = model
        .set_flow_fields(FlowFields::uniform(1, 1.0, 1000.0, 1.0e-3, -1.0))
        .unwrap_err();
    assert!(matches!(err, PbeError::InvalidConfiguration(_)));
    assert!(err.to_string().contains("dispersed density"));

    // The previous fields stay in place: no breakup without turbulence
    assert_eq!(model.flow(), &FlowFields::quiescent(1));
    assert!(model.breakup_rate(5).iter().all(|&r| r == 0.0));
}
