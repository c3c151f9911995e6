//! Analysis definition and export tests against the demo linear pathway.
//!
//! Reference values for X0 = 10, k1 = 10, k1r = 1, k2 = 5, k2r = 1, k3 = 2:
//! | Quantity | Value |
//! |----------|-------|
//! | J        | 1000/13 |
//! | S1       | 300/13 |
//! | S2       | 500/13 |
//! | C^J_R1   | 10/13 |
//! | C^J_R2   | 2/13 |
//! | C^J_R3   | 1/13 |

use symca_patterns::{
    config::AnalysisDefinition,
    export::{export_scan_json_to, write_scan_csv, ScanCsvExporter},
    Model, Node, ScanMode,
};

const DEMO_PATH: &str = "data/models/linear_pathway.json";

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
        "{}: expected {}, got {}",
        what,
        expected,
        actual
    );
}

#[test]
fn test_load_demo_definition() {
    let definition = AnalysisDefinition::load(DEMO_PATH).unwrap();
    assert_eq!(definition.model.name, "linear_pathway");
    assert_eq!(definition.sigma_name, "Sigma");
    assert_eq!(definition.coefficients.len(), 6);
    assert_eq!(definition.scan_parameter.as_deref(), Some("X0"));
}

#[test]
fn test_initial_steady_state() {
    let analysis = AnalysisDefinition::load(DEMO_PATH).unwrap().build().unwrap();
    let model = analysis.context.model();

    for reaction in ["R1", "R2", "R3"] {
        assert_close(model.flux(reaction).unwrap(), 1000.0 / 13.0, reaction);
    }
    assert_close(model.steady_state("S1").unwrap(), 300.0 / 13.0, "S1");
    assert_close(model.steady_state("S2").unwrap(), 500.0 / 13.0, "S2");
    assert!(model.is_fixed_species("X0"));
    assert!(!model.is_fixed_species("k1"));
}

#[test]
fn test_flux_control_coefficients() {
    let analysis = AnalysisDefinition::load(DEMO_PATH).unwrap().build().unwrap();
    let expected = [("ccJ_R1", 10.0 / 13.0), ("ccJ_R2", 2.0 / 13.0), ("ccJ_R3", 1.0 / 13.0)];
    for (name, value) in expected {
        assert_close(analysis.coefficient(name).unwrap().value().unwrap(), value, name);
    }
}

#[test]
fn test_concentration_control_signs() {
    let analysis = AnalysisDefinition::load(DEMO_PATH).unwrap().build().unwrap();
    assert!(analysis.coefficient("ccS1_R1").unwrap().value().unwrap() > 0.0);
    assert!(analysis.coefficient("ccS1_R2").unwrap().value().unwrap() < 0.0);
    assert!(analysis.coefficient("ccS1_R3").unwrap().value().unwrap() < 0.0);
}

#[test]
fn test_display_of_built_nodes() {
    let analysis = AnalysisDefinition::load(DEMO_PATH).unwrap().build().unwrap();
    let cc = analysis.coefficient("ccS1_R1").unwrap();
    assert_eq!(cc.numerator().to_string(), "ec_R3_S2 - ec_R2_S2");
    assert_eq!(
        cc.control_patterns()[1].numerator().to_string(),
        "-ec_R2_S2"
    );
    assert!(analysis.sigma.to_string().starts_with("Sigma = "));
}

#[test]
fn test_missing_definition_file() {
    let err = AnalysisDefinition::load("data/models/missing.json").unwrap_err();
    assert!(format!("{:#}", err).contains("missing.json"));
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_scan_exports() {
    let analysis = AnalysisDefinition::load(DEMO_PATH).unwrap().build().unwrap();
    let cc = analysis.coefficient("ccS1_R1").unwrap();
    let figure = cc.parscan("k2", &[1.0, 2.0, 4.0], ScanMode::Value, true).unwrap();

    let mut buffer = Vec::new();
    write_scan_csv(&figure, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("x,CP1,CP2,ccS1_R1"));
    assert_eq!(lines.count(), 3);

    let dir = std::env::temp_dir().join(format!("symca_exports_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let csv_path = ScanCsvExporter::with_path(dir.join("scan.csv"))
        .export(&figure)
        .unwrap();
    assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), text);

    let json_path = dir.join("scan.json");
    export_scan_json_to(&figure, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["figure"]["coefficient"], "ccS1_R1");
    assert_eq!(json["figure"]["lines"].as_array().unwrap().len(), 3);

    std::fs::remove_dir_all(&dir).unwrap();
}
