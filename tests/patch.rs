//! Integration tests for validating patched stores.
use anyhow::Result;
use scenario_assembly::cli::handle_validate_command;
use scenario_assembly::input::load_scenarios;
use scenario_assembly::patch::{FilePatch, StorePatch};
use scenario_assembly::settings::Settings;
use std::fs;
use tempfile::TempDir;

const STORE_DIR: &str = "demos/simple";

/// Patch of the "simple" store which moves the wind project to another load zone
fn get_store_dir_file_patch() -> Result<TempDir> {
    let zones_patch = FilePatch::new("entity_zones.csv")
        .delete_row("project_load_zones,1,wind,south")
        .add_row("project_load_zones,1,wind,north");
    StorePatch::new(STORE_DIR)
        .with_file_patch(zones_patch)
        .build_to_tempdir()
}

/// Patch of the "simple" store which drops the wind project's load zone altogether
fn get_store_dir_dangling_patch() -> Result<TempDir> {
    let zones_patch = FilePatch::new("entity_zones.csv").delete_row("project_load_zones,1,wind,south");
    StorePatch::new(STORE_DIR)
        .with_file_patch(zones_patch)
        .build_to_tempdir()
}

/// Patch of the "simple" store which switches on the RPS feature for the base scenario
fn get_store_dir_scenarios_patch() -> Result<TempDir> {
    StorePatch::new(STORE_DIR)
        .with_scenarios_patch("[base.features]\nof_rps = true\n")
        .build_to_tempdir()
}

#[test]
fn test_file_patch_and_validate() {
    unsafe { std::env::set_var("SCENARIO_ASSEMBLY_LOG_LEVEL", "off") };

    let store_dir = get_store_dir_file_patch().unwrap();

    // The appropriate change has been made
    let zones = fs::read_to_string(store_dir.path().join("entity_zones.csv")).unwrap();
    assert!(!zones.contains("project_load_zones,1,wind,south"));
    assert!(zones.contains("project_load_zones,1,wind,north"));

    // Validation passes
    handle_validate_command(store_dir.path(), None, Some(Settings::default())).unwrap();
}

#[test]
fn test_dangling_patch_and_validate() {
    unsafe { std::env::set_var("SCENARIO_ASSEMBLY_LOG_LEVEL", "off") };

    let store_dir = get_store_dir_dangling_patch().unwrap();
    let val = handle_validate_command(store_dir.path(), Some("base"), Some(Settings::default()));
    assert!(val.is_err());
}

#[test]
fn test_scenarios_patch_and_validate() {
    unsafe { std::env::set_var("SCENARIO_ASSEMBLY_LOG_LEVEL", "off") };

    let store_dir = get_store_dir_scenarios_patch().unwrap();

    // The appropriate change has been made, and the rest of the scenario is untouched
    let scenarios = load_scenarios(store_dir.path()).unwrap();
    assert!(scenarios["base"].features.of_rps);
    assert!(scenarios["base"].subscenarios.temporal.is_some());

    // RPS selectors are missing, so validation fails for base but not for rps
    let settings = || Some(Settings::default());
    assert!(handle_validate_command(store_dir.path(), Some("base"), settings()).is_err());
    handle_validate_command(store_dir.path(), Some("rps"), settings()).unwrap();
}
