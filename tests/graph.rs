//! Integration tests for the `save-graph` command.
use scenario_assembly::cli::{GraphOpts, handle_save_graph_command};
use scenario_assembly::log::is_logger_initialised;
use scenario_assembly::settings::Settings;
use std::fs;
use tempfile::tempdir;

/// An integration test for the `save-graph` command.
///
/// We also check that the logger is initialised after it is run.
#[test]
fn test_handle_save_graph_command() {
    unsafe { std::env::set_var("SCENARIO_ASSEMBLY_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("graphs");
    let opts = GraphOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
    };
    handle_save_graph_command(&opts, Some(Settings::default())).unwrap();
    assert!(is_logger_initialised());

    let dot = fs::read_to_string(output_dir.join("category_dependencies.dot")).unwrap();
    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("project_operational_chars"));
    assert!(dot.contains("style=dashed"));
}
