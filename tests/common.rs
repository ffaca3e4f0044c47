use assert_cmd::cargo_bin_cmd;

/// The store bundled as the `simple` example
#[allow(dead_code)]
pub const STORE_DIR: &str = "demos/simple";

/// Run the program with the given arguments and check that it succeeds
#[allow(dead_code)]
pub fn assert_assembly_runs(args: &[&str]) {
    cargo_bin_cmd!("scenario-assembly")
        .env("SCENARIO_ASSEMBLY_USE_DEFAULT_SETTINGS", "1")
        .args(args)
        .assert()
        .success();
}

/// Run the program with the given arguments and check that it fails
#[allow(dead_code)]
pub fn assert_assembly_fails(args: &[&str]) {
    cargo_bin_cmd!("scenario-assembly")
        .env("SCENARIO_ASSEMBLY_USE_DEFAULT_SETTINGS", "1")
        .args(args)
        .assert()
        .failure();
}

/// Run the program with the given arguments and return what it printed to stdout
#[allow(dead_code)]
pub fn get_assembly_stdout(args: &[&str]) -> String {
    let output = cargo_bin_cmd!("scenario-assembly")
        .env("SCENARIO_ASSEMBLY_USE_DEFAULT_SETTINGS", "1")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success());

    String::from_utf8(output.stdout).unwrap()
}
