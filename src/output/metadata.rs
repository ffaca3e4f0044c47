//! The `metadata.toml` output file.
//!
//! Records where a resolved scenario came from, a summary of its temporal hierarchy, the build
//! that produced it and the host it ran on.
use crate::assembler::ResolvedScenario;
use anyhow::{Context, Result, anyhow};
use chrono::Local;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

const METADATA_FILE_NAME: &str = "metadata.toml";

#[allow(clippy::doc_markdown)]
#[allow(clippy::needless_raw_strings)]
mod built_info {
    // Generated by build.rs
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize)]
struct Metadata<'a> {
    assembly: AssemblyInfo<'a>,
    scenario: ScenarioSummary,
    build: BuildInfo,
    platform: HostInfo,
}

#[derive(Serialize)]
struct AssemblyInfo<'a> {
    store_path: &'a Path,
    scenario: &'a str,
    datetime: String,
}

/// Sizes of the resolved temporal hierarchy
#[derive(Serialize)]
struct ScenarioSummary {
    temporal_scenario_id: u32,
    periods: usize,
    subproblems: usize,
    stages: usize,
    timepoints: usize,
    enabled_features: Vec<String>,
    warnings: usize,
}

impl ScenarioSummary {
    fn new(resolved: &ResolvedScenario) -> Self {
        let temporal = &resolved.temporal;
        Self {
            temporal_scenario_id: temporal.temporal_scenario_id.0,
            periods: temporal.periods.len(),
            subproblems: temporal.subproblems.len(),
            stages: temporal.iter_stages().count(),
            timepoints: temporal
                .iter_stages()
                .map(|(_, stage)| stage.timepoints.len())
                .sum(),
            enabled_features: resolved
                .features
                .iter_enabled()
                .map(|feature| feature.to_string())
                .collect(),
            warnings: resolved.warnings.len(),
        }
    }
}

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    is_debug: bool,
    rustc_version: &'static str,
    build_time_utc: &'static str,
    /// Short hash, suffixed with `-dirty` for uncommitted changes
    git_commit_hash: String,
}

impl BuildInfo {
    fn current() -> Self {
        let git_commit_hash = match built_info::GIT_COMMIT_HASH_SHORT {
            None => "unknown".to_string(),
            Some(hash) if built_info::GIT_DIRTY == Some(true) => format!("{hash}-dirty"),
            Some(hash) => hash.to_string(),
        };

        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
            git_commit_hash,
        }
    }
}

#[derive(Serialize)]
struct HostInfo {
    sysname: String,
    nodename: String,
    release: String,
    machine: String,
    osname: String,
}

impl HostInfo {
    fn query() -> Result<Self> {
        let uname = PlatformInfo::new()
            .map_err(|err| anyhow!("{err}"))
            .context("Unable to determine platform info")?;
        let lossy = |s: &std::ffi::OsStr| s.to_string_lossy().into_owned();

        Ok(Self {
            sysname: lossy(uname.sysname()),
            nodename: lossy(uname.nodename()),
            release: lossy(uname.release()),
            machine: lossy(uname.machine()),
            osname: lossy(uname.osname()),
        })
    }
}

/// Write `metadata.toml` for a resolved scenario into `output_path`
pub fn write_metadata(
    output_path: &Path,
    store_path: &Path,
    resolved: &ResolvedScenario,
) -> Result<()> {
    let metadata = Metadata {
        assembly: AssemblyInfo {
            store_path,
            scenario: resolved.name.as_str(),
            datetime: Local::now().to_rfc2822(),
        },
        scenario: ScenarioSummary::new(resolved),
        build: BuildInfo::current(),
        platform: HostInfo::query()?,
    };

    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)
        .with_context(|| format!("Could not write {}", file_path.display()))
}
