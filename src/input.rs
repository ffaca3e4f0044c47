//! Common routines for handling input data.
//!
//! A store directory holds one registry file per subscenario category, the detail rows of the
//! fragments and a `scenarios.toml` file defining the scenarios. Only problems with the files
//! themselves are reported here (bad values, unknown names, duplicate keys). Whether the fragments
//! fit together is left to the validators.
use crate::scenario::ScenarioMap;
use crate::store::SubscenarioStore;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::fs;
use std::hash::Hash;
use std::path::Path;

pub mod entity;
use entity::{read_entity_members, read_entity_zones, read_fragment_registries};
pub mod project;
use project::{read_heat_rate_curves, read_operational_chars, read_project_fragments};
pub mod scenario;
use scenario::read_scenarios;
pub mod temporal;
use temporal::read_temporal_tables;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }
    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file.
///
/// The file may be missing or empty, in which case no rows are returned.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    if !file_path.exists() {
        return Ok(Vec::new().into_iter());
    }

    let vec = read_csv_internal(file_path)?;
    Ok(vec.into_iter())
}

fn read_csv_internal<'a, T: DeserializeOwned + 'a>(file_path: &'a Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Inserts a key-value pair into an `IndexMap` if the key does not already exist.
///
/// If the key already exists, it returns an error with a message indicating the key's existence.
pub fn try_insert<K, V>(map: &mut IndexMap<K, V>, key: &K, value: V) -> Result<()>
where
    K: Eq + Hash + Clone + Debug,
{
    let existing = map.insert(key.clone(), value).is_some();
    ensure!(!existing, "Key {key:?} already exists in the map");
    Ok(())
}

/// Load every fragment in a store directory.
///
/// # Arguments
///
/// * `store_dir` - Folder containing the store's input files
///
/// # Returns
///
/// The store or an error if any input file is malformed.
pub fn load_store<P: AsRef<Path>>(store_dir: P) -> Result<SubscenarioStore> {
    let store_dir = store_dir.as_ref();
    let fragments = read_fragment_registries(store_dir)?;
    let members = read_entity_members(store_dir)?;
    let zones = read_entity_zones(store_dir)?;
    let operational_chars = read_operational_chars(store_dir)?;
    let project_fragments = read_project_fragments(store_dir)?;
    let heat_rate_curves = read_heat_rate_curves(store_dir)?;
    let temporal = read_temporal_tables(store_dir)?;
    debug!(
        "Loaded {} fragments from {}",
        fragments.values().map(|registry| registry.len()).sum::<usize>(),
        store_dir.display()
    );

    Ok(SubscenarioStore {
        fragments,
        members,
        zones,
        operational_chars,
        project_fragments,
        heat_rate_curves,
        temporal,
    })
}

/// Load the scenarios defined in a store directory
pub fn load_scenarios<P: AsRef<Path>>(store_dir: P) -> Result<ScenarioMap> {
    read_scenarios(store_dir.as_ref())
}
