//! Code for reading fragment registries and the entity tables of fragments.
use super::{input_err_msg, read_csv_optional};
use crate::category::{SelectorRef, SubscenarioCategory, SubscenarioID};
use crate::store::{EntitySet, Fragment, FragmentMap, ZoneMap};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use strum::IntoEnumIterator;

const ENTITY_MEMBERS_FILE_NAME: &str = "entity_members.csv";
const ENTITY_ZONES_FILE_NAME: &str = "entity_zones.csv";

/// The name of the registry file for a category
pub fn registry_file_name(category: SubscenarioCategory) -> String {
    format!("subscenarios_{category}.csv")
}

#[derive(Debug, PartialEq, Deserialize)]
struct FragmentRaw {
    subscenario_id: u32,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, PartialEq, Deserialize)]
struct EntityMemberRaw {
    category: SubscenarioCategory,
    subscenario_id: u32,
    entity: String,
}

#[derive(Debug, PartialEq, Deserialize)]
struct EntityZoneRaw {
    category: SubscenarioCategory,
    subscenario_id: u32,
    entity: String,
    zone: String,
}

/// Read the fragment registry of every category.
///
/// A category without a registry file has no fragments.
///
/// # Arguments
///
/// * `store_dir` - Folder containing the store's input files
///
/// # Returns
///
/// The registered fragments of each category with at least one fragment.
pub fn read_fragment_registries(
    store_dir: &Path,
) -> Result<HashMap<SubscenarioCategory, FragmentMap>> {
    let mut registries = HashMap::new();
    for category in SubscenarioCategory::iter() {
        let file_path = store_dir.join(registry_file_name(category));
        let fragments_csv = read_csv_optional(&file_path)?;
        let fragments =
            read_fragments_from_iter(fragments_csv).with_context(|| input_err_msg(&file_path))?;
        if !fragments.is_empty() {
            registries.insert(category, fragments);
        }
    }

    Ok(registries)
}

fn read_fragments_from_iter<I>(iter: I) -> Result<FragmentMap>
where
    I: Iterator<Item = FragmentRaw>,
{
    let mut fragments = FragmentMap::new();
    for raw in iter {
        let id = SubscenarioID(raw.subscenario_id);
        ensure!(!raw.name.is_empty(), "Subscenario {id} has an empty name");
        let fragment = Fragment {
            id,
            name: raw.name,
            description: raw.description,
        };
        ensure!(
            fragments.insert(id, fragment).is_none(),
            "Duplicate subscenario ID: {id}"
        );
    }

    Ok(fragments)
}

/// Read the members of entity-set fragments (portfolios, zone sets and so on)
pub fn read_entity_members(store_dir: &Path) -> Result<HashMap<SelectorRef, EntitySet>> {
    let file_path = store_dir.join(ENTITY_MEMBERS_FILE_NAME);
    let members_csv = read_csv_optional(&file_path)?;
    read_entity_members_from_iter(members_csv).with_context(|| input_err_msg(&file_path))
}

fn read_entity_members_from_iter<I>(iter: I) -> Result<HashMap<SelectorRef, EntitySet>>
where
    I: Iterator<Item = EntityMemberRaw>,
{
    let mut members: HashMap<SelectorRef, EntitySet> = HashMap::new();
    for raw in iter {
        let selector = SelectorRef {
            category: raw.category,
            id: SubscenarioID(raw.subscenario_id),
        };
        ensure!(!raw.entity.is_empty(), "Empty entity name in {selector}");
        let inserted = members
            .entry(selector)
            .or_default()
            .insert(raw.entity.as_str().into());
        ensure!(inserted, "Duplicate member {} in {selector}", raw.entity);
    }

    Ok(members)
}

/// Read the entity-to-zone assignments of zone-map fragments
pub fn read_entity_zones(store_dir: &Path) -> Result<HashMap<SelectorRef, ZoneMap>> {
    let file_path = store_dir.join(ENTITY_ZONES_FILE_NAME);
    let zones_csv = read_csv_optional(&file_path)?;
    read_entity_zones_from_iter(zones_csv).with_context(|| input_err_msg(&file_path))
}

fn read_entity_zones_from_iter<I>(iter: I) -> Result<HashMap<SelectorRef, ZoneMap>>
where
    I: Iterator<Item = EntityZoneRaw>,
{
    let mut zones: HashMap<SelectorRef, ZoneMap> = HashMap::new();
    for raw in iter {
        let selector = SelectorRef {
            category: raw.category,
            id: SubscenarioID(raw.subscenario_id),
        };
        ensure!(
            !raw.entity.is_empty() && !raw.zone.is_empty(),
            "Empty entity or zone name in {selector}"
        );
        let inserted = zones
            .entry(selector)
            .or_default()
            .entry(raw.entity.as_str().into())
            .or_default()
            .insert(raw.zone.as_str().into());
        ensure!(
            inserted,
            "{} is assigned to zone {} more than once in {selector}",
            raw.entity,
            raw.zone
        );
    }

    Ok(zones)
}
