//! Code for building modified copies of a subscenario store.
//!
//! A [`StorePatch`] copies a base store and then adds or removes rows of its CSV files and
//! overrides parts of `scenarios.toml`. It is mostly used to derive broken or extended stores from
//! the bundled examples in tests.
use anyhow::{Context, Result, ensure};
use csv::{ReaderBuilder, Trim, Writer};
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};

const SCENARIOS_FILE_NAME: &str = "scenarios.toml";

/// A CSV row, as a list of trimmed fields
type Row = Vec<String>;

fn split_row(row: &str) -> Row {
    row.split(',').map(|field| field.trim().to_string()).collect()
}

/// A set of changes to apply to a base store
pub struct StorePatch {
    base_store_dir: PathBuf,
    file_patches: Vec<FilePatch>,
    scenarios_patch: Option<toml::Table>,
}

impl StorePatch {
    /// Create a new empty patch for the store in the given directory
    pub fn new<P: Into<PathBuf>>(base_store_dir: P) -> Self {
        StorePatch {
            base_store_dir: base_store_dir.into(),
            file_patches: Vec::new(),
            scenarios_patch: None,
        }
    }

    /// Add a patch for one CSV file
    pub fn with_file_patch(mut self, patch: FilePatch) -> Self {
        self.file_patches.push(patch);
        self
    }

    /// Add patches for several CSV files
    pub fn with_file_patches<I>(mut self, patches: I) -> Self
    where
        I: IntoIterator<Item = FilePatch>,
    {
        self.file_patches.extend(patches);
        self
    }

    /// Override parts of `scenarios.toml`.
    ///
    /// Tables are merged key by key, so `[base.features]\nof_rps = true` switches on one feature
    /// of the `base` scenario and leaves the rest of it alone. A scenario absent from the base is
    /// added.
    ///
    /// # Panics
    ///
    /// If the string is not valid TOML or a scenarios patch has already been given.
    pub fn with_scenarios_patch(mut self, patch_str: impl AsRef<str>) -> Self {
        assert!(
            self.scenarios_patch.is_none(),
            "Scenarios patch already set for this StorePatch"
        );
        let patch: toml::Table = toml::from_str(patch_str.as_ref())
            .expect("Failed to parse string passed to with_scenarios_patch");
        self.scenarios_patch = Some(patch);
        self
    }

    /// Write the patched store to `out_dir`, which must exist
    pub fn build<O: AsRef<Path>>(&self, out_dir: O) -> Result<()> {
        let base_dir = self.base_store_dir.as_path();
        let out_dir = out_dir.as_ref();

        let base_scenarios_path = base_dir.join(SCENARIOS_FILE_NAME);
        let out_scenarios_path = out_dir.join(SCENARIOS_FILE_NAME);
        if let Some(patch) = &self.scenarios_patch {
            let base = fs::read_to_string(&base_scenarios_path).with_context(|| {
                format!("Could not read {}", base_scenarios_path.display())
            })?;
            fs::write(&out_scenarios_path, merge_scenarios(&base, patch)?)?;
        } else {
            fs::copy(&base_scenarios_path, &out_scenarios_path).with_context(|| {
                format!("Could not copy {}", base_scenarios_path.display())
            })?;
        }

        // Patched files are overwritten below
        for entry in fs::read_dir(base_dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                if let Some(file_name) = path.file_name() {
                    fs::copy(&path, out_dir.join(file_name))?;
                }
            }
        }

        for patch in &self.file_patches {
            patch.apply_and_save(base_dir, out_dir)?;
        }

        Ok(())
    }

    /// Write the patched store to a new temporary directory
    pub fn build_to_tempdir(&self) -> Result<tempfile::TempDir> {
        let temp_dir = tempfile::tempdir()?;
        self.build(temp_dir.path())?;
        Ok(temp_dir)
    }
}

/// Changes to the rows of one CSV file of a store
#[derive(Debug)]
pub struct FilePatch {
    file_name: String,
    header: Option<Row>,
    to_delete: IndexSet<Row>,
    to_add: IndexSet<Row>,
}

impl FilePatch {
    /// Create a new empty patch for the given file (e.g. `entity_members.csv`)
    pub fn new(file_name: impl Into<String>) -> Self {
        FilePatch {
            file_name: file_name.into(),
            header: None,
            to_delete: IndexSet::new(),
            to_add: IndexSet::new(),
        }
    }

    /// Set the expected header (comma separated).
    ///
    /// The base file's header must match. If the base store doesn't have the file, it is created
    /// with this header.
    pub fn with_header(mut self, header: impl AsRef<str>) -> Self {
        assert!(self.header.is_none(), "Header already set for this FilePatch");
        self.header = Some(split_row(header.as_ref()));
        self
    }

    /// Append a row (comma separated)
    pub fn add_row(mut self, row: impl AsRef<str>) -> Self {
        self.to_add.insert(split_row(row.as_ref()));
        self
    }

    /// Remove a row of the base file (comma separated)
    pub fn delete_row(mut self, row: impl AsRef<str>) -> Self {
        self.to_delete.insert(split_row(row.as_ref()));
        self
    }

    fn apply(&self, base_store_dir: &Path) -> Result<String> {
        let base_path = base_store_dir.join(&self.file_name);
        let base = if base_path.is_file() {
            fs::read_to_string(&base_path)?
        } else {
            let header = self.header.as_ref().with_context(|| {
                format!(
                    "{} is not in the base store and the patch has no header",
                    self.file_name
                )
            })?;
            format!("{}\n", header.join(","))
        };

        patch_csv(&base, self).with_context(|| format!("Error patching {}", self.file_name))
    }

    /// Apply the patch to the file in the base store and write the result to `out_store_dir`
    pub fn apply_and_save(&self, base_store_dir: &Path, out_store_dir: &Path) -> Result<()> {
        let patched = self.apply(base_store_dir)?;
        fs::write(out_store_dir.join(&self.file_name), patched)?;
        Ok(())
    }
}

/// Merge `patch` into `base`, recursing into tables present in both
fn merge_tables(base: &mut toml::Table, patch: &toml::Table) {
    for (key, value) in patch {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(patch_table)) => {
                merge_tables(base_table, patch_table);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Merge a patch into the contents of `scenarios.toml`
fn merge_scenarios(base: &str, patch: &toml::Table) -> Result<String> {
    let mut scenarios: toml::Table = toml::from_str(base).context("Invalid scenarios file")?;
    for (name, value) in patch {
        ensure!(
            value.is_table(),
            "Scenario {name} must be a table in the scenarios patch"
        );
    }
    merge_tables(&mut scenarios, patch);

    Ok(toml::to_string_pretty(&scenarios)?)
}

/// Apply a patch to the contents of a CSV file.
///
/// Base rows keep their order; added rows go at the end.
fn patch_csv(base: &str, patch: &FilePatch) -> Result<String> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(base.as_bytes());
    let header: Row = reader
        .headers()
        .context("Failed to read header")?
        .iter()
        .map(ToString::to_string)
        .collect();

    if let Some(expected) = &patch.header {
        ensure!(
            header == *expected,
            "Header mismatch: base file has [{}], patch has [{}]",
            header.join(", "),
            expected.join(", ")
        );
    }

    let mut rows = IndexSet::new();
    for record in reader.records() {
        let row: Row = record?.iter().map(ToString::to_string).collect();
        ensure!(rows.insert(row.clone()), "Duplicate row in base file: {row:?}");
    }

    for row in &patch.to_delete {
        ensure!(
            !patch.to_add.contains(row),
            "Row is both added and deleted: {row:?}"
        );
        ensure!(rows.shift_remove(row), "Row to delete not found: {row:?}");
    }
    for row in &patch.to_add {
        ensure!(
            rows.insert(row.clone()),
            "Row to add is already present: {row:?}"
        );
    }

    let mut writer = Writer::from_writer(vec![]);
    writer.write_record(&header)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(String::from_utf8(writer.into_inner()?)?)
}
