//! Subscenario stores bundled with the program
use anyhow::{Context, Result, bail, ensure};
use include_dir::{Dir, include_dir};
use std::fs;
use std::path::Path;

/// Each subdirectory is one store
static BUNDLED_STORES: Dir = include_dir!("demos");

/// A bundled store, extractable to disk
pub struct ExampleStore {
    name: &'static str,
    dir: &'static Dir<'static>,
}

impl ExampleStore {
    /// All bundled stores, in directory order
    pub fn all() -> impl Iterator<Item = ExampleStore> {
        BUNDLED_STORES.dirs().map(|dir| ExampleStore {
            name: dir.path().to_str().expect("Invalid unicode in path"),
            dir,
        })
    }

    /// Look up a bundled store by name
    pub fn find(name: &str) -> Result<ExampleStore> {
        match Self::all().find(|store| store.name == name) {
            Some(store) => Ok(store),
            None => bail!("Example '{name}' not found"),
        }
    }

    /// The store's directory name
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn text_file(&self, file_name: &str) -> Result<&'static str> {
        self.dir
            .get_file(self.dir.path().join(file_name))
            .with_context(|| format!("{file_name} missing from example '{}'", self.name))?
            .contents_utf8()
            .with_context(|| format!("{file_name} is not valid UTF-8"))
    }

    /// The store's description
    pub fn readme(&self) -> Result<&'static str> {
        self.text_file("README.txt")
    }

    /// Names of the scenarios defined in the store's `scenarios.toml`
    pub fn scenario_names(&self) -> Result<Vec<String>> {
        let scenarios: toml::Table = toml::from_str(self.text_file("scenarios.toml")?)?;
        Ok(scenarios.keys().cloned().collect())
    }

    /// Write the store's files into `new_path`, which must not exist yet
    pub fn extract(&self, new_path: &Path) -> Result<()> {
        ensure!(
            self.dir.dirs().next().is_none(),
            "Example '{}' has nested directories",
            self.name
        );

        fs::create_dir(new_path)
            .with_context(|| format!("Could not create {}", new_path.display()))?;
        for file in self.dir.files() {
            let file_name = file
                .path()
                .file_name()
                .context("Bundled file has no name")?;
            fs::write(new_path.join(file_name), file.contents())?;
        }

        Ok(())
    }
}
