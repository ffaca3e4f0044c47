//! The `example` subcommands, for working with the bundled stores.
use super::{ResolveOpts, handle_resolve_command, handle_validate_command};
use crate::example::ExampleStore;
use crate::settings::Settings;
use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Subcommands of `example`
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// Print the names of the bundled stores.
    List,
    /// Describe a bundled store and list its scenarios.
    Info {
        /// Name of the store.
        name: String,
    },
    /// Copy a bundled store into a new directory.
    Extract {
        /// Name of the store.
        name: String,
        /// Where to put it. Defaults to a directory named after the store.
        new_path: Option<PathBuf>,
    },
    /// Resolve a scenario of a bundled store, or validate all of its scenarios if none is given.
    Run {
        /// Name of the store.
        name: String,
        /// Scenario to resolve.
        scenario: Option<String>,
        /// Output options for `resolve`
        #[command(flatten)]
        opts: ResolveOpts,
    },
}

impl ExampleSubcommands {
    /// Run the subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => {
                for store in ExampleStore::all() {
                    println!("{}", store.name());
                }
                Ok(())
            }
            Self::Info { name } => print_example_info(&ExampleStore::find(&name)?),
            Self::Extract { name, new_path } => {
                let dest = new_path.unwrap_or_else(|| PathBuf::from(&name));
                ExampleStore::find(&name)?.extract(&dest)
            }
            Self::Run {
                name,
                scenario,
                opts,
            } => handle_example_run_command(&name, scenario.as_deref(), &opts, None),
        }
    }
}

fn print_example_info(store: &ExampleStore) -> Result<()> {
    print!("{}", store.readme()?);
    println!("\nScenarios:");
    for scenario in store.scenario_names()? {
        println!("  {scenario}");
    }

    Ok(())
}

/// Extract a bundled store to a temporary directory and resolve or validate it there
pub fn handle_example_run_command(
    name: &str,
    scenario: Option<&str>,
    opts: &ResolveOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let store = ExampleStore::find(name)?;
    let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
    let store_path = temp_dir.path().join(store.name());
    store.extract(&store_path)?;

    run_on_store(&store_path, scenario, opts, settings)
}

fn run_on_store(
    store_path: &Path,
    scenario: Option<&str>,
    opts: &ResolveOpts,
    settings: Option<Settings>,
) -> Result<()> {
    if let Some(scenario) = scenario {
        handle_resolve_command(store_path, scenario, opts, settings)
    } else {
        handle_validate_command(store_path, None, settings)
    }
}
