//! The command line interface.
use crate::assembler::{ResolvedScenario, assemble_scenario};
use crate::feature::FeatureRequirements;
use crate::graph::{build_category_graph, check_order, save_category_graph};
use crate::input::{load_scenarios, load_store};
use crate::log;
use crate::output::{ScenarioWriter, create_output_directory, get_output_dir};
use crate::registry::dependency::CROSS_REFERENCES;
use crate::scenario::{Scenario, ScenarioMap};
use crate::settings::Settings;
use crate::store::SubscenarioStore;
use crate::view::scenario_view;
use ::log::{debug, error, info, warn};
use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;

pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for assembling scenarios.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the `resolve` command
#[derive(Args)]
pub struct ResolveOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// Options for the `save-graph` command
#[derive(Args)]
pub struct GraphOpts {
    /// Directory for graph files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Assemble a scenario and write the resolved configuration to file.
    Resolve {
        /// Path to the store directory.
        store_dir: PathBuf,
        /// The name of the scenario.
        scenario: String,
        /// Other resolve options
        #[command(flatten)]
        opts: ResolveOpts,
    },
    /// Check that a scenario (or every scenario in a store) can be assembled.
    Validate {
        /// Path to the store directory.
        store_dir: PathBuf,
        /// The name of the scenario. If omitted, every scenario is validated.
        scenario: Option<String>,
    },
    /// Show which fragment a scenario selects in each category.
    View {
        /// Path to the store directory.
        store_dir: PathBuf,
        /// The name of the scenario.
        scenario: String,
    },
    /// Save the category dependency graph in DOT format.
    SaveGraph {
        /// Other options
        #[command(flatten)]
        opts: GraphOpts,
    },
    /// Manage example stores.
    Example {
        /// The available subcommands for managing example stores.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Resolve {
                store_dir,
                scenario,
                opts,
            } => handle_resolve_command(&store_dir, &scenario, &opts, None),
            Self::Validate {
                store_dir,
                scenario,
            } => handle_validate_command(&store_dir, scenario.as_deref(), None),
            Self::View {
                store_dir,
                scenario,
            } => handle_view_command(&store_dir, &scenario),
            Self::SaveGraph { opts } => handle_save_graph_command(&opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    match cli.command {
        Some(command) => command.execute(),
        None => Ok(Cli::command().print_long_help()?),
    }
}

/// Load program settings, if not provided
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Load the feature requirements named in the settings, or the bundled ones
fn load_requirements(settings: &Settings) -> Result<FeatureRequirements> {
    FeatureRequirements::load(settings.feature_requirements_path.as_deref())
        .context("Failed to load feature requirements.")
}

/// Load the store and its scenarios
fn load_store_and_scenarios(store_path: &Path) -> Result<(SubscenarioStore, ScenarioMap)> {
    let store = load_store(store_path).context("Failed to load store.")?;
    let scenarios = load_scenarios(store_path).context("Failed to load scenarios.")?;
    info!("Loaded store from {}", store_path.display());

    Ok((store, scenarios))
}

/// Look up a scenario by name
fn get_scenario<'a>(scenarios: &'a ScenarioMap, name: &str) -> Result<&'a Scenario> {
    scenarios
        .get(name)
        .with_context(|| format!("Scenario {name} not found in store"))
}

/// Log the violations which didn't block assembly
fn log_warnings(resolved: &ResolvedScenario) {
    for warning in resolved.warnings.iter() {
        warn!("Scenario {}: {warning}", resolved.name);
    }
}

/// Create the output folder and start logging.
///
/// Log files are only written into the folder if `log_to_dir` is set.
fn prepare_output_dir(
    output_path: &Path,
    settings: &Settings,
    overwrite: bool,
    log_to_dir: bool,
) -> Result<()> {
    let overwrite = overwrite || settings.overwrite;
    let replaced = create_output_directory(output_path, overwrite)
        .with_context(|| format!("Failed to create output folder: {}", output_path.display()))?;

    let log_dir = log_to_dir.then_some(output_path);
    log::init(&settings.log_level, log_dir).context("Failed to initialise logging.")?;

    info!("Output folder: {}", output_path.display());
    // Only reported once the logger is up
    if replaced {
        warn!("Output folder will be overwritten");
    }

    Ok(())
}

/// Handle the `resolve` command.
pub fn handle_resolve_command(
    store_path: &Path,
    scenario_name: &str,
    opts: &ResolveOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;
    let output_path = match &opts.output_dir {
        Some(path) => path.clone(),
        None => get_output_dir(store_path, scenario_name, settings.results_root.clone())?,
    };
    prepare_output_dir(&output_path, &settings, opts.overwrite, true)?;
    info!("Starting scenario-assembly v{}", env!("CARGO_PKG_VERSION"));

    let requirements = load_requirements(&settings)?;
    let (store, scenarios) = load_store_and_scenarios(store_path)?;
    let scenario = get_scenario(&scenarios, scenario_name)?;

    let resolved = assemble_scenario(&store, scenario, &requirements)?;
    log_warnings(&resolved);

    let view = scenario_view(&store, scenario);
    ScenarioWriter::new(&output_path).write_all(store_path, &resolved, &view)?;
    info!("Scenario {scenario_name} resolved");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(
    store_path: &Path,
    scenario_name: Option<&str>,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = settings_or_load(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(&settings.log_level, None).context("Failed to initialise logging.")?;

    let requirements = load_requirements(&settings)?;
    let (store, scenarios) = load_store_and_scenarios(store_path)?;
    let to_check: Vec<&Scenario> = match scenario_name {
        Some(name) => vec![get_scenario(&scenarios, name)?],
        None => scenarios.values().collect(),
    };

    let mut failed = 0;
    for scenario in &to_check {
        match assemble_scenario(&store, scenario, &requirements) {
            Ok(resolved) => {
                log_warnings(&resolved);
                info!("Scenario {} is valid", scenario.name);
            }
            Err(err) => {
                error!("{err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} scenarios failed validation", to_check.len());
    }
    info!("Validation successful!");

    Ok(())
}

/// Handle the `view` command.
pub fn handle_view_command(store_path: &Path, scenario_name: &str) -> Result<()> {
    let store = load_store(store_path).context("Failed to load store.")?;
    let scenarios = load_scenarios(store_path).context("Failed to load scenarios.")?;
    let scenario = get_scenario(&scenarios, scenario_name)?;
    print!("{}", scenario_view(&store, scenario));

    Ok(())
}

/// Handle the `save-graph` command.
pub fn handle_save_graph_command(opts: &GraphOpts, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;
    let output_path = opts
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.graph_results_root.clone());
    prepare_output_dir(&output_path, &settings, opts.overwrite, false)?;

    let graph = build_category_graph(CROSS_REFERENCES);
    debug!("Category check order: {:?}", check_order(&graph));
    save_category_graph(&graph, &output_path)?;
    info!("Graph saved to: {}", output_path.display());

    Ok(())
}
