//! Program settings, read from `settings.toml` in the user's configuration directory.
use crate::get_config_dir;
use crate::input::{input_err_msg, read_toml};
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result, ensure};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// If set, the settings file is ignored (used by integration tests)
const USE_DEFAULT_SETTINGS_ENV_VAR: &str = "SCENARIO_ASSEMBLY_USE_DEFAULT_SETTINGS";

const DEFAULT_SETTINGS_FILE_HEADER: &str = concat!(
    "# Program settings for scenario-assembly v",
    env!("CARGO_PKG_VERSION"),
    ".
#
# Every option is shown with its default value, commented out. Uncomment a line to change it.
# The defaults for the installed version can be printed with:
# \tscenario-assembly settings show-default
"
);

/// The path the settings file is read from
pub fn get_settings_file_path() -> PathBuf {
    get_config_dir().join(SETTINGS_FILE_NAME)
}

/// Program settings
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// The default program log level
    pub log_level: String,
    /// Whether to overwrite output files by default
    pub overwrite: bool,
    /// Folder under which resolved scenarios are written. Defaults to `assembly_results`.
    pub results_root: PathBuf,
    /// Folder in which the category dependency graph is written. Defaults to `assembly_graphs`.
    pub graph_results_root: PathBuf,
    /// TOML file of feature requirements to use instead of the bundled table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_requirements_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            overwrite: false,
            results_root: PathBuf::from("assembly_results"),
            graph_results_root: PathBuf::from("assembly_graphs"),
            feature_requirements_path: None,
        }
    }
}

impl Settings {
    /// Load the user's settings.
    ///
    /// Defaults are used if there is no settings file or [`USE_DEFAULT_SETTINGS_ENV_VAR`] is set.
    pub fn load() -> Result<Settings> {
        if env::var_os(USE_DEFAULT_SETTINGS_ENV_VAR).is_some() {
            return Ok(Settings::default());
        }

        Self::from_path(&get_settings_file_path())
    }

    fn from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        settings
            .check()
            .with_context(|| input_err_msg(file_path))?;

        Ok(settings)
    }

    fn check(&self) -> Result<()> {
        ensure!(
            !self.results_root.as_os_str().is_empty(),
            "results_root cannot be empty"
        );
        if let Some(path) = &self.feature_requirements_path {
            ensure!(
                path.is_file(),
                "Feature requirements file not found: {}",
                path.display()
            );
        }

        Ok(())
    }

    /// A settings file with every option commented out and documented
    pub fn default_file_contents() -> String {
        let defaults =
            toml::to_string(&Settings::default()).expect("Could not convert settings to TOML");

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in defaults.lines() {
            let Some((field, _)) = line.split_once('=') else {
                continue;
            };

            // Every field has a doc comment
            let docs = Settings::get_field_docs(field.trim()).expect("Missing doc comment for field");
            out.push('\n');
            for doc_line in docs.lines() {
                writeln!(out, "# # {}", doc_line.trim()).unwrap();
            }
            writeln!(out, "# {line}").unwrap();
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn no_settings_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(Settings::from_path(&file_path).unwrap(), Settings::default());
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let requirements_path = dir.path().join("requirements.toml");
        fs::write(&requirements_path, "").unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(
            &file_path,
            format!(
                "log_level = \"warn\"\nfeature_requirements_path = {:?}\n",
                requirements_path.to_str().unwrap()
            ),
        )
        .unwrap();

        assert_eq!(
            Settings::from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".to_string(),
                feature_requirements_path: Some(requirements_path),
                ..Settings::default()
            }
        );
    }

    #[test]
    fn missing_requirements_file() {
        let settings = Settings {
            feature_requirements_path: Some("no_such_file.toml".into()),
            ..Settings::default()
        };
        assert_error!(
            settings.check(),
            "Feature requirements file not found: no_such_file.toml"
        );
    }

    #[test]
    fn wrong_value_type() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "overwrite = \"sometimes\"\n").unwrap();
        assert!(Settings::from_path(&file_path).is_err());
    }

    #[test]
    fn default_file_contents() {
        let contents = Settings::default_file_contents();
        assert!(contents.contains("# results_root = \"assembly_results\""));
        assert!(contents.contains("# # The default program log level\n# log_level = \"info\""));
        assert!(!contents.contains("feature_requirements_path"));
    }
}
