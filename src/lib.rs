//! Common functionality for assembling and validating capacity-expansion scenarios.
//!
//! A scenario picks one fragment ("subscenario") per input category and switches optional model
//! features on or off. The [`assembler`] checks that the choices agree with each other and with
//! the enabled features, then resolves the temporal hierarchy that the optimiser is indexed
//! against.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod assembler;
pub mod category;
pub mod cli;
pub mod example;
pub mod feature;
pub mod graph;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod patch;
pub mod registry;
pub mod scenario;
pub mod settings;
pub mod store;
pub mod temporal;
pub mod view;
pub mod violation;

#[cfg(test)]
mod fixture;

/// Get the directory in which program configuration files are stored.
///
/// # Panics
///
/// If the platform has no notion of a per-user configuration directory.
pub fn get_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        panic!("Could not determine configuration directory for this platform");
    };
    config_dir.push("scenario-assembly");

    config_dir
}
