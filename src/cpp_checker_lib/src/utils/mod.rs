//! This module contains various utility modules and helper functions.

pub mod log;

use crate::prelude::*;

/// Get the contents of a configuration file.
///
/// The file is looked up in the configuration directory of the `cpp_checker`,
/// as determined by the `directories` crate.
pub fn read_config_file(filename: &str) -> Result<serde_json::Value, Error> {
    let project_dirs = directories::ProjectDirs::from("", "", "cpp_checker")
        .context("Could not discern location of configuration files.")?;
    let config_dir = project_dirs.config_dir();
    let config_path = config_dir.join(filename);
    let config_file =
        std::fs::read_to_string(config_path).context("Could not read configuration file")?;
    Ok(serde_json::from_str(&config_file)?)
}
