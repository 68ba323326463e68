mod file_creation;

use std::{fs, path::Path};

use file_creation::create_default_config_file;

use super::{Config, ConfigPaths};
use crate::{ConnuiError, Result};

impl Config {
    /// Loads a configuration file, creating it with defaults when missing
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file or its directory cannot be created
    /// - The configuration file cannot be read
    /// - The TOML content is invalid
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            create_default_config_file(path)?;
        }

        let content = fs::read_to_string(path).map_err(|e| ConnuiError::io(e, path))?;
        Self::parse(&content, Some(path))
    }

    /// Loads the configuration from its standard location
    ///
    /// # Errors
    /// Returns an error if the location cannot be resolved or the file is invalid
    pub fn load_default() -> Result<Config> {
        let path = ConfigPaths::main_config()?;
        Self::load(&path)
    }

    /// Parses configuration from TOML text
    ///
    /// # Errors
    /// Returns [`ConnuiError::TomlParseError`] for malformed TOML or wrongly typed values
    pub fn parse(content: &str, origin: Option<&Path>) -> Result<Config> {
        toml::from_str(content).map_err(|e| ConnuiError::toml_parse(e, origin))
    }
}
