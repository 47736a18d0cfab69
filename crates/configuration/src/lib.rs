// crates/configuration/src/lib.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the persisted configuration file. Its presence in a directory
/// also marks that directory as the project root for the upward search.
pub const CONFIGURATION_FILE: &str = ".analysis_configuration";

/// Persisted analysis defaults, read from the project root. Either field
/// may be omitted from the file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub source_directories: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
}

impl Configuration {
    /// Reads and parses the configuration file at `path`.
    pub fn read(path: &Path) -> Result<Configuration> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Error opening {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }
}
