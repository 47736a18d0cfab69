// crates/resolve_source_dirs/src/lib.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use thiserror::Error;

use configuration::Configuration;
use filesystem::Filesystem;

/// Parsed command-line inputs the resolver consumes. The surrounding CLI
/// layer owns flag definitions; this is the record it hands over.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    pub source_directory: Vec<String>,
    pub target: Vec<String>,
    /// The directory the tool was invoked from. Relative paths from every
    /// source are translated against this, not against the project root.
    pub original_directory: PathBuf,
    pub build: bool,
    pub use_buck_cache: bool,
}

/// The invocation offers nothing to analyze.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("No targets or source directories to analyze")]
    NoSourceDirectories,
}

/// Build-query collaborator: expands targets into the source directories
/// backing them, possibly building them first. May block on a subprocess or
/// an interactive prompt.
pub trait SourceDirectoryGenerator {
    fn generate_source_directories(
        &self,
        targets: &BTreeSet<String>,
        build: bool,
        prompt: bool,
        use_cache: bool,
    ) -> Result<Vec<String>>;
}

/// Produces the absolute, deduplicated set of source directories to analyze.
///
/// Directories and targets given on the command line win outright; the
/// configuration is consulted only when the command line supplies neither.
/// Whatever targets end up selected are expanded through `generator` (a
/// single call, prompting enabled) and the expansion is unioned with the
/// directly-supplied directories. Every directory is then translated
/// against `arguments.original_directory` and canonicalized.
pub fn resolve_source_directories(
    arguments: &Arguments,
    configuration: &Configuration,
    filesystem: &dyn Filesystem,
    generator: &dyn SourceDirectoryGenerator,
) -> Result<BTreeSet<PathBuf>> {
    let mut source_directories: BTreeSet<String> =
        arguments.source_directory.iter().cloned().collect();
    let mut targets: BTreeSet<String> = arguments.target.iter().cloned().collect();

    // The configuration only speaks when the command line is silent.
    if source_directories.is_empty() && targets.is_empty() {
        source_directories.extend(configuration.source_directories.iter().cloned());
        targets.extend(configuration.targets.iter().cloned());
    } else {
        log::debug!("Ignoring configuration: explicit arguments were given");
    }

    if source_directories.is_empty() && targets.is_empty() {
        return Err(EnvironmentError::NoSourceDirectories.into());
    }

    let generated = generator.generate_source_directories(
        &targets,
        arguments.build,
        true,
        arguments.use_buck_cache,
    )?;
    log::debug!(
        "{} target(s) expanded into {} director(ies)",
        targets.len(),
        generated.len()
    );
    source_directories.extend(generated);

    Ok(source_directories
        .iter()
        .map(|directory| filesystem.realpath(&arguments.original_directory.join(directory)))
        .collect())
}
