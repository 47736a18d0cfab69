// crates/run_analysis/src/services.rs

use std::collections::BTreeSet;

use anyhow::Result;

use resolve_source_dirs::SourceDirectoryGenerator;

/// Buck-backed implementation of the build-query seam the resolver
/// consumes. Constructed here and injected, so the resolver never reaches
/// for the real build system on its own.
pub struct BuckGenerator;

impl SourceDirectoryGenerator for BuckGenerator {
    fn generate_source_directories(
        &self,
        targets: &BTreeSet<String>,
        build: bool,
        prompt: bool,
        use_cache: bool,
    ) -> Result<Vec<String>> {
        buck_query::generate_source_directories(targets, build, prompt, use_cache)
    }
}
