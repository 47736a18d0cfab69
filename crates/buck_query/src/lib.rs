// crates/buck_query/src/lib.rs

use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};

/// Expands build targets into the source directories backing them,
/// optionally building the targets first.
///
/// With `build` set, targets are built before the directories are returned;
/// `use_cache` skips rebuilding targets whose output directory already
/// exists. With `prompt` set, building a wildcard target pattern asks for
/// confirmation on stdin first, since such patterns can expand to a full
/// rebuild. An empty target set resolves to no directories without invoking
/// buck at all.
pub fn generate_source_directories(
    targets: &BTreeSet<String>,
    build: bool,
    prompt: bool,
    use_cache: bool,
) -> Result<Vec<String>> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let mapping = query_target_outputs(targets)?;

    if build {
        let stale: Vec<String> = mapping
            .iter()
            .filter(|(_, directory)| !use_cache || !Path::new(directory).exists())
            .map(|(target, _)| target.clone())
            .collect();
        if !stale.is_empty() {
            // Wildcards are judged on the requested patterns, not on the
            // concrete rules they expanded to.
            if prompt && contains_wildcard_pattern(targets) {
                let question = format!(
                    "About to build {} target pattern(s), which may expand to a full build. Proceed?",
                    stale.len()
                );
                if !confirm(&question)? {
                    bail!("Aborting: build declined");
                }
            }
            build_targets(&stale)?;
        }
    }

    Ok(mapping.into_iter().map(|(_, directory)| directory).collect())
}

/// Maps each target to its output directory via `buck targets --show-output`.
/// Output is one `target path` pair per line.
fn query_target_outputs(targets: &BTreeSet<String>) -> Result<Vec<(String, String)>> {
    let output = Command::new("buck")
        .arg("targets")
        .arg("--show-output")
        .args(targets)
        .output()
        .map_err(|error| anyhow!("Failed to execute buck: {}", error))?;
    if !output.status.success() {
        bail!(
            "buck targets failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let mut mapping = Vec::new();
    for line in stdout.lines() {
        let mut fields = line.split_whitespace();
        if let (Some(target), Some(directory)) = (fields.next(), fields.next()) {
            mapping.push((target.to_string(), directory.to_string()));
        }
    }
    Ok(mapping)
}

fn build_targets(targets: &[String]) -> Result<()> {
    log::info!("Building {} target(s)", targets.len());
    let output = Command::new("buck")
        .arg("build")
        .args(targets)
        .output()
        .map_err(|error| anyhow!("Failed to execute buck: {}", error))?;
    if !output.status.success() {
        bail!(
            "buck build failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Wildcard patterns (`//dir/...` or a bare `//dir:` suffix) can expand to
/// arbitrarily many rules.
fn contains_wildcard_pattern<'a, I>(targets: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    targets
        .into_iter()
        .any(|target| target.ends_with("...") || target.ends_with(':'))
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::env;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests below rewire PATH to point at a fake buck; serialize them.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn targets(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[cfg(unix)]
    fn install_fake_buck(dir: &TempDir, script_body: &str) {
        let path = dir.path().join("buck");
        fs::write(&path, format!("#!/bin/sh\n{}", script_body)).unwrap();
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    fn with_path_prepended<T>(dir: &TempDir, run: impl FnOnce() -> T) -> T {
        let original = env::var("PATH").unwrap_or_default();
        env::set_var(
            "PATH",
            format!("{}:{}", dir.path().display(), original),
        );
        let result = run();
        env::set_var("PATH", original);
        result
    }

    #[test]
    fn empty_target_set_resolves_without_buck() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = env::var("PATH").unwrap_or_default();
        // No buck reachable at all; an empty set must still succeed.
        env::set_var("PATH", "");
        let result = generate_source_directories(&BTreeSet::new(), true, true, false);
        env::set_var("PATH", original);
        assert!(result.unwrap().is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn show_output_lines_become_directories() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = TempDir::new().unwrap();
        install_fake_buck(
            &dir,
            r#"if [ "$1" = "targets" ]; then
  echo "//client:lib /work/client"
  echo "//tools:cli /work/tools"
fi"#,
        );

        let directories = with_path_prepended(&dir, || {
            generate_source_directories(&targets(&["//client:lib", "//tools:cli"]), false, true, false)
        })
        .unwrap();
        assert_eq!(directories, vec!["/work/client", "/work/tools"]);
    }

    #[test]
    #[cfg(unix)]
    fn build_failure_surfaces_stderr() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = TempDir::new().unwrap();
        install_fake_buck(
            &dir,
            r#"if [ "$1" = "targets" ]; then
  echo "//client:lib /work/client"
elif [ "$1" = "build" ]; then
  echo "rule //client:lib is broken" >&2
  exit 1
fi"#,
        );

        let error = with_path_prepended(&dir, || {
            generate_source_directories(&targets(&["//client:lib"]), true, true, false)
        })
        .unwrap_err();
        assert!(error.to_string().contains("rule //client:lib is broken"));
    }

    #[test]
    #[cfg(unix)]
    fn cached_targets_are_not_rebuilt() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = TempDir::new().unwrap();
        let cached_out = dir.path().join("out_cached");
        fs::create_dir(&cached_out).unwrap();
        let missing_out = dir.path().join("out_missing");
        let build_log = dir.path().join("build.log");

        install_fake_buck(
            &dir,
            &format!(
                r#"if [ "$1" = "targets" ]; then
  echo "//cached:lib {}"
  echo "//missing:lib {}"
elif [ "$1" = "build" ]; then
  shift
  echo "$@" >> "{}"
fi"#,
                cached_out.display(),
                missing_out.display(),
                build_log.display()
            ),
        );

        let directories = with_path_prepended(&dir, || {
            generate_source_directories(&targets(&["//cached:lib", "//missing:lib"]), true, true, true)
        })
        .unwrap();
        assert_eq!(directories.len(), 2);

        let built = fs::read_to_string(&build_log).unwrap();
        assert!(built.contains("//missing:lib"));
        assert!(!built.contains("//cached:lib"));
    }

    #[test]
    #[cfg(unix)]
    fn missing_buck_is_an_execution_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = env::var("PATH").unwrap_or_default();
        env::set_var("PATH", "");
        let error =
            generate_source_directories(&targets(&["//client:lib"]), false, true, false)
                .unwrap_err();
        env::set_var("PATH", original);
        assert!(error.to_string().contains("Failed to execute buck"));
    }

    #[test]
    fn wildcard_patterns_are_detected() {
        let wildcards = vec!["//client/...".to_string()];
        assert!(contains_wildcard_pattern(&wildcards));
        let colon = vec!["//client:".to_string()];
        assert!(contains_wildcard_pattern(&colon));
        let concrete = vec!["//client:lib".to_string()];
        assert!(!contains_wildcard_pattern(&concrete));
    }
}
