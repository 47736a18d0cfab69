use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::env;

// Library dependencies.
use configuration::{Configuration, CONFIGURATION_FILE};
use filesystem::{Filesystem, OsFilesystem};
use find_project_root::find_project_root;
use resolve_source_dirs::{resolve_source_directories, Arguments, EnvironmentError};

mod services;

use services::BuckGenerator;

fn main() {
    if let Err(error) = run() {
        log::error!("{:#}", error);
        if error.downcast_ref::<EnvironmentError>().is_some() {
            std::process::exit(2);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = Command::new("run_analysis")
        .version("0.1.0")
        .about("Resolves the source directories an analysis run should target")
        .arg(
            Arg::new("source_directory")
                .long("source-directory")
                .action(clap::ArgAction::Append)
                .help("Analyze the given source directory"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .action(clap::ArgAction::Append)
                .help("Analyze the source directories backing the given build target"),
        )
        .arg(
            Arg::new("build")
                .long("build")
                .action(clap::ArgAction::SetTrue)
                .help("Build targets before querying their source directories"),
        )
        .arg(
            Arg::new("use_buck_cache")
                .long("use-buck-cache")
                .action(clap::ArgAction::SetTrue)
                .help("Reuse already-built target output where present"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(clap::ArgAction::SetTrue)
                .help("Enable verbose logging"),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let filesystem = OsFilesystem;
    let original_directory = filesystem
        .current_dir()
        .context("Failed to get current directory")?;

    let project_root = find_project_root(&filesystem, &original_directory, CONFIGURATION_FILE);
    log::info!("Project root: {}", project_root.display());

    let configuration_path = project_root.join(CONFIGURATION_FILE);
    let configuration = if filesystem.is_file(&configuration_path) {
        Configuration::read(&configuration_path)?
    } else {
        // No configuration file anywhere up the tree; explicit arguments
        // can still drive the run.
        Configuration::default()
    };

    env::set_current_dir(&project_root)
        .context("Failed to change directory to the project root")?;

    let arguments = Arguments {
        source_directory: collect_values(&matches, "source_directory"),
        target: collect_values(&matches, "target"),
        original_directory,
        build: matches.get_flag("build"),
        use_buck_cache: matches.get_flag("use_buck_cache"),
    };

    let source_directories =
        resolve_source_directories(&arguments, &configuration, &filesystem, &BuckGenerator)?;

    log::info!("Analyzing {} source director(ies)", source_directories.len());
    for directory in &source_directories {
        println!("{}", directory.display());
    }
    Ok(())
}

fn collect_values(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .get_many::<String>(name)
        .unwrap_or_default()
        .cloned()
        .collect()
}

fn init_logging(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}
