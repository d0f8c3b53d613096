mod commands;
mod logging;
mod output;
mod progress;

use std::io::{self, Write};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, OutputFormat, ScanArgs};
use dotenv::dotenv;
use pkgdir_check_core::finding::KNOWN_FINDINGS;
use pkgdir_check_core::{AppConfig, CheckEngine, ProgressReporter, SilentReporter};
use progress::CliReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    match args.command {
        Some(Commands::Scan(scan_args)) => {
            let config = load_config_or_exit();
            match run_scan(config, &scan_args) {
                Ok(code) => process::exit(code),
                Err(err) => {
                    error!("Error: {:#}", err);
                    process::exit(2);
                }
            }
        }
        Some(Commands::ListChecks) => {
            for (name, severity, desc) in KNOWN_FINDINGS {
                println!("{:<20} {:<8} {}", name, severity.to_string(), desc);
            }
        }
        Some(Commands::PrintConfig) => {
            let config = load_config_or_exit();
            println!("Configuration: {:#?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }
}

/// Loads the configuration, exiting with status 2 when it is invalid.
fn load_config_or_exit() -> AppConfig {
    match pkgdir_check_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(2);
        }
    }
}

fn apply_overrides(mut config: AppConfig, args: &ScanArgs) -> AppConfig {
    if let Some(repo) = &args.repo {
        config.repo_root = repo.clone();
    }
    if args.strict {
        config.strict_unknown_entries = true;
    }
    if args.no_gitignore {
        config.use_gitignore = false;
    }
    if let Some(digest) = args.digest {
        config.digest_algorithm = digest;
    }
    config
        .ignore_patterns
        .extend(args.ignore_patterns.iter().cloned());
    config
}

/// Returns the process exit status: 1 when findings at the failing severity
/// were reported, 0 otherwise.
fn run_scan(config: AppConfig, args: &ScanArgs) -> anyhow::Result<i32> {
    let config = apply_overrides(config, args);
    let repo_root = config.repo_root.clone();
    let engine = CheckEngine::new(config)
        .with_context(|| format!("cannot open repository {}", repo_root))?;

    let cli_reporter;
    let reporter: &dyn ProgressReporter = if args.progress {
        cli_reporter = CliReporter::new();
        &cli_reporter
    } else {
        &SilentReporter
    };
    let result = engine.run(&args.targets, reporter)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => output::write_text(&mut out, &result.findings)?,
        OutputFormat::Json => output::write_json(&mut out, &result.findings)?,
    }
    out.flush()?;

    info!(
        "Checked in {}",
        format!("{:.2}s", result.stats.duration.as_secs_f64()).green()
    );
    if args.format == OutputFormat::Text {
        eprintln!("{}", output::summary(&result.stats));
    }

    let failing = result.stats.errors > 0 || (args.fail_on_warning && result.stats.warnings > 0);
    Ok(if failing { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_checks_parses_without_config() {
        let cli = Cli::try_parse_from(["pkgdir-check", "list-checks"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::ListChecks)));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "pkgdir-check",
            "scan",
            "--repo",
            "/srv/repo",
            "--strict",
            "--no-gitignore",
            "--ignore",
            "**/*.rej",
            "--digest",
            "blake3",
            "dev-libs/foo",
        ]);
        let Some(Commands::Scan(args)) = cli.command else {
            panic!("expected scan");
        };
        let config = AppConfig {
            ignore_patterns: vec!["**/*.orig".to_string()],
            ..AppConfig::default()
        };
        let config = apply_overrides(config, &args);
        assert_eq!(config.repo_root, "/srv/repo");
        assert!(config.strict_unknown_entries);
        assert!(!config.use_gitignore);
        assert_eq!(config.ignore_patterns, ["**/*.orig", "**/*.rej"]);
        assert_eq!(
            config.digest_algorithm,
            pkgdir_check_core::hasher::DigestAlgorithm::Blake3
        );
        assert_eq!(args.targets, ["dev-libs/foo"]);
        assert_eq!(args.format, OutputFormat::Text);
    }
}
