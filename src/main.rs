//! portal-manifest - catalog member/project pages of a static portal.

mod build;
mod catalog;
mod check;
mod cli;
mod config;
mod diagnostic;
mod discovery;
mod error;
mod logger;
mod manifest;
mod rewrite;

use anyhow::{Context, Result, bail};
use build::{BuildOptions, BuildReport, build_portal};
use check::check_portal;
use clap::Parser;
use cli::{Cli, Commands};
use config::PortalConfig;
use diagnostic::DiagnosticKind;
use manifest::WriteOutcome;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = PortalConfig::load(&cli)?;

    match &cli.command {
        Commands::Build {
            no_rewrite,
            dry_run,
        } => {
            let options = BuildOptions {
                rewrite: !no_rewrite,
                dry_run: *dry_run,
            };
            let report = build_portal(&config, &options)?;
            print_build_summary(&config, &options, &report);
            Ok(())
        }
        Commands::Check => run_check(&config),
    }
}

/// Print diagnostics followed by one line per pass and the manifest status.
fn print_build_summary(config: &PortalConfig, options: &BuildOptions, report: &BuildReport) {
    let diagnostics = &report.diagnostics;
    diagnostics.emit(config.verbose);
    if !config.verbose && !diagnostics.is_empty() {
        let notes = diagnostics.len() - diagnostics.warning_count();
        let missing = diagnostics.of_kind(DiagnosticKind::AssetNotFound).count();
        if notes > 0 {
            log!("note"; "{notes} hidden ({missing} missing asset(s)), rerun with --verbose");
        }
    }

    let verb = if options.dry_run { "would rewrite" } else { "rewrote" };
    if options.rewrite {
        let passes = [
            ("html", config.rewrite.html, report.rewrites.html),
            ("css", config.rewrite.css, report.rewrites.css),
            ("router", config.rewrite.router, report.rewrites.router),
        ];
        for (pass, enabled, count) in passes {
            if enabled {
                log!(pass; "{verb} {count} file(s)");
            }
        }
    }

    let path = config.manifest_path().display();
    match report.manifest {
        WriteOutcome::Written => log!("manifest"; "updated {path}"),
        WriteOutcome::Unchanged => log!("manifest"; "unchanged"),
        WriteOutcome::Pending => log!("manifest"; "would update {path}"),
    }
    log!(
        "manifest";
        "{} member(s), {} project(s), {} page(s)",
        report.catalog.members.len(),
        report.catalog.project_count(),
        report.catalog.html_paths.len()
    );
}

/// Validate the persisted manifest; fails when any error is found.
fn run_check(config: &PortalConfig) -> Result<()> {
    let report = check_portal(config).with_context(|| {
        format!(
            "Failed to load manifest {}",
            config.manifest_path().display()
        )
    })?;

    for warning in &report.warnings {
        log!("warn"; "{warning}");
    }
    for error in &report.errors {
        log!("error"; "{error}");
    }

    if !report.is_ok() {
        bail!(
            "manifest check failed with {} error(s) and {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        );
    }
    log!("check"; "passed with {} warning(s)", report.warnings.len());
    Ok(())
}
