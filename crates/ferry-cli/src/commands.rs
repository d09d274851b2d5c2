//! Command implementations for the ferry CLI.

use anyhow::Result;
use ferry_core::{
    ConsoleProgressReporter, MigrationConfig, MigrationProgress, MigrationReport, Migrator,
};

fn build(config: &MigrationConfig) -> Result<(Migrator, ConsoleProgressReporter)> {
    let reporter = ConsoleProgressReporter::new();
    let progress = MigrationProgress::with_callback(reporter.callback());
    let migrator = Migrator::new(config)?.with_progress(progress);
    Ok((migrator, reporter))
}

fn finish(reporter: &ConsoleProgressReporter, report: &MigrationReport, message: &str) {
    reporter.finish(message);
    report.print_summary();
}

/// Migrate labels, issues, and pull requests.
pub async fn issues(config: &MigrationConfig) -> Result<()> {
    let (migrator, reporter) = build(config)?;
    let report = migrator.migrate_history().await?;
    finish(&reporter, &report, "issue and pull request history migrated");
    Ok(())
}

/// Migrate releases and their assets.
pub async fn releases(config: &MigrationConfig) -> Result<()> {
    let (migrator, reporter) = build(config)?;
    let report = migrator.migrate_releases().await?;
    finish(&reporter, &report, "releases migrated");
    Ok(())
}

/// Migrate everything: labels, history, then releases.
pub async fn all(config: &MigrationConfig) -> Result<()> {
    let (migrator, reporter) = build(config)?;
    let report = migrator.migrate_all().await?;
    finish(&reporter, &report, "migration complete");
    Ok(())
}
