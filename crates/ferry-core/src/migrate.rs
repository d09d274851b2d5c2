//! Top-level migration orchestration.

use crate::error::Result;
use crate::gateway::{DryRunGateway, RepoGateway};
use crate::github::GitHubGateway;
use crate::issues::HistorySync;
use crate::labels::sync_labels;
use crate::progress::{MigrationPhase, MigrationProgress};
use crate::releases::ReleaseSync;
use crate::types::{MigrationConfig, MigrationReport};

use tracing::info;

/// Drives a full migration between two repositories.
pub struct Migrator {
    source: Box<dyn RepoGateway>,
    dest: Box<dyn RepoGateway>,
    progress: MigrationProgress,
}

impl Migrator {
    /// Build a migrator from configuration, connecting both gateways.
    ///
    /// With `dry_run` set, both gateways are wrapped so that every mutating
    /// call is logged and skipped.
    pub fn new(config: &MigrationConfig) -> Result<Self> {
        let source = GitHubGateway::new(
            &config.source_repo,
            &config.source_token,
            &config.source_api_url,
        )?;
        let dest = GitHubGateway::new(
            &config.dest_repo,
            &config.dest_token,
            &config.dest_api_url,
        )?;

        let (source, dest): (Box<dyn RepoGateway>, Box<dyn RepoGateway>) = if config.dry_run {
            (
                Box::new(DryRunGateway::new(source)),
                Box::new(DryRunGateway::new(dest)),
            )
        } else {
            (Box::new(source), Box::new(dest))
        };

        Ok(Self::from_gateways(source, dest))
    }

    /// Build a migrator over arbitrary gateways.
    pub fn from_gateways(source: Box<dyn RepoGateway>, dest: Box<dyn RepoGateway>) -> Self {
        Self {
            source,
            dest,
            progress: MigrationProgress::new(),
        }
    }

    /// Set a progress tracker.
    pub fn with_progress(mut self, progress: MigrationProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Migrate labels and the issue/PR number space.
    pub async fn migrate_history(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::new();
        self.preflight().await?;
        self.run_history(&mut report).await?;
        self.finish(&mut report);
        Ok(report)
    }

    /// Migrate releases and their assets.
    pub async fn migrate_releases(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::new();
        self.preflight().await?;
        self.run_releases(&mut report).await?;
        self.finish(&mut report);
        Ok(report)
    }

    /// Migrate everything: labels, history, then releases.
    pub async fn migrate_all(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::new();
        self.preflight().await?;
        self.run_history(&mut report).await?;
        self.run_releases(&mut report).await?;
        self.finish(&mut report);
        Ok(report)
    }

    // Both repositories must resolve before any mutation is attempted.
    async fn preflight(&self) -> Result<()> {
        self.progress.set_phase(MigrationPhase::Initializing, 1);
        self.source.check_repository().await?;
        self.dest.check_repository().await?;
        info!(
            "migrating from {} to {}",
            self.source.repo(),
            self.dest.repo()
        );
        Ok(())
    }

    async fn run_history(&self, report: &mut MigrationReport) -> Result<()> {
        self.progress.set_phase(MigrationPhase::SyncingLabels, 1);
        report.labels_created = sync_labels(self.source.as_ref(), self.dest.as_ref()).await?;

        HistorySync::new(self.source.as_ref(), self.dest.as_ref(), &self.progress)
            .run(report)
            .await
    }

    async fn run_releases(&self, report: &mut MigrationReport) -> Result<()> {
        ReleaseSync::new(self.source.as_ref(), self.dest.as_ref(), &self.progress)?
            .run(report)
            .await
    }

    fn finish(&self, report: &mut MigrationReport) {
        self.progress.set_phase(MigrationPhase::Complete, 1);
        report.complete();
    }
}
