//! Release migration: diff by name, recreate, transfer assets.

use crate::error::Result;
use crate::gateway::RepoGateway;
use crate::progress::{MigrationPhase, MigrationProgress};
use crate::types::{MigrationReport, NewRelease, Release};

use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::{error, info, warn};

/// Content type for an asset file name, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "zip" | "vsix" => "application/zip",
        "tgz" => "application/gzip",
        "json" => "application/json",
        "manifest" => "application/manifest+json",
        "p7s" => "application/pkcs7-signature",
        _ => "application/octet-stream",
    }
}

/// Recreates missing releases at the destination and ferries their assets
/// through a local staging directory.
pub struct ReleaseSync<'a> {
    source: &'a dyn RepoGateway,
    dest: &'a dyn RepoGateway,
    progress: &'a MigrationProgress,
    staging: TempDir,
}

impl<'a> ReleaseSync<'a> {
    pub fn new(
        source: &'a dyn RepoGateway,
        dest: &'a dyn RepoGateway,
        progress: &'a MigrationProgress,
    ) -> Result<Self> {
        Ok(Self {
            source,
            dest,
            progress,
            staging: TempDir::new()?,
        })
    }

    /// Migrate every source release whose name is absent at the destination.
    ///
    /// Releases are de-duplicated by name, not tag; that is the key the
    /// destination set is built from. Asset failures are reported and
    /// skipped, never fatal.
    pub async fn run(&self, report: &mut MigrationReport) -> Result<()> {
        let existing: HashSet<Option<String>> = self
            .dest
            .list_releases()
            .await?
            .into_iter()
            .map(|release| release.name)
            .collect();
        let releases = self.source.list_releases().await?;

        self.progress
            .set_phase(MigrationPhase::SyncingReleases, releases.len() as u64);

        for release in &releases {
            let label = release.name.as_deref().unwrap_or(&release.tag_name);
            info!("processing release: {label}");

            if existing.contains(&release.name) {
                info!("skipping existing release: {label}");
                report.releases_skipped += 1;
                self.progress.increment(Some(label));
                continue;
            }

            let created = match self
                .dest
                .create_release(&NewRelease {
                    tag_name: release.tag_name.clone(),
                    target_commitish: release.target_commitish.clone(),
                    name: release.name.clone(),
                    body: release.body.clone().unwrap_or_default(),
                    draft: release.draft,
                    prerelease: release.prerelease,
                })
                .await
            {
                Ok(created) => created,
                Err(e) => {
                    error!("failed to create release {label}: {e}");
                    report.add_warning(format!("release {label}: creation failed: {e}"));
                    self.progress.increment(Some(label));
                    continue;
                }
            };
            report.releases_created += 1;

            self.transfer_assets(release, &created, report).await?;
            info!("all assets for release {label} transferred");
            self.progress.increment(Some(label));
        }

        Ok(())
    }

    // Downloads, then uploads, strictly one asset at a time. Sequential on
    // purpose: parallel transfers trip host rate limits.
    async fn transfer_assets(
        &self,
        source_release: &Release,
        dest_release: &Release,
        report: &mut MigrationReport,
    ) -> Result<()> {
        let assets = self.source.list_assets(source_release).await?;

        let mut staged: Vec<PathBuf> = Vec::new();
        for asset in &assets {
            // Staging is partitioned per asset id so identically named
            // assets from different releases never collide.
            let path = self
                .staging
                .path()
                .join(asset.id.to_string())
                .join(&asset.name);

            info!("downloading asset: {} ({} bytes)", asset.name, asset.size);
            match self.source.download_asset(asset, &path).await {
                Ok(()) => staged.push(path),
                Err(e) => {
                    warn!("failed to download asset {}: {e}", asset.name);
                    report.add_warning(format!("asset {}: download failed: {e}", asset.name));
                }
            }
        }

        for path in &staged {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();

            info!("uploading asset: {file_name}");
            match self
                .dest
                .upload_asset(dest_release, path, content_type_for(file_name))
                .await
            {
                Ok(()) => report.assets_transferred += 1,
                Err(e) => {
                    warn!("failed to upload asset {file_name}: {e}");
                    report.add_warning(format!("asset {file_name}: upload failed: {e}"));
                }
            }
        }

        Ok(())
    }
}
