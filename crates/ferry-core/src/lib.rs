//! # Ferry
//!
//! This crate migrates the collaboration history of one GitHub repository
//! into another, typically across identity domains where a plain transfer
//! is not available. It replays issues and pull requests so that every item
//! keeps its original number, carries authorship attribution headers on
//! replicated comments, and recreates releases together with their binary
//! assets.
//!
//! ## Features
//!
//! - **Number-preserving replay**: the engine walks the source number space
//!   in order and re-creates missing items so numbering stays aligned
//! - **Idempotent re-runs**: items and releases already present at the
//!   destination are skipped, never overwritten
//! - **Label sync**: the destination label set becomes a superset of the
//!   source's
//! - **Release migration**: releases are diffed by name and assets are
//!   staged locally before upload
//! - **Dry-run mode**: every mutation is logged and skipped
//!
//! ## Example
//!
//! ```rust,ignore
//! use ferry_core::{MigrationConfig, Migrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MigrationConfig::new("old-org/widgets", "new-org/widgets")
//!         .with_source_token("ghp_old")
//!         .with_dest_token("ghp_new");
//!
//!     let report = Migrator::new(&config)?.migrate_all().await?;
//!     report.print_summary();
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod github;
pub mod issues;
pub mod labels;
pub mod migrate;
pub mod progress;
pub mod releases;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use error::{MigrationError, Result};
pub use gateway::{find_item, DryRunGateway, RepoGateway};
pub use github::GitHubGateway;
pub use issues::{decide, HistorySync, SyncDecision};
pub use labels::sync_labels;
pub use migrate::Migrator;
pub use progress::{ConsoleProgressReporter, MigrationPhase, MigrationProgress, ProgressCallback};
pub use releases::{content_type_for, ReleaseSync};
pub use types::*;

/// Version of the migration engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_target_public_api() {
        let config = MigrationConfig::new("a/b", "c/d");
        assert_eq!(config.source_api_url, DEFAULT_API_URL);
        assert_eq!(config.dest_api_url, DEFAULT_API_URL);
        assert!(!config.dry_run);
    }
}
