//! Common types for migration operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for a migration run.
///
/// Passed explicitly into every component at construction; there is no
/// ambient global configuration.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Source repository identifier (e.g., "owner/repo").
    pub source_repo: String,

    /// Destination repository identifier (e.g., "owner/repo").
    pub dest_repo: String,

    /// Access token for the source repository.
    pub source_token: String,

    /// Access token for the destination repository.
    pub dest_token: String,

    /// Source API base URL (defaults to the public GitHub API).
    pub source_api_url: String,

    /// Destination API base URL (defaults to the public GitHub API).
    pub dest_api_url: String,

    /// When set, mutating calls are logged and skipped.
    pub dry_run: bool,

    /// Advisory concurrency hint for asset transfers. The engine currently
    /// transfers sequentially to respect host rate limits.
    pub max_transfers: usize,
}

/// Default API endpoint for repositories hosted on github.com.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

impl MigrationConfig {
    /// Create a configuration for migrating between two repositories.
    pub fn new(source_repo: impl Into<String>, dest_repo: impl Into<String>) -> Self {
        Self {
            source_repo: source_repo.into(),
            dest_repo: dest_repo.into(),
            source_token: String::new(),
            dest_token: String::new(),
            source_api_url: DEFAULT_API_URL.to_string(),
            dest_api_url: DEFAULT_API_URL.to_string(),
            dry_run: false,
            max_transfers: 5,
        }
    }

    /// Set the source access token.
    pub fn with_source_token(mut self, token: impl Into<String>) -> Self {
        self.source_token = token.into();
        self
    }

    /// Set the destination access token.
    pub fn with_dest_token(mut self, token: impl Into<String>) -> Self {
        self.dest_token = token.into();
        self
    }

    /// Set the source API base URL.
    pub fn with_source_api_url(mut self, url: impl Into<String>) -> Self {
        self.source_api_url = url.into();
        self
    }

    /// Set the destination API base URL.
    pub fn with_dest_api_url(mut self, url: impl Into<String>) -> Self {
        self.dest_api_url = url.into();
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Whether a numbered item is an issue or a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Issue => write!(f, "issue"),
            Self::PullRequest => write!(f, "pull request"),
        }
    }
}

/// Open/closed state of an issue or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

/// An issue as read from or written to a repository host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Item number; issues and pull requests share one number space.
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: ItemState,
    /// Names of labels applied to the issue.
    pub labels: Vec<String>,
}

/// A pull request as read from or written to a repository host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Item number; issues and pull requests share one number space.
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: ItemState,
    /// Name of the base branch the pull request targets.
    pub base_ref: String,
    /// Head commit SHA. Replication pins the head to this hash rather than
    /// a branch name, since source branches may be deleted or live in forks.
    pub head_sha: String,
}

/// A numbered repository item: an issue or a pull request.
///
/// The two share one number space, so a lookup by number can resolve to
/// either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoItem {
    Issue(Issue),
    PullRequest(PullRequest),
}

impl RepoItem {
    /// The item's number.
    pub fn number(&self) -> u64 {
        match self {
            Self::Issue(issue) => issue.number,
            Self::PullRequest(pr) => pr.number,
        }
    }

    /// The item's title.
    pub fn title(&self) -> &str {
        match self {
            Self::Issue(issue) => &issue.title,
            Self::PullRequest(pr) => &pr.title,
        }
    }

    /// Whether the item is an issue or a pull request.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Issue(_) => ItemKind::Issue,
            Self::PullRequest(_) => ItemKind::PullRequest,
        }
    }
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Login of the original author.
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// URL of the original comment.
    pub url: String,
    pub body: String,
}

/// A review comment anchored to a diff position on a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
    pub body: String,
    /// Commit the comment was made against.
    pub commit_id: String,
    /// File path the comment is anchored to.
    pub path: String,
    /// Diff line anchor; absent when the comment is outdated.
    pub position: Option<u64>,
}

/// A label that can be applied to issues and pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    /// Label name; the unique key within a repository.
    pub name: String,
    /// Label color in hex format (e.g., "d73a4a").
    pub color: String,
}

/// A release (tagged version) in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Host-assigned release ID.
    pub id: u64,
    /// Release title. The de-duplication key between repositories; two
    /// unnamed releases compare equal.
    pub name: Option<String>,
    /// Tag name (e.g., "v1.0.0").
    pub tag_name: String,
    /// Target branch or commit SHA.
    pub target_commitish: String,
    /// Markdown body (changelog, notes).
    pub body: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
}

/// A binary asset attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Host-assigned asset ID; used to partition the staging area.
    pub id: u64,
    pub name: String,
    /// Size in bytes as reported by the host.
    pub size: u64,
    /// URL the asset bytes can be fetched from.
    pub url: String,
}

/// Payload for creating an issue.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Payload for creating a pull request.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub title: String,
    /// Base branch name at the destination.
    pub base: String,
    /// Head commit SHA.
    pub head: String,
    pub body: String,
}

/// Payload for creating a review comment.
#[derive(Debug, Clone)]
pub struct NewReviewComment {
    pub body: String,
    pub commit_id: String,
    pub path: String,
    pub position: Option<u64>,
}

/// Payload for creating a release.
#[derive(Debug, Clone)]
pub struct NewRelease {
    pub tag_name: String,
    pub target_commitish: String,
    pub name: Option<String>,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// Report of a completed migration run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Number of labels created at the destination.
    pub labels_created: usize,

    /// Number of issues created at the destination.
    pub issues_created: usize,

    /// Number of pull requests created at the destination.
    pub prs_created: usize,

    /// Numbers skipped because the destination already held a matching item.
    pub items_matched: usize,

    /// Numbers absent from the source repository.
    pub items_missing: usize,

    /// Number of releases created at the destination.
    pub releases_created: usize,

    /// Releases skipped because their name already existed at the destination.
    pub releases_skipped: usize,

    /// Number of release assets transferred.
    pub assets_transferred: usize,

    /// Warnings generated during migration (mismatches, failed assets).
    pub warnings: Vec<String>,

    /// Start time of the run.
    pub started_at: Option<DateTime<Utc>>,

    /// End time of the run.
    pub completed_at: Option<DateTime<Utc>>,
}

impl MigrationReport {
    /// Create a new empty report stamped with the current time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Add a warning to the report.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Get the duration of the run.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Print a summary of the run.
    pub fn print_summary(&self) {
        println!("\n=== Migration Summary ===\n");
        println!("Labels created:     {}", self.labels_created);
        println!("Issues created:     {}", self.issues_created);
        println!("PRs created:        {}", self.prs_created);
        println!("Already present:    {}", self.items_matched);
        println!("Gaps in source:     {}", self.items_missing);
        println!("Releases created:   {}", self.releases_created);
        println!("Releases skipped:   {}", self.releases_skipped);
        println!("Assets transferred: {}", self.assets_transferred);

        if let Some(duration) = self.duration() {
            println!("\nCompleted in {} seconds", duration.num_seconds());
        }

        if !self.warnings.is_empty() {
            println!("\nWarnings ({}):", self.warnings.len());
            for warning in &self.warnings {
                println!("  - {warning}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = MigrationConfig::new("old/repo", "new/repo")
            .with_source_token("src_tok")
            .with_dest_token("dst_tok")
            .with_dry_run(true);

        assert_eq!(config.source_repo, "old/repo");
        assert_eq!(config.dest_repo, "new/repo");
        assert_eq!(config.source_api_url, DEFAULT_API_URL);
        assert!(config.dry_run);
    }

    #[test]
    fn test_repo_item_accessors() {
        let item = RepoItem::Issue(Issue {
            number: 7,
            title: "Broken build".to_string(),
            body: None,
            state: ItemState::Open,
            labels: vec![],
        });

        assert_eq!(item.number(), 7);
        assert_eq!(item.title(), "Broken build");
        assert_eq!(item.kind(), ItemKind::Issue);
    }

    #[test]
    fn test_report_duration() {
        let mut report = MigrationReport::new();
        assert!(report.duration().is_none());
        report.complete();
        assert!(report.duration().is_some());
    }
}
