//! The repository gateway capability.
//!
//! Everything the migration engine needs from a repository host is expressed
//! as the [`RepoGateway`] trait. The engine drives two gateways, one for the
//! source repository and one for the destination, and never talks to a host
//! directly. That keeps the reconciliation logic testable against in-memory
//! fakes and lets dry-run mode swap mutations out wholesale.

use crate::error::Result;
use crate::types::{
    Asset, Comment, Issue, ItemKind, ItemState, Label, NewIssue, NewPullRequest, NewRelease,
    NewReviewComment, PullRequest, Release, RepoItem, ReviewComment,
};

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Capability interface over one repository on a host.
///
/// Lookups return `Ok(None)` for a clean not-found; numbers can legally be
/// absent (deleted items leave gaps in the shared issue/PR number space).
#[async_trait]
pub trait RepoGateway: Send + Sync {
    /// The "owner/repo" identifier this gateway is bound to.
    fn repo(&self) -> &str;

    /// Verify the repository exists and is reachable with the configured
    /// credentials. Called once before any mutation.
    async fn check_repository(&self) -> Result<()>;

    /// Fetch the issue at `number`, if one exists.
    async fn find_issue(&self, number: u64) -> Result<Option<Issue>>;

    /// Fetch the pull request at `number`, if one exists.
    async fn find_pull_request(&self, number: u64) -> Result<Option<PullRequest>>;

    /// List every issue and pull request number, open or closed.
    async fn list_item_numbers(&self) -> Result<Vec<u64>>;

    async fn list_labels(&self) -> Result<Vec<Label>>;

    async fn create_label(&self, label: &Label) -> Result<()>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue>;

    async fn create_pull_request(&self, pr: &NewPullRequest) -> Result<PullRequest>;

    /// List the issue-level comments on item `number`, in creation order.
    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>>;

    /// List the review comments on pull request `number`, in creation order.
    async fn list_review_comments(&self, number: u64) -> Result<Vec<ReviewComment>>;

    async fn create_comment(&self, number: u64, body: &str) -> Result<()>;

    async fn create_review_comment(
        &self,
        number: u64,
        comment: &NewReviewComment,
    ) -> Result<()>;

    async fn close_item(&self, number: u64, kind: ItemKind) -> Result<()>;

    async fn list_releases(&self) -> Result<Vec<Release>>;

    async fn create_release(&self, release: &NewRelease) -> Result<Release>;

    async fn list_assets(&self, release: &Release) -> Result<Vec<Asset>>;

    /// Download the asset's bytes to `dest`.
    async fn download_asset(&self, asset: &Asset, dest: &Path) -> Result<()>;

    /// Upload the file at `path` as an asset on `release`.
    async fn upload_asset(
        &self,
        release: &Release,
        path: &Path,
        content_type: &str,
    ) -> Result<()>;
}

/// Resolve the item at `number` with the dual-lookup strategy: pull request
/// first, then issue. Lookup errors are demoted to "not found"; a gap in
/// the number space is an expected outcome, not a fault.
pub async fn find_item(gateway: &dyn RepoGateway, number: u64) -> Option<RepoItem> {
    match gateway.find_pull_request(number).await {
        Ok(Some(pr)) => return Some(RepoItem::PullRequest(pr)),
        Ok(None) => {}
        Err(e) => debug!("#{number}: pull request lookup failed, treating as not found: {e}"),
    }

    match gateway.find_issue(number).await {
        Ok(Some(issue)) => Some(RepoItem::Issue(issue)),
        Ok(None) => None,
        Err(e) => {
            debug!("#{number}: issue lookup failed, treating as not found: {e}");
            None
        }
    }
}

/// Dry-run decorator over a gateway.
///
/// Reads pass through; every mutating or byte-transferring call is replaced
/// by a logged no-op returning a synthetic success value. Created items get
/// numbers from a simulated auto-increment seeded with the wrapped
/// repository's current maximum, so the reconciler's number-alignment check
/// behaves exactly as it would on a live run.
pub struct DryRunGateway<G> {
    inner: G,
    // 0 means unseeded; item numbers are 1-based so 0 is never a real value.
    next_number: AtomicU64,
    next_release_id: AtomicU64,
}

impl<G: RepoGateway> DryRunGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            next_number: AtomicU64::new(0),
            next_release_id: AtomicU64::new(1),
        }
    }

    async fn take_number(&self) -> Result<u64> {
        if self.next_number.load(Ordering::SeqCst) == 0 {
            let max = self
                .inner
                .list_item_numbers()
                .await?
                .into_iter()
                .max()
                .unwrap_or(0);
            self.next_number.store(max + 1, Ordering::SeqCst);
        }
        Ok(self.next_number.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl<G: RepoGateway> RepoGateway for DryRunGateway<G> {
    fn repo(&self) -> &str {
        self.inner.repo()
    }

    async fn check_repository(&self) -> Result<()> {
        self.inner.check_repository().await
    }

    async fn find_issue(&self, number: u64) -> Result<Option<Issue>> {
        self.inner.find_issue(number).await
    }

    async fn find_pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        self.inner.find_pull_request(number).await
    }

    async fn list_item_numbers(&self) -> Result<Vec<u64>> {
        self.inner.list_item_numbers().await
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        self.inner.list_labels().await
    }

    async fn create_label(&self, label: &Label) -> Result<()> {
        info!("[dry-run] would create label {} ({})", label.name, label.color);
        Ok(())
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue> {
        let number = self.take_number().await?;
        info!("[dry-run] would create issue \"{}\" as #{number}", issue.title);
        Ok(Issue {
            number,
            title: issue.title.clone(),
            body: Some(issue.body.clone()),
            state: ItemState::Open,
            labels: issue.labels.clone(),
        })
    }

    async fn create_pull_request(&self, pr: &NewPullRequest) -> Result<PullRequest> {
        let number = self.take_number().await?;
        info!("[dry-run] would create pull request \"{}\" as #{number}", pr.title);
        Ok(PullRequest {
            number,
            title: pr.title.clone(),
            body: Some(pr.body.clone()),
            state: ItemState::Open,
            base_ref: pr.base.clone(),
            head_sha: pr.head.clone(),
        })
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        self.inner.list_comments(number).await
    }

    async fn list_review_comments(&self, number: u64) -> Result<Vec<ReviewComment>> {
        self.inner.list_review_comments(number).await
    }

    async fn create_comment(&self, number: u64, _body: &str) -> Result<()> {
        info!("[dry-run] would comment on #{number}");
        Ok(())
    }

    async fn create_review_comment(
        &self,
        number: u64,
        comment: &NewReviewComment,
    ) -> Result<()> {
        info!(
            "[dry-run] would add review comment on #{number} at {}:{:?}",
            comment.path, comment.position
        );
        Ok(())
    }

    async fn close_item(&self, number: u64, kind: ItemKind) -> Result<()> {
        info!("[dry-run] would close {kind} #{number}");
        Ok(())
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        self.inner.list_releases().await
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release> {
        info!("[dry-run] would create release {}", release.tag_name);
        Ok(Release {
            id: self.next_release_id.fetch_add(1, Ordering::SeqCst),
            name: release.name.clone(),
            tag_name: release.tag_name.clone(),
            target_commitish: release.target_commitish.clone(),
            body: Some(release.body.clone()),
            draft: release.draft,
            prerelease: release.prerelease,
        })
    }

    async fn list_assets(&self, release: &Release) -> Result<Vec<Asset>> {
        self.inner.list_assets(release).await
    }

    async fn download_asset(&self, asset: &Asset, _dest: &Path) -> Result<()> {
        info!("[dry-run] would download asset {} ({} bytes)", asset.name, asset.size);
        Ok(())
    }

    async fn upload_asset(
        &self,
        _release: &Release,
        path: &Path,
        content_type: &str,
    ) -> Result<()> {
        info!("[dry-run] would upload asset {} as {content_type}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryRepo;

    #[tokio::test]
    async fn test_find_item_prefers_pull_request() {
        let repo = InMemoryRepo::new("o/r");
        repo.seed_pull_request(1, "a fix", None, ItemState::Open, "main", "abc123");

        let item = find_item(&repo, 1).await.expect("item should resolve");
        assert_eq!(item.kind(), ItemKind::PullRequest);
    }

    #[tokio::test]
    async fn test_find_item_falls_back_to_issue() {
        let repo = InMemoryRepo::new("o/r");
        repo.seed_issue(3, "a bug", None, ItemState::Open, &[]);

        let item = find_item(&repo, 3).await.expect("item should resolve");
        assert_eq!(item.kind(), ItemKind::Issue);
        assert!(find_item(&repo, 4).await.is_none());
    }

    #[tokio::test]
    async fn test_dry_run_simulates_auto_increment() {
        let repo = InMemoryRepo::new("o/r");
        repo.seed_issue(1, "existing", None, ItemState::Open, &[]);
        repo.seed_issue(2, "existing", None, ItemState::Open, &[]);
        let dry = DryRunGateway::new(repo);

        let issue = dry
            .create_issue(&NewIssue {
                title: "next".to_string(),
                body: String::new(),
                labels: vec![],
            })
            .await
            .unwrap();
        assert_eq!(issue.number, 3);

        let pr = dry
            .create_pull_request(&NewPullRequest {
                title: "after".to_string(),
                base: "main".to_string(),
                head: "abc123".to_string(),
                body: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(pr.number, 4);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let repo = InMemoryRepo::new("o/r");
        let dry = DryRunGateway::new(repo);

        dry.create_label(&Label {
            name: "bug".to_string(),
            color: "d73a4a".to_string(),
        })
        .await
        .unwrap();
        dry.create_comment(1, "hello").await.unwrap();
        dry.close_item(1, ItemKind::Issue).await.unwrap();

        assert_eq!(dry.inner.write_count(), 0);
        assert!(dry.inner.list_labels().await.unwrap().is_empty());
    }
}
