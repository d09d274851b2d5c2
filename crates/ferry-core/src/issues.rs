//! Issue and pull request history migration.
//!
//! The engine walks the source repository's item number space in strictly
//! ascending order and replays each missing item at the destination. Numbers
//! must end up identical on both sides, but the host assigns them itself,
//! monotonically, as items are created: the walk order is what makes the
//! numbers line up, and any skipped or failed creation would misalign every
//! item after it. That is why creation failures and number mismatches abort
//! the run, while gaps and already-present items are ordinary skips.

use crate::error::{MigrationError, Result};
use crate::gateway::{find_item, RepoGateway};
use crate::progress::{MigrationPhase, MigrationProgress};
use crate::types::{
    Comment, Issue, ItemKind, ItemState, MigrationReport, NewIssue, NewPullRequest,
    NewReviewComment, PullRequest, RepoItem,
};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Outcome of reconciling one number against the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// The number is absent from the source; a legal gap.
    MissingInSource,
    /// No destination item holds this number; replicate the source item.
    Create,
    /// The destination already holds an item of the same kind and title.
    Matching,
    /// Same kind at the destination, but a different title. Never
    /// overwritten; numbers can collide by coincidence.
    TitleMismatch,
    /// Source and destination disagree about the item kind.
    KindMismatch,
}

/// Decide what to do for one number given both lookups.
pub fn decide(source: Option<&RepoItem>, dest: Option<&RepoItem>) -> SyncDecision {
    let Some(source) = source else {
        return SyncDecision::MissingInSource;
    };
    let Some(dest) = dest else {
        return SyncDecision::Create;
    };

    if source.kind() != dest.kind() {
        SyncDecision::KindMismatch
    } else if source.title() != dest.title() {
        SyncDecision::TitleMismatch
    } else {
        SyncDecision::Matching
    }
}

fn attributed_body(author: &str, created_at: &DateTime<Utc>, url: &str, body: &str) -> String {
    format!(
        "Originally written by {author} on {} at {url}\n\n{body}",
        created_at.to_rfc3339()
    )
}

fn attributed_comment(comment: &Comment) -> String {
    attributed_body(&comment.author, &comment.created_at, &comment.url, &comment.body)
}

/// Replays the issue/PR history of one repository into another.
pub struct HistorySync<'a> {
    source: &'a dyn RepoGateway,
    dest: &'a dyn RepoGateway,
    progress: &'a MigrationProgress,
}

impl<'a> HistorySync<'a> {
    pub fn new(
        source: &'a dyn RepoGateway,
        dest: &'a dyn RepoGateway,
        progress: &'a MigrationProgress,
    ) -> Self {
        Self {
            source,
            dest,
            progress,
        }
    }

    /// Walk numbers 1 through the source's maximum, replicating each item
    /// the destination does not already hold.
    pub async fn run(&self, report: &mut MigrationReport) -> Result<()> {
        let numbers = self.source.list_item_numbers().await?;
        let Some(max) = numbers.into_iter().max() else {
            info!("source repository has no issues or pull requests");
            return Ok(());
        };

        info!(
            "syncing items #1 through #{max} from {} to {}",
            self.source.repo(),
            self.dest.repo()
        );
        self.progress.set_phase(MigrationPhase::SyncingItems, max);

        for number in 1..=max {
            self.sync_number(number, report).await?;
            self.progress.increment(Some(&format!("#{number}")));
        }

        Ok(())
    }

    async fn sync_number(&self, number: u64, report: &mut MigrationReport) -> Result<()> {
        let source_item = find_item(self.source, number).await;

        if let Some(item) = &source_item {
            // Defensive check against a host reporting an inconsistent
            // number; skipping is safe, creating would not be.
            if item.number() != number {
                warn!("#{number}: source reported number {}, skipping", item.number());
                report.add_warning(format!(
                    "#{number}: source number mismatch ({})",
                    item.number()
                ));
                return Ok(());
            }
        }

        // The destination lookup is only needed when the source has an item.
        let dest_item = match &source_item {
            Some(_) => find_item(self.dest, number).await,
            None => None,
        };

        match decide(source_item.as_ref(), dest_item.as_ref()) {
            SyncDecision::MissingInSource => {
                debug!("#{number}: not found in source, skipping");
                report.items_missing += 1;
            }
            SyncDecision::Matching => {
                info!(
                    "#{number}: {} already exists in destination, skipping",
                    source_item.as_ref().map(RepoItem::kind).unwrap_or(ItemKind::Issue)
                );
                report.items_matched += 1;
            }
            SyncDecision::TitleMismatch => {
                warn!("#{number}: title mismatch, skipping");
                report.add_warning(format!("#{number}: title mismatch"));
            }
            SyncDecision::KindMismatch => {
                warn!("#{number}: source and destination kinds differ, skipping");
                report.add_warning(format!("#{number}: kind mismatch"));
            }
            SyncDecision::Create => {
                let item = source_item.expect("Create decision implies a source item");
                info!("#{number}: creating {}", item.kind());

                let created = match self.replicate(&item).await {
                    Ok(created_number) => created_number,
                    Err(e) => {
                        error!("#{number}: replication failed: {e}");
                        return Err(MigrationError::CreationFailed {
                            number,
                            reason: e.to_string(),
                        });
                    }
                };

                if created != number {
                    return Err(MigrationError::AlignmentBroken {
                        expected: number,
                        actual: created,
                    });
                }

                match item.kind() {
                    ItemKind::Issue => report.issues_created += 1,
                    ItemKind::PullRequest => report.prs_created += 1,
                }
            }
        }

        Ok(())
    }

    async fn replicate(&self, item: &RepoItem) -> Result<u64> {
        match item {
            RepoItem::Issue(issue) => self.replicate_issue(issue).await,
            RepoItem::PullRequest(pr) => self.replicate_pull_request(pr).await,
        }
    }

    async fn replicate_issue(&self, issue: &Issue) -> Result<u64> {
        let created = self
            .dest
            .create_issue(&NewIssue {
                title: issue.title.clone(),
                body: issue.body.clone().unwrap_or_default(),
                labels: issue.labels.clone(),
            })
            .await?;

        for comment in self.source.list_comments(issue.number).await? {
            self.dest
                .create_comment(created.number, &attributed_comment(&comment))
                .await?;
        }

        // Close last, so comment creation never runs against a closed item.
        if issue.state == ItemState::Closed {
            self.dest.close_item(created.number, ItemKind::Issue).await?;
        }

        Ok(created.number)
    }

    async fn replicate_pull_request(&self, pr: &PullRequest) -> Result<u64> {
        let created = self
            .dest
            .create_pull_request(&NewPullRequest {
                title: pr.title.clone(),
                base: pr.base_ref.clone(),
                head: pr.head_sha.clone(),
                body: pr.body.clone().unwrap_or_default(),
            })
            .await?;

        for comment in self.source.list_comments(pr.number).await? {
            self.dest
                .create_comment(created.number, &attributed_comment(&comment))
                .await?;
        }

        for review_comment in self.source.list_review_comments(pr.number).await? {
            self.dest
                .create_review_comment(
                    created.number,
                    &NewReviewComment {
                        body: attributed_body(
                            &review_comment.author,
                            &review_comment.created_at,
                            &review_comment.url,
                            &review_comment.body,
                        ),
                        commit_id: review_comment.commit_id.clone(),
                        path: review_comment.path.clone(),
                        position: review_comment.position,
                    },
                )
                .await?;
        }

        if pr.state == ItemState::Closed {
            self.dest
                .close_item(created.number, ItemKind::PullRequest)
                .await?;
        }

        Ok(created.number)
    }
}
