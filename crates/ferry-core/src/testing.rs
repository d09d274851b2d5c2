//! In-memory repository fake backing the engine's unit tests.

use crate::error::{MigrationError, Result};
use crate::gateway::RepoGateway;
use crate::types::{
    Asset, Comment, Issue, ItemKind, ItemState, Label, NewIssue, NewPullRequest, NewRelease,
    NewReviewComment, PullRequest, Release, RepoItem, ReviewComment,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    items: BTreeMap<u64, RepoItem>,
    comments: BTreeMap<u64, Vec<Comment>>,
    review_comments: BTreeMap<u64, Vec<ReviewComment>>,
    created_review_comments: BTreeMap<u64, Vec<NewReviewComment>>,
    labels: Vec<Label>,
    releases: Vec<Release>,
    assets: BTreeMap<u64, Vec<Asset>>,
    asset_bodies: BTreeMap<u64, Vec<u8>>,
    uploads: Vec<(u64, String, String)>,
    downloads: Vec<u64>,
    next_item_override: Option<u64>,
    next_release_id: u64,
    writes: u64,
    fail_repository_check: bool,
    fail_item_creation: bool,
    fail_release_creation: bool,
    failing_downloads: HashSet<u64>,
}

/// A repository that lives entirely in memory.
///
/// Seeding helpers set up pre-existing state without counting as writes;
/// the write counter only tracks mutations performed through the gateway,
/// which is what "no mutation happened" assertions care about. Clones share
/// state, so a test can hand one handle to the engine and inspect another.
#[derive(Clone)]
pub struct InMemoryRepo {
    repo: String,
    state: Arc<Mutex<State>>,
}

fn parse_time(at: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(at)
        .expect("test timestamps must be RFC 3339")
        .with_timezone(&Utc)
}

impl InMemoryRepo {
    pub fn new(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            state: Arc::new(Mutex::new(State {
                next_release_id: 1,
                ..Default::default()
            })),
        }
    }

    pub fn seed_issue(
        &self,
        number: u64,
        title: &str,
        body: Option<&str>,
        state: ItemState,
        labels: &[&str],
    ) {
        self.state.lock().unwrap().items.insert(
            number,
            RepoItem::Issue(Issue {
                number,
                title: title.to_string(),
                body: body.map(|b| b.to_string()),
                state,
                labels: labels.iter().map(|l| l.to_string()).collect(),
            }),
        );
    }

    pub fn seed_pull_request(
        &self,
        number: u64,
        title: &str,
        body: Option<&str>,
        state: ItemState,
        base_ref: &str,
        head_sha: &str,
    ) {
        self.state.lock().unwrap().items.insert(
            number,
            RepoItem::PullRequest(PullRequest {
                number,
                title: title.to_string(),
                body: body.map(|b| b.to_string()),
                state,
                base_ref: base_ref.to_string(),
                head_sha: head_sha.to_string(),
            }),
        );
    }

    pub fn seed_comment(&self, number: u64, author: &str, at: &str, url: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .comments
            .entry(number)
            .or_default()
            .push(Comment {
                author: author.to_string(),
                created_at: parse_time(at),
                url: url.to_string(),
                body: body.to_string(),
            });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn seed_review_comment(
        &self,
        number: u64,
        author: &str,
        at: &str,
        url: &str,
        body: &str,
        commit_id: &str,
        path: &str,
        position: Option<u64>,
    ) {
        self.state
            .lock()
            .unwrap()
            .review_comments
            .entry(number)
            .or_default()
            .push(ReviewComment {
                author: author.to_string(),
                created_at: parse_time(at),
                url: url.to_string(),
                body: body.to_string(),
                commit_id: commit_id.to_string(),
                path: path.to_string(),
                position,
            });
    }

    pub fn seed_label(&self, name: &str, color: &str) {
        self.state.lock().unwrap().labels.push(Label {
            name: name.to_string(),
            color: color.to_string(),
        });
    }

    pub fn seed_release(&self, name: Option<&str>, tag_name: &str, target: &str) -> Release {
        let mut state = self.state.lock().unwrap();
        let release = Release {
            id: state.next_release_id,
            name: name.map(|n| n.to_string()),
            tag_name: tag_name.to_string(),
            target_commitish: target.to_string(),
            body: None,
            draft: false,
            prerelease: false,
        };
        state.next_release_id += 1;
        state.releases.push(release.clone());
        release
    }

    pub fn seed_asset(&self, release: &Release, id: u64, name: &str, body: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.assets.entry(release.id).or_default().push(Asset {
            id,
            name: name.to_string(),
            size: body.len() as u64,
            url: format!("mem://assets/{id}"),
        });
        state.asset_bodies.insert(id, body.to_vec());
    }

    /// Override the number the next created item receives, simulating a
    /// destination whose auto-increment does not line up.
    pub fn force_next_number(&self, number: u64) {
        self.state.lock().unwrap().next_item_override = Some(number);
    }

    pub fn fail_repository_check(&self) {
        self.state.lock().unwrap().fail_repository_check = true;
    }

    pub fn fail_item_creation(&self) {
        self.state.lock().unwrap().fail_item_creation = true;
    }

    pub fn fail_release_creation(&self) {
        self.state.lock().unwrap().fail_release_creation = true;
    }

    pub fn fail_download(&self, asset_id: u64) {
        self.state.lock().unwrap().failing_downloads.insert(asset_id);
    }

    /// Mutations performed through the gateway; seeds are not counted.
    pub fn write_count(&self) -> u64 {
        self.state.lock().unwrap().writes
    }

    pub fn download_count(&self) -> usize {
        self.state.lock().unwrap().downloads.len()
    }

    /// Uploaded assets as (release id, file name, content type).
    pub fn uploads(&self) -> Vec<(u64, String, String)> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn item(&self, number: u64) -> Option<RepoItem> {
        self.state.lock().unwrap().items.get(&number).cloned()
    }

    pub fn comment_bodies(&self, number: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(&number)
            .map(|comments| comments.iter().map(|c| c.body.clone()).collect())
            .unwrap_or_default()
    }

    pub fn review_comments(&self, number: u64) -> Vec<NewReviewComment> {
        self.state
            .lock()
            .unwrap()
            .created_review_comments
            .get(&number)
            .cloned()
            .unwrap_or_default()
    }

    fn next_item_number(state: &mut State) -> u64 {
        state
            .next_item_override
            .take()
            .unwrap_or_else(|| state.items.keys().max().copied().unwrap_or(0) + 1)
    }
}

#[async_trait]
impl RepoGateway for InMemoryRepo {
    fn repo(&self) -> &str {
        &self.repo
    }

    async fn check_repository(&self) -> Result<()> {
        if self.state.lock().unwrap().fail_repository_check {
            return Err(MigrationError::RepositoryNotFound(self.repo.clone()));
        }
        Ok(())
    }

    async fn find_issue(&self, number: u64) -> Result<Option<Issue>> {
        Ok(match self.state.lock().unwrap().items.get(&number) {
            Some(RepoItem::Issue(issue)) => Some(issue.clone()),
            _ => None,
        })
    }

    async fn find_pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        Ok(match self.state.lock().unwrap().items.get(&number) {
            Some(RepoItem::PullRequest(pr)) => Some(pr.clone()),
            _ => None,
        })
    }

    async fn list_item_numbers(&self) -> Result<Vec<u64>> {
        Ok(self.state.lock().unwrap().items.keys().copied().collect())
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        Ok(self.state.lock().unwrap().labels.clone())
    }

    async fn create_label(&self, label: &Label) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.labels.push(label.clone());
        state.writes += 1;
        Ok(())
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue> {
        let mut state = self.state.lock().unwrap();
        if state.fail_item_creation {
            return Err(MigrationError::ApiError("issue creation disabled".to_string()));
        }
        let number = Self::next_item_number(&mut state);
        let created = Issue {
            number,
            title: issue.title.clone(),
            body: Some(issue.body.clone()),
            state: ItemState::Open,
            labels: issue.labels.clone(),
        };
        state.items.insert(number, RepoItem::Issue(created.clone()));
        state.writes += 1;
        Ok(created)
    }

    async fn create_pull_request(&self, pr: &NewPullRequest) -> Result<PullRequest> {
        let mut state = self.state.lock().unwrap();
        if state.fail_item_creation {
            return Err(MigrationError::ApiError(
                "pull request creation disabled".to_string(),
            ));
        }
        let number = Self::next_item_number(&mut state);
        let created = PullRequest {
            number,
            title: pr.title.clone(),
            body: Some(pr.body.clone()),
            state: ItemState::Open,
            base_ref: pr.base.clone(),
            head_sha: pr.head.clone(),
        };
        state
            .items
            .insert(number, RepoItem::PullRequest(created.clone()));
        state.writes += 1;
        Ok(created)
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .comments
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_review_comments(&self, number: u64) -> Result<Vec<ReviewComment>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .review_comments
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.comments.entry(number).or_default().push(Comment {
            author: "ferry".to_string(),
            created_at: Utc::now(),
            url: String::new(),
            body: body.to_string(),
        });
        state.writes += 1;
        Ok(())
    }

    async fn create_review_comment(
        &self,
        number: u64,
        comment: &NewReviewComment,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .created_review_comments
            .entry(number)
            .or_default()
            .push(comment.clone());
        state.writes += 1;
        Ok(())
    }

    async fn close_item(&self, number: u64, _kind: ItemKind) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.items.get_mut(&number) {
            Some(RepoItem::Issue(issue)) => issue.state = ItemState::Closed,
            Some(RepoItem::PullRequest(pr)) => pr.state = ItemState::Closed,
            None => {
                return Err(MigrationError::ApiError(format!(
                    "cannot close missing item #{number}"
                )))
            }
        }
        state.writes += 1;
        Ok(())
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        Ok(self.state.lock().unwrap().releases.clone())
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release> {
        let mut state = self.state.lock().unwrap();
        if state.fail_release_creation {
            return Err(MigrationError::ApiError(
                "release creation disabled".to_string(),
            ));
        }
        let created = Release {
            id: state.next_release_id,
            name: release.name.clone(),
            tag_name: release.tag_name.clone(),
            target_commitish: release.target_commitish.clone(),
            body: Some(release.body.clone()),
            draft: release.draft,
            prerelease: release.prerelease,
        };
        state.next_release_id += 1;
        state.releases.push(created.clone());
        state.writes += 1;
        Ok(created)
    }

    async fn list_assets(&self, release: &Release) -> Result<Vec<Asset>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .assets
            .get(&release.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn download_asset(&self, asset: &Asset, dest: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_downloads.contains(&asset.id) {
            return Err(MigrationError::TransferFailed(format!(
                "download of {} refused",
                asset.name
            )));
        }
        let body = state.asset_bodies.get(&asset.id).cloned().unwrap_or_default();
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, body)?;
        state.downloads.push(asset.id);
        Ok(())
    }

    async fn upload_asset(
        &self,
        release: &Release,
        path: &Path,
        content_type: &str,
    ) -> Result<()> {
        // The staged file must actually exist; uploads read real bytes.
        let _ = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let mut state = self.state.lock().unwrap();
        state
            .uploads
            .push((release.id, file_name, content_type.to_string()));
        state.writes += 1;
        Ok(())
    }
}
