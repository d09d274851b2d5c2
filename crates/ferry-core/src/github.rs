//! GitHub REST adapter for the repository gateway.

use crate::error::{MigrationError, Result};
use crate::gateway::RepoGateway;
use crate::types::{
    Asset, Comment, Issue, ItemKind, ItemState, Label, NewIssue, NewPullRequest, NewRelease,
    NewReviewComment, PullRequest, Release, ReviewComment, DEFAULT_API_URL,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::debug;

/// GitHub API response types
#[derive(Debug, Deserialize)]
struct IssueWire {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    #[serde(default)]
    labels: Vec<LabelWire>,
    // Present when the payload actually describes a pull request; the
    // issues endpoint reports both kinds.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PullRequestWire {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    base: RefWire,
    head: RefWire,
}

#[derive(Debug, Deserialize)]
struct RefWire {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct LabelWire {
    name: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct NumberWire {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct UserWire {
    login: String,
}

#[derive(Debug, Deserialize)]
struct CommentWire {
    body: Option<String>,
    user: UserWire,
    created_at: DateTime<Utc>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ReviewCommentWire {
    body: Option<String>,
    user: UserWire,
    created_at: DateTime<Utc>,
    url: String,
    commit_id: String,
    path: String,
    position: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ReleaseWire {
    id: u64,
    tag_name: String,
    target_commitish: String,
    name: Option<String>,
    body: Option<String>,
    draft: bool,
    prerelease: bool,
}

#[derive(Debug, Deserialize)]
struct AssetWire {
    id: u64,
    name: String,
    size: u64,
    url: String,
}

fn item_state(state: &str) -> ItemState {
    if state == "closed" {
        ItemState::Closed
    } else {
        ItemState::Open
    }
}

impl From<IssueWire> for Issue {
    fn from(wire: IssueWire) -> Self {
        Self {
            number: wire.number,
            title: wire.title,
            body: wire.body,
            state: item_state(&wire.state),
            labels: wire.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

impl From<PullRequestWire> for PullRequest {
    fn from(wire: PullRequestWire) -> Self {
        Self {
            number: wire.number,
            title: wire.title,
            body: wire.body,
            state: item_state(&wire.state),
            base_ref: wire.base.ref_name,
            head_sha: wire.head.sha,
        }
    }
}

impl From<CommentWire> for Comment {
    fn from(wire: CommentWire) -> Self {
        Self {
            author: wire.user.login,
            created_at: wire.created_at,
            url: wire.url,
            body: wire.body.unwrap_or_default(),
        }
    }
}

impl From<ReviewCommentWire> for ReviewComment {
    fn from(wire: ReviewCommentWire) -> Self {
        Self {
            author: wire.user.login,
            created_at: wire.created_at,
            url: wire.url,
            body: wire.body.unwrap_or_default(),
            commit_id: wire.commit_id,
            path: wire.path,
            position: wire.position,
        }
    }
}

impl From<ReleaseWire> for Release {
    fn from(wire: ReleaseWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            tag_name: wire.tag_name,
            target_commitish: wire.target_commitish,
            body: wire.body,
            draft: wire.draft,
            prerelease: wire.prerelease,
        }
    }
}

impl From<AssetWire> for Asset {
    fn from(wire: AssetWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            size: wire.size,
            url: wire.url,
        }
    }
}

/// Gateway bound to one GitHub repository.
pub struct GitHubGateway {
    client: Client,
    token: String,
    api_url: String,
    repo: String,
}

impl GitHubGateway {
    /// Create a gateway for `repo` ("owner/repo") on the host at `api_url`.
    pub fn new(repo: &str, token: &str, api_url: &str) -> Result<Self> {
        if repo.split('/').count() != 2 {
            return Err(MigrationError::InvalidConfig(format!(
                "Invalid repository format: {repo}. Expected 'owner/repo'"
            )));
        }

        let client = Client::builder()
            .user_agent("ferry-migrate")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            token: token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}{path}", self.api_url, self.repo)
    }

    // github.com serves asset uploads from a dedicated host; GHES serves
    // them from the API host.
    fn upload_url(&self, path: &str) -> String {
        let base = if self.api_url == DEFAULT_API_URL {
            "https://uploads.github.com"
        } else {
            self.api_url.as_str()
        };
        format!("{base}/repos/{}{path}", self.repo)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
    }

    async fn error_for_status(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(MigrationError::AuthenticationFailed(
                "Bad credentials".to_string(),
            ));
        }

        if status == StatusCode::FORBIDDEN {
            if let Some(reset) = response.headers().get("x-ratelimit-reset") {
                if let Ok(reset_time) = reset.to_str().unwrap_or("0").parse::<u64>() {
                    let now = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0);
                    if reset_time > now {
                        return Err(MigrationError::RateLimitExceeded(reset_time - now));
                    }
                }
            }
            return Err(MigrationError::AuthenticationFailed(
                "Access denied. Check your token permissions.".to_string(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MigrationError::ApiError(format!(
                "GitHub API error ({status}): {body}"
            )));
        }

        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        let response = self.error_for_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| MigrationError::ApiError(e.to_string()))
    }

    /// GET that maps a clean 404 to `None`.
    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = self.error_for_status(response).await?;
        response
            .json()
            .await
            .map(Some)
            .map_err(|e| MigrationError::ApiError(e.to_string()))
    }

    async fn get_paginated<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let base_url = self.url(path);
        let separator = if base_url.contains('?') { '&' } else { '?' };
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            let url = format!("{base_url}{separator}page={page}&per_page=100");
            let items: Vec<T> = self.get(&url).await?;

            if items.is_empty() {
                break;
            }

            let count = items.len();
            all_items.extend(items);

            if count < 100 {
                break;
            }
            page += 1;
        }

        Ok(all_items)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .authorized(request.json(body))
            .send()
            .await
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        let response = self.error_for_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| MigrationError::ApiError(e.to_string()))
    }
}

#[async_trait]
impl RepoGateway for GitHubGateway {
    fn repo(&self) -> &str {
        &self.repo
    }

    async fn check_repository(&self) -> Result<()> {
        let url = format!("{}/repos/{}", self.api_url, self.repo);
        match self.get_optional::<serde_json::Value>(&url).await? {
            Some(_) => Ok(()),
            None => Err(MigrationError::RepositoryNotFound(self.repo.clone())),
        }
    }

    async fn find_issue(&self, number: u64) -> Result<Option<Issue>> {
        let wire: Option<IssueWire> = self.get_optional(&self.url(&format!("/issues/{number}"))).await?;
        match wire {
            // The issues endpoint also reports pull requests; a payload
            // carrying the marker is not an issue.
            Some(wire) if wire.pull_request.is_some() => {
                debug!("#{number}: issue payload is a pull request");
                Ok(None)
            }
            Some(wire) => Ok(Some(wire.into())),
            None => Ok(None),
        }
    }

    async fn find_pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        let wire: Option<PullRequestWire> =
            self.get_optional(&self.url(&format!("/pulls/{number}"))).await?;
        Ok(wire.map(Into::into))
    }

    async fn list_item_numbers(&self) -> Result<Vec<u64>> {
        let items: Vec<NumberWire> = self.get_paginated("/issues?state=all").await?;
        Ok(items.into_iter().map(|i| i.number).collect())
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        let labels: Vec<LabelWire> = self.get_paginated("/labels").await?;
        Ok(labels
            .into_iter()
            .map(|l| Label {
                name: l.name,
                color: l.color,
            })
            .collect())
    }

    async fn create_label(&self, label: &Label) -> Result<()> {
        let _: serde_json::Value = self
            .send_json(
                self.client.post(self.url("/labels")),
                &json!({ "name": label.name, "color": label.color }),
            )
            .await?;
        Ok(())
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue> {
        let wire: IssueWire = self
            .send_json(
                self.client.post(self.url("/issues")),
                &json!({
                    "title": issue.title,
                    "body": issue.body,
                    "labels": issue.labels,
                }),
            )
            .await?;
        Ok(wire.into())
    }

    async fn create_pull_request(&self, pr: &NewPullRequest) -> Result<PullRequest> {
        let wire: PullRequestWire = self
            .send_json(
                self.client.post(self.url("/pulls")),
                &json!({
                    "title": pr.title,
                    "base": pr.base,
                    "head": pr.head,
                    "body": pr.body,
                }),
            )
            .await?;
        Ok(wire.into())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        let comments: Vec<CommentWire> = self
            .get_paginated(&format!("/issues/{number}/comments"))
            .await?;
        Ok(comments.into_iter().map(Into::into).collect())
    }

    async fn list_review_comments(&self, number: u64) -> Result<Vec<ReviewComment>> {
        let comments: Vec<ReviewCommentWire> = self
            .get_paginated(&format!("/pulls/{number}/comments"))
            .await?;
        Ok(comments.into_iter().map(Into::into).collect())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        let _: serde_json::Value = self
            .send_json(
                self.client.post(self.url(&format!("/issues/{number}/comments"))),
                &json!({ "body": body }),
            )
            .await?;
        Ok(())
    }

    async fn create_review_comment(
        &self,
        number: u64,
        comment: &NewReviewComment,
    ) -> Result<()> {
        let _: serde_json::Value = self
            .send_json(
                self.client.post(self.url(&format!("/pulls/{number}/comments"))),
                &json!({
                    "body": comment.body,
                    "commit_id": comment.commit_id,
                    "path": comment.path,
                    "position": comment.position,
                }),
            )
            .await?;
        Ok(())
    }

    async fn close_item(&self, number: u64, kind: ItemKind) -> Result<()> {
        let path = match kind {
            ItemKind::Issue => format!("/issues/{number}"),
            ItemKind::PullRequest => format!("/pulls/{number}"),
        };
        let _: serde_json::Value = self
            .send_json(
                self.client.patch(self.url(&path)),
                &json!({ "state": "closed" }),
            )
            .await?;
        Ok(())
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        let releases: Vec<ReleaseWire> = self.get_paginated("/releases").await?;
        Ok(releases.into_iter().map(Into::into).collect())
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release> {
        let wire: ReleaseWire = self
            .send_json(
                self.client.post(self.url("/releases")),
                &json!({
                    "tag_name": release.tag_name,
                    "target_commitish": release.target_commitish,
                    "name": release.name,
                    "body": release.body,
                    "draft": release.draft,
                    "prerelease": release.prerelease,
                }),
            )
            .await?;
        Ok(wire.into())
    }

    async fn list_assets(&self, release: &Release) -> Result<Vec<Asset>> {
        let assets: Vec<AssetWire> = self
            .get_paginated(&format!("/releases/{}/assets", release.id))
            .await?;
        Ok(assets.into_iter().map(Into::into).collect())
    }

    async fn download_asset(&self, asset: &Asset, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(&asset.url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/octet-stream")
            .send()
            .await
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MigrationError::TransferFailed(format!(
                "download of {} failed with status {}",
                asset.name,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }

    async fn upload_asset(
        &self,
        release: &Release,
        path: &Path,
        content_type: &str,
    ) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                MigrationError::TransferFailed(format!("invalid asset path: {}", path.display()))
            })?;
        let data = tokio::fs::read(path).await?;

        let url = self.upload_url(&format!("/releases/{}/assets?name={file_name}", release.id));
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MigrationError::TransferFailed(format!(
                "upload of {file_name} failed with status {status}: {body}"
            )));
        }

        Ok(())
    }
}
