// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Hosting API seam used by the probes.
///
/// The trait exposes one method per remote capability. Implementations fail
/// with [`Error::RemoteApi`] on non-2xx answers and never treat a missing
/// credential as an error.
use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::Error, locator::RepositoryIdentifier};

/// Repository metadata kept in the details bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct RepositoryInfo
{
    pub name:              String,
    pub full_name:         String,
    #[serde(default)]
    pub description:       Option<String,>,
    #[serde(default)]
    pub html_url:          Option<String,>,
    #[serde(default)]
    pub default_branch:    Option<String,>,
    /// Repository size in kilobytes as reported by the API.
    #[serde(default)]
    pub size:              u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub stargazers_count:  u64,
    #[serde(default)]
    pub forks_count:       u64,
    #[serde(default)]
    pub created_at:        Option<DateTime<Utc,>,>,
    #[serde(default)]
    pub pushed_at:         Option<DateTime<Utc,>,>,
}

/// Kind of object found at a repository path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind
{
    File,
    Dir,
    Other,
}

/// Existence probe result for a repository path.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ContentEntry
{
    pub path: String,
    pub kind: ContentKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct Contributor
{
    pub login:         String,
    #[serde(default)]
    pub contributions: u64,
}

/// One week of the commit-activity series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct WeeklyCommitActivity
{
    /// Unix timestamp of the first day of the week.
    pub week:  i64,
    pub total: u64,
    #[serde(default)]
    pub days:  Vec<u64,>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct Branch
{
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize,)]
#[serde(rename_all = "snake_case")]
pub enum ItemState
{
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct PullRequest
{
    pub number: u64,
    pub state:  ItemState,
}

#[derive(Debug, Clone, PartialEq, Deserialize,)]
pub struct Issue
{
    pub number:       u64,
    pub state:        ItemState,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value,>,
}

impl Issue
{
    /// Returns `true` for plain issues, `false` for pull requests.
    pub fn is_plain_issue(&self,) -> bool
    {
        self.pull_request.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize,)]
pub struct WorkflowList
{
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize,)]
pub struct VulnerabilityAlert
{
    pub number: u64,
    #[serde(default)]
    pub state:  Option<String,>,
}

/// Remote capabilities needed by the probe set.
#[async_trait]
pub trait HostingApi: Send + Sync
{
    /// Whether requests carry a credential.
    fn is_authenticated(&self,) -> bool;

    async fn repository(&self, repo: &RepositoryIdentifier,)
    -> Result<RepositoryInfo, Error,>;

    /// Resolves a path; fails with a 404 [`Error::RemoteApi`] when absent.
    async fn contents(&self, repo: &RepositoryIdentifier, path: &str,)
    -> Result<ContentEntry, Error,>;

    /// Byte counts per language.
    async fn languages(&self, repo: &RepositoryIdentifier,)
    -> Result<BTreeMap<String, u64,>, Error,>;

    async fn contributors(&self, repo: &RepositoryIdentifier,)
    -> Result<Vec<Contributor,>, Error,>;

    async fn commit_activity(
        &self,
        repo: &RepositoryIdentifier,
    ) -> Result<Vec<WeeklyCommitActivity,>, Error,>;

    async fn branches(&self, repo: &RepositoryIdentifier,) -> Result<Vec<Branch,>, Error,>;

    /// Pull requests in every state.
    async fn pull_requests(&self, repo: &RepositoryIdentifier,)
    -> Result<Vec<PullRequest,>, Error,>;

    /// Issues in every state; the listing may include pull requests.
    async fn issues(&self, repo: &RepositoryIdentifier,) -> Result<Vec<Issue,>, Error,>;

    async fn workflows(&self, repo: &RepositoryIdentifier,) -> Result<WorkflowList, Error,>;

    /// Decoded README text.
    async fn readme(&self, repo: &RepositoryIdentifier,) -> Result<String, Error,>;

    /// Open vulnerability alerts; usually requires elevated permissions.
    async fn vulnerability_alerts(
        &self,
        repo: &RepositoryIdentifier,
    ) -> Result<Vec<VulnerabilityAlert,>, Error,>;

    /// Decoded text of a single file.
    async fn file_content(&self, repo: &RepositoryIdentifier, path: &str,)
    -> Result<String, Error,>;
}

/// Builds hosting clients for an optional credential.
///
/// The pipeline asks for a second, credential-less client when the hosting
/// API rejects the supplied credential on the first call.
pub trait HostConnector: Send + Sync
{
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the client cannot be constructed.
    fn connect(&self, credential: Option<&str,>,) -> Result<Arc<dyn HostingApi,>, Error,>;
}
