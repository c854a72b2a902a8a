// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// GitHub REST implementation of [`HostingApi`] built on `octocrab`.
///
/// Every route is fetched through the generic `get` helper and decoded into
/// the lean models from [`crate::host`], so only the fields the probes use
/// have to be present in the payload.
use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use octocrab::Octocrab;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::Error,
    host::{
        Branch, ContentEntry, ContentKind, Contributor, HostConnector, HostingApi, Issue,
        PullRequest, RepositoryInfo, VulnerabilityAlert, WeeklyCommitActivity, WorkflowList,
    },
    locator::RepositoryIdentifier,
    retry::{RetryConfig, retry_with_backoff},
};

/// Page size used for every list endpoint.
const PER_PAGE: u8 = 100;

#[derive(Debug, Serialize,)]
struct ListQuery<'a,>
{
    per_page: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    state:    Option<&'a str,>,
}

impl ListQuery<'static,>
{
    const fn page() -> Self
    {
        Self {
            per_page: PER_PAGE, state: None,
        }
    }

    const fn all_states() -> Self
    {
        Self {
            per_page: PER_PAGE, state: Some("all",),
        }
    }

    const fn open() -> Self
    {
        Self {
            per_page: PER_PAGE, state: Some("open",),
        }
    }
}

/// Client issuing REST calls against the GitHub API.
#[derive(Clone,)]
pub struct GithubHost
{
    octocrab:      Octocrab,
    retry:         RetryConfig,
    authenticated: bool,
}

impl GithubHost
{
    /// Wraps an already configured `octocrab` instance.
    pub fn new(octocrab: Octocrab, retry: RetryConfig, authenticated: bool,) -> Self
    {
        Self {
            octocrab,
            retry,
            authenticated,
        }
    }

    async fn get_json<T, P,>(&self, route: String, query: Option<&P,>,) -> Result<T, Error,>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized + Sync,
    {
        debug!("GET {}", route);
        let octocrab = &self.octocrab;
        let route_ref = route.as_str();
        retry_with_backoff(&self.retry, route_ref, || async move {
            octocrab.get::<T, _, P,>(route_ref, query,).await.map_err(remote_error,)
        },)
        .await
    }

    async fn get_content_value(
        &self,
        repo: &RepositoryIdentifier,
        path: &str,
    ) -> Result<serde_json::Value, Error,>
    {
        let route = format!("/repos/{}/{}/contents/{}", repo.owner(), repo.name(), path);
        self.get_json(route, None::<&(),>,).await
    }
}

/// Maps `octocrab` failures onto the crate error taxonomy.
fn remote_error(error: octocrab::Error,) -> Error
{
    match error {
        octocrab::Error::GitHub {
            source, ..
        } => Error::RemoteApi {
            status:  source.status_code.as_u16(),
            message: source.message,
        },
        other => Error::Transport {
            message: other.to_string(),
        },
    }
}

/// Decodes the base64 `content` field of a contents or README payload.
fn decode_content(payload: &serde_json::Value, context: &str,) -> Result<String, Error,>
{
    let encoded = payload
        .get("content",)
        .and_then(serde_json::Value::as_str,)
        .ok_or_else(|| Error::decode(context, "payload has no content field",),)?;

    let compact: String = encoded.chars().filter(|ch| !ch.is_whitespace(),).collect();
    let bytes = STANDARD.decode(compact.as_bytes(),).map_err(|error| Error::decode(context, error,),)?;

    String::from_utf8(bytes,).map_err(|error| Error::decode(context, error,),)
}

fn content_kind(payload: &serde_json::Value,) -> ContentKind
{
    if payload.is_array() {
        return ContentKind::Dir;
    }
    match payload.get("type",).and_then(serde_json::Value::as_str,) {
        Some("file",) => ContentKind::File,
        Some("dir",) => ContentKind::Dir,
        _ => ContentKind::Other,
    }
}

#[async_trait]
impl HostingApi for GithubHost
{
    fn is_authenticated(&self,) -> bool
    {
        self.authenticated
    }

    async fn repository(&self, repo: &RepositoryIdentifier,) -> Result<RepositoryInfo, Error,>
    {
        let route = format!("/repos/{}/{}", repo.owner(), repo.name());
        self.get_json(route, None::<&(),>,).await
    }

    async fn contents(&self, repo: &RepositoryIdentifier, path: &str,)
    -> Result<ContentEntry, Error,>
    {
        let payload = self.get_content_value(repo, path,).await?;
        Ok(ContentEntry {
            path: path.to_owned(), kind: content_kind(&payload,),
        },)
    }

    async fn languages(&self, repo: &RepositoryIdentifier,)
    -> Result<BTreeMap<String, u64,>, Error,>
    {
        let route = format!("/repos/{}/{}/languages", repo.owner(), repo.name());
        self.get_json(route, None::<&(),>,).await
    }

    async fn contributors(&self, repo: &RepositoryIdentifier,)
    -> Result<Vec<Contributor,>, Error,>
    {
        let route = format!("/repos/{}/{}/contributors", repo.owner(), repo.name());
        self.get_json(route, Some(&ListQuery::page(),),).await
    }

    async fn commit_activity(
        &self,
        repo: &RepositoryIdentifier,
    ) -> Result<Vec<WeeklyCommitActivity,>, Error,>
    {
        let route = format!("/repos/{}/{}/stats/commit_activity", repo.owner(), repo.name());
        self.get_json(route, None::<&(),>,).await
    }

    async fn branches(&self, repo: &RepositoryIdentifier,) -> Result<Vec<Branch,>, Error,>
    {
        let route = format!("/repos/{}/{}/branches", repo.owner(), repo.name());
        self.get_json(route, Some(&ListQuery::page(),),).await
    }

    async fn pull_requests(&self, repo: &RepositoryIdentifier,)
    -> Result<Vec<PullRequest,>, Error,>
    {
        let route = format!("/repos/{}/{}/pulls", repo.owner(), repo.name());
        self.get_json(route, Some(&ListQuery::all_states(),),).await
    }

    async fn issues(&self, repo: &RepositoryIdentifier,) -> Result<Vec<Issue,>, Error,>
    {
        let route = format!("/repos/{}/{}/issues", repo.owner(), repo.name());
        self.get_json(route, Some(&ListQuery::all_states(),),).await
    }

    async fn workflows(&self, repo: &RepositoryIdentifier,) -> Result<WorkflowList, Error,>
    {
        let route = format!("/repos/{}/{}/actions/workflows", repo.owner(), repo.name());
        self.get_json(route, None::<&(),>,).await
    }

    async fn readme(&self, repo: &RepositoryIdentifier,) -> Result<String, Error,>
    {
        let route = format!("/repos/{}/{}/readme", repo.owner(), repo.name());
        let payload: serde_json::Value = self.get_json(route, None::<&(),>,).await?;
        decode_content(&payload, "README",)
    }

    async fn vulnerability_alerts(
        &self,
        repo: &RepositoryIdentifier,
    ) -> Result<Vec<VulnerabilityAlert,>, Error,>
    {
        let route = format!("/repos/{}/{}/dependabot/alerts", repo.owner(), repo.name());
        self.get_json(route, Some(&ListQuery::open(),),).await
    }

    async fn file_content(&self, repo: &RepositoryIdentifier, path: &str,)
    -> Result<String, Error,>
    {
        let payload = self.get_content_value(repo, path,).await?;
        if content_kind(&payload,) != ContentKind::File {
            return Err(Error::decode(path, "path does not point to a file",),);
        }
        decode_content(&payload, path,)
    }
}

/// Connector producing [`GithubHost`] clients.
#[derive(Debug, Clone, Default,)]
pub struct GithubConnector
{
    retry:    RetryConfig,
    api_base: Option<String,>,
}

impl GithubConnector
{
    /// Creates a connector with the given retry policy and optional API root.
    pub fn new(retry: RetryConfig, api_base: Option<String,>,) -> Self
    {
        Self {
            retry,
            api_base,
        }
    }
}

impl HostConnector for GithubConnector
{
    fn connect(&self, credential: Option<&str,>,) -> Result<Arc<dyn HostingApi,>, Error,>
    {
        let mut builder = Octocrab::builder();
        if let Some(base,) = self.api_base.as_deref() {
            builder = builder.base_uri(base,).map_err(remote_error,)?;
        }

        let credential = credential.map(str::trim,).filter(|token| !token.is_empty(),);
        if let Some(token,) = credential {
            builder = builder.personal_token(token.to_owned(),);
        } else {
            debug!("no GitHub credential supplied, using unauthenticated rate limits");
        }

        let octocrab = builder.build().map_err(remote_error,)?;
        Ok(Arc::new(GithubHost::new(octocrab, self.retry.clone(), credential.is_some(),),),)
    }
}

#[cfg(test)]
mod tests
{
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_content_handles_wrapped_base64()
    {
        let payload = json!({ "content": "SGVsbG8s\nIHdvcmxk\n", "encoding": "base64" });
        let decoded = decode_content(&payload, "README",).expect("decodable",);
        assert_eq!(decoded, "Hello, world");
    }

    #[test]
    fn decode_content_rejects_missing_field()
    {
        let payload = json!({ "type": "dir" });
        let error = decode_content(&payload, "README",).unwrap_err();
        assert!(matches!(error, Error::Decode { .. }));
    }

    #[test]
    fn content_kind_distinguishes_files_and_directories()
    {
        assert_eq!(content_kind(&json!([{ "name": "a" }])), ContentKind::Dir);
        assert_eq!(content_kind(&json!({ "type": "file" })), ContentKind::File);
        assert_eq!(content_kind(&json!({ "type": "symlink" })), ContentKind::Other);
    }

    #[test]
    fn list_query_serializes_state_only_when_present()
    {
        let page = serde_json::to_value(ListQuery::page(),).expect("serializable",);
        let all = serde_json::to_value(ListQuery::all_states(),).expect("serializable",);
        assert_eq!(page, json!({ "per_page": 100 }));
        assert_eq!(all, json!({ "per_page": 100, "state": "all" }));
    }

    #[tokio::test]
    async fn connector_builds_unauthenticated_client_without_token()
    {
        let connector = GithubConnector::default();
        let client = connector.connect(None,).expect("client builds",);
        assert!(!client.is_authenticated());

        let blank = connector.connect(Some("   ",),).expect("client builds",);
        assert!(!blank.is_authenticated());
    }

    #[tokio::test]
    async fn connector_marks_token_clients_authenticated()
    {
        let connector = GithubConnector::new(RetryConfig::default(), None,);
        let client = connector.connect(Some("ghp_example",),).expect("client builds",);
        assert!(client.is_authenticated());
    }
}
