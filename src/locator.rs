// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Parsing of user-supplied repository URLs into owner/name identifiers.
//!
//! Both `https://github.com/owner/name` and `git@github.com:owner/name.git`
//! forms are accepted. Parsing is pure: it never performs I/O, so a rejected
//! URL is guaranteed to cost zero remote calls.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// Host serving the repositories this crate analyzes.
pub const HOSTING_DOMAIN: &str = "github.com";
const SSH_PREFIX: &str = "git@github.com:";

/// Normalized owner/name pair addressing one repository.
///
/// Both fields are non-empty and free of path separators. Instances are only
/// produced by [`parse`] and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,)]
pub struct RepositoryIdentifier
{
    owner: String,
    name:  String,
}

impl RepositoryIdentifier
{
    /// Account or organization owning the repository.
    pub fn owner(&self,) -> &str
    {
        &self.owner
    }

    /// Repository name without any `.git` suffix.
    pub fn name(&self,) -> &str
    {
        &self.name
    }
}

impl std::fmt::Display for RepositoryIdentifier
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parses a repository URL into a [`RepositoryIdentifier`].
///
/// Leading and trailing whitespace, a trailing slash and a trailing `.git`
/// suffix are ignored. Path segments after `owner/name` (for example
/// `/tree/main`) are tolerated and dropped.
///
/// # Errors
///
/// Returns [`Error::InvalidRepositoryUrl`] when the input is empty or
/// malformed, when the host is not [`HOSTING_DOMAIN`], or when fewer than two
/// non-empty path segments follow the host.
///
/// # Examples
///
/// ```
/// use repograde::parse_repository_url;
///
/// let repo = parse_repository_url("git@github.com:rust-lang/cargo.git",)?;
/// assert_eq!(repo.to_string(), "rust-lang/cargo");
/// # Ok::<(), repograde::Error>(())
/// ```
pub fn parse(raw: &str,) -> Result<RepositoryIdentifier, Error,>
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_url(raw, "repository URL is required",),);
    }

    let segments = match trimmed.strip_prefix(SSH_PREFIX,) {
        Some(path,) => path.split('/',).map(str::to_owned,).collect::<Vec<_,>>(),
        None => http_segments(raw, trimmed,)?,
    };

    let mut segments = segments.into_iter().filter(|segment| !segment.is_empty(),);
    let (Some(owner,), Some(name,),) = (segments.next(), segments.next(),) else {
        return Err(Error::invalid_url(raw, "expected owner and repository path segments",),);
    };

    let name = name.strip_suffix(".git",).unwrap_or(&name,);

    Ok(RepositoryIdentifier {
        owner: validate_segment(raw, &owner, "owner",)?,
        name:  validate_segment(raw, name, "repository name",)?,
    },)
}

fn http_segments(raw: &str, trimmed: &str,) -> Result<Vec<String,>, Error,>
{
    let candidate = if trimmed.contains("://",) || trimmed.contains(':',) {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate,)
        .map_err(|error| Error::invalid_url(raw, format!("malformed URL: {error}"),),)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_url(raw, format!("unsupported scheme '{}'", url.scheme()),),);
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let host = host.strip_prefix("www.",).unwrap_or(&host,);
    if host != HOSTING_DOMAIN {
        return Err(Error::invalid_url(raw, format!("host must be {HOSTING_DOMAIN}"),),);
    }

    Ok(url
        .path_segments()
        .map(|segments| segments.map(str::to_owned,).collect(),)
        .unwrap_or_default(),)
}

fn validate_segment(raw: &str, segment: &str, field: &str,) -> Result<String, Error,>
{
    if segment.is_empty() {
        return Err(Error::invalid_url(raw, format!("{field} cannot be empty"),),);
    }

    let allowed = |ch: char| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.');
    if !segment.chars().all(allowed,) || segment == "." || segment == ".." {
        return Err(Error::invalid_url(raw, format!("{field} contains invalid characters"),),);
    }

    Ok(segment.to_owned(),)
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::parse;
    use crate::error::Error;

    proptest! {
        #[test]
        fn two_segment_urls_always_parse(owner in "[A-Za-z0-9][A-Za-z0-9-]{0,20}", name in "[A-Za-z0-9_][A-Za-z0-9_.-]{0,30}") {
            prop_assume!(name != ".." && !name.ends_with(".git"));
            let repo = parse(&format!("https://github.com/{owner}/{name}")).expect("valid URL");
            prop_assert_eq!(repo.owner(), owner.as_str());
            prop_assert_eq!(repo.name(), name.as_str());
        }

        #[test]
        fn foreign_hosts_are_rejected(host in "[a-z]{3,12}\\.(com|org|io)", path in "[a-z]{1,8}/[a-z]{1,8}") {
            prop_assume!(host != "github.com");
            let result = parse(&format!("https://{host}/{path}"));
            let rejected = matches!(result, Err(Error::InvalidRepositoryUrl { .. }));
            prop_assert!(rejected);
        }
    }

    #[test]
    fn parses_https_url()
    {
        let repo = parse("https://github.com/octocat/Hello-World",).expect("valid URL",);
        assert_eq!(repo.owner(), "octocat");
        assert_eq!(repo.name(), "Hello-World");
    }

    #[test]
    fn strips_git_suffix_and_trailing_slash()
    {
        let repo = parse("  https://github.com/octocat/hello.git/  ",).expect("valid URL",);
        assert_eq!(repo.to_string(), "octocat/hello");
    }

    #[test]
    fn parses_ssh_form()
    {
        let repo = parse("git@github.com:octocat/hello.git",).expect("valid URL",);
        assert_eq!(repo.owner(), "octocat");
        assert_eq!(repo.name(), "hello");
    }

    #[test]
    fn accepts_www_host_and_missing_scheme()
    {
        let with_www = parse("https://www.github.com/octocat/hello",).expect("valid URL",);
        let bare = parse("github.com/octocat/hello",).expect("valid URL",);
        assert_eq!(with_www, bare);
    }

    #[test]
    fn drops_segments_after_repository()
    {
        let repo = parse("https://github.com/octocat/hello/tree/main/src",).expect("valid URL",);
        assert_eq!(repo.to_string(), "octocat/hello");
    }

    #[test]
    fn rejects_script_urls()
    {
        let error = parse("javascript:alert(1)",).unwrap_err();
        assert!(matches!(error, Error::InvalidRepositoryUrl { .. }));
    }

    #[test]
    fn rejects_single_segment()
    {
        let error = parse("https://github.com/octocat",).unwrap_err();
        match error {
            Error::InvalidRepositoryUrl {
                reason, ..
            } => assert_eq!(reason, "expected owner and repository path segments"),
            other => panic!("expected invalid URL error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_input()
    {
        assert!(parse("   ").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn rejects_foreign_host()
    {
        assert!(parse("https://gitlab.com/octocat/hello").is_err());
        assert!(parse("https://github.com.evil.io/octocat/hello").is_err());
    }

    #[test]
    fn rejects_bare_git_suffix_name()
    {
        assert!(parse("https://github.com/octocat/.git").is_err());
    }
}
