// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Probe implementations.
//!
//! Every probe is split in two halves. [`Probe::fetch`] performs the remote
//! calls and returns the gathered [`Evidence`]; a failed fetch leaves the
//! accumulator untouched because nothing has been applied yet.
//! [`Evidence::apply`] is synchronous and merges the evidence through the
//! mutation primitives of [`ScoreRecord`]. The orchestrator checks for
//! cancellation between the two halves, so a result fetched after a
//! cancellation request is dropped without effect.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    error::Error,
    host::{Contributor, HostingApi, ItemState, RepositoryInfo, WeeklyCommitActivity},
    locator::RepositoryIdentifier,
    manifest::{MANIFEST_PATH, PackageManifest},
    patterns::{DetectorSet, FileFindings, SAMPLE_FILES},
    readme::{ReadmeScorer, ReadmeSignals},
    report::DetailsBag,
    score::{Dimension, ScoreRecord},
    step::Probe,
};

/// Marker paths whose presence the contents probe checks, in request order.
pub const MARKER_PATHS: [&str; 27] = [
    ".github/workflows",
    ".github/CODEOWNERS",
    "README.md",
    "LICENSE",
    "CONTRIBUTING.md",
    "CODE_OF_CONDUCT.md",
    ".eslintrc.json",
    ".eslintrc.js",
    ".prettierrc",
    ".editorconfig",
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "tests",
    "test",
    "__tests__",
    "docs",
    "src",
    "src/components",
    "src/containers",
    "src/services",
    "src/utils",
    "src/hooks",
    "src/providers",
    "src/context",
    "src/models",
    "src/store",
];

const DOCUMENTATION_MARKERS: [&str; 5] =
    ["README.md", "LICENSE", "CONTRIBUTING.md", "CODE_OF_CONDUCT.md", "docs"];
const STYLE_MARKERS: [&str; 4] = [".eslintrc.json", ".eslintrc.js", ".prettierrc", ".editorconfig"];
const DEPENDENCY_MARKERS: [&str; 3] = ["package.json", "package-lock.json", "yarn.lock"];
const TEST_MARKERS: [&str; 3] = ["tests", "test", "__tests__"];
const ORGANIZATION_MARKERS: [&str; 5] = ["src", "docs", "test", "tests", "__tests__"];
const SECURITY_MARKERS: [&str; 2] = [".github/workflows", ".github/CODEOWNERS"];

const SECURITY_POLICY_PATH: &str = "SECURITY.md";
const README_PATH: &str = "README.md";

/// Compiled regex catalogues shared by every analysis of one analyzer.
pub struct Toolkit
{
    detectors: DetectorSet,
    readme:    ReadmeScorer,
}

impl Toolkit
{
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a detector expression fails to
    /// compile.
    pub fn new() -> Result<Self, Error,>
    {
        Ok(Self {
            detectors: DetectorSet::compile()?,
            readme:    ReadmeScorer::new()?,
        },)
    }
}

/// Inputs shared by every probe of one run.
pub struct ProbeContext<'a,>
{
    pub api:            &'a dyn HostingApi,
    pub repo:           &'a RepositoryIdentifier,
    pub toolkit:        &'a Toolkit,
    /// "Now" used for the repository age.
    pub reference_time: DateTime<Utc,>,
}

/// Score record and details bag owned by one run.
#[derive(Debug, Clone, Default, PartialEq,)]
pub struct Accumulator
{
    pub scores:  ScoreRecord,
    pub details: DetailsBag,
}

/// Data gathered by a successful fetch, waiting to be applied.
#[derive(Debug, Clone, PartialEq,)]
pub enum Evidence
{
    RepoInfo(RepositoryInfo,),
    /// Presence flag for every entry of [`MARKER_PATHS`].
    Contents(BTreeMap<&'static str, bool,>,),
    Languages(BTreeMap<String, u64,>,),
    Contributors(Vec<Contributor,>,),
    Commits
    {
        activity:       Vec<WeeklyCommitActivity,>,
        reference_time: DateTime<Utc,>,
    },
    Branches(usize,),
    PullRequests
    {
        open: usize, closed: usize,
    },
    Issues
    {
        open: usize, closed: usize,
    },
    CodePatterns(Vec<FileFindings,>,),
    SafeCodePatterns
    {
        readme_length: Option<usize,>,
        manifest:      Option<PackageManifest,>,
    },
    Workflows(u64,),
    Readme(ReadmeSignals,),
    Dependencies(PackageManifest,),
    Security
    {
        has_policy: bool,
        alerts:     Option<usize,>,
    },
}

impl Probe
{
    /// Name used in diagnostics.
    pub const fn label(self,) -> &'static str
    {
        match self {
            Self::RepoInfo => "repo-info",
            Self::Contents => "contents",
            Self::Languages => "languages",
            Self::Contributors => "contributors",
            Self::Commits => "commits",
            Self::Branches => "branches",
            Self::PullRequests => "pull-requests",
            Self::Issues => "issues",
            Self::CodePatterns => "code-patterns",
            Self::SafeCodePatterns => "code-patterns (conservative)",
            Self::Workflows => "workflows",
            Self::Readme => "readme",
            Self::Dependencies => "dependencies",
            Self::Security => "security",
        }
    }

    /// Performs the remote calls of this probe.
    ///
    /// # Errors
    ///
    /// Returns the first remote or decoding error of the probe's required
    /// call. Optional sub-checks (marker paths, sampled files, alerts) never
    /// fail the probe.
    pub async fn fetch(self, ctx: &ProbeContext<'_,>,) -> Result<Evidence, Error,>
    {
        let api = ctx.api;
        let repo = ctx.repo;

        match self {
            Self::RepoInfo => Ok(Evidence::RepoInfo(api.repository(repo,).await?,),),
            Self::Contents => {
                let mut presence = BTreeMap::new();
                let mut inconclusive = Vec::new();
                for path in MARKER_PATHS {
                    match api.contents(repo, path,).await {
                        Ok(_,) => {
                            presence.insert(path, true,);
                        }
                        Err(error,) => {
                            if !error.is_not_found() {
                                debug!("marker {} inconclusive: {}", path, error);
                                inconclusive.push(error,);
                            }
                            presence.insert(path, false,);
                        }
                    }
                }
                // Only non-404 failures: the repository itself was unreachable.
                if inconclusive.len() == MARKER_PATHS.len() {
                    if let Some(error,) = inconclusive.pop() {
                        return Err(error,);
                    }
                }
                Ok(Evidence::Contents(presence,),)
            }
            Self::Languages => Ok(Evidence::Languages(api.languages(repo,).await?,),),
            Self::Contributors => Ok(Evidence::Contributors(api.contributors(repo,).await?,),),
            Self::Commits => Ok(Evidence::Commits {
                activity:       api.commit_activity(repo,).await?,
                reference_time: ctx.reference_time,
            },),
            Self::Branches => Ok(Evidence::Branches(api.branches(repo,).await?.len(),),),
            Self::PullRequests => {
                let pulls = api.pull_requests(repo,).await?;
                let (open, closed,) = count_states(pulls.iter().map(|pull| pull.state,),);
                Ok(Evidence::PullRequests {
                    open,
                    closed,
                },)
            }
            Self::Issues => {
                let issues = api.issues(repo,).await?;
                let states = issues.iter().filter(|issue| issue.is_plain_issue(),).map(|issue| issue.state,);
                let (open, closed,) = count_states(states,);
                Ok(Evidence::Issues {
                    open,
                    closed,
                },)
            }
            Self::CodePatterns => {
                let mut files = Vec::new();
                for path in SAMPLE_FILES {
                    match api.file_content(repo, path,).await {
                        Ok(content,) => files.push(((*path).to_owned(), content,),),
                        Err(error,) => debug!("skipping sample {}: {}", path, error),
                    }
                }
                Ok(Evidence::CodePatterns(ctx.toolkit.detectors.scan_all(&files,),),)
            }
            Self::SafeCodePatterns => Ok(fetch_conservative_samples(api, repo,).await,),
            Self::Workflows => Ok(Evidence::Workflows(api.workflows(repo,).await?.total_count,),),
            Self::Readme => {
                let text = api.readme(repo,).await?;
                Ok(Evidence::Readme(ctx.toolkit.readme.signals(&text,),),)
            }
            Self::Dependencies => {
                let text = api.file_content(repo, MANIFEST_PATH,).await?;
                Ok(Evidence::Dependencies(PackageManifest::parse(&text,)?,),)
            }
            Self::Security => {
                let has_policy = api.contents(repo, SECURITY_POLICY_PATH,).await.is_ok();
                let alerts = match api.vulnerability_alerts(repo,).await {
                    Ok(alerts,) => Some(alerts.len(),),
                    Err(error,) => {
                        debug!("vulnerability alerts unavailable: {}", error);
                        None
                    }
                };
                Ok(Evidence::Security {
                    has_policy,
                    alerts,
                },)
            }
        }
    }
}

fn count_states<I,>(states: I,) -> (usize, usize,)
where
    I: Iterator<Item = ItemState,>,
{
    states.fold((0, 0,), |(open, closed,), state| match state {
        ItemState::Open => (open + 1, closed,),
        ItemState::Closed => (open, closed + 1,),
        ItemState::Unknown => (open, closed,),
    },)
}

/// Reads README.md, then package.json, stopping at the first failed read.
async fn fetch_conservative_samples(api: &dyn HostingApi, repo: &RepositoryIdentifier,) -> Evidence
{
    let readme_length = match api.file_content(repo, README_PATH,).await {
        Ok(text,) => text.chars().count(),
        Err(error,) => {
            debug!("{} unavailable, skipping remaining samples: {}", README_PATH, error);
            return Evidence::SafeCodePatterns {
                readme_length: None,
                manifest:      None,
            };
        }
    };

    let manifest = match api.file_content(repo, MANIFEST_PATH,).await {
        Ok(text,) => PackageManifest::parse(&text,)
            .map_err(|error| debug!("ignoring unparsable {}: {}", MANIFEST_PATH, error),)
            .ok(),
        Err(error,) => {
            debug!("{} unavailable: {}", MANIFEST_PATH, error);
            None
        }
    };

    Evidence::SafeCodePatterns {
        readme_length: Some(readme_length,),
        manifest,
    }
}

fn ratio_score(open: usize, closed: usize,) -> Option<f64,>
{
    let total = open + closed;
    (total > 0).then(|| closed as f64 / total as f64 * 10.0,)
}

/// Rewards a moderate branch count, peaking at ten branches. Zero branches
/// yield negative infinity, which drags the blend down to the score floor.
fn branch_score(count: usize,) -> f64
{
    let distance = ((count as f64).log10() - 1.0).abs();
    (5.0 * (1.0 - distance / 2.0)).min(5.0,)
}

fn marker_weight(
    presence: &BTreeMap<&'static str, bool,>,
    markers: &[&'static str],
    weight: f64,
) -> f64
{
    markers.iter().filter(|marker| presence.get(*marker,).copied().unwrap_or(false,),).count() as f64 * weight
}

impl Evidence
{
    /// Merges the evidence into the accumulator.
    pub fn apply(self, acc: &mut Accumulator,)
    {
        let scores = &mut acc.scores;
        let details = &mut acc.details;

        match self {
            Self::RepoInfo(info,) => {
                let size = info.size as f64;
                let issue_ratio = info.open_issues_count as f64 / (size / 100.0).max(1.0,);
                scores.set_if_unset(Dimension::FileOrganization, 5.0 + size / 10_000.0,);
                scores.set_if_unset(Dimension::MaintainabilityIndex, 10.0 - issue_ratio,);
                details.repo_info = Some(info,);
            }
            Self::Contents(presence,) => {
                let any_tests = TEST_MARKERS.iter().any(|marker| presence.get(marker,).copied().unwrap_or(false,),);

                scores.set_if_unset(
                    Dimension::DocumentationCoverage,
                    marker_weight(&presence, &DOCUMENTATION_MARKERS, 2.0,).min(10.0,),
                );
                scores.set_if_unset(
                    Dimension::StyleConsistency,
                    marker_weight(&presence, &STYLE_MARKERS, 2.5,).min(10.0,),
                );
                scores.set_if_unset(
                    Dimension::DependencyManagement,
                    marker_weight(&presence, &DEPENDENCY_MARKERS, 3.5,).min(10.0,),
                );
                scores.set_if_unset(Dimension::TestCoverage, if any_tests { 7.0 } else { 3.0 },);
                scores.set_if_unset(
                    Dimension::SecurityVulnerabilities,
                    marker_weight(&presence, &SECURITY_MARKERS, 5.0,).min(10.0,),
                );

                let previous = scores.value_or_placeholder(Dimension::FileOrganization,);
                let organization = marker_weight(&presence, &ORGANIZATION_MARKERS, 2.0,);
                scores.overwrite(Dimension::FileOrganization, previous / 2.0 + organization,);
            }
            Self::Languages(languages,) => {
                let count = languages.len() as f64;
                let total: u64 = languages.values().sum();
                let primary = languages.values().copied().max().unwrap_or(0,);

                scores.set_if_unset(Dimension::CodeComplexity, 10.0 - (count - 1.0),);
                // an empty map yields NaN, which clamps to the floor
                scores.set_if_unset(Dimension::CodeDuplication, 10.0 * primary as f64 / total as f64,);
                details.languages = languages;
            }
            Self::Contributors(contributors,) => {
                let contribution = (contributors.len() as f64 / 2.0).min(5.0,);
                scores.blend_average(Dimension::MaintainabilityIndex, contribution,);
                details.contributors = contributors;
            }
            Self::Commits {
                activity,
                reference_time,
            } => {
                let created = details.repo_info.as_ref().and_then(|info| info.created_at,);
                match created {
                    Some(created,) => {
                        let total: u64 = activity.iter().map(|week| week.total,).sum();
                        let age_weeks = (reference_time - created).num_weeks().max(1,);
                        let per_week = total as f64 / age_weeks as f64;
                        scores.set_commit_history((per_week + 1.0).log2() * 3.0,);
                    }
                    None => debug!("repository creation date unknown, skipping commit history"),
                }
                details.commit_activity = activity;
            }
            Self::Branches(count,) => {
                scores.blend_average(Dimension::FileOrganization, branch_score(count,),);
            }
            Self::PullRequests {
                open,
                closed,
            }
            | Self::Issues {
                open,
                closed,
            } => {
                if let Some(score,) = ratio_score(open, closed,) {
                    scores.blend_average(Dimension::MaintainabilityIndex, score,);
                }
            }
            Self::CodePatterns(findings,) => {
                for file in findings {
                    file.merge_into(details,);
                }
            }
            Self::SafeCodePatterns {
                readme_length,
                manifest,
            } => {
                if let Some(length,) = readme_length {
                    details.readme_length = Some(length,);
                    if length > 1000 {
                        scores.max_floor(Dimension::DocumentationCoverage, 7.0,);
                    } else if length > 500 {
                        scores.max_floor(Dimension::DocumentationCoverage, 5.0,);
                    }
                }
                if let Some(manifest,) = manifest {
                    if manifest.declares_dependencies() {
                        scores.max_floor(Dimension::DependencyManagement, 7.0,);
                    }
                    if manifest.has_script("test",) {
                        scores.max_floor(Dimension::TestCoverage, 6.0,);
                    }
                    if manifest.has_script("lint",) {
                        scores.max_floor(Dimension::StyleConsistency, 6.0,);
                    }
                }
            }
            Self::Workflows(count,) => {
                if count > 0 {
                    scores.add_clamped(Dimension::SecurityVulnerabilities, 3.0,);
                    scores.add_clamped(Dimension::StyleConsistency, 2.0,);
                }
            }
            Self::Readme(signals,) => {
                scores.blend_average(Dimension::DocumentationCoverage, signals.score(),);
            }
            Self::Dependencies(manifest,) => {
                if manifest.has_testing_tools() {
                    scores.add_clamped(Dimension::TestCoverage, 3.0,);
                }
                if manifest.has_linting_tools() {
                    scores.add_clamped(Dimension::StyleConsistency, 2.0,);
                }
                if manifest.has_security_tools() {
                    scores.add_clamped(Dimension::SecurityVulnerabilities, 2.0,);
                }
                scores.overwrite(Dimension::DependencyManagement, manifest.management_score(),);
            }
            Self::Security {
                has_policy,
                alerts,
            } => {
                if has_policy {
                    scores.add_clamped(Dimension::SecurityVulnerabilities, 2.0,);
                }
                if let Some(count,) = alerts.filter(|count| *count > 0,) {
                    scores.add_clamped(Dimension::SecurityVulnerabilities, -(count.min(5,) as f64),);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;

    use super::*;
    use crate::{
        host::{
            HostConnector,
            mock::{MockConnector, MockScript},
        },
        locator,
    };

    fn repo_info(size: u64, open_issues: u64,) -> RepositoryInfo
    {
        RepositoryInfo {
            name:              "hello".to_owned(),
            full_name:         "octocat/hello".to_owned(),
            description:       None,
            html_url:          None,
            default_branch:    Some("main".to_owned(),),
            size,
            open_issues_count: open_issues,
            stargazers_count:  0,
            forks_count:       0,
            created_at:        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0,).unwrap(),),
            pushed_at:         None,
        }
    }

    fn apply_all(evidence: Vec<Evidence,>,) -> Accumulator
    {
        let mut acc = Accumulator::default();
        for item in evidence {
            item.apply(&mut acc,);
        }
        acc
    }

    #[test]
    fn repo_info_seeds_organization_and_maintainability()
    {
        let acc = apply_all(vec![Evidence::RepoInfo(repo_info(20_000, 100,),)],);
        assert_eq!(acc.scores.get(Dimension::FileOrganization), Some(7.0));
        // 10 - 100 / 200
        assert_eq!(acc.scores.get(Dimension::MaintainabilityIndex), Some(9.5));
        assert!(acc.details.repo_info.is_some());
    }

    #[test]
    fn contents_weights_markers_per_dimension()
    {
        let present = ["README.md", "LICENSE", ".prettierrc", "package.json", "yarn.lock", "src", "docs"];
        let presence = MARKER_PATHS.iter().map(|path| (*path, present.contains(path,),),).collect();
        let acc = apply_all(vec![Evidence::RepoInfo(repo_info(0, 0,),), Evidence::Contents(presence,)],);

        assert_eq!(acc.scores.get(Dimension::DocumentationCoverage), Some(6.0));
        assert_eq!(acc.scores.get(Dimension::StyleConsistency), Some(2.5));
        assert_eq!(acc.scores.get(Dimension::DependencyManagement), Some(7.0));
        assert_eq!(acc.scores.get(Dimension::TestCoverage), Some(3.0));
        // no security markers: 0 clamps to the floor
        assert_eq!(acc.scores.get(Dimension::SecurityVulnerabilities), Some(1.0));
        // 5 / 2 + 2 * 2
        assert_eq!(acc.scores.get(Dimension::FileOrganization), Some(6.5));
    }

    #[test]
    fn languages_reward_focus()
    {
        let languages = BTreeMap::from([("Rust".to_owned(), 750,), ("Shell".to_owned(), 250,),],);
        let acc = apply_all(vec![Evidence::Languages(languages,)],);
        assert_eq!(acc.scores.get(Dimension::CodeComplexity), Some(9.0));
        assert_eq!(acc.scores.get(Dimension::CodeDuplication), Some(7.5));
    }

    #[test]
    fn empty_language_map_floors_duplication()
    {
        let acc = apply_all(vec![Evidence::Languages(BTreeMap::new(),)],);
        assert_eq!(acc.scores.get(Dimension::CodeComplexity), Some(10.0));
        assert_eq!(acc.scores.get(Dimension::CodeDuplication), Some(1.0));
        assert_eq!(acc.scores.finalize().get(Dimension::CodeDuplication), 1.0);
    }

    fn approx(left: f64, right: f64,) -> bool
    {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn branch_score_peaks_at_ten()
    {
        assert!(approx(branch_score(10,), 5.0,));
        assert!(approx(branch_score(1,), 2.5,));
        assert!(approx(branch_score(100,), 2.5,));
        assert_eq!(branch_score(0,), f64::NEG_INFINITY);
        assert!(branch_score(10_000,) < 0.0);
    }

    #[test]
    fn zero_branches_drop_organization_to_the_floor()
    {
        let mut acc = Accumulator::default();
        acc.scores.overwrite(Dimension::FileOrganization, 8.0,);
        Evidence::Branches(0,).apply(&mut acc,);
        assert_eq!(acc.scores.get(Dimension::FileOrganization), Some(1.0));

        let mut acc = Accumulator::default();
        acc.scores.overwrite(Dimension::FileOrganization, 8.0,);
        Evidence::Branches(10,).apply(&mut acc,);
        assert_eq!(acc.scores.get(Dimension::FileOrganization), Some(6.5));
    }

    #[test]
    fn ratios_blend_into_maintainability()
    {
        let acc = apply_all(vec![
            Evidence::RepoInfo(repo_info(0, 0,),),
            Evidence::PullRequests {
                open: 1, closed: 3,
            },
            Evidence::Issues {
                open: 0, closed: 0,
            },
        ],);
        // (10 + 7.5) / 2; the empty issue list changes nothing
        assert_eq!(acc.scores.get(Dimension::MaintainabilityIndex), Some(8.75));
    }

    #[test]
    fn commits_use_reference_time_for_age()
    {
        let reference_time = Utc.with_ymd_and_hms(2024, 1, 29, 0, 0, 0,).unwrap();
        let activity = vec![WeeklyCommitActivity {
            week: 0, total: 28, days: Vec::new(),
        }];
        let acc = apply_all(vec![
            Evidence::RepoInfo(repo_info(0, 0,),),
            Evidence::Commits {
                activity,
                reference_time,
            },
        ],);
        // four weeks old, seven commits per week: log2(8) * 3 = 9
        let history = acc.scores.commit_history().expect("history computed",);
        assert!(approx(history, 9.0,));
        assert_eq!(acc.details.commit_activity.len(), 1);
    }

    #[test]
    fn commits_without_repository_info_skip_history()
    {
        let acc = apply_all(vec![Evidence::Commits {
            activity:       Vec::new(),
            reference_time: Utc::now(),
        }],);
        assert_eq!(acc.scores.commit_history(), None);
    }

    #[test]
    fn conservative_samples_apply_floors()
    {
        let manifest = PackageManifest::parse(r#"{ "dependencies": {}, "scripts": { "test": "jest", "lint": "eslint ." } }"#,)
            .expect("valid manifest",);
        let acc = apply_all(vec![Evidence::SafeCodePatterns {
            readme_length: Some(800,),
            manifest:      Some(manifest,),
        }],);
        assert_eq!(acc.scores.get(Dimension::DocumentationCoverage), Some(5.0));
        assert_eq!(acc.scores.get(Dimension::DependencyManagement), Some(7.0));
        assert_eq!(acc.scores.get(Dimension::TestCoverage), Some(6.0));
        assert_eq!(acc.scores.get(Dimension::StyleConsistency), Some(6.0));
        assert_eq!(acc.details.readme_length, Some(800));
    }

    #[test]
    fn security_alerts_deduct_at_most_five()
    {
        let mut acc = Accumulator::default();
        acc.scores.overwrite(Dimension::SecurityVulnerabilities, 10.0,);
        Evidence::Security {
            has_policy: false, alerts: Some(12,),
        }
        .apply(&mut acc,);
        assert_eq!(acc.scores.get(Dimension::SecurityVulnerabilities), Some(5.0));
    }

    #[tokio::test]
    async fn conservative_fetch_stops_after_missing_readme()
    {
        let mut script = MockScript::default();
        script.files.insert("package.json".to_owned(), r#"{ "dependencies": {} }"#.to_owned(),);
        let connector = MockConnector::new(script,);
        let api = connector.connect(None,).expect("mock connects",);
        let repo = locator::parse("https://github.com/octocat/hello",).expect("valid URL",);
        let toolkit = Toolkit::new().expect("toolkit compiles",);
        let ctx = ProbeContext {
            api: api.as_ref(), repo: &repo, toolkit: &toolkit, reference_time: Utc::now(),
        };

        let evidence = Probe::SafeCodePatterns.fetch(&ctx,).await.expect("never fails",);
        assert_eq!(
            evidence,
            Evidence::SafeCodePatterns {
                readme_length: None, manifest: None,
            }
        );
        assert_eq!(connector.calls(), vec!["file:README.md".to_owned()]);
    }

    #[tokio::test]
    async fn contents_fetch_checks_every_marker()
    {
        let mut script = MockScript::default();
        script.paths.insert("src".to_owned(),);
        script.files.insert("README.md".to_owned(), "# hi".to_owned(),);
        let connector = MockConnector::new(script,);
        let api = connector.connect(None,).expect("mock connects",);
        let repo = locator::parse("https://github.com/octocat/hello",).expect("valid URL",);
        let toolkit = Toolkit::new().expect("toolkit compiles",);
        let ctx = ProbeContext {
            api: api.as_ref(), repo: &repo, toolkit: &toolkit, reference_time: Utc::now(),
        };

        let Evidence::Contents(presence,) = Probe::Contents.fetch(&ctx,).await.expect("never fails",) else {
            panic!("unexpected evidence");
        };
        assert_eq!(connector.call_count(), MARKER_PATHS.len());
        assert_eq!(presence.get("src"), Some(&true));
        assert_eq!(presence.get("README.md"), Some(&true));
        assert_eq!(presence.get("docs"), Some(&false));
    }

    #[tokio::test]
    async fn contents_fetch_fails_when_every_marker_is_forbidden()
    {
        let mut script = MockScript::default();
        script.files.insert("README.md".to_owned(), "# hi".to_owned(),);
        script.failures.insert("contents".to_owned(), 403,);
        let connector = MockConnector::new(script,);
        let api = connector.connect(None,).expect("mock connects",);
        let repo = locator::parse("https://github.com/octocat/hello",).expect("valid URL",);
        let toolkit = Toolkit::new().expect("toolkit compiles",);
        let ctx = ProbeContext {
            api: api.as_ref(), repo: &repo, toolkit: &toolkit, reference_time: Utc::now(),
        };

        let error = Probe::Contents.fetch(&ctx,).await.unwrap_err();
        assert!(matches!(error, Error::RemoteApi { status: 403, .. }), "{error:?}");
        assert_eq!(connector.call_count(), MARKER_PATHS.len());
    }

    #[tokio::test]
    async fn contents_fetch_treats_a_single_server_error_as_absent()
    {
        let mut script = MockScript::default();
        script.paths.insert("src".to_owned(),);
        script.paths.insert("docs".to_owned(),);
        script.failures.insert("contents:docs".to_owned(), 502,);
        let connector = MockConnector::new(script,);
        let api = connector.connect(None,).expect("mock connects",);
        let repo = locator::parse("https://github.com/octocat/hello",).expect("valid URL",);
        let toolkit = Toolkit::new().expect("toolkit compiles",);
        let ctx = ProbeContext {
            api: api.as_ref(), repo: &repo, toolkit: &toolkit, reference_time: Utc::now(),
        };

        let Evidence::Contents(presence,) = Probe::Contents.fetch(&ctx,).await.expect("partial failure tolerated",) else {
            panic!("unexpected evidence");
        };
        assert_eq!(presence.get("src"), Some(&true));
        assert_eq!(presence.get("docs"), Some(&false));
    }
}
