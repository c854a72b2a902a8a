// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Pipeline orchestrator.
//!
//! A [`PipelineRun`] drives the stages of one [`ProbeStrategy`] strictly in
//! order against a single accumulator. Probe failures are logged and
//! absorbed; only locator errors, the wall-clock budget, cancellation and a
//! rejected credential that survives the anonymous retry reach the caller.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::Error,
    host::{HostConnector, HostingApi},
    locator::{self, RepositoryIdentifier},
    probes::{Accumulator, ProbeContext, Toolkit},
    rate_limit::ceil_secs,
    report::PipelineResult,
    step::{COMPLETE_PROGRESS, INIT_PROGRESS, Probe, ProbeStrategy, ProgressEvent, StepId},
};

/// Wall-clock budget applied when the caller does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60,);

/// Lifecycle of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum PipelineState
{
    Idle,
    /// Index of the step in flight; `0` is the init step.
    Running(usize,),
    Completed,
    Failed,
    Cancelled,
}

impl PipelineState
{
    /// Terminal states never transition again.
    pub const fn is_terminal(self,) -> bool
    {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Receiver of the progress events of one run.
pub trait ProgressSink: Send
{
    fn emit(&mut self, event: ProgressEvent,);
}

/// Sink discarding every event.
#[derive(Debug, Clone, Copy, Default,)]
pub struct NoProgress;

impl ProgressSink for NoProgress
{
    fn emit(&mut self, _event: ProgressEvent,) {}
}

impl ProgressSink for Vec<ProgressEvent,>
{
    fn emit(&mut self, event: ProgressEvent,)
    {
        self.push(event,);
    }
}

impl ProgressSink for UnboundedSender<ProgressEvent,>
{
    fn emit(&mut self, event: ProgressEvent,)
    {
        if self.send(event,).is_err() {
            debug!("progress receiver dropped, discarding {}", event.step);
        }
    }
}

/// Knobs of one analyzer.
#[derive(Debug, Clone, PartialEq,)]
pub struct AnalysisOptions
{
    pub strategy:       ProbeStrategy,
    pub timeout:        Duration,
    /// Fixed "now" for the repository age; the system clock when unset.
    pub reference_time: Option<DateTime<Utc,>,>,
}

impl Default for AnalysisOptions
{
    fn default() -> Self
    {
        Self {
            strategy:       ProbeStrategy::default(),
            timeout:        DEFAULT_TIMEOUT,
            reference_time: None,
        }
    }
}

/// Entry point shared by every transport.
///
/// Cloning is cheap; clones share the connector and the compiled detector
/// catalogues but every invocation gets its own [`PipelineRun`].
#[derive(Clone,)]
pub struct Analyzer
{
    connector: Arc<dyn HostConnector,>,
    options:   AnalysisOptions,
    toolkit:   Arc<Toolkit,>,
}

impl Analyzer
{
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a detector expression fails to
    /// compile.
    pub fn new(connector: Arc<dyn HostConnector,>, options: AnalysisOptions,) -> Result<Self, Error,>
    {
        Ok(Self {
            connector,
            options,
            toolkit: Arc::new(Toolkit::new()?,),
        },)
    }

    pub fn options(&self,) -> &AnalysisOptions
    {
        &self.options
    }

    /// Fresh state machine for one invocation.
    pub fn start(&self,) -> PipelineRun
    {
        PipelineRun {
            connector: Arc::clone(&self.connector,),
            options:   self.options.clone(),
            toolkit:   Arc::clone(&self.toolkit,),
            state:     PipelineState::Idle,
        }
    }

    /// Analyzes one repository URL.
    ///
    /// # Errors
    ///
    /// See [`PipelineRun::execute`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use repograde::{AnalysisOptions, Analyzer, GithubConnector, NoProgress, RetryConfig};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # async fn run() -> Result<(), repograde::Error> {
    /// let connector = Arc::new(GithubConnector::new(RetryConfig::default(), None));
    /// let analyzer = Analyzer::new(connector, AnalysisOptions::default())?;
    /// let result = analyzer
    ///     .analyze("https://github.com/rust-lang/rust", None, &mut NoProgress, &CancellationToken::new())
    ///     .await?;
    /// println!("{}", result.overall_score);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn analyze(
        &self,
        url: &str,
        credential: Option<&str,>,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, Error,>
    {
        self.start().execute(url, credential, sink, cancel,).await
    }
}

/// State machine of a single analysis.
pub struct PipelineRun
{
    connector: Arc<dyn HostConnector,>,
    options:   AnalysisOptions,
    toolkit:   Arc<Toolkit,>,
    state:     PipelineState,
}

fn ensure_active(cancel: &CancellationToken,) -> Result<(), Error,>
{
    if cancel.is_cancelled() { Err(Error::AnalysisCancelled,) } else { Ok((),) }
}

impl PipelineRun
{
    pub fn state(&self,) -> PipelineState
    {
        self.state
    }

    /// Runs the whole pipeline once.
    ///
    /// Emits `init` first, then one event per stage and `complete` last, with
    /// strictly increasing progress values.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRepositoryUrl`] before any remote call;
    /// - [`Error::AnalysisTimeout`] when the budget elapses;
    /// - [`Error::AnalysisCancelled`] when `cancel` fires;
    /// - [`Error::Transport`] when the connector cannot build a client;
    /// - [`Error::InvalidResult`] when finalization breaks a range invariant;
    /// - [`Error::Validation`] when the run was already executed.
    pub async fn execute(
        &mut self,
        url: &str,
        credential: Option<&str,>,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, Error,>
    {
        if self.state != PipelineState::Idle {
            return Err(Error::validation(format!(
                "pipeline run already left the idle state ({:?})",
                self.state
            ),),);
        }

        self.state = PipelineState::Running(0,);
        sink.emit(ProgressEvent::new(StepId::Init, INIT_PROGRESS,),);

        let outcome = match locator::parse(url,) {
            Ok(repo,) => {
                info!("analyzing {} with the {:?} strategy", repo, self.options.strategy);
                let budget = self.options.timeout;
                match tokio::time::timeout(budget, self.run_with_fallback(&repo, credential, sink, cancel,),)
                    .await
                {
                    Ok(outcome,) => outcome,
                    Err(_,) => Err(Error::AnalysisTimeout {
                        budget_secs: ceil_secs(budget,),
                    },),
                }
            }
            Err(error,) => Err(error,),
        };

        self.state = match &outcome {
            Ok(_,) => PipelineState::Completed,
            Err(Error::AnalysisCancelled,) => PipelineState::Cancelled,
            Err(_,) => PipelineState::Failed,
        };
        match &outcome {
            Ok(result,) => info!("analysis of {} finished with overall score {}", url, result.overall_score),
            Err(error,) => warn!("analysis of {} ended in {:?}: {}", url, self.state, error),
        }
        outcome
    }

    async fn run_with_fallback(
        &mut self,
        repo: &RepositoryIdentifier,
        credential: Option<&str,>,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, Error,>
    {
        let api = self.connector.connect(credential,)?;
        match self.run_stages(api.as_ref(), repo, sink, cancel,).await {
            Err(error,) if error.is_auth_failure() && api.is_authenticated() => {
                warn!("credential rejected for {}, retrying without it: {}", repo, error);
                let anonymous = self.connector.connect(None,)?;
                self.run_stages(anonymous.as_ref(), repo, sink, cancel,).await
            }
            outcome => outcome,
        }
    }

    async fn run_stages(
        &mut self,
        api: &dyn HostingApi,
        repo: &RepositoryIdentifier,
        sink: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, Error,>
    {
        let toolkit = Arc::clone(&self.toolkit,);
        let ctx = ProbeContext {
            api,
            repo,
            toolkit: &toolkit,
            reference_time: self.options.reference_time.unwrap_or_else(Utc::now,),
        };
        let mut acc = Accumulator::default();
        let mut result = None;

        for (index, stage,) in self.options.strategy.stages().iter().enumerate() {
            ensure_active(cancel,)?;
            self.state = PipelineState::Running(index + 1,);

            if stage.probes.is_empty() {
                let Accumulator {
                    scores,
                    details,
                } = std::mem::take(&mut acc,);
                result = Some(PipelineResult::assemble(&scores.finalize(), details,),);
            }

            for probe in stage.probes {
                ensure_active(cancel,)?;
                let outcome = probe.fetch(&ctx,).await;
                ensure_active(cancel,)?;
                match outcome {
                    Ok(evidence,) => evidence.apply(&mut acc,),
                    Err(error,)
                        if *probe == Probe::RepoInfo && error.is_auth_failure() && api.is_authenticated() =>
                    {
                        return Err(error,);
                    }
                    Err(error,) => warn!("{} probe failed for {}, continuing: {}", probe.label(), repo, error),
                }
            }

            debug!("step {} done ({}%)", stage.step, stage.progress);
            sink.emit(ProgressEvent::new(stage.step, stage.progress,),);
        }

        let result = result.ok_or_else(|| Error::InvalidResult {
            message: "strategy has no calculate stage".to_owned(),
        },)?;
        result.validate()?;
        sink.emit(ProgressEvent::new(StepId::Complete, COMPLETE_PROGRESS,),);
        Ok(result,)
    }
}

#[cfg(test)]
mod tests
{
    use std::collections::{BTreeMap, HashMap, HashSet};

    use chrono::TimeZone;

    use super::*;
    use crate::{
        host::{
            Branch, Contributor, Issue, ItemState, PullRequest, RepositoryInfo,
            WeeklyCommitActivity,
            mock::{MockConnector, MockScript},
        },
        score::Dimension,
    };

    const URL: &str = "https://github.com/octocat/hello";

    fn fixed_now() -> DateTime<Utc,>
    {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0,).unwrap()
    }

    fn rich_readme() -> String
    {
        format!(
            "# Hello\n## Install\n## Usage\n## License\n![logo](logo.png)\n```sh\nnpm install\n```\n{}",
            "lorem ipsum dolor ".repeat(150)
        )
    }

    fn healthy_script() -> MockScript
    {
        let readme = rich_readme();
        let manifest = r#"{
            "dependencies": { "express": "4.18.2" },
            "devDependencies": { "jest": "^29.0.0", "eslint": "^9.0.0" },
            "scripts": { "test": "jest", "lint": "eslint ." }
        }"#;

        let paths: HashSet<String,> = [
            ".github/workflows",
            ".github/CODEOWNERS",
            "LICENSE",
            "CONTRIBUTING.md",
            "CODE_OF_CONDUCT.md",
            ".eslintrc.json",
            ".eslintrc.js",
            ".prettierrc",
            ".editorconfig",
            "package-lock.json",
            "yarn.lock",
            "tests",
            "docs",
            "src",
            "SECURITY.md",
        ]
        .into_iter()
        .map(str::to_owned,)
        .collect();
        let files = HashMap::from([
            ("README.md".to_owned(), readme.clone(),),
            ("package.json".to_owned(), manifest.to_owned(),),
        ],);

        MockScript {
            repository: Some(RepositoryInfo {
                name:              "hello".to_owned(),
                full_name:         "octocat/hello".to_owned(),
                description:       Some("demo".to_owned(),),
                html_url:          None,
                default_branch:    Some("main".to_owned(),),
                size:              5000,
                open_issues_count: 0,
                stargazers_count:  42,
                forks_count:       7,
                created_at:        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0,).unwrap(),),
                pushed_at:         None,
            },),
            paths,
            files,
            languages: Some(BTreeMap::from([("TypeScript".to_owned(), 120_000,)],),),
            contributors: Some(
                (0..20)
                    .map(|index| Contributor {
                        login: format!("dev{index}"), contributions: 10,
                    },)
                    .collect(),
            ),
            commit_activity: Some(vec![WeeklyCommitActivity {
                week: 1_704_067_200, total: 52, days: Vec::new(),
            }],),
            branches: Some(
                (0..10)
                    .map(|index| Branch {
                        name: format!("branch-{index}"),
                    },)
                    .collect(),
            ),
            pull_requests: Some(vec![PullRequest {
                number: 1, state: ItemState::Closed,
            }],),
            issues: Some(vec![Issue {
                number: 2, state: ItemState::Closed, pull_request: None,
            }],),
            workflows: Some(2,),
            readme: Some(readme,),
            alerts: Some(Vec::new(),),
            ..MockScript::default()
        }
    }

    fn analyzer(connector: &MockConnector, strategy: ProbeStrategy,) -> Analyzer
    {
        let options = AnalysisOptions {
            strategy,
            reference_time: Some(fixed_now(),),
            ..AnalysisOptions::default()
        };
        Analyzer::new(Arc::new(connector.clone(),), options,).expect("toolkit compiles",)
    }

    #[tokio::test]
    async fn healthy_repository_scores_high_with_either_strategy()
    {
        for strategy in [ProbeStrategy::Conservative, ProbeStrategy::Exhaustive] {
            let connector = MockConnector::new(healthy_script(),);
            let mut events = Vec::new();
            let result = analyzer(&connector, strategy,)
                .analyze(URL, None, &mut events, &CancellationToken::new(),)
                .await
                .expect("analysis succeeds",);

            assert!(result.score(Dimension::DocumentationCoverage,) >= 9.0, "{strategy:?}");
            assert!(result.score(Dimension::TestCoverage,) >= 9.0, "{strategy:?}");
            assert!(result.score(Dimension::StyleConsistency,) >= 9.0, "{strategy:?}");
            assert_eq!(result.score(Dimension::CodeComplexity,), 10.0);
            assert!(result.overall_score >= 8, "{strategy:?}");
            assert!(result.commit_history.is_some());
            assert_eq!(result.repository_name(), Some("hello"));
            assert_eq!(events, strategy.expected_events());
        }
    }

    #[tokio::test]
    async fn malformed_url_fails_without_remote_calls()
    {
        let connector = MockConnector::new(healthy_script(),);
        let mut run = analyzer(&connector, ProbeStrategy::default(),).start();
        let mut events = Vec::new();

        let error = run
            .execute("javascript:alert(1)", None, &mut events, &CancellationToken::new(),)
            .await
            .unwrap_err();

        assert!(matches!(error, Error::InvalidRepositoryUrl { .. }));
        assert_eq!(connector.call_count(), 0);
        assert!(connector.connections().is_empty());
        assert_eq!(events, vec![ProgressEvent::new(StepId::Init, 0)]);
        assert_eq!(run.state(), PipelineState::Failed);
    }

    #[tokio::test]
    async fn unreachable_repository_still_produces_a_bounded_result()
    {
        for strategy in [ProbeStrategy::Conservative, ProbeStrategy::Exhaustive] {
            let connector = MockConnector::new(MockScript::default(),);
            let mut events = Vec::new();
            let result = analyzer(&connector, strategy,)
                .analyze(URL, None, &mut events, &CancellationToken::new(),)
                .await
                .expect("step failures are absorbed",);

            // core (5 + 1 + 3 + 1 + 1 + 5 + 5 + 1) / 8 = 2.75, bonus 1 / 5
            assert_eq!(result.overall_score, 3);
            assert_eq!(result.score(Dimension::MaintainabilityIndex,), 5.0);
            assert_eq!(result.commit_history, None);
            assert_eq!(events.last(), Some(&ProgressEvent::new(StepId::Complete, 100)));
        }
    }

    struct CancelAfter
    {
        step:   StepId,
        token:  CancellationToken,
        events: Vec<ProgressEvent,>,
    }

    impl ProgressSink for CancelAfter
    {
        fn emit(&mut self, event: ProgressEvent,)
        {
            self.events.push(event,);
            if event.step == self.step {
                self.token.cancel();
            }
        }
    }

    #[tokio::test]
    async fn cancellation_between_steps_stops_further_progress()
    {
        let connector = MockConnector::new(healthy_script(),);
        let token = CancellationToken::new();
        let mut sink = CancelAfter {
            step: StepId::Contributors, token: token.clone(), events: Vec::new(),
        };
        let mut run = analyzer(&connector, ProbeStrategy::Exhaustive,).start();

        let error = run.execute(URL, None, &mut sink, &token,).await.unwrap_err();

        assert!(matches!(error, Error::AnalysisCancelled));
        assert_eq!(run.state(), PipelineState::Cancelled);
        let progress: Vec<u8,> = sink.events.iter().map(|event| event.progress,).collect();
        assert_eq!(progress, vec![0, 7, 14, 21, 28]);
        assert!(!connector.calls().contains(&"commit_activity".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_probe_finishes_but_its_result_is_discarded()
    {
        let mut script = healthy_script();
        script.latency = Some(Duration::from_secs(10,),);
        let connector = MockConnector::new(script,);
        let options = AnalysisOptions {
            timeout: Duration::from_secs(3600,),
            reference_time: Some(fixed_now(),),
            ..AnalysisOptions::default()
        };
        let analyzer = Analyzer::new(Arc::new(connector.clone(),), options,).expect("toolkit compiles",);

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15,),).await;
            trigger.cancel();
        },);

        let mut events = Vec::new();
        let error = analyzer.analyze(URL, None, &mut events, &token,).await.unwrap_err();

        assert!(matches!(error, Error::AnalysisCancelled));
        let steps: Vec<StepId,> = events.iter().map(|event| event.step,).collect();
        assert_eq!(steps, vec![StepId::Init, StepId::RepoInfo]);
        // repository plus every marker of the interrupted contents probe
        assert_eq!(connector.call_count(), 1 + crate::probes::MARKER_PATHS.len());
    }

    #[tokio::test(start_paused = true)]
    async fn exceeding_the_budget_fails_with_timeout()
    {
        let mut script = healthy_script();
        script.latency = Some(Duration::from_secs(10,),);
        let connector = MockConnector::new(script,);
        let options = AnalysisOptions {
            timeout: Duration::from_secs(30,),
            ..AnalysisOptions::default()
        };
        let analyzer = Analyzer::new(Arc::new(connector,), options,).expect("toolkit compiles",);
        let mut run = analyzer.start();

        let error = run.execute(URL, None, &mut NoProgress, &CancellationToken::new(),).await.unwrap_err();

        assert!(matches!(
            error,
            Error::AnalysisTimeout {
                budget_secs: 30
            }
        ));
        assert_eq!(run.state(), PipelineState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_budget_reports_whole_seconds_rounded_up()
    {
        let mut script = healthy_script();
        script.latency = Some(Duration::from_secs(10,),);
        let options = AnalysisOptions {
            timeout: Duration::from_millis(500,),
            ..AnalysisOptions::default()
        };
        let analyzer = Analyzer::new(Arc::new(MockConnector::new(script,),), options,).expect("toolkit compiles",);

        let error =
            analyzer.analyze(URL, None, &mut NoProgress, &CancellationToken::new(),).await.unwrap_err();

        assert!(matches!(
            error,
            Error::AnalysisTimeout {
                budget_secs: 1
            }
        ));
        assert_eq!(error.to_string(), "analysis timed out after 1s");
    }

    #[tokio::test]
    async fn forbidden_contents_leave_marker_dimensions_untouched()
    {
        for strategy in [ProbeStrategy::Conservative, ProbeStrategy::Exhaustive] {
            let mut script = healthy_script();
            script.files.clear();
            script.readme = None;
            script.workflows = None;
            script.failures.insert("contents".to_owned(), 403,);
            let connector = MockConnector::new(script,);
            let mut events = Vec::new();

            let result = analyzer(&connector, strategy,)
                .analyze(URL, None, &mut events, &CancellationToken::new(),)
                .await
                .expect("step failures are absorbed",);

            assert_eq!(events, strategy.expected_events());
            assert_eq!(result.score(Dimension::DocumentationCoverage,), 0.0, "{strategy:?}");
            assert_eq!(result.score(Dimension::StyleConsistency,), 0.0, "{strategy:?}");
            assert_eq!(result.score(Dimension::TestCoverage,), 0.0, "{strategy:?}");
            // languages still ran after the failed contents step
            assert_eq!(result.score(Dimension::CodeComplexity,), 10.0);
        }
    }

    #[tokio::test]
    async fn server_error_mid_run_falls_back_to_defaults()
    {
        let mut script = healthy_script();
        script.failures.insert("languages".to_owned(), 500,);
        let connector = MockConnector::new(script,);
        let mut events = Vec::new();

        let result = analyzer(&connector, ProbeStrategy::Exhaustive,)
            .analyze(URL, None, &mut events, &CancellationToken::new(),)
            .await
            .expect("step failures are absorbed",);

        assert_eq!(events, ProbeStrategy::Exhaustive.expected_events());
        assert_eq!(result.score(Dimension::CodeComplexity,), 5.0);
        assert_eq!(result.score(Dimension::CodeDuplication,), 5.0);
        assert!(result.details.languages.is_empty());
        let calls = connector.calls();
        assert!(calls.contains(&"languages".to_owned()));
        assert!(calls.contains(&"contributors".to_owned()));
    }

    #[tokio::test]
    async fn rejected_credential_is_retried_anonymously_once()
    {
        let mut script = healthy_script();
        script.reject_credential = true;
        let connector = MockConnector::new(script,);
        let mut events = Vec::new();

        let result = analyzer(&connector, ProbeStrategy::Conservative,)
            .analyze(URL, Some("ghp_revoked",), &mut events, &CancellationToken::new(),)
            .await
            .expect("anonymous retry succeeds",);

        assert_eq!(connector.connections(), vec![true, false]);
        assert_eq!(events, ProbeStrategy::Conservative.expected_events());
        assert!(result.overall_score >= 8);
    }

    #[tokio::test]
    async fn identical_responses_yield_identical_output()
    {
        let mut rendered = Vec::new();
        for _ in 0..2 {
            let connector = MockConnector::new(healthy_script(),);
            let result = analyzer(&connector, ProbeStrategy::Exhaustive,)
                .analyze(URL, None, &mut NoProgress, &CancellationToken::new(),)
                .await
                .expect("analysis succeeds",);
            rendered.push(serde_json::to_vec(&result,).expect("serializable",),);
        }
        assert_eq!(rendered[0], rendered[1]);
    }

    #[tokio::test]
    async fn a_run_executes_only_once()
    {
        let connector = MockConnector::new(healthy_script(),);
        let mut run = analyzer(&connector, ProbeStrategy::Conservative,).start();
        assert_eq!(run.state(), PipelineState::Idle);

        run.execute(URL, None, &mut NoProgress, &CancellationToken::new(),).await.expect("first run succeeds",);
        assert_eq!(run.state(), PipelineState::Completed);
        assert!(run.state().is_terminal());

        let error = run.execute(URL, None, &mut NoProgress, &CancellationToken::new(),).await.unwrap_err();
        assert!(matches!(error, Error::Validation { .. }));
        assert_eq!(run.state(), PipelineState::Completed);
    }

    #[tokio::test]
    async fn channel_sink_forwards_events()
    {
        let (mut sender, mut receiver,) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent,>();
        sender.emit(ProgressEvent::new(StepId::Init, 0,),);
        drop(sender,);
        assert_eq!(receiver.recv().await, Some(ProgressEvent::new(StepId::Init, 0)));
        assert_eq!(receiver.recv().await, None);
    }
}
