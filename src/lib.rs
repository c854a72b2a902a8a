// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Heuristic quality scoring for public GitHub repositories.
//!
//! The library parses a repository URL, runs a fixed sequence of probes
//! against the GitHub REST API and folds their partial, frequently failing
//! answers into nine bounded dimension scores plus an integer overall score.
//! Progress is reported after every step, the whole run is bounded by a
//! wall-clock budget and can be cancelled cooperatively between steps.
//!
//! Two transports sit on top of the [`Analyzer`]: a duplex [`Session`]
//! streaming progress messages, and a rate-limited request/response
//! [`AnalysisService`].

mod config;
mod error;
mod github;
mod host;
mod locator;
mod manifest;
mod patterns;
mod pipeline;
mod probes;
mod rate_limit;
mod readme;
mod recommendations;
mod report;
mod retry;
mod score;
mod service;
mod session;
mod step;

pub use config::{AnalysisSection, AnalyzerConfig, GithubSection, load_config, parse_config};
pub use error::{Error, ErrorKind, io_error};
pub use github::{GithubConnector, GithubHost};
pub use host::{
    Branch, ContentEntry, ContentKind, Contributor, HostConnector, HostingApi, Issue, ItemState,
    PullRequest, RepositoryInfo, VulnerabilityAlert, WeeklyCommitActivity, WorkflowList,
};
pub use locator::{HOSTING_DOMAIN, RepositoryIdentifier, parse as parse_repository_url};
pub use manifest::PackageManifest;
pub use patterns::{DetectorSet, FileFindings, SAMPLE_FILES};
pub use pipeline::{
    AnalysisOptions, Analyzer, DEFAULT_TIMEOUT, NoProgress, PipelineRun, PipelineState,
    ProgressSink,
};
pub use probes::{Accumulator, Evidence, MARKER_PATHS, ProbeContext, Toolkit};
pub use rate_limit::{
    FixedWindowLimiter, RateLimitConfig, RateLimitDecision, RateLimiter, UNKNOWN_CLIENT,
    client_key,
};
pub use readme::{ReadmeScorer, ReadmeSignals};
pub use recommendations::{
    Category, Priority, Recommendation, ScoreBand, generate as generate_recommendations,
};
pub use report::{CodeQualityIssue, DetailsBag, DetectedPattern, PipelineResult};
pub use retry::{RetryConfig, retry_with_backoff};
pub use score::{Dimension, FinalScores, ScoreRecord, clamp_score};
pub use service::{AnalysisService, ServiceRequest, ServiceResponse};
pub use session::{ClientMessage, ServerMessage, Session};
pub use step::{Probe, ProbeStrategy, ProgressEvent, Stage, StepId};
