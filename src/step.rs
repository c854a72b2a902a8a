// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Step identifiers, progress values and the probe plan of each strategy.
//!
//! The progress values are part of the external contract: consumers drive
//! progress bars from them, so they are reproduced exactly and never derived.

use serde::{Deserialize, Serialize};

/// Identifier of a reported pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,)]
#[serde(rename_all = "kebab-case")]
pub enum StepId
{
    Init,
    RepoInfo,
    Contents,
    Languages,
    Contributors,
    Commits,
    Branches,
    PullRequests,
    Issues,
    CodePatterns,
    Workflows,
    Readme,
    Dependencies,
    Security,
    Calculate,
    Complete,
}

impl StepId
{
    /// Wire name of the step.
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::Init => "init",
            Self::RepoInfo => "repo-info",
            Self::Contents => "contents",
            Self::Languages => "languages",
            Self::Contributors => "contributors",
            Self::Commits => "commits",
            Self::Branches => "branches",
            Self::PullRequests => "pull-requests",
            Self::Issues => "issues",
            Self::CodePatterns => "code-patterns",
            Self::Workflows => "workflows",
            Self::Readme => "readme",
            Self::Dependencies => "dependencies",
            Self::Security => "security",
            Self::Calculate => "calculate",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for StepId
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

/// Progress tuple emitted after every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
pub struct ProgressEvent
{
    pub step:     StepId,
    pub progress: u8,
}

impl ProgressEvent
{
    pub const fn new(step: StepId, progress: u8,) -> Self
    {
        Self {
            step,
            progress,
        }
    }
}

/// Progress value of the event emitted when an invocation starts.
pub const INIT_PROGRESS: u8 = 0;
/// Progress value of the terminal event.
pub const COMPLETE_PROGRESS: u8 = 100;

/// Individual probe executed inside a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum Probe
{
    RepoInfo,
    Contents,
    Languages,
    Contributors,
    Commits,
    Branches,
    PullRequests,
    Issues,
    /// Samples the multi-ecosystem file catalogue for informational detectors.
    CodePatterns,
    /// Reads only README.md and package.json and applies score floors.
    SafeCodePatterns,
    Workflows,
    Readme,
    Dependencies,
    Security,
}

/// One reported step together with the probes it runs.
///
/// A stage with no probes is the calculation stage; the orchestrator
/// finalizes the score record there.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct Stage
{
    pub step:     StepId,
    pub progress: u8,
    pub probes:   &'static [Probe],
}

const fn stage(step: StepId, progress: u8, probes: &'static [Probe],) -> Stage
{
    Stage {
        step,
        progress,
        probes,
    }
}

const EXHAUSTIVE: [Stage; 14] = [
    stage(StepId::RepoInfo, 7, &[Probe::RepoInfo,],),
    stage(StepId::Contents, 14, &[Probe::Contents,],),
    stage(StepId::Languages, 21, &[Probe::Languages,],),
    stage(StepId::Contributors, 28, &[Probe::Contributors,],),
    stage(StepId::Commits, 35, &[Probe::Commits,],),
    stage(StepId::Branches, 42, &[Probe::Branches,],),
    stage(StepId::PullRequests, 49, &[Probe::PullRequests,],),
    stage(StepId::Issues, 56, &[Probe::Issues,],),
    stage(StepId::CodePatterns, 60, &[Probe::CodePatterns,],),
    stage(StepId::Workflows, 63, &[Probe::Workflows,],),
    stage(StepId::Readme, 70, &[Probe::Readme,],),
    stage(StepId::Dependencies, 77, &[Probe::Dependencies,],),
    stage(StepId::Security, 84, &[Probe::Security,],),
    stage(StepId::Calculate, 91, &[],),
];

const CONSERVATIVE: [Stage; 13] = [
    stage(StepId::RepoInfo, 7, &[Probe::RepoInfo,],),
    stage(StepId::Contents, 14, &[Probe::Contents,],),
    stage(StepId::Languages, 21, &[Probe::Languages,],),
    stage(StepId::Contributors, 28, &[Probe::Contributors,],),
    stage(StepId::Commits, 35, &[Probe::Commits,],),
    stage(StepId::Branches, 42, &[Probe::Branches,],),
    stage(StepId::PullRequests, 49, &[Probe::PullRequests,],),
    stage(StepId::Issues, 56, &[Probe::Issues,],),
    stage(StepId::Workflows, 65, &[Probe::SafeCodePatterns, Probe::Workflows,],),
    stage(StepId::Readme, 70, &[Probe::Readme,],),
    stage(StepId::Dependencies, 77, &[Probe::Dependencies,],),
    stage(StepId::Security, 84, &[Probe::Security,],),
    stage(StepId::Calculate, 91, &[],),
];

/// How the code-pattern step spends remote calls.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStrategy
{
    /// Samples the full file catalogue; detectors never touch scores.
    Exhaustive,
    /// Reads two files at most and feeds coarse floors into the scores.
    #[default]
    Conservative,
}

impl ProbeStrategy
{
    /// Ordered stages between `init` and `complete`.
    pub fn stages(self,) -> &'static [Stage]
    {
        match self {
            Self::Exhaustive => &EXHAUSTIVE,
            Self::Conservative => &CONSERVATIVE,
        }
    }

    /// Every progress event a successful run emits, in order.
    pub fn expected_events(self,) -> Vec<ProgressEvent,>
    {
        std::iter::once(ProgressEvent::new(StepId::Init, INIT_PROGRESS,),)
            .chain(self.stages().iter().map(|stage| ProgressEvent::new(stage.step, stage.progress,),),)
            .chain(std::iter::once(ProgressEvent::new(StepId::Complete, COMPLETE_PROGRESS,),),)
            .collect()
    }
}
