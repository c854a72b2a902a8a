// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Score accumulator shared by the probes of one analysis.
//!
//! Probes never write dimension values directly. They compose their
//! contribution from the mutation primitives on [`ScoreRecord`], each of which
//! re-clamps the touched dimension into [`MIN_SCORE`]..=[`MAX_SCORE`]. A
//! dimension nobody touched stays unset and is reported as the zero
//! placeholder unless finalization substitutes the mid-scale default.

use serde::{Deserialize, Serialize};

/// Lower bound of every stored dimension value.
pub const MIN_SCORE: f64 = 1.0;
/// Upper bound of every stored dimension value.
pub const MAX_SCORE: f64 = 10.0;
/// Value substituted for defaulted dimensions no probe reached.
pub const DEFAULT_SCORE: f64 = 5.0;
/// Divisor dampening the bonus channel of the overall score.
pub const BONUS_DAMPENING: f64 = 5.0;

/// Closed set of scored quality axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub enum Dimension
{
    CodeComplexity,
    DocumentationCoverage,
    TestCoverage,
    StyleConsistency,
    SecurityVulnerabilities,
    MaintainabilityIndex,
    CodeDuplication,
    FileOrganization,
    DependencyManagement,
}

impl Dimension
{
    /// Every dimension in reporting order.
    pub const ALL: [Dimension; 9] = [
        Dimension::CodeComplexity,
        Dimension::DocumentationCoverage,
        Dimension::TestCoverage,
        Dimension::StyleConsistency,
        Dimension::SecurityVulnerabilities,
        Dimension::MaintainabilityIndex,
        Dimension::CodeDuplication,
        Dimension::FileOrganization,
        Dimension::DependencyManagement,
    ];

    /// Dimensions that fall back to [`DEFAULT_SCORE`] when never touched.
    pub const DEFAULTED: [Dimension; 3] =
        [Dimension::CodeComplexity, Dimension::MaintainabilityIndex, Dimension::CodeDuplication];

    /// Wire name of the dimension.
    pub const fn key(self,) -> &'static str
    {
        match self {
            Self::CodeComplexity => "codeComplexity",
            Self::DocumentationCoverage => "documentationCoverage",
            Self::TestCoverage => "testCoverage",
            Self::StyleConsistency => "styleConsistency",
            Self::SecurityVulnerabilities => "securityVulnerabilities",
            Self::MaintainabilityIndex => "maintainabilityIndex",
            Self::CodeDuplication => "codeDuplication",
            Self::FileOrganization => "fileOrganization",
            Self::DependencyManagement => "dependencyManagement",
        }
    }

    /// Bonus dimensions reach the overall score through the dampened channel.
    pub const fn is_bonus(self,) -> bool
    {
        matches!(self, Self::DependencyManagement)
    }

    const fn index(self,) -> usize
    {
        self as usize
    }
}

/// Clamps a raw contribution into the score range; NaN maps to the floor.
pub fn clamp_score(value: f64,) -> f64
{
    if value.is_nan() { MIN_SCORE } else { value.clamp(MIN_SCORE, MAX_SCORE,) }
}

/// Mutable per-dimension scores of one running analysis.
#[derive(Debug, Clone, Default, PartialEq,)]
pub struct ScoreRecord
{
    values:         [Option<f64,>; 9],
    commit_history: Option<f64,>,
}

impl ScoreRecord
{
    /// Creates a record with every dimension unset.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Current value, `None` while no probe touched the dimension.
    pub fn get(&self, dimension: Dimension,) -> Option<f64,>
    {
        self.values[dimension.index()]
    }

    /// Current value, reading an untouched dimension as the zero placeholder.
    pub fn value_or_placeholder(&self, dimension: Dimension,) -> f64
    {
        self.get(dimension,).unwrap_or(0.0,)
    }

    fn store(&mut self, dimension: Dimension, value: f64,)
    {
        self.values[dimension.index()] = Some(clamp_score(value,),);
    }

    /// Writes `value` only when the dimension is still unset.
    pub fn set_if_unset(&mut self, dimension: Dimension, value: f64,)
    {
        if self.get(dimension,).is_none() {
            self.store(dimension, value,);
        }
    }

    /// Replaces the current value outright.
    pub fn overwrite(&mut self, dimension: Dimension, value: f64,)
    {
        self.store(dimension, value,);
    }

    /// Running blend `(current + value) / 2`; an unset dimension blends from 0.
    pub fn blend_average(&mut self, dimension: Dimension, value: f64,)
    {
        let current = self.value_or_placeholder(dimension,);
        self.store(dimension, (current + value) / 2.0,);
    }

    /// Adds a bonus (positive) or penalty (negative) delta.
    pub fn add_clamped(&mut self, dimension: Dimension, delta: f64,)
    {
        let current = self.value_or_placeholder(dimension,);
        self.store(dimension, current + delta,);
    }

    /// Raises the dimension to at least `floor`.
    pub fn max_floor(&mut self, dimension: Dimension, floor: f64,)
    {
        let current = self.value_or_placeholder(dimension,);
        self.store(dimension, current.max(floor,),);
    }

    /// Records the auxiliary commit-history score.
    pub fn set_commit_history(&mut self, value: f64,)
    {
        self.commit_history = Some(clamp_score(value,),);
    }

    pub fn commit_history(&self,) -> Option<f64,>
    {
        self.commit_history
    }

    /// Substitutes defaults and derives the overall score.
    ///
    /// The core score is the mean of the non-bonus dimensions (untouched ones
    /// count as 0); the bonus score is the mean of the bonus dimensions
    /// divided by [`BONUS_DAMPENING`]. Their sum is rounded to the nearest
    /// integer and clamped into the score range.
    pub fn finalize(mut self,) -> FinalScores
    {
        for dimension in Dimension::DEFAULTED {
            self.set_if_unset(dimension, DEFAULT_SCORE,);
        }

        let (bonus, core,): (Vec<Dimension,>, Vec<Dimension,>,) =
            Dimension::ALL.into_iter().partition(|dimension| dimension.is_bonus(),);

        let core_score = mean(core.iter().map(|dimension| self.value_or_placeholder(*dimension,),),);
        let bonus_score = mean(
            bonus.iter().map(|dimension| self.value_or_placeholder(*dimension,).max(0.0,),),
        ) / BONUS_DAMPENING;

        let overall = clamp_score((core_score + bonus_score).round(),) as u8;

        FinalScores {
            values:         Dimension::ALL.map(|dimension| self.value_or_placeholder(dimension,),),
            overall,
            commit_history: self.commit_history,
        }
    }
}

fn mean<I,>(values: I,) -> f64
where
    I: Iterator<Item = f64,>,
{
    let (sum, count,) = values.fold((0.0, 0usize,), |(sum, count,), value| (sum + value, count + 1,),);
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Immutable scores produced by [`ScoreRecord::finalize`].
#[derive(Debug, Clone, PartialEq,)]
pub struct FinalScores
{
    values:         [f64; 9],
    overall:        u8,
    commit_history: Option<f64,>,
}

impl FinalScores
{
    pub fn get(&self, dimension: Dimension,) -> f64
    {
        self.values[dimension.index()]
    }

    /// Integer overall score in `1..=10`.
    pub fn overall(&self,) -> u8
    {
        self.overall
    }

    pub fn commit_history(&self,) -> Option<f64,>
    {
        self.commit_history
    }

    /// Iterates `(dimension, value)` pairs in reporting order.
    pub fn iter(&self,) -> impl Iterator<Item = (Dimension, f64,),> + '_
    {
        Dimension::ALL.into_iter().map(|dimension| (dimension, self.get(dimension,),),)
    }
}
