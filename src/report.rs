// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Result object handed to callers once an analysis completes.
//!
//! The JSON shape is the output contract consumed by front-ends: the nine
//! dimensions and `overallScore` sit at the top level next to the optional
//! `commitHistory` and the `details` bag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    host::{Contributor, RepositoryInfo, WeeklyCommitActivity},
    score::{Dimension, FinalScores, MAX_SCORE, MIN_SCORE},
};

/// Pattern reported by the informational detectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern
{
    pub name:        String,
    #[serde(rename = "type")]
    pub kind:        String,
    pub description: String,
    /// Sampled file in which the pattern was first seen.
    pub found_in:    String,
}

/// Code-quality issue reported by the informational detectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub struct CodeQualityIssue
{
    pub issue:       String,
    pub impact:      String,
    pub description: String,
    pub found_in:    String,
}

/// Raw artifacts gathered while probing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub struct DetailsBag
{
    #[serde(default)]
    pub repo_info:           Option<RepositoryInfo,>,
    #[serde(default)]
    pub languages:           BTreeMap<String, u64,>,
    #[serde(default)]
    pub contributors:        Vec<Contributor,>,
    #[serde(default)]
    pub commit_activity:     Vec<WeeklyCommitActivity,>,
    #[serde(default)]
    pub detected_patterns:   Vec<DetectedPattern,>,
    #[serde(default)]
    pub code_quality_issues: Vec<CodeQualityIssue,>,
    /// README length recorded by the conservative pattern probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_length:       Option<usize,>,
}

impl DetailsBag
{
    /// Appends a pattern unless one with the same name is already present.
    pub fn push_pattern(&mut self, pattern: DetectedPattern,)
    {
        if !self.detected_patterns.iter().any(|known| known.name == pattern.name,) {
            self.detected_patterns.push(pattern,);
        }
    }

    /// Appends an issue unless the same issue was already seen in that file.
    pub fn push_issue(&mut self, issue: CodeQualityIssue,)
    {
        let duplicate = self
            .code_quality_issues
            .iter()
            .any(|known| known.issue == issue.issue && known.found_in == issue.found_in,);
        if !duplicate {
            self.code_quality_issues.push(issue,);
        }
    }
}

/// Finalized scores plus the details bag of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult
{
    pub code_complexity:          f64,
    pub documentation_coverage:   f64,
    pub test_coverage:            f64,
    pub style_consistency:        f64,
    pub security_vulnerabilities: f64,
    pub maintainability_index:    f64,
    pub code_duplication:         f64,
    pub file_organization:        f64,
    pub dependency_management:    f64,
    pub overall_score:            u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_history:           Option<f64,>,
    pub details:                  DetailsBag,
}

impl PipelineResult
{
    /// Combines finalized scores with the gathered details.
    pub fn assemble(scores: &FinalScores, details: DetailsBag,) -> Self
    {
        Self {
            code_complexity: scores.get(Dimension::CodeComplexity,),
            documentation_coverage: scores.get(Dimension::DocumentationCoverage,),
            test_coverage: scores.get(Dimension::TestCoverage,),
            style_consistency: scores.get(Dimension::StyleConsistency,),
            security_vulnerabilities: scores.get(Dimension::SecurityVulnerabilities,),
            maintainability_index: scores.get(Dimension::MaintainabilityIndex,),
            code_duplication: scores.get(Dimension::CodeDuplication,),
            file_organization: scores.get(Dimension::FileOrganization,),
            dependency_management: scores.get(Dimension::DependencyManagement,),
            overall_score: scores.overall(),
            commit_history: scores.commit_history(),
            details,
        }
    }

    /// Reported value of one dimension.
    pub fn score(&self, dimension: Dimension,) -> f64
    {
        match dimension {
            Dimension::CodeComplexity => self.code_complexity,
            Dimension::DocumentationCoverage => self.documentation_coverage,
            Dimension::TestCoverage => self.test_coverage,
            Dimension::StyleConsistency => self.style_consistency,
            Dimension::SecurityVulnerabilities => self.security_vulnerabilities,
            Dimension::MaintainabilityIndex => self.maintainability_index,
            Dimension::CodeDuplication => self.code_duplication,
            Dimension::FileOrganization => self.file_organization,
            Dimension::DependencyManagement => self.dependency_management,
        }
    }

    /// Repository name from the fetched metadata, if any.
    pub fn repository_name(&self,) -> Option<&str,>
    {
        self.details.repo_info.as_ref().map(|info| info.name.as_str(),)
    }

    /// Checks the range invariants of a finalized result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResult`] when the overall score leaves `1..=10`
    /// or a dimension is neither the zero placeholder nor inside the score
    /// range.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        if !(1..=10).contains(&self.overall_score,) {
            return Err(Error::InvalidResult {
                message: format!("overall score {} outside 1..=10", self.overall_score),
            },);
        }

        for dimension in Dimension::ALL {
            let value = self.score(dimension,);
            let placeholder = value == 0.0;
            if !placeholder && !(MIN_SCORE..=MAX_SCORE).contains(&value,) {
                return Err(Error::InvalidResult {
                    message: format!("{} has out-of-range value {value}", dimension.key()),
                },);
            }
        }

        match self.commit_history {
            Some(history,) if !(MIN_SCORE..=MAX_SCORE).contains(&history,) => {
                return Err(Error::InvalidResult {
                    message: format!("commitHistory has out-of-range value {history}"),
                },);
            }
            _ => {}
        }

        Ok((),)
    }
}

#[cfg(test)]
mod tests
{
    use serde_json::Value;

    use super::*;
    use crate::score::ScoreRecord;

    fn pattern(name: &str, file: &str,) -> DetectedPattern
    {
        DetectedPattern {
            name:        name.to_owned(),
            kind:        "design".to_owned(),
            description: String::new(),
            found_in:    file.to_owned(),
        }
    }

    fn issue(name: &str, file: &str,) -> CodeQualityIssue
    {
        CodeQualityIssue {
            issue:       name.to_owned(),
            impact:      "low".to_owned(),
            description: String::new(),
            found_in:    file.to_owned(),
        }
    }

    #[test]
    fn patterns_are_deduplicated_by_name()
    {
        let mut details = DetailsBag::default();
        details.push_pattern(pattern("Factory Pattern", "src/index.js",),);
        details.push_pattern(pattern("Factory Pattern", "main.go",),);
        assert_eq!(details.detected_patterns.len(), 1);
        assert_eq!(details.detected_patterns[0].found_in, "src/index.js");
    }

    #[test]
    fn issues_are_deduplicated_per_file()
    {
        let mut details = DetailsBag::default();
        details.push_issue(issue("Magic Numbers", "a.js",),);
        details.push_issue(issue("Magic Numbers", "a.js",),);
        details.push_issue(issue("Magic Numbers", "b.js",),);
        assert_eq!(details.code_quality_issues.len(), 2);
    }

    #[test]
    fn serialized_shape_matches_output_contract()
    {
        let result = PipelineResult::assemble(&ScoreRecord::new().finalize(), DetailsBag::default(),);
        let json = serde_json::to_value(&result,).expect("serializable",);

        for dimension in Dimension::ALL {
            assert!(json.get(dimension.key()).is_some(), "missing {}", dimension.key());
        }
        assert_eq!(json["overallScore"], Value::from(2));
        assert!(json.get("commitHistory").is_none());
        let details = &json["details"];
        for key in ["repoInfo", "languages", "contributors", "commitActivity", "detectedPatterns", "codeQualityIssues"]
        {
            assert!(details.get(key).is_some(), "missing details.{key}");
        }
        assert!(details.get("readmeLength").is_none());
    }

    #[test]
    fn validate_accepts_placeholders_and_rejects_out_of_range()
    {
        let mut result = PipelineResult::assemble(&ScoreRecord::new().finalize(), DetailsBag::default(),);
        assert!(result.validate().is_ok());

        result.test_coverage = 0.5;
        assert!(matches!(result.validate(), Err(Error::InvalidResult { .. })));

        result.test_coverage = 3.0;
        result.overall_score = 0;
        assert!(matches!(result.validate(), Err(Error::InvalidResult { .. })));
    }
}
