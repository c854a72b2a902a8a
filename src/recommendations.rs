// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Improvement recommendations and score bands derived from a finished
//! analysis.

use serde::{Deserialize, Serialize};

use crate::{report::PipelineResult, score::Dimension};

/// Dimensions scoring below this value receive a recommendation.
pub const RECOMMENDATION_THRESHOLD: f64 = 7.0;
/// Dimensions scoring below this value receive a high-priority one.
pub const CRITICAL_THRESHOLD: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub enum Category
{
    CodeQuality,
    Documentation,
    Testing,
    Organization,
    Security,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum Priority
{
    High,
    Medium,
    Low,
}

/// Actionable advice for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct Recommendation
{
    pub title:       String,
    pub description: String,
    pub category:    Category,
    pub priority:    Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions:     Vec<String,>,
    /// Score that triggered the recommendation.
    pub score:       f64,
}

struct Advice
{
    title:       &'static str,
    description: &'static str,
    actions:     &'static [&'static str],
}

fn category(dimension: Dimension,) -> Category
{
    match dimension {
        Dimension::CodeComplexity | Dimension::StyleConsistency | Dimension::CodeDuplication => {
            Category::CodeQuality
        }
        Dimension::DocumentationCoverage => Category::Documentation,
        Dimension::TestCoverage => Category::Testing,
        Dimension::SecurityVulnerabilities => Category::Security,
        Dimension::FileOrganization => Category::Organization,
        Dimension::MaintainabilityIndex | Dimension::DependencyManagement => Category::Maintenance,
    }
}

fn critical_advice(dimension: Dimension,) -> Advice
{
    match dimension {
        Dimension::CodeComplexity => Advice {
            title:       "Significantly Improve Code Complexity",
            description: "Your codebase has high complexity issues. Consider a major refactoring effort to break \
                          down complex functions into smaller, more manageable pieces with clear responsibilities.",
            actions:     &[
                "Break down functions longer than 30 lines into smaller functions",
                "Reduce nested conditionals using guard clauses and early returns",
                "Extract complex logic into helper functions with descriptive names",
            ],
        },
        Dimension::DocumentationCoverage => Advice {
            title:       "Create Comprehensive Documentation",
            description: "Your repository lacks essential documentation. Create a detailed README with \
                          installation instructions, usage examples and API documentation where applicable.",
            actions:     &[
                "Create a README with project overview, installation, and usage instructions",
                "Add inline documentation for public APIs and complex logic",
                "Create contributing guidelines and a code of conduct",
            ],
        },
        Dimension::TestCoverage => Advice {
            title:       "Implement a Testing Strategy",
            description: "Your repository has minimal or no tests. Implement a testing strategy covering unit and \
                          integration tests.",
            actions:     &[
                "Set up a testing framework appropriate for your project",
                "Start writing unit tests for core functionality",
                "Configure a CI pipeline to run tests automatically",
            ],
        },
        Dimension::StyleConsistency => Advice {
            title:       "Establish Code Style Standards",
            description: "Your codebase lacks consistent styling. Introduce formatting and linting tools to keep \
                          the project consistent.",
            actions:     &[
                "Add a linter and a formatter for your language",
                "Add pre-commit hooks to enforce style guidelines",
                "Run a formatter on the entire codebase to establish a baseline",
            ],
        },
        Dimension::SecurityVulnerabilities => Advice {
            title:       "Address Critical Security Issues",
            description: "Your repository has significant security concerns. Conduct a security audit and publish \
                          a security policy.",
            actions:     &[
                "Conduct a security audit to identify vulnerabilities",
                "Review and update dependencies with known vulnerabilities",
                "Add a SECURITY.md describing how to report issues",
            ],
        },
        Dimension::MaintainabilityIndex => Advice {
            title:       "Improve Code Maintainability",
            description: "Your codebase has significant maintainability issues. Reduce technical debt and triage \
                          the open issue backlog.",
            actions:     &[
                "Identify and refactor areas with high complexity",
                "Break down large files into more manageable modules",
                "Document architectural decisions and data flows",
            ],
        },
        Dimension::CodeDuplication => Advice {
            title:       "Eliminate Code Duplication",
            description: "Your codebase contains significant duplication. Refactor duplicated code into reusable \
                          functions or modules.",
            actions:     &[
                "Run a duplication detection tool to identify problem areas",
                "Extract common logic into shared utilities",
            ],
        },
        Dimension::FileOrganization => Advice {
            title:       "Restructure Project Organization",
            description: "Your repository structure needs significant improvement. Reorganize files and \
                          directories to follow the conventions of your technology stack.",
            actions:     &[
                "Research standard project layouts for your language",
                "Separate sources, tests, and documentation into dedicated directories",
                "Document the directory structure in your README",
            ],
        },
        Dimension::DependencyManagement => Advice {
            title:       "Implement Proper Dependency Management",
            description: "Your repository needs a better approach to managing dependencies. Declare, version and \
                          maintain them explicitly.",
            actions:     &[
                "Pin dependency versions to avoid unexpected changes",
                "Commit a lockfile",
                "Audit dependencies for vulnerabilities regularly",
            ],
        },
    }
}

fn moderate_advice(dimension: Dimension,) -> Advice
{
    match dimension {
        Dimension::CodeComplexity => Advice {
            title:       "Reduce Code Complexity",
            description: "Some parts of your codebase have moderate complexity issues. Simplify the most complex \
                          functions.",
            actions:     &["Identify and refactor the most complex functions", "Break up long methods"],
        },
        Dimension::DocumentationCoverage => Advice {
            title:       "Enhance Documentation",
            description: "Your documentation covers the basics. Add more detailed explanations and examples.",
            actions:     &["Add more code examples to the README", "Create a changelog to track project changes"],
        },
        Dimension::TestCoverage => Advice {
            title:       "Expand Test Coverage",
            description: "Your project has some tests, but coverage could be improved for critical components \
                          and edge cases.",
            actions:     &["Test critical paths and error conditions", "Add tests for boundary conditions"],
        },
        Dimension::StyleConsistency => Advice {
            title:       "Improve Code Style Consistency",
            description: "Your codebase shows some style inconsistencies. Strengthen linting rules and apply them \
                          across the project.",
            actions:     &["Tighten the linting configuration", "Format automatically on save or in CI"],
        },
        Dimension::SecurityVulnerabilities => Advice {
            title:       "Strengthen Security Practices",
            description: "Your repository has some security measures but would benefit from more robust practices.",
            actions:     &["Update dependencies to patch vulnerabilities", "Add security-focused automated checks"],
        },
        Dimension::MaintainabilityIndex => Advice {
            title:       "Enhance Code Maintainability",
            description: "Your codebase is moderately maintainable. Clarify responsibilities and keep issues \
                          moving.",
            actions:     &["Refactor areas with unclear responsibilities", "Close or triage stale issues"],
        },
        Dimension::CodeDuplication => Advice {
            title:       "Reduce Code Duplication",
            description: "Your codebase has some duplication. Extract common patterns into reusable components.",
            actions:     &["Extract duplicate logic into helper functions"],
        },
        Dimension::FileOrganization => Advice {
            title:       "Improve Project Structure",
            description: "Your project structure could be more organized. Group related files consistently.",
            actions:     &["Group related files more consistently", "Create clear boundaries between layers"],
        },
        Dimension::DependencyManagement => Advice {
            title:       "Optimize Dependency Management",
            description: "Your approach to dependencies is adequate. Keep them updated and organized.",
            actions:     &["Update non-breaking dependencies regularly", "Remove unused dependencies"],
        },
    }
}

fn recommendation(dimension: Dimension, score: f64,) -> Option<Recommendation,>
{
    if score >= RECOMMENDATION_THRESHOLD {
        return None;
    }

    let (advice, priority,) = if score < CRITICAL_THRESHOLD {
        (critical_advice(dimension,), Priority::High,)
    } else {
        (moderate_advice(dimension,), Priority::Medium,)
    };
    Some(Recommendation {
        title: advice.title.to_owned(),
        description: advice.description.to_owned(),
        category: category(dimension,),
        priority,
        actions: advice.actions.iter().map(|action| (*action).to_owned(),).collect(),
        score,
    },)
}

/// Recommendations for every dimension scoring below
/// [`RECOMMENDATION_THRESHOLD`], in reporting order; a single low-priority
/// entry when none qualifies.
pub fn generate(result: &PipelineResult,) -> Vec<Recommendation,>
{
    let recommendations: Vec<_,> = Dimension::ALL
        .into_iter()
        .filter_map(|dimension| recommendation(dimension, result.score(dimension,),),)
        .collect();
    if !recommendations.is_empty() {
        return recommendations;
    }

    vec![Recommendation {
        title:       "Maintain Current Quality Standards".to_owned(),
        description: "Your repository demonstrates good software engineering practices. Continue maintaining \
                      these standards as the project evolves."
            .to_owned(),
        category:    Category::Maintenance,
        priority:    Priority::Low,
        actions:     Vec::new(),
        score:       10.0,
    }]
}

/// Qualitative band of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand
{
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand
{
    pub fn for_score(score: f64,) -> Self
    {
        if score >= 8.0 {
            Self::Excellent
        } else if score >= 6.0 {
            Self::Good
        } else if score >= 4.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub const fn label(self,) -> &'static str
    {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}
