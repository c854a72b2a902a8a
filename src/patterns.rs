// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Regex detectors for design patterns and code-quality issues.
//!
//! Findings are informational only and land in the details bag; nothing in
//! this module influences a score. Detector sets are chosen by file
//! extension, and the whole catalogue is compiled once per analyzer.

use rayon::prelude::*;
use regex::Regex;

use crate::{
    error::Error,
    report::{CodeQualityIssue, DetailsBag, DetectedPattern},
};

/// Files sampled by the exhaustive code-pattern probe, grouped by ecosystem.
pub const SAMPLE_FILES: &[&str] = &[
    // JavaScript / TypeScript
    "package.json",
    "tsconfig.json",
    "src/index.js",
    "src/index.ts",
    "src/App.js",
    "src/App.tsx",
    "src/store/index.js",
    "src/context/index.js",
    // Svelte
    "packages/svelte/src/index.js",
    "packages/svelte/compiler/index.js",
    "packages/svelte/src/runtime/index.js",
    "src/lib/index.js",
    "src/routes/+layout.svelte",
    "svelte.config.js",
    // Python
    "setup.py",
    "requirements.txt",
    "src/__init__.py",
    "app.py",
    "main.py",
    // Go
    "go.mod",
    "main.go",
    "cmd/main.go",
    "pkg/server/server.go",
    "internal/app/app.go",
    // Java / Kotlin
    "pom.xml",
    "build.gradle",
    "src/main/java/com/example/Application.java",
    "src/main/kotlin/com/example/Application.kt",
    // Ruby
    "Gemfile",
    "app/models/application_record.rb",
    "config/routes.rb",
    "app/controllers/application_controller.rb",
    // Generic
    "README.md",
    "Dockerfile",
    ".github/workflows/ci.yml",
    "docker-compose.yml",
];

struct PatternSpec
{
    name:        &'static str,
    kind:        &'static str,
    pattern:     &'static str,
    description: &'static str,
}

const fn design(name: &'static str, pattern: &'static str, description: &'static str,) -> PatternSpec
{
    PatternSpec {
        name,
        kind: "design",
        pattern,
        description,
    }
}

const fn architectural(
    name: &'static str,
    pattern: &'static str,
    description: &'static str,
) -> PatternSpec
{
    PatternSpec {
        name,
        kind: "architectural",
        pattern,
        description,
    }
}

const COMMON_PATTERNS: &[PatternSpec] = &[
    design(
        "Singleton Pattern",
        r"(?i)singleton|getInstance|private\s+constructor|static\s+instance|new\s+self|new\s+static",
        "Ensures a class has only one instance with global access point",
    ),
    design(
        "Factory Pattern",
        r"(?i)factory|create[A-Z]\w+|getInstance|newInstance|build|new[A-Z]\w+",
        "Creates objects without specifying the exact class or constructor",
    ),
    design(
        "Observer Pattern",
        r"(?i)observer|subscribe|publish|emit|listen|on\(|addEventListener|dispatch|notify",
        "Objects subscribe to events and get notified when they occur",
    ),
    design(
        "Strategy Pattern",
        r"(?i)strategy|algorithm|\buse[A-Z]\w+Strategy|setStrategy|execute\(\)",
        "Defines a family of algorithms and makes them interchangeable",
    ),
    design(
        "Decorator Pattern",
        r"(?i)decorator|@\w+|decorate|wrap|enhance|withStyles|with[A-Z]\w+",
        "Attaches additional responsibilities to objects dynamically",
    ),
];

const JAVASCRIPT_PATTERNS: &[PatternSpec] = &[
    design(
        "Module Pattern",
        r"(?i)export\s+(default)?\s*(function|class|const)",
        "Uses ES modules for code organization",
    ),
    design(
        "Higher-Order Components",
        r"(?i)function\s+\w+\s*\(\s*\w+\s*\)\s*\{\s*return\s+(class|function)",
        "Functions that take a component and return a new component",
    ),
    design(
        "Render Props Pattern",
        r"(?i)render\s*=\s*\{\s*\(\s*\)\s*=>\s*\(",
        "Sharing code between React components using a prop whose value is a function",
    ),
    design("Hooks Pattern", r"(?i)\buse[A-Z]\w+", "Uses React hooks for state and effects",),
    design(
        "Promise/Async Pattern",
        r"(?i)new\s+Promise|\basync\b|\bawait\b|\.then\(|\.catch\(",
        "Uses Promises or async/await for asynchronous operations",
    ),
    architectural(
        "Flux/Redux Pattern",
        r"(?i)createStore|reducer|dispatch|action|useSelector|useDispatch|mapStateToProps",
        "Implements unidirectional data flow architecture",
    ),
];

const PYTHON_PATTERNS: &[PatternSpec] = &[
    design(
        "Decorator Pattern (Python)",
        r"@\w+",
        "Uses Python decorators to modify function behavior",
    ),
    design(
        "Context Manager",
        r"with\s+\w+(\(\))?\s+as\s+\w+|__enter__|__exit__",
        "Uses context managers for resource management",
    ),
    design(
        "Type Hints",
        r"def\s+\w+\(\w+\s*:\s*\w+(\[\w+\])?",
        "Uses Python type hints for better code clarity",
    ),
    design(
        "ORM Pattern",
        r"class\s+\w+\(\s*(db\.)?Model\s*\)|Column\(|relationship\(",
        "Uses ORM for database interactions",
    ),
];

const JAVA_PATTERNS: &[PatternSpec] = &[
    design(
        "Builder Pattern",
        r"(?i)\.builder\(\)|\.build\(\)|static\s+class\s+Builder|return\s+new\s+Builder",
        "Constructs complex objects step by step",
    ),
    design(
        "Dependency Injection",
        r"(?i)@Inject|@Autowired|@Component|@Service|@Repository|@Controller",
        "Injects dependencies instead of creating them",
    ),
    design(
        "Template Method",
        r"(?i)abstract\s+class|@Override|extends\s+\w+",
        "Defines the skeleton of an algorithm, deferring some steps to subclasses",
    ),
];

const GO_PATTERNS: &[PatternSpec] = &[
    design(
        "Interface Implementation",
        r"type\s+\w+\s+interface|func\s+\(\w+\s+\*?\w+\)\s+\w+",
        "Implements interfaces in Go",
    ),
    design(
        "Error Handling Pattern",
        r"if\s+err\s+!=\s+nil|return\s+\w+,\s+err|errors\.New",
        "Go-style error handling pattern",
    ),
    design(
        "Structural Composition",
        r"type\s+\w+\s+struct\s*\{[^}]*\w+\s+\w+[^}]*\}",
        "Uses structural composition instead of inheritance",
    ),
];

const RUBY_PATTERNS: &[PatternSpec] = &[
    design(
        "Mixin Pattern",
        r"(?i)include\s+\w+|extend\s+\w+|module\s+\w+",
        "Uses modules and mixins for shared functionality",
    ),
    design("DSL Pattern", r"do\s+\|[^|]*\|", "Creates domain-specific languages within Ruby",),
    design(
        "ActiveRecord Pattern",
        r"(?i)class\s+\w+\s+<\s+ActiveRecord::Base|has_many|belongs_to|has_one",
        "ORM pattern from Ruby on Rails",
    ),
];

const SVELTE_PATTERNS: &[PatternSpec] = &[
    design("Reactive Declarations", r"\$:\s+\w+", "Svelte reactive variable declarations",),
    design(
        "Store Pattern",
        r"writable|readable|derived|get|subscribe|update|set",
        "Svelte store pattern for state management",
    ),
    design("Actions Pattern", r"use:\w+", "Reusable element actions in Svelte",),
    architectural(
        "Compiler Pattern",
        r"(?i)transform|parse|compile|ast|tokenize|walk|visitor",
        "Implements compiler-like code transformation",
    ),
];

const JS_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];
const PYTHON_EXTENSIONS: &[&str] = &["py", "pyw"];
const JAVA_EXTENSIONS: &[&str] = &["java", "kt", "scala"];
const GO_EXTENSIONS: &[&str] = &["go"];
const RUBY_EXTENSIONS: &[&str] = &["rb", "rake"];
const SVELTE_EXTENSIONS: &[&str] = &["svelte"];

/// Minimum body length, in characters, of a function flagged as long.
const LONG_FUNCTION_CHARS: usize = 1000;

enum Matcher
{
    Regex(Regex,),
    /// Function header followed by its terminator at least
    /// [`LONG_FUNCTION_CHARS`] characters later.
    LongFunction(Regex,),
}

impl Matcher
{
    fn is_match(&self, content: &str,) -> bool
    {
        match self {
            Self::Regex(regex,) => regex.is_match(content,),
            Self::LongFunction(header,) => header.find_iter(content,).any(|found| {
                let terminator = if found.as_str().get(..3,).is_some_and(|head| head.eq_ignore_ascii_case("def",),) {
                    "end"
                } else {
                    "}"
                };
                let body = &content[found.end()..];
                body.char_indices()
                    .nth(LONG_FUNCTION_CHARS,)
                    .is_some_and(|(offset, _,)| body[offset..].to_ascii_lowercase().contains(terminator,),)
            },),
        }
    }
}

struct QualityCheck
{
    issue:       &'static str,
    impact:      &'static str,
    description: &'static str,
    applicable:  Option<&'static [&'static str],>,
    matcher:     Matcher,
}

struct PatternDetector
{
    name:        &'static str,
    kind:        &'static str,
    description: &'static str,
    regex:       Regex,
}

/// Findings for one sampled file, before de-duplication.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct FileFindings
{
    pub patterns: Vec<DetectedPattern,>,
    pub issues:   Vec<CodeQualityIssue,>,
}

/// Compiled detector catalogue.
pub struct DetectorSet
{
    common:     Vec<PatternDetector,>,
    javascript: Vec<PatternDetector,>,
    python:     Vec<PatternDetector,>,
    java:       Vec<PatternDetector,>,
    go:         Vec<PatternDetector,>,
    ruby:       Vec<PatternDetector,>,
    svelte:     Vec<PatternDetector,>,
    checks:     Vec<QualityCheck,>,
}

fn compile(pattern: &str,) -> Result<Regex, Error,>
{
    Regex::new(pattern,).map_err(|e| Error::validation(format!("invalid detector regex: {e}"),),)
}

fn compile_set(specs: &[PatternSpec],) -> Result<Vec<PatternDetector,>, Error,>
{
    specs
        .iter()
        .map(|spec| {
            Ok(PatternDetector {
                name:        spec.name,
                kind:        spec.kind,
                description: spec.description,
                regex:       compile(spec.pattern,)?,
            },)
        },)
        .collect()
}

fn extension(path: &str,) -> String
{
    path.rsplit('.',).next().unwrap_or(path,).to_ascii_lowercase()
}

impl DetectorSet
{
    /// Compiles every detector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a detector expression fails to
    /// compile.
    pub fn compile() -> Result<Self, Error,>
    {
        let checks = vec![
            QualityCheck {
                issue:       "Long Functions",
                impact:      "high",
                description: "Functions over 1000 characters may be too complex and need refactoring",
                applicable:  None,
                matcher:     Matcher::LongFunction(compile(
                    r"(?i)function\s+\w+\s*\([^)]*\)\s*\{|def\s+\w+|func\s+\w+",
                )?,),
            },
            QualityCheck {
                issue:       "Magic Numbers",
                impact:      "medium",
                description: "Unexplained numeric literals should be named constants",
                applicable:  None,
                matcher:     Matcher::Regex(compile(r"\b\d{3,}\b",)?,),
            },
            QualityCheck {
                issue:       "Commented Code",
                impact:      "low",
                description: "Commented out code should be removed",
                applicable:  None,
                matcher:     Matcher::Regex(compile(r"//\s*\w+\s*\(|/\*[\s\S]*?\*/\s*\w+\s*\(|#\s*\w+\s*\(",)?,),
            },
            QualityCheck {
                issue:       "Nested Callbacks",
                impact:      "medium",
                description: "Deeply nested callbacks can lead to callback hell",
                applicable:  Some(JS_EXTENSIONS,),
                matcher:     Matcher::Regex(compile(r"(?i)\)\s*=>\s*\{[^{}]*\([^{]*=>\s*\{",)?,),
            },
            QualityCheck {
                issue:       "Console Statements",
                impact:      "low",
                description: "Console statements should be removed in production code",
                applicable:  Some(JS_EXTENSIONS,),
                matcher:     Matcher::Regex(compile(r"(?i)console\.(log|warn|error)",)?,),
            },
            QualityCheck {
                issue:       "Global Variables",
                impact:      "medium",
                description: "Global variables should be avoided",
                applicable:  Some(PYTHON_EXTENSIONS,),
                matcher:     Matcher::Regex(compile(r"(?m)^\s*[a-zA-Z_]\w*\s*=",)?,),
            },
            QualityCheck {
                issue:       "Catch Exception",
                impact:      "medium",
                description: "Catching generic Exception is not recommended",
                applicable:  Some(&["java",],),
                matcher:     Matcher::Regex(compile(r"(?i)catch\s*\(\s*Exception\s+",)?,),
            },
        ];

        Ok(Self {
            common: compile_set(COMMON_PATTERNS,)?,
            javascript: compile_set(JAVASCRIPT_PATTERNS,)?,
            python: compile_set(PYTHON_PATTERNS,)?,
            java: compile_set(JAVA_PATTERNS,)?,
            go: compile_set(GO_PATTERNS,)?,
            ruby: compile_set(RUBY_PATTERNS,)?,
            svelte: compile_set(SVELTE_PATTERNS,)?,
            checks,
        },)
    }

    fn detectors_for(&self, path: &str, extension: &str,) -> Vec<&PatternDetector,>
    {
        let mut detectors: Vec<&PatternDetector,> = self.common.iter().collect();

        let language: &[PatternDetector] = if JS_EXTENSIONS.contains(&extension,) {
            &self.javascript
        } else if PYTHON_EXTENSIONS.contains(&extension,) {
            &self.python
        } else if JAVA_EXTENSIONS.contains(&extension,) {
            &self.java
        } else if GO_EXTENSIONS.contains(&extension,) {
            &self.go
        } else if RUBY_EXTENSIONS.contains(&extension,) {
            &self.ruby
        } else if SVELTE_EXTENSIONS.contains(&extension,) {
            &self.svelte
        } else {
            &[]
        };
        detectors.extend(language,);

        if path.contains("svelte",) && matches!(extension, "js" | "ts") {
            detectors.extend(&self.svelte,);
        }

        detectors
    }

    /// Runs the detectors applicable to `path` over its content.
    pub fn scan(&self, path: &str, content: &str,) -> FileFindings
    {
        let extension = extension(path,);

        let patterns = self
            .detectors_for(path, &extension,)
            .into_iter()
            .filter(|detector| detector.regex.is_match(content,),)
            .map(|detector| DetectedPattern {
                name:        detector.name.to_owned(),
                kind:        detector.kind.to_owned(),
                description: detector.description.to_owned(),
                found_in:    path.to_owned(),
            },)
            .collect();

        let issues = self
            .checks
            .iter()
            .filter(|check| check.applicable.is_none_or(|extensions| extensions.contains(&extension.as_str(),),),)
            .filter(|check| check.matcher.is_match(content,),)
            .map(|check| CodeQualityIssue {
                issue:       check.issue.to_owned(),
                impact:      check.impact.to_owned(),
                description: check.description.to_owned(),
                found_in:    path.to_owned(),
            },)
            .collect();

        FileFindings {
            patterns,
            issues,
        }
    }

    /// Scans sampled files in parallel, returning findings in sample order.
    pub fn scan_all(&self, files: &[(String, String,)],) -> Vec<FileFindings,>
    {
        files.par_iter().map(|(path, content,)| self.scan(path, content,),).collect()
    }
}

impl FileFindings
{
    /// Merges the findings into `details`, skipping duplicates.
    pub fn merge_into(self, details: &mut DetailsBag,)
    {
        for pattern in self.patterns {
            details.push_pattern(pattern,);
        }
        for issue in self.issues {
            details.push_issue(issue,);
        }
    }
}
