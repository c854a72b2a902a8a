// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Analyzer configuration document.
//!
//! Every section is optional; omitted values fall back to the defaults the
//! transports use without a file. Command-line flags override whatever the
//! document sets.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Error},
    pipeline::{AnalysisOptions, DEFAULT_TIMEOUT},
    rate_limit::RateLimitConfig,
    retry::RetryConfig,
    step::ProbeStrategy,
};

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use repograde::parse_config;
///
/// let config = parse_config("analysis:\n  timeout_secs: 90\n  strategy: exhaustive\n").expect("valid configuration");
/// assert_eq!(config.analysis.timeout_secs, 90);
/// assert_eq!(config.rate_limit.max_requests, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,)]
#[serde(default)]
pub struct AnalyzerConfig
{
    pub analysis:   AnalysisSection,
    pub rate_limit: RateLimitConfig,
    pub retry:      RetryConfig,
    pub github:     GithubSection,
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(default)]
pub struct AnalysisSection
{
    /// Wall-clock budget of one analysis in seconds (default: 60).
    pub timeout_secs: u64,
    pub strategy:     ProbeStrategy,
}

impl Default for AnalysisSection
{
    fn default() -> Self
    {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(), strategy: ProbeStrategy::default(),
        }
    }
}

/// Hosting API settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize,)]
#[serde(default)]
pub struct GithubSection
{
    /// Alternative API root, e.g. for GitHub Enterprise.
    pub api_base: Option<String,>,
}

impl AnalyzerConfig
{
    /// Pipeline options described by the `analysis` section.
    pub fn analysis_options(&self,) -> AnalysisOptions
    {
        AnalysisOptions {
            strategy: self.analysis.strategy,
            timeout: Duration::from_secs(self.analysis.timeout_secs,),
            reference_time: None,
        }
    }

    /// Checks numeric invariants of every section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        if self.analysis.timeout_secs == 0 {
            return Err(Error::validation("analysis.timeout_secs must be greater than zero",),);
        }
        if self.rate_limit.max_requests == 0 {
            return Err(Error::validation("rate_limit.max_requests must be greater than zero",),);
        }
        if self.rate_limit.window_secs == 0 {
            return Err(Error::validation("rate_limit.window_secs must be greater than zero",),);
        }
        if self.rate_limit.max_tracked_keys == 0 {
            return Err(Error::validation("rate_limit.max_tracked_keys must be greater than zero",),);
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::validation("retry.max_attempts must be greater than zero",),);
        }
        if self.retry.backoff_factor.is_nan() || self.retry.backoff_factor < 1.0 {
            return Err(Error::validation(format!(
                "retry.backoff_factor must be at least 1.0, got {}",
                self.retry.backoff_factor
            ),),);
        }
        if let Some(base,) = self.github.api_base.as_deref() {
            url::Url::parse(base,)
                .map_err(|e| Error::validation(format!("github.api_base '{base}' is not a URL: {e}"),),)?;
        }
        Ok((),)
    }
}

/// Loads and validates configuration from a YAML file.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read, [`Error::Parse`] when
/// the YAML is malformed and [`Error::Validation`] when a value is out of
/// range.
pub fn load_config(path: &Path,) -> Result<AnalyzerConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses and validates configuration from YAML text.
///
/// An empty document yields the defaults.
///
/// # Errors
///
/// Returns [`Error::Parse`] or [`Error::Validation`].
pub fn parse_config(contents: &str,) -> Result<AnalyzerConfig, Error,>
{
    let config: AnalyzerConfig =
        if contents.trim().is_empty() { AnalyzerConfig::default() } else { serde_yaml::from_str(contents,)? };
    config.validate()?;
    Ok(config,)
}

#[cfg(test)]
mod tests
{
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_yields_defaults()
    {
        let config = parse_config("",).expect("valid configuration",);
        assert_eq!(config, AnalyzerConfig::default());
        let options = config.analysis_options();
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.strategy, ProbeStrategy::Conservative);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults()
    {
        let config = parse_config(
            "rate_limit:\n  max_requests: 25\nretry:\n  max_attempts: 5\ngithub:\n  api_base: https://ghe.example.com/api/v3\n",
        )
        .expect("valid configuration",);
        assert_eq!(config.rate_limit.max_requests, 25);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 500);
        assert_eq!(config.github.api_base.as_deref(), Some("https://ghe.example.com/api/v3"));
    }

    #[test]
    fn zero_values_are_rejected()
    {
        for document in [
            "analysis:\n  timeout_secs: 0\n",
            "rate_limit:\n  window_secs: 0\n",
            "rate_limit:\n  max_requests: 0\n",
            "retry:\n  max_attempts: 0\n",
            "retry:\n  backoff_factor: 0.5\n",
        ] {
            let error = parse_config(document,).unwrap_err();
            assert!(matches!(error, Error::Validation { .. }), "{document}");
        }
    }

    #[test]
    fn unknown_strategy_is_a_parse_error()
    {
        let error = parse_config("analysis:\n  strategy: reckless\n",).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn invalid_api_base_is_rejected()
    {
        let error = parse_config("github:\n  api_base: not a url\n",).unwrap_err();
        assert!(matches!(error, Error::Validation { .. }));
    }

    #[test]
    fn load_config_reads_from_disk()
    {
        let mut file = tempfile::NamedTempFile::new().expect("expected temp file",);
        writeln!(file, "analysis:\n  strategy: exhaustive").expect("expected write",);

        let config = load_config(file.path(),).expect("valid configuration",);
        assert_eq!(config.analysis.strategy, ProbeStrategy::Exhaustive);
    }

    #[test]
    fn missing_file_is_an_io_error()
    {
        let dir = tempfile::tempdir().expect("expected temp dir",);
        let error = load_config(&dir.path().join("absent.yaml",),).unwrap_err();
        assert!(matches!(error, Error::Io { .. }));
    }
}
