#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the analysis crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free while still
//! exposing a documented error surface for library consumers.

use std::path::{Path, PathBuf};

/// Unified error type returned by the locator, the hosting client, the
/// pipeline and the transports built on top of it.
///
/// Probe-level failures are absorbed by the pipeline and only ever logged;
/// everything that reaches a caller is one of the orchestrator-level kinds
/// reported by [`Error::kind`].
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// The submitted URL does not address a repository on the hosting service.
    #[error("invalid repository URL {url:?}: {reason}")]
    InvalidRepositoryUrl {
        /// Raw input as supplied by the caller.
        url:    String,
        /// Why the input was rejected.
        reason: String
    },
    /// The hosting API answered with a non-2xx status.
    #[error("remote API error ({status}): {message}")]
    RemoteApi {
        /// HTTP status reported by the hosting API.
        status:  u16,
        /// Message returned by the hosting API.
        message: String
    },
    /// The request never produced an HTTP response.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the network or client failure.
        message: String
    },
    /// A payload returned by the hosting API could not be decoded.
    #[error("failed to decode {context}: {message}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// Decoder diagnostic.
        message: String
    },
    /// The caller exceeded the admission window.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded {
        /// Seconds the caller should wait before retrying.
        retry_after_secs: u64
    },
    /// The wall-clock budget for one analysis elapsed.
    #[error("analysis timed out after {budget_secs}s")]
    AnalysisTimeout {
        /// Budget that was exceeded, in seconds.
        budget_secs: u64
    },
    /// A cancellation request was honored at a step boundary.
    #[error("analysis cancelled by user")]
    AnalysisCancelled,
    /// The pipeline completed but produced an unusable result.
    #[error("invalid analysis result: {message}")]
    InvalidResult {
        /// Which invariant the result violated.
        message: String
    },
    /// Wraps I/O errors that occur while reading configuration files.
    #[error("failed to read configuration from {path:?}: {source}")]
    Io {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when the configuration violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps serialization errors when writing results.
    #[error("failed to serialize results: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    }
}

/// Coarse classification used by transports to choose a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum ErrorKind
{
    /// Input validation failed before any remote call.
    InvalidRepositoryUrl,
    /// A remote call failed and the failure was not absorbed.
    RemoteApi,
    /// The admission window rejected the caller.
    RateLimitExceeded,
    /// The wall-clock budget elapsed.
    AnalysisTimeout,
    /// The caller cancelled the analysis.
    AnalysisCancelled,
    /// The pipeline produced an unusable result.
    InvalidResult,
    /// Configuration or output failures local to the process.
    Internal,
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs an [`Error::InvalidRepositoryUrl`] for the given input.
    pub fn invalid_url<U, R>(url: U, reason: R) -> Self
    where
        U: Into<String>,
        R: Into<String>
    {
        Self::InvalidRepositoryUrl {
            url:    url.into(),
            reason: reason.into()
        }
    }

    /// Constructs an [`Error::Decode`] describing what failed to decode.
    pub fn decode<C, M>(context: C, message: M) -> Self
    where
        C: Into<String>,
        M: std::fmt::Display
    {
        Self::Decode {
            context: context.into(),
            message: message.to_string()
        }
    }

    /// Classifies the error for transport mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRepositoryUrl { .. } => ErrorKind::InvalidRepositoryUrl,
            Self::RemoteApi { .. } | Self::Transport { .. } | Self::Decode { .. } => {
                ErrorKind::RemoteApi
            }
            Self::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Self::AnalysisTimeout { .. } => ErrorKind::AnalysisTimeout,
            Self::AnalysisCancelled => ErrorKind::AnalysisCancelled,
            Self::InvalidResult { .. } => ErrorKind::InvalidResult,
            Self::Io { .. } | Self::Parse { .. } | Self::Validation { .. } | Self::Serialize { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Status code a request/response transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidRepositoryUrl => 400,
            ErrorKind::RemoteApi => 502,
            ErrorKind::RateLimitExceeded => 429,
            ErrorKind::AnalysisTimeout => 504,
            ErrorKind::AnalysisCancelled => 499,
            ErrorKind::InvalidResult | ErrorKind::Internal => 500
        }
    }

    /// Returns `true` for a rejected credential on the hosting API.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::RemoteApi { status: 401, .. })
    }

    /// Returns `true` for a 404 answer of the hosting API.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RemoteApi { status: 404, .. })
    }

    /// Returns `true` when repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::RemoteApi {
                status, ..
            } => *status >= 500,
            _ => false
        }
    }

    /// Message suitable for end users.
    ///
    /// With `verbose` unset, internal diagnostics are replaced by generic
    /// wording so that remote payloads and file paths are never echoed back.
    pub fn public_message(&self, verbose: bool) -> String {
        if verbose {
            return self.to_string();
        }

        match self {
            Self::InvalidRepositoryUrl { .. } => {
                "Invalid GitHub repository URL. Expected https://github.com/owner/name.".to_owned()
            }
            Self::RemoteApi {
                status: 404, ..
            } => "Repository not found. Please check the URL and try again.".to_owned(),
            Self::RemoteApi {
                status: 403 | 429, ..
            } => "GitHub API rate limit exceeded. Please try again later or provide a GitHub token."
                .to_owned(),
            Self::RateLimitExceeded {
                retry_after_secs
            } => format!("Too many requests. Please retry in {retry_after_secs} seconds."),
            Self::AnalysisTimeout { .. } => {
                "Analysis timed out. The repository may be too large or complex to analyze."
                    .to_owned()
            }
            Self::AnalysisCancelled => "Analysis cancelled by user".to_owned(),
            _ => "Failed to analyze repository".to_owned()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the configuration file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}
