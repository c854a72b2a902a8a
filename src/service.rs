// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Request/response entry point for callers without a duplex channel.
//!
//! The handler is transport-agnostic: it takes the method, body and caller
//! addresses of a request and produces a status, headers and a JSON body.
//! No progress is streamed; the call resolves once the pipeline finishes.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    error::Error,
    pipeline::{Analyzer, NoProgress},
    rate_limit::{RateLimitDecision, RateLimiter, client_key},
};

pub const HEADER_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_REMAINING: &str = "X-RateLimit-Remaining";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

/// Incoming request as seen by the handler.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ServiceRequest
{
    pub method:        String,
    pub body:          String,
    /// Raw `X-Forwarded-For` header.
    pub forwarded_for: Option<String,>,
    pub peer_addr:     Option<String,>,
}

impl ServiceRequest
{
    /// POST request carrying `body`.
    pub fn post(body: impl Into<String,>,) -> Self
    {
        Self {
            method:        "POST".to_owned(),
            body:          body.into(),
            forwarded_for: None,
            peer_addr:     None,
        }
    }
}

/// Handler answer.
#[derive(Debug, Clone, PartialEq,)]
pub struct ServiceResponse
{
    pub status:  u16,
    pub headers: Vec<(&'static str, String,),>,
    pub body:    Value,
}

impl ServiceResponse
{
    fn new(status: u16, body: Value,) -> Self
    {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str,) -> Option<&str,>
    {
        self.headers
            .iter()
            .find(|(key, _,)| key.eq_ignore_ascii_case(name,),)
            .map(|(_, value,)| value.as_str(),)
    }
}

#[derive(Debug, Default, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody
{
    #[serde(default)]
    repo_url:   Option<String,>,
    #[serde(default)]
    credential: Option<String,>,
}

/// Rate-limited analysis handler.
pub struct AnalysisService
{
    analyzer:           Analyzer,
    limiter:            Arc<dyn RateLimiter,>,
    default_credential: Option<String,>,
    verbose_errors:     bool,
}

impl AnalysisService
{
    pub fn new(analyzer: Analyzer, limiter: Arc<dyn RateLimiter,>,) -> Self
    {
        Self {
            analyzer,
            limiter,
            default_credential: None,
            verbose_errors: false,
        }
    }

    /// Credential used when a request does not carry one.
    pub fn with_default_credential(mut self, credential: Option<String,>,) -> Self
    {
        self.default_credential = credential;
        self
    }

    /// Expose diagnostic error text in responses.
    pub fn with_verbose_errors(mut self, verbose: bool,) -> Self
    {
        self.verbose_errors = verbose;
        self
    }

    pub async fn handle(&self, request: &ServiceRequest,) -> ServiceResponse
    {
        if !request.method.eq_ignore_ascii_case("POST",) {
            return ServiceResponse::new(405, json!({ "error": "Method not allowed" }),);
        }

        let key = client_key(request.forwarded_for.as_deref(), request.peer_addr.as_deref(),);
        let decision = self.limiter.check(&key,).await;
        let mut headers = vec![
            (HEADER_LIMIT, decision.limit().to_string(),),
            (HEADER_REMAINING, decision.remaining().to_string(),),
        ];
        if let RateLimitDecision::Limited { .. } = decision {
            let retry_after_secs = decision.retry_after_secs().unwrap_or(0,);
            warn!("rate limit exceeded for {}", key);
            headers.push((HEADER_RETRY_AFTER, retry_after_secs.to_string(),),);
            let error = Error::RateLimitExceeded {
                retry_after_secs,
            };
            return ServiceResponse {
                status: error.status_code(),
                headers,
                body: json!({ "error": error.public_message(self.verbose_errors) }),
            };
        }

        let mut response = self.analyze(request,).await;
        headers.append(&mut response.headers,);
        response.headers = headers;
        response
    }

    async fn analyze(&self, request: &ServiceRequest,) -> ServiceResponse
    {
        let body: AnalyzeBody = match serde_json::from_str(&request.body,) {
            Ok(body,) => body,
            Err(error,) if request.body.trim().is_empty() => {
                info!("empty request body: {}", error);
                AnalyzeBody::default()
            }
            Err(error,) => {
                warn!("malformed request body: {}", error);
                return ServiceResponse::new(400, json!({ "error": "Invalid request body" }),);
            }
        };

        let Some(repo_url,) = body.repo_url.filter(|url| !url.trim().is_empty(),) else {
            return ServiceResponse::new(400, json!({ "error": "Repository URL is required" }),);
        };
        let credential = body.credential.or_else(|| self.default_credential.clone(),);

        info!("request/response analysis of {}", repo_url);
        let outcome =
            self.analyzer.analyze(&repo_url, credential.as_deref(), &mut NoProgress, &CancellationToken::new(),).await;
        match outcome {
            Ok(result,) => match serde_json::to_value(&result,) {
                Ok(body,) => ServiceResponse::new(200, body,),
                Err(source,) => failure(&Error::Serialize {
                    source,
                }, self.verbose_errors,),
            },
            Err(error,) => failure(&error, self.verbose_errors,),
        }
    }
}

fn failure(error: &Error, verbose: bool,) -> ServiceResponse
{
    warn!("analysis failed: {}", error);
    ServiceResponse::new(
        error.status_code(),
        json!({
            "error": "Failed to analyze repository",
            "message": error.public_message(verbose),
        }),
    )
}
