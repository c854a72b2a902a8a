// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Duplex analysis session.
//!
//! A session consumes [`ClientMessage`]s and answers with [`ServerMessage`]s
//! over a pair of channels. At most one analysis runs per session; it owns a
//! [`CancellationToken`] that `cancelAnalysis`, `disconnect` and a closed
//! inbound channel all trigger.

use serde::{Deserialize, Serialize};
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::Error,
    pipeline::{Analyzer, ProgressSink},
    report::PipelineResult,
    step::{ProgressEvent, StepId},
};

/// Status reported with every successful result.
pub const SUCCESS_STATUS: &str = "success";
/// Answer to an analysis request received while another one is running.
pub const BUSY_MESSAGE: &str = "An analysis is already running for this session";

/// Inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage
{
    #[serde(rename_all = "camelCase")]
    AnalyzeRepo
    {
        repo_url:   String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credential: Option<String,>,
    },
    CancelAnalysis,
    Disconnect,
}

impl ClientMessage
{
    /// Decodes one JSON message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed or unknown messages.
    pub fn from_json(text: &str,) -> Result<Self, Error,>
    {
        serde_json::from_str(text,).map_err(|error| Error::decode("client message", error,),)
    }
}

/// Outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage
{
    Progress
    {
        step: StepId, progress: u8,
    },
    #[serde(rename_all = "camelCase")]
    AnalysisResults
    {
        status:    String,
        repo_name: String,
        results:   Box<PipelineResult,>,
    },
    Error
    {
        message: String,
    },
}

impl ServerMessage
{
    fn error(message: impl Into<String,>,) -> Self
    {
        Self::Error {
            message: message.into(),
        }
    }

    /// Encodes the message as a single JSON line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] if the result cannot be encoded.
    pub fn to_json(&self,) -> Result<String, Error,>
    {
        Ok(serde_json::to_string(self,)?,)
    }
}

impl From<ProgressEvent,> for ServerMessage
{
    fn from(event: ProgressEvent,) -> Self
    {
        Self::Progress {
            step:     event.step,
            progress: event.progress,
        }
    }
}

/// Forwards progress while the analysis has not been cancelled.
struct ChannelProgress
{
    outbound: UnboundedSender<ServerMessage,>,
    cancel:   CancellationToken,
}

impl ProgressSink for ChannelProgress
{
    fn emit(&mut self, event: ProgressEvent,)
    {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.outbound.send(event.into(),).is_err() {
            debug!("session outbound closed, dropping progress {}", event.step);
        }
    }
}

struct ActiveAnalysis
{
    cancel: CancellationToken,
    handle: JoinHandle<(),>,
}

impl ActiveAnalysis
{
    fn is_running(&self,) -> bool
    {
        !self.handle.is_finished()
    }

    fn release(self,)
    {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// One client connection.
pub struct Session
{
    analyzer:       Analyzer,
    verbose_errors: bool,
    active:         Option<ActiveAnalysis,>,
}

impl Session
{
    /// `verbose_errors` exposes diagnostic error text to the client.
    pub fn new(analyzer: Analyzer, verbose_errors: bool,) -> Self
    {
        Self {
            analyzer,
            verbose_errors,
            active: None,
        }
    }

    /// Serves the session until `disconnect` arrives or `inbound` closes.
    pub async fn run(
        mut self,
        mut inbound: UnboundedReceiver<ClientMessage,>,
        outbound: UnboundedSender<ServerMessage,>,
    )
    {
        info!("session opened");
        while let Some(message,) = inbound.recv().await {
            match message {
                ClientMessage::AnalyzeRepo {
                    repo_url,
                    credential,
                } => self.start_analysis(repo_url, credential, &outbound,),
                ClientMessage::CancelAnalysis => self.cancel_analysis(&outbound,),
                ClientMessage::Disconnect => break,
            }
        }

        if let Some(active,) = self.active.take() {
            if active.is_running() {
                info!("releasing in-flight analysis of a closed session");
            }
            active.release();
        }
        info!("session closed");
    }

    fn start_analysis(
        &mut self,
        repo_url: String,
        credential: Option<String,>,
        outbound: &UnboundedSender<ServerMessage,>,
    )
    {
        if self.active.as_ref().is_some_and(ActiveAnalysis::is_running,) {
            warn!("rejecting analysis of {} while another one is running", repo_url);
            send(outbound, ServerMessage::error(BUSY_MESSAGE,),);
            return;
        }

        info!("analysis requested for {}", repo_url);
        let cancel = CancellationToken::new();
        let analyzer = self.analyzer.clone();
        let verbose = self.verbose_errors;
        let mut sink = ChannelProgress {
            outbound: outbound.clone(),
            cancel:   cancel.clone(),
        };
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let outcome = analyzer.analyze(&repo_url, credential.as_deref(), &mut sink, &token,).await;
            if token.is_cancelled() {
                debug!("analysis of {} cancelled, suppressing its outcome", repo_url);
                return;
            }

            let message = match outcome {
                Ok(result,) => ServerMessage::AnalysisResults {
                    status:    SUCCESS_STATUS.to_owned(),
                    repo_name: result.repository_name().map_or_else(|| repo_url.clone(), str::to_owned,),
                    results:   Box::new(result,),
                },
                Err(error,) => ServerMessage::error(error.public_message(verbose,),),
            };
            send(&sink.outbound, message,);
        },);

        self.active = Some(ActiveAnalysis {
            cancel,
            handle,
        },);
    }

    fn cancel_analysis(&mut self, outbound: &UnboundedSender<ServerMessage,>,)
    {
        match self.active.take() {
            Some(active,) if active.is_running() => {
                info!("cancelling the running analysis");
                active.cancel.cancel();
                send(outbound, ServerMessage::error(Error::AnalysisCancelled.public_message(false,),),);
                self.active = Some(active,);
            }
            _ => debug!("no active analysis to cancel"),
        }
    }
}

fn send(outbound: &UnboundedSender<ServerMessage,>, message: ServerMessage,)
{
    if outbound.send(message,).is_err() {
        debug!("session outbound closed, dropping message");
    }
}
