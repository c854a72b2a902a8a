// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface for the repograde binary.
//!
//! `analyze` scores a single repository and prints the result as JSON,
//! `session` serves the duplex message protocol over newline-delimited JSON on
//! standard input and output, and `requests` answers one request body per line
//! through the rate-limited request/response handler.

use std::{
    io,
    path::{Path, PathBuf},
    process,
    sync::Arc,
    time::Duration,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use repograde::{
    AnalysisOptions, AnalysisService, Analyzer, AnalyzerConfig, ClientMessage, Error,
    FixedWindowLimiter, GithubConnector, PipelineResult, ProbeStrategy, ProgressEvent,
    ProgressSink, ServerMessage, ServiceRequest, ServiceResponse, Session,
    generate_recommendations, load_config,
};
use serde_json::{Map, Value, json};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Command line interface for scoring GitHub repositories.
#[derive(Debug, Parser,)]
#[command(name = "repograde", version, about = "Heuristic quality scores for GitHub repositories")]
struct Cli
{
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Subcommand,)]
enum Command
{
    /// Analyze one repository and print the result as JSON.
    Analyze(AnalyzeArgs,),
    /// Serve the message protocol over stdin/stdout, one JSON object per line.
    Session(SessionArgs,),
    /// Answer request bodies read from stdin, one per line, subject to the
    /// configured rate limit.
    Requests(RequestsArgs,),
}

/// Options shared by every subcommand.
#[derive(Debug, Args,)]
struct CommonArgs
{
    /// Path to a YAML configuration file.
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf,>,

    /// Access token for the GitHub API.
    #[arg(long = "token", value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String,>,

    /// Wall-clock budget of one analysis in milliseconds.
    #[arg(long = "timeout-ms", value_name = "MS", env = "ANALYSIS_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64,>,

    /// Probe schedule to run.
    #[arg(long = "strategy", value_enum, global = true)]
    strategy: Option<ProbeStrategy,>,
}

#[derive(Debug, Args,)]
struct AnalyzeArgs
{
    /// Repository URL, e.g. https://github.com/owner/name.
    #[arg(value_name = "URL")]
    url: String,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,

    /// Include improvement recommendations next to the scores.
    #[arg(long = "recommendations", action = ArgAction::SetTrue)]
    recommendations: bool,

    /// Do not draw the progress bar.
    #[arg(long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,
}

#[derive(Debug, Args,)]
struct SessionArgs
{
    /// Send diagnostic error text to the client.
    #[arg(long = "verbose-errors", action = ArgAction::SetTrue)]
    verbose_errors: bool,
}

#[derive(Debug, Args,)]
struct RequestsArgs
{
    /// Caller address used as the rate-limit key.
    #[arg(long = "client", value_name = "ADDR")]
    client: Option<String,>,

    /// Include diagnostic error text in response bodies.
    #[arg(long = "verbose-errors", action = ArgAction::SetTrue)]
    verbose_errors: bool,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    init_tracing();
    if let Err(error,) = run().await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),);
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr,),).with(filter,).init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration failures and, for `analyze`, the analysis error.
async fn run() -> Result<(), Error,>
{
    let cli = Cli::parse();
    let config = resolve_config(cli.common.config.as_deref(),)?;
    let options = analysis_options(&config, &cli.common,);
    let connector = Arc::new(GithubConnector::new(config.retry.clone(), config.github.api_base.clone(),),);
    let analyzer = Analyzer::new(connector, options,)?;

    match cli.command {
        Command::Analyze(args,) => run_analyze(&analyzer, cli.common.token.as_deref(), args,).await,
        Command::Session(args,) => {
            run_session(analyzer, args.verbose_errors,).await;
            Ok((),)
        }
        Command::Requests(args,) => {
            let service = request_service(analyzer, &config, cli.common.token, args.verbose_errors,);
            run_requests(&service, args.client,).await
        }
    }
}

fn resolve_config(path: Option<&Path,>,) -> Result<AnalyzerConfig, Error,>
{
    match path {
        Some(path,) => {
            debug!("loading configuration from {}", path.display());
            load_config(path,)
        }
        None => Ok(AnalyzerConfig::default(),),
    }
}

fn analysis_options(config: &AnalyzerConfig, common: &CommonArgs,) -> AnalysisOptions
{
    let mut options = config.analysis_options();
    if let Some(millis,) = common.timeout_ms.filter(|millis| *millis > 0,) {
        options.timeout = Duration::from_millis(millis,);
    }
    if let Some(strategy,) = common.strategy {
        options.strategy = strategy;
    }
    options
}

/// Progress sink drawing an indicatif bar on stderr.
struct BarProgress
{
    bar: ProgressBar,
}

impl BarProgress
{
    fn new(hidden: bool,) -> Self
    {
        if hidden {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }
        let bar = ProgressBar::new(100,);
        let style = ProgressStyle::with_template("{spinner:.yellow} [{elapsed_precise}] {bar:30.cyan/blue} {pos:>3}% {msg}",)
            .unwrap_or_else(|_| ProgressStyle::default_bar(),);
        bar.set_style(style,);
        bar.enable_steady_tick(Duration::from_millis(120,),);
        Self {
            bar,
        }
    }
}

impl ProgressSink for BarProgress
{
    fn emit(&mut self, event: ProgressEvent,)
    {
        self.bar.set_position(u64::from(event.progress,),);
        self.bar.set_message(event.step.to_string(),);
    }
}

async fn run_analyze(analyzer: &Analyzer, token: Option<&str,>, args: AnalyzeArgs,) -> Result<(), Error,>
{
    let mut progress = BarProgress::new(args.quiet,);
    let outcome = analyzer.analyze(&args.url, token, &mut progress, &CancellationToken::new(),).await;
    progress.bar.finish_and_clear();
    let result = outcome?;
    info!("{} scored {}", args.url, result.overall_score);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_result(&mut handle, &result, args.recommendations, args.pretty,)
}

fn write_result<W: io::Write,>(
    writer: &mut W,
    result: &PipelineResult,
    recommendations: bool,
    pretty: bool,
) -> Result<(), Error,>
{
    let document = if recommendations {
        json!({ "result": result, "recommendations": generate_recommendations(result) })
    } else {
        serde_json::to_value(result,)?
    };

    if pretty {
        serde_json::to_writer_pretty(writer, &document,)?;
    } else {
        serde_json::to_writer(writer, &document,)?;
    }

    Ok((),)
}

/// Bridges stdin/stdout to a [`Session`] until stdin closes or the client
/// disconnects.
async fn run_session(analyzer: Analyzer, verbose_errors: bool,)
{
    let (inbound_tx, inbound_rx,) = mpsc::unbounded_channel();
    let (outbound_tx, mut outbound_rx,) = mpsc::unbounded_channel::<ServerMessage,>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message,) = outbound_rx.recv().await {
            let line = match message.to_json() {
                Ok(line,) => line,
                Err(error,) => {
                    warn!("dropping unencodable message: {}", error);
                    continue;
                }
            };
            let written = async {
                stdout.write_all(line.as_bytes(),).await?;
                stdout.write_all(b"\n",).await?;
                stdout.flush().await
            };
            if let Err(error,) = written.await {
                warn!("stdout closed: {}", error);
                break;
            }
        }
    },);

    let session = tokio::spawn(Session::new(analyzer, verbose_errors,).run(inbound_rx, outbound_tx.clone(),),);

    let mut lines = BufReader::new(tokio::io::stdin(),).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line,),) => line,
            Ok(None,) => break,
            Err(error,) => {
                warn!("failed to read stdin: {}", error);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match ClientMessage::from_json(&line,) {
            Ok(message,) => {
                let disconnect = matches!(message, ClientMessage::Disconnect);
                if inbound_tx.send(message,).is_err() || disconnect {
                    break;
                }
            }
            Err(error,) => {
                warn!("ignoring malformed client message: {}", error);
                let reply = ServerMessage::Error {
                    message: error.public_message(verbose_errors,),
                };
                if outbound_tx.send(reply,).is_err() {
                    debug!("session outbound closed, dropping decode error");
                }
            }
        }
    }

    drop(inbound_tx,);
    if let Err(error,) = session.await {
        warn!("session task failed: {}", error);
    }
    drop(outbound_tx,);
    if let Err(error,) = writer.await {
        warn!("writer task failed: {}", error);
    }
}

/// Request/response handler admitting callers through the configured window.
fn request_service(
    analyzer: Analyzer,
    config: &AnalyzerConfig,
    token: Option<String,>,
    verbose_errors: bool,
) -> AnalysisService
{
    let limiter = Arc::new(FixedWindowLimiter::new(config.rate_limit.clone(),),);
    AnalysisService::new(analyzer, limiter,).with_default_credential(token,).with_verbose_errors(verbose_errors,)
}

fn response_document(response: &ServiceResponse,) -> Value
{
    let headers: Map<String, Value,> = response
        .headers
        .iter()
        .map(|(name, value,)| ((*name).to_owned(), Value::String(value.clone(),),),)
        .collect();
    json!({ "status": response.status, "headers": headers, "body": response.body })
}

/// Handles one request body per stdin line until stdin closes.
///
/// # Errors
///
/// Returns [`Error::Serialize`] if a response cannot be encoded.
async fn run_requests(service: &AnalysisService, client: Option<String,>,) -> Result<(), Error,>
{
    let mut lines = BufReader::new(tokio::io::stdin(),).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line,),) => line,
            Ok(None,) => break,
            Err(error,) => {
                warn!("failed to read stdin: {}", error);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let mut request = ServiceRequest::post(line,);
        request.peer_addr = client.clone();
        let response = service.handle(&request,).await;
        debug!("answered request with status {}", response.status);

        let encoded = serde_json::to_string(&response_document(&response,),)?;
        let written = async {
            stdout.write_all(encoded.as_bytes(),).await?;
            stdout.write_all(b"\n",).await?;
            stdout.flush().await
        };
        if let Err(error,) = written.await {
            warn!("stdout closed: {}", error);
            break;
        }
    }
    Ok((),)
}
