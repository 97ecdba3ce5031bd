//! CLI for the chat citation pipeline.
//!
//! Subcommands:
//!  - `extract`    : run the pipeline over a saved message sequence.
//!  - `replay`     : drive a chat session from a recorded driver script.
//!  - `transcript` : print a saved session transcript.
//!
//! Usage examples:
//!  cargo run -p chat-citations -- extract --messages turn.json --json
//!  cargo run -p chat-citations -- replay --script script.json --prompt "hi" --stream
//!
//! Diagnostics go to stderr through `tracing` (`RUST_LOG` controls the level);
//! stdout only carries command output.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod render;

use crate::config::Config;
use crate::render::{render_output, render_turn, Spinner};

use chat_citations::{
    load_session_json, save_session_json, ChatSession, CitationPipeline, CitationPolicy,
    Message, ResponseMode, ScriptedDriver,
};

/// CLI entrypoint.
#[derive(Parser)]
#[command(
    name = "chat-citations",
    about = "Chat citation pipeline: extract sources and replay chat sessions",
    version
)]
struct Cli {
    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the answer and citations of a saved message sequence.
    Extract(ExtractArgs),

    /// Replay prompts against a scripted conversation driver.
    Replay(ReplayArgs),

    /// Print a saved session transcript.
    Transcript(TranscriptArgs),
}

/// Citation selection flags shared by subcommands. Unset flags fall back to
/// the environment, then to the library defaults.
#[derive(Args, Debug, Clone, Default)]
struct CitationArgs {
    /// Citation policy: ranked|unranked.
    #[arg(long)]
    policy: Option<CitationPolicy>,

    /// Minimum relevance (inclusive) kept by the ranked policy (0.0..1.0).
    #[arg(long, value_parser = config::min_score_flag)]
    min_score: Option<f64>,

    /// Maximum number of citations per turn.
    #[arg(long)]
    max_citations: Option<usize>,
}

/// Arguments for the `extract` subcommand.
#[derive(Args, Debug)]
struct ExtractArgs {
    /// Path to a JSON array of messages.
    #[arg(short, long, value_name = "PATH")]
    messages: PathBuf,

    #[command(flatten)]
    citations: CitationArgs,

    /// Output the result as JSON to stdout.
    #[arg(long)]
    json: bool,
}

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug)]
struct ReplayArgs {
    /// Path to the driver script (JSON with a `turns` array).
    #[arg(short, long, value_name = "PATH")]
    script: PathBuf,

    /// User prompt to submit. Repeat for several turns.
    #[arg(short, long = "prompt", value_name = "TEXT", required = true)]
    prompts: Vec<String>,

    /// Pull each turn as a stream of incremental updates.
    #[arg(long)]
    stream: bool,

    /// Path to write the session transcript (optional).
    #[arg(long, short = 'o', value_name = "PATH")]
    out: Option<PathBuf>,

    /// If set, continue the transcript stored at `--out` (load then replay).
    #[arg(long)]
    append: bool,

    /// Clear the loaded transcript before replaying (starts a new thread).
    #[arg(long)]
    reset: bool,

    #[command(flatten)]
    citations: CitationArgs,

    /// Output the final transcript as JSON to stdout.
    #[arg(long)]
    json: bool,
}

/// Arguments for the `transcript` subcommand.
#[derive(Args, Debug)]
struct TranscriptArgs {
    /// Path to a saved session JSON file.
    #[arg(short = 's', long, value_name = "PATH")]
    session: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

/// Application entry point.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration from environment")?;
    debug!(
        anthropic_key = config.anthropic_key_present,
        tavily_key = config.tavily_key_present,
        "configuration loaded"
    );

    match cli.command {
        Commands::Extract(args) => run_extract(args, &config),
        Commands::Replay(args) => run_replay(args, &config),
        Commands::Transcript(args) => run_transcript(args),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn pipeline_for(args: &CitationArgs, config: &Config) -> CitationPipeline {
    CitationPipeline::new(config.citation_config(
        args.policy,
        args.min_score,
        args.max_citations,
    ))
}

/// Run the `extract` subcommand.
fn run_extract(args: ExtractArgs, config: &Config) -> Result<()> {
    let file = BufReader::new(
        File::open(&args.messages)
            .with_context(|| format!("opening messages {}", args.messages.display()))?,
    );
    let messages: Vec<Message> = serde_json::from_reader(file)
        .with_context(|| format!("parsing messages from {}", args.messages.display()))?;

    let pipeline = pipeline_for(&args.citations, config);
    let output = pipeline.run(&messages);
    info!(
        messages = messages.len(),
        citations = output.citations.len(),
        "extraction complete"
    );

    if args.json {
        let out = json!({
            "messages": args.messages.to_string_lossy().to_string(),
            "config": pipeline.config(),
            "answer": output.answer,
            "citations": output.citations,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", render_output(&output));
    }
    Ok(())
}

/// Run the `replay` subcommand.
///
/// This function:
/// 1. Loads the driver script and (optionally) an existing transcript.
/// 2. Submits each prompt as one turn through `ChatSession::handle_turn`.
/// 3. Prints each assistant turn and optionally persists the transcript.
fn run_replay(args: ReplayArgs, config: &Config) -> Result<()> {
    if args.append && args.out.is_none() {
        return Err(anyhow::anyhow!(
            "--append requires --out <path> to be provided"
        ));
    }

    let mut driver = ScriptedDriver::from_json_file(&args.script)?;
    let pipeline = pipeline_for(&args.citations, config);
    let mode = if args.stream {
        ResponseMode::Streaming
    } else {
        ResponseMode::SingleShot
    };

    let mut session = match args.out.as_ref() {
        Some(outp) if args.append && outp.exists() => {
            info!(path = %outp.display(), "loading existing transcript");
            load_session_json(outp)
                .with_context(|| format!("loading transcript from {}", outp.display()))?
        }
        _ => ChatSession::new(),
    };
    if args.reset {
        session.clear();
    }
    info!(
        conversation_id = session.conversation_id(),
        turns = args.prompts.len(),
        scripted_responses = driver.remaining(),
        "replaying session"
    );

    for prompt in &args.prompts {
        if !args.json {
            println!("user> {}", prompt);
        }
        let spinner = Spinner::start("Thinking...")?;
        let turn = session.handle_turn(&mut driver, &pipeline, prompt, mode);
        spinner.finish();
        if !args.json {
            print!("{}", render_turn(turn));
        }
    }

    if let Some(outp) = args.out.as_ref() {
        save_session_json(&session, outp)
            .with_context(|| format!("saving transcript to {}", outp.display()))?;
        info!(path = %outp.display(), "saved transcript");
    }

    if args.json {
        let out = json!({
            "conversation_id": session.conversation_id(),
            "mode": mode,
            "turns": session.turns(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

/// Run the `transcript` subcommand.
fn run_transcript(args: TranscriptArgs) -> Result<()> {
    let session = load_session_json(&args.session)
        .with_context(|| format!("loading transcript from {}", args.session.display()))?;

    if args.json {
        let out = json!({
            "session": args.session.to_string_lossy().to_string(),
            "conversation_id": session.conversation_id(),
            "turns": session.turns(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("conversation_id={}", session.conversation_id());
    if session.is_empty() {
        println!("\nTranscript is empty.");
        return Ok(());
    }
    for turn in session.turns() {
        let when = i64::try_from(turn.timestamp)
            .ok()
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| String::from("unknown time"));
        println!("\n[{}] turn_id={}", when, turn.turn_id);
        print!("{}", render_turn(turn));
    }
    Ok(())
}
