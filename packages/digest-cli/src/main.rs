//! `digest` - summarize legal documents, assess their risks and ask
//! questions about them from the terminal.

mod config;
mod export;
mod progress;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use legal_digest::{
    guarded, loaders, Artifact, ArtifactKind, Document, GuardedLlm, OpenAiLlm, Orchestrator,
    TracingProgress,
};
use openai_client::OpenAIClient;
use std::io::Write;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Settings};
use crate::export::Report;
use crate::progress::TerminalProgress;

#[derive(Parser)]
#[command(name = "digest")]
#[command(about = "Summarize legal documents, assess their risks and ask questions about them")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the hierarchical summary
    Summarize(DocumentArgs),

    /// Generate the risk assessment
    Assess(DocumentArgs),

    /// Generate both, then answer questions about the document
    Analyze {
        #[command(flatten)]
        document: DocumentArgs,

        /// Ask these questions instead of prompting interactively
        #[arg(short, long = "question")]
        questions: Vec<String>,
    },
}

#[derive(Args)]
struct DocumentArgs {
    /// Document to process (.txt, .md, .csv, .pdf)
    file: PathBuf,

    /// Write a Markdown report to this path
    #[arg(long)]
    export: Option<PathBuf>,
}

type Digest = Orchestrator<GuardedLlm<OpenAiLlm>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,legal_digest=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.settings.into_config()?;

    match cli.command {
        Commands::Summarize(args) => {
            let (mut digest, document) = setup(&config, &args).await?;
            run_and_print(&mut digest, ArtifactKind::Summary, &document).await?;
            export(&digest, args.export.as_ref())?;
        }
        Commands::Assess(args) => {
            let (mut digest, document) = setup(&config, &args).await?;
            run_and_print(&mut digest, ArtifactKind::RiskReport, &document).await?;
            export(&digest, args.export.as_ref())?;
        }
        Commands::Analyze {
            document: args,
            questions,
        } => {
            let (mut digest, document) = setup(&config, &args).await?;
            run_and_print(&mut digest, ArtifactKind::Summary, &document).await?;
            run_and_print(&mut digest, ArtifactKind::RiskReport, &document).await?;

            if questions.is_empty() {
                interactive_qa(&mut digest).await?;
            } else {
                for question in &questions {
                    ask_and_print(&mut digest, question).await?;
                }
            }
            export(&digest, args.export.as_ref())?;
        }
    }

    Ok(())
}

/// Load the document and build a guarded orchestrator.
async fn setup(config: &Config, args: &DocumentArgs) -> Result<(Digest, Document)> {
    let document = loaders::load_path(&args.file)
        .await
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let client = OpenAIClient::new(&config.api_key).with_base_url(&config.base_url);
    let llm = OpenAiLlm::new(client)
        .with_temperature(config.temperature)
        .with_max_completion_tokens(config.max_tokens);
    let llm = guarded(llm, &config.pipeline).context("Invalid rate limit settings")?;

    let digest =
        Orchestrator::new(llm, config.pipeline.clone()).context("Invalid pipeline settings")?;
    // Redirected stderr gets log lines instead of an in-place progress line
    let mut digest = if console::user_attended_stderr() {
        digest.with_progress(TerminalProgress::new())
    } else {
        digest.with_progress(TracingProgress)
    };
    digest.load_document(&document);
    info!(
        source = %document.source,
        kind = %document.kind,
        chars = document.char_len(),
        "Document loaded"
    );

    println!(
        "{} {} ({}, {} characters)",
        "Loaded".green().bold(),
        document.source.bold(),
        document.kind,
        document.char_len()
    );

    Ok((digest, document))
}

async fn run_and_print(digest: &mut Digest, kind: ArtifactKind, document: &Document) -> Result<()> {
    println!();
    println!("{}", format!("Generating {}...", kind.label()).bright_cyan());

    let watcher = cancel_on_ctrl_c(digest);
    let result = digest.run(kind, document).await;
    watcher.abort();
    let artifact = result.with_context(|| format!("{} failed", kind.label()))?;

    print_artifact(&artifact);
    Ok(())
}

/// Cancel the orchestrator's current token on Ctrl-C.
///
/// A cancelled call re-arms the orchestrator with a fresh token, so each
/// call gets its own watcher.
fn cancel_on_ctrl_c(digest: &Digest) -> JoinHandle<()> {
    let cancel = digest.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling at the next call boundary");
            cancel.cancel();
        }
    })
}

fn print_artifact(artifact: &Artifact) {
    println!();
    println!("{}", artifact.kind.label().bright_green().bold());
    println!(
        "{}",
        format!(
            "{} chunks, {} reduction levels",
            artifact.chunk_count, artifact.levels
        )
        .dimmed()
    );
    println!();
    println!("{}", artifact.text);
}

/// Print the answer as it streams in.
async fn ask_and_print(digest: &mut Digest, question: &str) -> Result<()> {
    println!();
    println!("{} {}", "Q:".bright_blue().bold(), question);
    print!("{} ", "A:".bright_green().bold());
    std::io::stdout().flush().ok();

    let on_delta = |delta: &str| {
        print!("{}", delta);
        std::io::stdout().flush().ok();
    };
    let watcher = cancel_on_ctrl_c(digest);
    let result = digest.ask_streaming(question, Some(&on_delta)).await;
    watcher.abort();
    println!();

    result.context("Question failed")?;
    Ok(())
}

/// Prompt for questions until an empty line.
async fn interactive_qa(digest: &mut Digest) -> Result<()> {
    println!();
    println!("{}", "Ask about the document (empty line to finish)".bright_cyan());

    loop {
        let question = tokio::task::spawn_blocking(|| {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt("Question")
                .allow_empty(true)
                .interact_text()
        })
        .await??;

        let question = question.trim();
        if question.is_empty() {
            break;
        }

        // A failed answer leaves the session usable
        if let Err(e) = ask_and_print(digest, question).await {
            warn!(error = %format!("{:#}", e), "Question failed");
        }
    }

    Ok(())
}

fn export(digest: &Digest, path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    Report::from_session(digest.session()).write_to(path)?;
    info!(path = %path.display(), "Report exported");
    println!();
    println!("{} {}", "Report written to".green(), path.display());
    Ok(())
}
