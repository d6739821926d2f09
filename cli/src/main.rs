//! CLI entrypoint for consilium
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use consilium_application::{
    AuditSink, CircuitBreaker, ConsultPanelUseCase, CorpusProvider, CorpusStore, FinalResult,
    GuardedReviewUseCase, HandleTaskUseCase, NullAuditSink, RetrievalCache,
};
use consilium_domain::{CircuitMode, SmartRouter};
use consilium_infrastructure::{
    ConfigLoader, FileConfig, FsCorpusProvider, HttpModelGateway, HttpReviewer, JsonlAuditSink,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Final answer plus a short decision summary
    Text,
    /// The full result as JSON, including the trace
    Json,
}

#[derive(Parser)]
#[command(name = "consilium", version, about = "Multi-agent review engine")]
struct Cli {
    /// The task to review
    task: Option<String>,

    /// Path to a config file (overrides discovered configs)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip config file discovery and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Override the reviewer circuit mode (off, shadow, active)
    #[arg(long)]
    breaker_mode: Option<CircuitMode>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Print cache and breaker status after the task completes
    #[arg(long)]
    stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if cli.print_config {
        let defaults = ConfigLoader::load_defaults();
        println!("{}", toml::to_string_pretty(&defaults)?);
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };
    if let Some(mode) = cli.breaker_mode {
        config.engine.breaker_mode = mode;
    }

    let Some(task) = cli.task else {
        bail!("a task is required; see --help");
    };

    let result = run(&config, &task, cli.stats).await?;

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text(&result),
    }

    Ok(())
}

/// Wire the layers together and handle one task.
async fn run(config: &FileConfig, task: &str, show_stats: bool) -> Result<FinalResult> {
    info!("starting consilium");

    let corpus = match FsCorpusProvider::new(config.corpus.dir.clone()).load().await {
        Ok(corpus) => corpus,
        Err(e) => {
            // A missing corpus degrades retrieval, it does not block review.
            tracing::warn!("running without knowledge corpus: {e}");
            consilium_domain::Corpus::empty()
        }
    };

    let audit: Arc<dyn AuditSink> = match &config.audit.path {
        Some(path) => match JsonlAuditSink::new(path) {
            Some(sink) => Arc::new(sink),
            None => Arc::new(NullAuditSink),
        },
        None => Arc::new(NullAuditSink),
    };

    let cache = Arc::new(RetrievalCache::new(
        config.engine.cache_capacity,
        config.engine.normalization,
    ));
    let breaker = Arc::new(CircuitBreaker::new(
        config.engine.breaker_mode,
        config.engine.thresholds,
    ));

    let panel = ConsultPanelUseCase::new(
        Arc::new(HttpModelGateway::new(&config.gateway)),
        Arc::new(CorpusStore::new(corpus)),
        Arc::clone(&cache),
        config.engine.panel,
        config.engine.limits,
    );
    let review = GuardedReviewUseCase::new(
        Arc::new(HttpReviewer::new(&config.reviewer)),
        Arc::clone(&breaker),
        config.engine.gate,
        config.engine.review_timeout(),
    );
    let router = SmartRouter::default().with_aggregation(config.engine.aggregation);
    let engine = HandleTaskUseCase::new(router, panel, review, audit);

    let result = engine
        .execute(task)
        .await
        .context("task handling failed")?;

    if show_stats {
        let stats = cache.stats();
        let metrics = breaker.window_metrics();
        println!(
            "[cache: {} hits / {} misses, {}/{} entries]",
            stats.hits, stats.misses, stats.entries, stats.capacity,
        );
        println!(
            "[breaker: mode {}, {} windowed calls, override rate {:.2}]",
            breaker.mode(),
            metrics.calls,
            metrics.override_rate,
        );
    }

    Ok(result)
}

fn print_text(result: &FinalResult) {
    println!("{}", result.text);
    println!();
    println!(
        "[tier {} | confidence {:.2} | override {}]",
        result.tier,
        result.confidence,
        if result.override_applied { "applied" } else { "none" },
    );
    if !result.trace.routing.reason.is_empty() {
        println!("[routing: {}]", result.trace.routing.reason);
    }
}
