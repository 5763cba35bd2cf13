use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use news_analysis::orchestrator::reports;
use news_analysis::samples::{sample_texts, split_qa_sample};
use news_analysis::{AnalysisError, AnalysisOrchestrator, AppConfig, FeedCache, FeedFetcher, StrategyRegistry, TaskKind};

#[derive(Parser)]
#[command(name = "news-analysis")]
#[command(about = "Text analysis over free text and cached news feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    /// Minutes a fetched feed stays fresh
    #[arg(long)]
    ttl_minutes: Option<u64>,

    /// Network timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Resolve the full body of every article when a feed is fetched
    #[arg(long)]
    full_text: bool,

    /// Longest accepted input, in characters
    #[arg(long)]
    max_text_chars: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available analysis tasks
    Tasks,

    /// Show sample inputs for a task
    Samples {
        #[arg(short, long, default_value = "sentiment")]
        task: String,
    },

    /// Run one or more tasks over a text
    Analyze {
        /// Task identifier; repeat to run several
        #[arg(short, long = "task", required = true)]
        tasks: Vec<String>,

        #[arg(long)]
        text: String,

        /// Context passage for question answering
        #[arg(long)]
        context: Option<String>,
    },

    /// Run every task over a text and time each one
    Compare {
        #[arg(long)]
        text: String,
    },

    /// List the configured feeds
    Feeds,

    /// Show the cached articles of a feed
    News {
        #[arg(short, long, default_value = "top_stories")]
        feed: String,

        /// Show at most this many articles
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Analyse one article of a feed
    Article {
        #[arg(short, long, default_value = "top_stories")]
        feed: String,

        #[arg(short, long)]
        index: usize,

        /// Task identifier; repeat to run several. Defaults to every task.
        #[arg(short, long = "task")]
        tasks: Vec<String>,

        /// Question to answer from the article body
        #[arg(short, long)]
        question: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("failed to serialize output")?);
    Ok(())
}

/// Print the failure the way the rendering layer would, then report it as the exit error.
fn fail(e: AnalysisError) -> Result<()> {
    print_json(&e.to_failure())?;
    Err(e.into())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_env().context("invalid environment configuration")?;
    if let Some(ttl) = cli.ttl_minutes {
        config.cache_ttl_minutes = ttl;
    }
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout_seconds = timeout;
    }
    if let Some(max) = cli.max_text_chars {
        config.max_text_chars = max;
    }
    config.resolve_full_text |= cli.full_text;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install log subscriber")?;

    let config = load_config(&cli)?;
    let source = Arc::new(FeedFetcher::new(config.fetch.clone())?);
    let cache = Arc::new(FeedCache::from_config(&config, source)?);
    let registry = Arc::new(StrategyRegistry::with_builtin());
    let orchestrator = AnalysisOrchestrator::from_config(&config, registry, cache);

    info!("Ready with {} tasks and {} feeds", orchestrator.list_tasks().len(), config.feeds.len());

    match cli.command {
        Commands::Tasks => print_json(&orchestrator.list_tasks()),

        Commands::Samples { task } => {
            let kind: TaskKind = match task.parse() {
                Ok(kind) => kind,
                Err(_) => return fail(AnalysisError::UnknownTask(task)),
            };
            if kind == TaskKind::Qa {
                let samples: Vec<_> = sample_texts(kind)
                    .iter()
                    .map(|sample| {
                        let (question, context) = split_qa_sample(sample);
                        serde_json::json!({ "question": question, "context": context })
                    })
                    .collect();
                print_json(&samples)
            } else {
                print_json(&sample_texts(kind))
            }
        }

        Commands::Analyze { tasks, text, context } => {
            if let [task] = tasks.as_slice() {
                match orchestrator.run_one(task, &text, context.as_deref()).await {
                    Ok(result) => print_json(&result),
                    Err(e) => fail(e),
                }
            } else {
                let results = orchestrator.run_many(&tasks, &text, context.as_deref()).await;
                print_json(&reports(&results))
            }
        }

        Commands::Compare { text } => {
            let report = orchestrator.compare_all(&text).await;
            print_json(&report.to_reports())
        }

        Commands::Feeds => print_json(&orchestrator.cache().feeds()),

        Commands::News { feed, limit } => match orchestrator.cache().get(&feed).await {
            Ok(entry) => {
                let shown = limit.unwrap_or(entry.len()).min(entry.len());
                print_json(&serde_json::json!({
                    "feed_id": entry.feed_id,
                    "fetched_at": entry.fetched_at,
                    "expires_at": entry.expires_at,
                    "total": entry.len(),
                    "articles": &entry.articles[..shown],
                }))
            }
            Err(e) => fail(e),
        },

        Commands::Article {
            feed,
            index,
            tasks,
            question,
        } => {
            let tasks = if tasks.is_empty() {
                orchestrator.registry().task_ids().into_iter().map(str::to_string).collect()
            } else {
                tasks
            };
            match orchestrator
                .analyze_article(&feed, index, &tasks, question.as_deref())
                .await
            {
                Ok(analysis) => print_json(&analysis.view()),
                Err(e) => fail(e),
            }
        }
    }
}
