use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use sage::config::Config;
use sage::llm::{CompletionProvider, OpenAiClient, ReplicateClient};
use sage::orchestrator::{Orchestrator, QueryOptions, SOURCE_CACHE};
use sage::search::{SearchProvider, SerperClient};
use sage::store::{HistoryEntry, HistoryStore, JsonFileBackend};
use sage::suggest::{self, Suggestions, SuggestionsEngine};

const ENV_FILE: &str = ".env";
const KEEPALIVE_PROBE: &str = "keep alive";

#[derive(Parser)]
#[command(
    name = "sage",
    about = "Search-augmented terminal assistant with model fallback",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and get a search-augmented answer
    Ask {
        question: String,
        /// Return a cached answer when one exists
        #[arg(short, long)]
        quick: bool,
        /// Ask the models for a longer, more thorough answer
        #[arg(short, long)]
        detailed: bool,
        /// Save the question and answer to a file
        #[arg(short, long, value_name = "FILE")]
        save: Option<String>,
        /// Rewrite the question with the primary model before answering
        #[arg(long)]
        optimize: bool,
        /// Skip follow-up suggestions
        #[arg(long)]
        no_suggest: bool,
    },
    /// View past questions and answers
    History {
        /// Search through recorded questions and answers
        #[arg(short, long, value_name = "QUERY")]
        search: Option<String>,
        /// Number of recent entries to show
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Delete all recorded history
    ClearHistory,
    /// Write API keys to the local .env file
    Configure {
        #[arg(long, value_name = "KEY")]
        serper_key: Option<String>,
        #[arg(long, value_name = "KEY")]
        openai_key: Option<String>,
        #[arg(long, value_name = "KEY")]
        llama_key: Option<String>,
        /// Show which keys are currently configured
        #[arg(long)]
        show: bool,
    },
    /// Periodically ping the remote APIs to keep them warm
    Keepalive {
        /// Minutes between keep-alive cycles
        #[arg(long, default_value_t = 5)]
        interval_mins: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,sage=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Ask {
            question,
            quick,
            detailed,
            save,
            optimize,
            no_suggest,
        } => {
            ask(
                &config,
                &question,
                QueryOptions { quick, detailed },
                save.as_deref(),
                optimize,
                no_suggest,
            )
            .await
        }
        Commands::History { search, limit } => history(&config, search.as_deref(), limit),
        Commands::ClearHistory => clear_history(&config),
        Commands::Configure {
            serper_key,
            openai_key,
            llama_key,
            show,
        } => configure(&config, serper_key, openai_key, llama_key, show),
        Commands::Keepalive { interval_mins } => keepalive(&config, interval_mins).await,
    }
}

fn serper_key(config: &Config) -> Result<String> {
    config
        .serper_api_key
        .clone()
        .context("SERPER_API_KEY must be set; run `sage configure --serper-key <key>` or export it")
}

fn primary_client(config: &Config) -> OpenAiClient {
    OpenAiClient::new(
        config.openai_api_key.as_deref(),
        &config.openai_model,
        &config.openai_base_url,
    )
}

fn fallback_client(config: &Config) -> ReplicateClient {
    ReplicateClient::new(config.llama_api_key.as_deref(), &config.llama_model_version)
}

fn open_store(config: &Config) -> HistoryStore<JsonFileBackend> {
    HistoryStore::load(JsonFileBackend::new(
        &config.history_file,
        &config.cache_file,
    ))
}

async fn ask(
    config: &Config,
    question: &str,
    opts: QueryOptions,
    save: Option<&str>,
    optimize: bool,
    no_suggest: bool,
) -> Result<()> {
    let serper_key = serper_key(config)?;

    let question = if optimize {
        let rewritten = suggest::optimize_question(&primary_client(config), question).await;
        if rewritten != question {
            println!("{} {}", "Original: ".dimmed(), question);
            println!("{} {}", "Optimized:".cyan(), rewritten);
        }
        rewritten
    } else {
        question.to_string()
    };

    let mut orchestrator = Orchestrator::new(
        Box::new(SerperClient::new(&serper_key)),
        Box::new(primary_client(config)),
        Box::new(fallback_client(config)),
        open_store(config),
    );

    let outcome = match orchestrator.answer(&question, opts).await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), anyhow::Error::from(err));
            eprintln!(
                "{}",
                "Run `sage configure` to update API keys, or check your connection.".yellow()
            );
            std::process::exit(1);
        }
    };

    println!("\n{}", question.bold());
    let tag = match outcome.source {
        SOURCE_CACHE => format!(
            "cached answer from {}",
            outcome.cached_at.as_deref().unwrap_or("an earlier run")
        ),
        source => format!("answer via {source}"),
    };
    println!("{}", format!("[{tag}]").dimmed());
    println!("\n{}\n", outcome.response);

    if !opts.quick {
        if let Some(results) = &outcome.search_results {
            println!("{}", "Sources".cyan().bold());
            println!("{}\n", results.dimmed());
        }
    }

    if let Some(path) = save {
        save_answer(path, &question, &outcome.response);
    }

    if !no_suggest {
        let engine = SuggestionsEngine::new(Box::new(fallback_client(config)));
        print_suggestions(&engine.suggestions(&question).await);
    }

    Ok(())
}

fn save_answer(path: &str, question: &str, response: &str) {
    let content = format!(
        "Question: {question}\n\nResponse:\n{response}\n\nGenerated on: {}\n",
        chrono::Utc::now().to_rfc3339()
    );
    match fs::write(path, content) {
        Ok(()) => println!("{}", format!("Saved to {path}").green()),
        Err(err) => eprintln!("{} failed to save to {path}: {err}", "error:".red().bold()),
    }
}

fn print_suggestions(suggestions: &Suggestions) {
    let sections = [
        ("Related questions", &suggestions.related_questions),
        ("Power options", &suggestions.power_options),
        ("Other approaches", &suggestions.approaches),
    ];
    for (title, items) in sections {
        println!("{}", title.cyan().bold());
        for (i, item) in items.iter().enumerate() {
            println!("  {}. {}", i + 1, item);
        }
        println!();
    }
}

fn history(config: &Config, search: Option<&str>, limit: usize) -> Result<()> {
    let store = open_store(config);

    match search {
        Some(query) => {
            let hits = store.search(query);
            if hits.is_empty() {
                println!("No matching entries.");
            } else {
                println!("{} matching entries:\n", hits.len());
                for entry in hits {
                    print_entry(entry);
                }
            }
        }
        None => {
            if store.is_empty() {
                println!("No history yet. Ask something first.");
            } else {
                println!("{} entries, showing the most recent:\n", store.len());
                for entry in store.recent(limit) {
                    print_entry(entry);
                }
            }
        }
    }

    Ok(())
}

fn print_entry(entry: &HistoryEntry) {
    println!("{} {}", entry.timestamp.dimmed(), entry.question.bold());
    println!("  {}\n", entry.answer);
}

fn clear_history(config: &Config) -> Result<()> {
    let mut store = open_store(config);
    let removed = store.len();
    store.clear();
    println!("Cleared {removed} history entries.");
    Ok(())
}

fn configure(
    config: &Config,
    serper_key: Option<String>,
    openai_key: Option<String>,
    llama_key: Option<String>,
    show: bool,
) -> Result<()> {
    if show {
        let status = |value: &Option<String>| {
            if value.is_some() {
                "configured".green()
            } else {
                "not set".yellow()
            }
        };
        println!("SERPER_API_KEY:      {}", status(&config.serper_api_key));
        println!("OPENAI_API_KEY:      {}", status(&config.openai_api_key));
        println!("REPLICATE_API_TOKEN: {}", status(&config.llama_api_key));
        return Ok(());
    }

    if serper_key.is_none() && openai_key.is_none() && llama_key.is_none() {
        anyhow::bail!(
            "nothing to configure; pass --serper-key, --openai-key or --llama-key (or --show)"
        );
    }

    let mut entries = load_env_file(ENV_FILE)?;
    if let Some(key) = serper_key {
        entries.insert("SERPER_API_KEY".into(), key);
    }
    if let Some(key) = openai_key {
        entries.insert("OPENAI_API_KEY".into(), key);
    }
    if let Some(key) = llama_key {
        entries.insert("REPLICATE_API_TOKEN".into(), key);
    }

    let content: String = entries
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect();
    fs::write(ENV_FILE, content).with_context(|| format!("failed to write {ENV_FILE}"))?;

    println!("{}", format!("Configuration saved to {ENV_FILE}").green());
    Ok(())
}

/// Existing key=value lines are kept so configuring one key never drops
/// another.
fn load_env_file(path: &str) -> Result<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
        Err(err) => return Err(err).with_context(|| format!("failed to read {path}")),
    };
    for line in data.lines() {
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                entries.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    Ok(entries)
}

async fn keepalive(config: &Config, interval_mins: u64) -> Result<()> {
    let serper_key = serper_key(config)?;
    let search = SerperClient::new(&serper_key);
    let primary = primary_client(config);
    let fallback = fallback_client(config);

    let interval_mins = interval_mins.max(1);
    info!(interval_mins, "starting keep-alive loop");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_mins * 60));
    loop {
        ticker.tick().await;
        run_keepalive_cycle(&search, &primary, &fallback).await;
    }
}

/// One probe per service; failures are logged and never stop the loop.
async fn run_keepalive_cycle(
    search: &SerperClient,
    primary: &OpenAiClient,
    fallback: &ReplicateClient,
) {
    match search.search(KEEPALIVE_PROBE).await {
        Ok(_) => info!("search service active"),
        Err(err) => warn!(error = %err, "search keep-alive failed"),
    }
    match primary.generate(KEEPALIVE_PROBE).await {
        Ok(_) => info!(model = primary.name(), "completion service active"),
        Err(err) => warn!(model = primary.name(), error = %err, "completion keep-alive failed"),
    }
    match fallback.generate(KEEPALIVE_PROBE).await {
        Ok(_) => info!(model = fallback.name(), "completion service active"),
        Err(err) => warn!(model = fallback.name(), error = %err, "completion keep-alive failed"),
    }
}
