//! Geowatch CLI
//!
//! Threat event feed and cascade-effect estimation from the terminal.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use geowatch_agents::{
    create_market_source, create_openai_answer, create_search_provider, create_valyu_answer,
    AnswerBackend, AppConfig, CascadeMode, EntityResearcher, GammaConfig, GraphGeocoder,
    MarketWatcher, SharedAnswer, ValyuConfig,
};
use geowatch_core::{
    classify_category, classify_threat_level, extract_entities, extract_keywords, factors_for,
    format_probability, format_volume, leading_outcome, normalize, CountryEntry, EventCategory,
    EventDraft, RandJitter, RelationshipGraph, ThreatEvent,
};
use geowatch_runtime::{CascadeState, Dashboard, DashboardConfig};

#[derive(Parser)]
#[command(name = "geowatch")]
#[command(author, version, about = "Geowatch: threat events and cascade effects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Valyu API key (or set VALYU_API_KEY env var)
    #[arg(long, env = "VALYU_API_KEY", global = true, hide_env_values = true)]
    valyu_api_key: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY", global = true, hide_env_values = true)]
    openai_api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the threat event feed
    Events {
        /// Search queries (default: built-in threat queries)
        queries: Vec<String>,

        /// Write the feed as JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Estimate the cascade effects of one event
    Cascade {
        /// Event JSON file (as written by `events`, one event)
        #[arg(short, long, conflicts_with_all = ["title", "country", "category"])]
        event: Option<PathBuf>,

        /// Event title
        #[arg(short, long)]
        title: Option<String>,

        /// Event country (default: first country named in the title)
        #[arg(long)]
        country: Option<String>,

        /// Event category (default: classified from the title)
        #[arg(long)]
        category: Option<String>,

        /// Graph relationships only, no answer provider
        #[arg(long)]
        offline: bool,

        /// Ask for structured output
        #[arg(long, conflicts_with = "offline")]
        structured: bool,

        /// Seed for reproducible probability jitter
        #[arg(long)]
        seed: Option<u64>,

        /// Write the analysis as JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify a text (argument or stdin)
    Classify {
        text: Option<String>,
    },

    /// Show a country profile and its relations to another country
    Graph {
        country: String,

        #[arg(long)]
        target: Option<String>,
    },

    /// Profile a named entity (country, group, person, organization)
    Entity {
        name: String,
    },

    /// Open prediction markets (default: geopolitical overlay)
    Markets {
        /// Markets concerning this country
        #[arg(long, conflicts_with = "search")]
        country: Option<String>,

        /// Markets mentioning this text
        #[arg(long)]
        search: Option<String>,

        /// Most markets shown (default: 50, 10 per country, 20 per search)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of one line per market
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let graph = Arc::new(config.load_graph()?);

    match cli.command {
        Commands::Events { ref queries, ref output } => {
            run_events(&cli, &config, graph, queries, output.as_deref()).await?;
        }
        Commands::Cascade {
            ref event,
            ref title,
            ref country,
            ref category,
            offline,
            structured,
            seed,
            ref output,
        } => {
            let event = match event {
                Some(path) => read_event(path)?,
                None => build_event(&graph, title.as_deref(), country.as_deref(), category.as_deref())?,
            };
            let options = CascadeOptions {
                offline,
                structured: structured || config.cascade.structured,
                seed,
            };
            run_cascade(&cli, &config, graph, &event, options, output.as_deref()).await?;
        }
        Commands::Classify { ref text } => {
            run_classify(text.clone())?;
        }
        Commands::Graph { ref country, ref target } => {
            run_graph(&graph, country, target.as_deref())?;
        }
        Commands::Entity { ref name } => {
            run_entity(&cli, &config, name).await?;
        }
        Commands::Markets {
            ref country,
            ref search,
            limit,
            json,
        } => {
            run_markets(&config, country.as_deref(), search.as_deref(), limit, json).await?;
        }
    }

    Ok(())
}

async fn run_events(
    cli: &Cli,
    config: &AppConfig,
    graph: Arc<RelationshipGraph>,
    queries: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let key = cli.valyu_api_key.as_deref().ok_or_else(|| {
        anyhow::anyhow!("Valyu API key required. Set VALYU_API_KEY or use --valyu-api-key")
    })?;

    let mut dashboard_config = DashboardConfig::new(graph.clone());
    dashboard_config.search = Some(create_search_provider(valyu_config(config, key))?);
    dashboard_config.geocoder = Some(Arc::new(GraphGeocoder::new(graph)));
    dashboard_config.collector = config.collector_config();
    dashboard_config.queries = if queries.is_empty() {
        config.search.queries.clone()
    } else {
        queries.to_vec()
    };

    let mut dashboard = Dashboard::new(dashboard_config);
    let feed = dashboard.refresh_events().await?;

    let body = serde_json::to_string_pretty(feed)?;
    emit(&body, output)?;

    if output.is_some() {
        println!("{} events", feed.count);
        for event in &feed.events {
            println!(
                "  [{}] {} ({}, {})",
                event.threat_level,
                event.title,
                event.category,
                event.country().unwrap_or("Unknown")
            );
        }
    }

    Ok(())
}

struct CascadeOptions {
    offline: bool,
    structured: bool,
    seed: Option<u64>,
}

async fn run_cascade(
    cli: &Cli,
    config: &AppConfig,
    graph: Arc<RelationshipGraph>,
    event: &ThreatEvent,
    options: CascadeOptions,
    output: Option<&Path>,
) -> Result<()> {
    let mut dashboard_config = DashboardConfig::new(graph);
    dashboard_config.timeout = config.cascade_timeout();
    dashboard_config.structured = options.structured;
    if !options.offline {
        dashboard_config.answer = Some(answer_provider(cli, config)?);
    }

    let mut dashboard = Dashboard::new(dashboard_config);
    if let Some(seed) = options.seed {
        dashboard = dashboard.with_jitter(Box::new(RandJitter::seeded(seed)));
    }

    let mode = if options.offline {
        CascadeMode::Offline
    } else {
        dashboard.mode()
    };
    info!("Analyzing {:?} ({:?})", event.title, mode);

    match dashboard.analyze_with(event, mode).await {
        CascadeState::Ready(analysis) => {
            let body = serde_json::to_string_pretty(analysis)?;
            emit(&body, output)?;

            if output.is_some() {
                println!("{}\n", analysis.summary);
                for effect in &analysis.effects {
                    println!(
                        "  {:>3}%  {:<16} {:<13} ~{}h",
                        effect.probability,
                        effect.target_country,
                        effect.impact_type.as_str(),
                        effect.timeframe_hours
                    );
                }
            }
            Ok(())
        }
        CascadeState::Failed { message, retryable } => {
            if *retryable {
                Err(anyhow::anyhow!("{} (try again, or use --offline)", message))
            } else {
                Err(anyhow::anyhow!("{}", message))
            }
        }
        CascadeState::Idle => Err(anyhow::anyhow!("No analysis produced")),
    }
}

fn run_classify(text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let normalized = normalize(&text);
    let report = json!({
        "category": classify_category(&normalized),
        "threatLevel": classify_threat_level(&normalized),
        "entities": extract_entities(&normalized),
        "keywords": extract_keywords(&normalized),
        "normalized": normalized,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_graph(graph: &RelationshipGraph, country: &str, target: Option<&str>) -> Result<()> {
    let profile = graph
        .profile(country)
        .ok_or_else(|| anyhow::anyhow!("{} is not in the relationship graph", country))?;

    let entry = CountryEntry {
        name: country.to_string(),
        profile: profile.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&entry)?);

    if let Some(target) = target {
        let relations = graph.relations(country, target);
        let report = json!({
            "source": country,
            "target": target,
            "relations": relations,
            "factors": factors_for(&relations),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

async fn run_entity(cli: &Cli, config: &AppConfig, name: &str) -> Result<()> {
    let key = cli.valyu_api_key.as_deref().ok_or_else(|| {
        anyhow::anyhow!("Valyu API key required. Set VALYU_API_KEY or use --valyu-api-key")
    })?;

    let researcher = EntityResearcher::new(create_search_provider(valyu_config(config, key))?);
    match researcher.research(name).await? {
        Some(dossier) => println!("{}", serde_json::to_string_pretty(&dossier)?),
        None => println!("Nothing found about {}", name),
    }
    Ok(())
}

async fn run_markets(
    config: &AppConfig,
    country: Option<&str>,
    search: Option<&str>,
    limit: Option<usize>,
    as_json: bool,
) -> Result<()> {
    let watcher = MarketWatcher::new(create_market_source(GammaConfig::default())?)
        .with_concurrency(config.search.concurrency);

    let markets = match (country, search) {
        (Some(country), _) => watcher.for_country(country, limit.unwrap_or(10)).await?,
        (None, Some(query)) => watcher.search(query, limit.unwrap_or(20)).await?,
        (None, None) => watcher.geopolitical(limit.unwrap_or(50)).await?,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&markets)?);
        return Ok(());
    }

    println!("{} markets", markets.len());
    for market in &markets {
        let leading = leading_outcome(market);
        println!(
            "  {:>4} {:<6} {:>8}  {}",
            format_probability(leading.probability),
            leading.label,
            format_volume(market.volume),
            market.question
        );
    }
    Ok(())
}

fn answer_provider(cli: &Cli, config: &AppConfig) -> Result<SharedAnswer> {
    let provider = match config.answer.backend {
        AnswerBackend::Valyu => {
            let key = cli.valyu_api_key.as_deref().ok_or_else(|| {
                anyhow::anyhow!("Valyu API key required. Set VALYU_API_KEY, or use --offline")
            })?;
            create_valyu_answer(valyu_config(config, key))?
        }
        AnswerBackend::OpenAi => {
            let key = cli.openai_api_key.as_deref().unwrap_or_default();
            create_openai_answer(config.openai_config(key))?
        }
    };
    Ok(provider)
}

fn valyu_config(config: &AppConfig, key: &str) -> ValyuConfig {
    let valyu = ValyuConfig::new(key);
    match &config.search.base_url {
        Some(url) => valyu.with_base_url(url),
        None => valyu,
    }
}

fn read_event(path: &Path) -> Result<ThreatEvent> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not an event", path.display()))
}

/// Assemble an event from command-line fields
fn build_event(
    graph: &RelationshipGraph,
    title: Option<&str>,
    country: Option<&str>,
    category: Option<&str>,
) -> Result<ThreatEvent> {
    let title = title.ok_or_else(|| anyhow::anyhow!("Either --event or --title is required"))?;

    let geocoder = GraphGeocoder::new(Arc::new(graph.clone()));
    let location = match country {
        Some(country) => geocoder.resolve(country, ""),
        None => geocoder.resolve(title, ""),
    }
    .ok_or_else(|| anyhow::anyhow!("Cannot place the event; pass --country with a graph country"))?;

    let mut draft = EventDraft::new(title, "", location, "cli");
    if let Some(name) = category {
        let category = EventCategory::parse(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown category {:?}", name))?;
        draft = draft.category(category);
    }

    Ok(draft.assemble()?)
}

fn emit(body: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved to {}", path.display());
        }
        None => println!("{}", body),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_event_from_flags() {
        let graph = RelationshipGraph::builtin();
        let event = build_event(&graph, Some("Shelling near the border"), Some("Ukraine"), Some("military"))
            .unwrap();
        assert_eq!(event.country(), Some("Ukraine"));
        assert_eq!(event.category, EventCategory::Military);
        assert_eq!(event.source, "cli");
    }

    #[test]
    fn test_build_event_geocodes_title() {
        let graph = RelationshipGraph::builtin();
        let event = build_event(&graph, Some("Floods sweep across Brazil"), None, None).unwrap();
        assert_eq!(event.country(), Some("Brazil"));
    }

    #[test]
    fn test_build_event_rejects_bad_input() {
        let graph = RelationshipGraph::builtin();
        assert!(build_event(&graph, None, Some("Ukraine"), None).is_err());
        assert!(build_event(&graph, Some("Quiet day"), None, None).is_err());
        assert!(build_event(&graph, Some("Clash"), Some("Ukraine"), Some("weather")).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "geowatch", "-vv", "cascade", "--title", "Clash", "--country", "Ukraine", "--offline", "--seed", "7",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Cascade { offline: true, seed: Some(7), .. }));
    }

    #[test]
    fn test_markets_flags() {
        let cli = Cli::try_parse_from(["geowatch", "markets", "--country", "Iran", "-l", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Markets { country: Some(ref c), limit: Some(5), json: false, .. } if c == "Iran"
        ));

        assert!(Cli::try_parse_from(["geowatch", "markets", "--country", "Iran", "--search", "oil"]).is_err());
    }
}
