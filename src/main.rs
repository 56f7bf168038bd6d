mod campus;
mod commands;
mod faq;
mod fuzzy;
mod gateway;
mod handbook;
mod handlers;
mod ingest;
mod rag;
mod router;
mod schedules;

#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use commands::ProviderChoice;
use handlers::Knowledge;
use ingest::{Ingestor, ReferenceData};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use unibot_channels::telegram::TelegramChannel;
use unibot_core::{
    config::{self, shellexpand, BotConfig, Config},
    traits::{Embedder, Provider, VectorStore},
};
use unibot_knowledge::{HandbookCatalog, HandbookStorage, InteractionLog, KnowledgeStore};
use unibot_providers::{build_embedder, build_provider};

#[derive(Parser)]
#[command(
    name = "unibot",
    version,
    about = "University information bot for Telegram"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot.
    Start,
    /// Check configuration, provider availability and the database.
    Status,
    /// Ask one question through the general retrieval chain.
    Ask {
        /// The question to ask.
        #[arg(trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Rebuild the vector store from reference data and handbooks.
    Ingest {
        /// Only replace the handbook documents.
        #[arg(long)]
        handbooks_only: bool,
        /// Empty the store before ingesting.
        #[arg(long)]
        reset: bool,
    },
    /// Create the database schema.
    Setup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to read .env: {e}");
        }
    }
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_logging(&cfg.bot);

    match cli.command {
        Commands::Start => start(cfg).await?,
        Commands::Status => status(&cli.config, &cfg).await,
        Commands::Ask { question } => {
            if question.is_empty() {
                anyhow::bail!("no question provided. Usage: unibot ask <question>");
            }
            ask(&cfg, &question.join(" ")).await?;
        }
        Commands::Ingest {
            handbooks_only,
            reset,
        } => ingest(&cfg, handbooks_only, reset).await?,
        Commands::Setup => {
            let embedder = build_embedder(&cfg)?;
            KnowledgeStore::connect(&cfg.database, embedder.dimensions()).await?;
            println!("Database schema is up to date.");
        }
    }

    Ok(())
}

/// Console logging, plus a daily rolling file when `bot.log_dir` is set.
/// The returned guard flushes the file writer on drop.
fn init_logging(bot: &BotConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&bot.log_level));

    match &bot.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(shellexpand(dir), "unibot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            None
        }
    }
}

/// Handbook storage, when Supabase is configured.
fn handbook_catalog(cfg: &Config) -> Option<Arc<dyn HandbookCatalog>> {
    if !cfg.supabase.is_configured() {
        warn!("Supabase storage not configured, handbooks are unavailable");
        return None;
    }
    match HandbookStorage::from_config(&cfg.supabase) {
        Ok(storage) => Some(Arc::new(storage)),
        Err(e) => {
            warn!("handbook storage unavailable: {e}");
            None
        }
    }
}

/// The default chat provider plus every other one with a key.
fn build_providers(cfg: &Config) -> anyhow::Result<ProviderChoice> {
    let default = build_provider(&cfg.provider.default, &cfg.provider).map_err(|e| {
        anyhow::anyhow!(
            "default provider '{}' cannot be used: {e}. Set its API key in config.toml or the environment.",
            cfg.provider.default
        )
    })?;

    let mut others: Vec<Arc<dyn Provider>> = Vec::new();
    for name in cfg.provider.configured() {
        if name == default.name() {
            continue;
        }
        match build_provider(name, &cfg.provider) {
            Ok(provider) => others.push(provider),
            Err(e) => warn!("skipping provider {name}: {e}"),
        }
    }
    Ok(ProviderChoice::new(default, others))
}

async fn start(cfg: Config) -> anyhow::Result<()> {
    let telegram = match &cfg.channel.telegram {
        Some(tg) if tg.enabled && !tg.bot_token.is_empty() => tg.clone(),
        _ => anyhow::bail!(
            "Telegram bot token is missing. Set TELEGRAM_TOKEN or [channel.telegram] bot_token."
        ),
    };
    let providers = build_providers(&cfg)?;
    let embedder = build_embedder(&cfg)?;

    let knowledge_store = KnowledgeStore::connect(&cfg.database, embedder.dimensions()).await?;
    let store: Arc<dyn VectorStore> = Arc::new(knowledge_store.clone());
    let handbooks = handbook_catalog(&cfg);

    let data = ReferenceData::load(&knowledge_store).await?;
    let ingestor = Ingestor::new(
        embedder.clone(),
        store.clone(),
        handbooks.clone(),
        cfg.ingest.clone(),
    );
    ingest::ensure_initialized(&ingestor, &data).await;

    let knowledge = Knowledge {
        faq: faq::FaqIndex::new(data.faq),
        lockers: schedules::LockerHours::from_rows(&data.lockers),
        serveries: schedules::ServeryHours::from_rows(&data.serveries),
        locations: data.locations,
        chains: rag::Chains::new(embedder, store, &cfg.retrieval),
        handbooks,
        routing: cfg.routing.clone(),
        default_address: cfg.bot.default_address.clone(),
    };
    info!(
        "Knowledge loaded: {} locations, {} FAQ entries",
        knowledge.locations.len(),
        knowledge.faq.len()
    );

    let interactions = InteractionLog::new(knowledge_store.pool().clone());
    let gateway = gateway::Gateway::new(
        Arc::new(TelegramChannel::new(telegram)),
        providers,
        knowledge,
        Some(interactions),
        cfg.auth.clone(),
        cfg.channel.clone(),
    );

    println!("{} is starting...", cfg.bot.name);
    Arc::new(gateway).run().await
}

async fn status(config_path: &str, cfg: &Config) {
    println!("unibot status\n");
    println!("Config: {config_path}");
    println!("Default provider: {}", cfg.provider.default);
    println!();

    for name in unibot_providers::SUPPORTED_PROVIDERS.iter().map(|s| s.name) {
        let state = match build_provider(name, &cfg.provider) {
            Ok(provider) => {
                if provider.is_available().await {
                    "available"
                } else {
                    "configured but unreachable"
                }
            }
            Err(_) => "not configured",
        };
        println!("  {name}: {state}");
    }
    println!();

    match build_embedder(cfg) {
        Ok(embedder) => {
            match KnowledgeStore::connect(&cfg.database, embedder.dimensions()).await {
                Ok(store) => match store.count().await {
                    Ok(n) => println!("  database: reachable, {n} documents"),
                    Err(e) => println!("  database: reachable, cannot count documents ({e})"),
                },
                Err(e) => println!("  database: {e}"),
            }
        }
        Err(e) => println!("  embeddings: {e}"),
    }

    let telegram = match &cfg.channel.telegram {
        Some(tg) if tg.enabled && !tg.bot_token.is_empty() => "configured",
        Some(tg) if tg.enabled => "enabled but missing bot_token",
        Some(_) => "disabled",
        None => "not configured",
    };
    println!("  telegram: {telegram}");
    println!(
        "  handbooks: {}",
        if cfg.supabase.is_configured() {
            "configured"
        } else {
            "not configured"
        }
    );
}

async fn ask(cfg: &Config, question: &str) -> anyhow::Result<()> {
    let providers = build_providers(cfg)?;
    let embedder = build_embedder(cfg)?;
    let store = KnowledgeStore::connect(&cfg.database, embedder.dimensions()).await?;
    let chains = rag::Chains::new(embedder, Arc::new(store), &cfg.retrieval);

    let answer = chains
        .general
        .invoke(providers.default_provider().as_ref(), question)
        .await?;
    println!("{}", answer.with_sources());
    Ok(())
}

async fn ingest(cfg: &Config, handbooks_only: bool, reset: bool) -> anyhow::Result<()> {
    let embedder: Arc<dyn Embedder> = build_embedder(cfg)?;
    let knowledge_store = KnowledgeStore::connect(&cfg.database, embedder.dimensions()).await?;
    let ingestor = Ingestor::new(
        embedder,
        Arc::new(knowledge_store.clone()),
        handbook_catalog(cfg),
        cfg.ingest.clone(),
    );

    let report = if handbooks_only {
        ingestor.ingest_handbooks().await?
    } else {
        let data = ReferenceData::load(&knowledge_store).await?;
        ingestor.ingest_all(&data, reset).await?
    };

    println!(
        "Ingested {} of {} documents ({} failed batches).",
        report.inserted, report.documents, report.failed_batches
    );
    Ok(())
}
