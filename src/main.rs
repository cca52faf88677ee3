use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use course_search::{
    config::Config,
    indexing::IndexBuilder,
    models::TermDump,
    search::{SearchService, SourceHydrator},
    store::{DocumentStore, ElasticStore, InMemoryStore},
};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "course-search")]
#[command(about = "Course search index builder and query tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "COURSE_SEARCH_CONFIG")]
    config: Option<String>,

    /// Print Prometheus metrics after the command finishes
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the class index from a term dump
    Rebuild {
        /// JSON file with `classes` and `sections` arrays
        #[arg(short, long)]
        dump: PathBuf,

        /// Build against an in-memory store instead of Elasticsearch
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a search and print the result as JSON
    Search {
        #[arg(short, long)]
        term: String,

        #[arg(short, long)]
        query: String,

        #[arg(long, default_value = "0")]
        min: usize,

        #[arg(long, default_value = "10")]
        max: usize,

        /// Filter selection as a JSON object, e.g. '{"subject":["CS"]}'
        #[arg(short, long, default_value = "{}")]
        filters: String,
    },

    /// List the known subject codes
    Subjects,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config);

    if config.observability.prometheus_enabled {
        if let Err(e) = course_search::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
    }

    match cli.command {
        Commands::Rebuild { dump, dry_run } => rebuild(&config, dump, dry_run).await?,
        Commands::Search {
            term,
            query,
            min,
            max,
            filters,
        } => search(&config, &term, &query, min, max, &filters).await?,
        Commands::Subjects => subjects(&config).await?,
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    if cli.print_metrics {
        print!("{}", course_search::metrics::gather_metrics());
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("course_search={}", config.observability.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn elastic_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store = ElasticStore::new(&config.store).context("Failed to build Elasticsearch client")?;
    Ok(Arc::new(store))
}

async fn rebuild(config: &Config, dump: PathBuf, dry_run: bool) -> anyhow::Result<()> {
    let dump = TermDump::from_path(&dump)?;
    if dump.is_empty() {
        bail!("Term dump has no classes or sections, refusing to rebuild");
    }

    let store: Arc<dyn DocumentStore> = if dry_run {
        tracing::info!("Dry run: writing to an in-memory store");
        Arc::new(InMemoryStore::new())
    } else {
        elastic_store(config)?
    };

    let builder = IndexBuilder::new(store, config.store.class_index.clone());
    let report = builder.rebuild(dump).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn search(
    config: &Config,
    term: &str,
    query: &str,
    min: usize,
    max: usize,
    filters: &str,
) -> anyhow::Result<()> {
    let filters: Map<String, Value> =
        serde_json::from_str(filters).context("--filters must be a JSON object")?;

    let service = SearchService::new(elastic_store(config)?, Arc::new(SourceHydrator), &config.store);
    let output = service.search(query, term, min, max, &filters).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn subjects(config: &Config) -> anyhow::Result<()> {
    let service = SearchService::new(elastic_store(config)?, Arc::new(SourceHydrator), &config.store);

    let mut subjects: Vec<&String> = service.subjects().await?.iter().collect();
    subjects.sort();
    for subject in subjects {
        println!("{}", subject);
    }
    Ok(())
}
