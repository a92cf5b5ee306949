//! Ontograph CLI
//!
//! A command-line interface for aggregating ontology documents into one graph
//! and searching it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ontograph_core::{DocumentId, SearchParams, DEFAULT_HOPS, DEFAULT_K};
use ontograph_service::{
    IngestService, RebuildDebouncer, RemoteIndex, SearchService, ServiceConfig,
};
use ontograph_store::{DirStore, DocumentStore, NewDocument, WritableStore};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Ontograph - one knowledge graph out of many ontology documents
#[derive(Parser)]
#[command(name = "ontograph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Document directory (defaults to ~/.ontograph/documents)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full aggregated graph
    Graph,

    /// Search the graph
    Search {
        /// Search query (empty prints the full graph)
        query: String,

        /// Number of documents to rank
        #[arg(short, default_value_t = DEFAULT_K)]
        k: usize,

        /// Traversal depth around the matched nodes
        #[arg(long, default_value_t = DEFAULT_HOPS)]
        hops: usize,
    },

    /// Add an ontology document from a JSON file
    Add {
        /// Path to the JSON file
        path: PathBuf,

        /// Where the document came from
        #[arg(short, long, default_value = "cli")]
        source: String,
    },

    /// Remove a document
    Remove {
        /// Document ID
        id: DocumentId,
    },

    /// List stored documents
    List,

    /// Show a document by ID
    Show {
        /// Document ID
        id: DocumentId,
    },

    /// Rank documents locally and print them with their ontologies
    Rank {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(short, default_value_t = DEFAULT_K)]
        k: usize,
    },

    /// Rebuild the remote index now
    Rebuild,

    /// Show local and remote index status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = ServiceConfig::from_env();
    let data_dir = match cli.data_dir.or_else(|| config.data_dir.clone()) {
        Some(path) => path,
        None => default_data_dir()?,
    };

    let mut store = DirStore::open(&data_dir)
        .with_context(|| format!("Failed to open document directory {}", data_dir.display()))?;
    info!("Using documents at: {}", data_dir.display());

    let remote = Arc::new(RemoteIndex::from_config(&config.remote));
    let debouncer = RebuildDebouncer::new(Arc::clone(&remote), config.quiet_period)?;
    store.set_listener(Arc::new(debouncer.clone()));
    let store = Arc::new(store);

    match cli.command {
        Commands::Graph => cmd_graph(store)?,
        Commands::Search { query, k, hops } => {
            let search = SearchService::new(store)
                .with_remote(Arc::clone(&remote), config.prefer_remote);
            cmd_search(search, query, k, hops).await?;
        }
        Commands::Add { path, source } => {
            let ingest = IngestService::new(store).with_remote(Arc::clone(&remote));
            cmd_add(ingest, &path, source).await?;
        }
        Commands::Remove { id } => {
            IngestService::new(store).delete(id)?;
            println!("✓ Removed document {}", id);
        }
        Commands::List => cmd_list(store)?,
        Commands::Show { id } => cmd_show(store, id)?,
        Commands::Rank { query, k } => {
            let hits = SearchService::new(store).rank(&query, k)?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Commands::Rebuild => cmd_rebuild(&remote).await?,
        Commands::Status => cmd_status(store, &remote, &data_dir).await?,
    }

    // Let a scheduled index rebuild run before the process exits.
    if remote.is_configured() && debouncer.is_pending() {
        info!("Waiting {:?} to rebuild the remote index", debouncer.quiet_period());
        debouncer.wait_idle().await;
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = builder.with_env_filter(EnvFilter::from_default_env()).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn default_data_dir() -> Result<PathBuf> {
    let mut path = dirs::home_dir().context("Could not find home directory")?;
    path.push(".ontograph");
    path.push("documents");
    Ok(path)
}

fn cmd_graph(store: Arc<DirStore>) -> Result<()> {
    let graph = SearchService::new(store).graph()?;
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}

async fn cmd_search(
    search: SearchService<DirStore>,
    query: String,
    k: usize,
    hops: usize,
) -> Result<()> {
    let params = SearchParams::new(query).with_k(k).with_hops(hops);
    let response = search.search(&params).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn cmd_add(ingest: IngestService<DirStore>, path: &Path, source: String) -> Result<()> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let document = NewDocument::from_slice(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?
        .with_filename(filename)
        .with_source(source);

    let report = ingest.ingest(document).await?;
    eprintln!("✓ Added document {}", report.document.id);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_list(store: Arc<DirStore>) -> Result<()> {
    let records = store.records()?;

    if records.is_empty() {
        println!("No documents yet. Add one with: ontograph add <file.json>");
        return Ok(());
    }

    println!("Documents ({}):\n", records.len());

    for record in records {
        let document = record.to_document();
        let filename = if record.filename.is_empty() {
            "(unnamed)"
        } else {
            record.filename.as_str()
        };
        println!("• {} [{}]", filename, record.id);
        println!(
            "  {} nodes, {} relations, added {}",
            document.raw_nodes().len(),
            document.raw_relations().len(),
            record.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

fn cmd_show(store: Arc<DirStore>, id: DocumentId) -> Result<()> {
    let document = store
        .get(id)?
        .with_context(|| format!("Document {} not found", id))?;
    println!("{}", serde_json::to_string_pretty(&document.raw)?);
    Ok(())
}

async fn cmd_rebuild(remote: &RemoteIndex) -> Result<()> {
    if !remote.is_configured() {
        anyhow::bail!("Remote index is not configured (set REMOTE_INDEX_URL)");
    }
    let ack = remote.try_build().await.context("Remote index rebuild failed")?;
    println!("{}", serde_json::to_string_pretty(&ack)?);
    Ok(())
}

async fn cmd_status(store: Arc<DirStore>, remote: &RemoteIndex, data_dir: &Path) -> Result<()> {
    let documents = store.list()?;
    let remote_status = remote.status().await;
    let status = json!({
        "documents": documents.len(),
        "data_dir": data_dir.display().to_string(),
        "remote": {
            "configured": remote.is_configured(),
            "url": remote.resolved_base(),
            "status": remote_status,
        },
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
