//! GraphCheck command-line interface.
//!
//! Ingests Python repositories into the knowledge graph and checks
//! generated scripts against it for hallucinated API usage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use graphcheck_analyzer::{HallucinationDetector, ValidatorSettings};
use graphcheck_core::{
    ConfigManager, GraphCheckConfig, GraphNode, GraphStore, HallucinationReport, IngestResult,
    NamespaceMeta, RepositoryIdentity, SymbolKind, Verdict,
};
use graphcheck_graph::{MemoryGraphStore, RepositoryIngestor, RocksDbGraphStore};
use graphcheck_parser::{FileCollectionConfig, PythonParser};

#[derive(Parser)]
#[command(name = "graphcheck", version, about = "Validate AI-generated Python against a code knowledge graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    format: OutputFormat,

    /// Override the graph database path
    #[arg(long, global = true, env = "GRAPHCHECK_DB_PATH")]
    db: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a Python repository and ingest it into the graph
    Ingest {
        /// Repository root directory
        path: PathBuf,

        /// Repository name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Number of parallel parse workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Check a Python script for hallucinated API usage
    Check {
        /// Script to validate
        script: PathBuf,

        /// Repository to validate against
        #[arg(short, long)]
        repo: String,

        /// Write the JSON report to a file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// List ingested repositories
    Repos,

    /// Summarize one repository's graph contents
    Explore {
        /// Repository name
        repo: String,
    },

    /// Show a symbol and its members by qualified name
    Lookup {
        /// Repository name
        repo: String,

        /// Fully qualified symbol name, e.g. pkg.mod.Class.method
        qualified_name: String,
    },

    /// Find symbols by simple name
    Search {
        /// Repository name
        repo: String,

        /// Simple symbol name, e.g. search
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let manager = ConfigManager::load().context("Failed to load configuration")?;
    let mut config = manager.config().clone();
    if let Some(db) = &cli.db {
        config.storage.db_path = db.clone();
    }

    match execute(&cli, &config).await {
        Ok(rendered) => {
            let hallucinated =
                matches!(&rendered, Rendered::Report(report) if report.has_hallucinations());
            print_rendered(cli.format, &rendered)?;
            if hallucinated {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graphcheck=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn open_store(config: &GraphCheckConfig) -> Result<Arc<dyn GraphStore>> {
    match config.storage.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryGraphStore::new())),
        _ => {
            let store = RocksDbGraphStore::open(&config.storage.db_path).with_context(|| {
                format!(
                    "Failed to open graph store at {}",
                    config.storage.db_path.display()
                )
            })?;
            Ok(Arc::new(store))
        }
    }
}

async fn execute(cli: &Cli, config: &GraphCheckConfig) -> Result<Rendered> {
    let store = open_store(config)?;
    match &cli.command {
        Commands::Ingest {
            path,
            name,
            workers,
        } => execute_ingest(store, config, path, name.as_deref(), *workers).await,
        Commands::Check { script, repo, save } => {
            execute_check(store, config, script, repo, save.as_deref()).await
        }
        Commands::Repos => Ok(Rendered::Repos(store.list_repositories().await?)),
        Commands::Explore { repo } => execute_explore(store, repo).await,
        Commands::Lookup {
            repo,
            qualified_name,
        } => execute_lookup(store, repo, qualified_name).await,
        Commands::Search { repo, name } => execute_search(store, repo, name).await,
    }
}

async fn execute_ingest(
    store: Arc<dyn GraphStore>,
    config: &GraphCheckConfig,
    path: &Path,
    name: Option<&str>,
    workers: Option<usize>,
) -> Result<Rendered> {
    let source = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let repo_name = match name {
        Some(n) => n.to_string(),
        None => source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                anyhow!(
                    "Cannot derive a repository name from {}; pass --name",
                    path.display()
                )
            })?,
    };

    let parser = PythonParser::new().with_concurrency(workers.unwrap_or(config.ingest.workers));
    let collection = FileCollectionConfig {
        max_file_size_bytes: config.ingest.max_file_size_bytes,
        ..FileCollectionConfig::default()
    };
    let parsed = parser.parse_directory(&source, &collection).await?;

    let identity = RepositoryIdentity::new(&repo_name, source.to_string_lossy());
    let ingestor = RepositoryIngestor::new(store);
    let result = ingestor
        .ingest(&identity, &parsed.modules, parsed.skipped)
        .await?;
    Ok(Rendered::Ingest(result))
}

async fn execute_check(
    store: Arc<dyn GraphStore>,
    config: &GraphCheckConfig,
    script: &Path,
    repo: &str,
    save: Option<&Path>,
) -> Result<Rendered> {
    let source = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read {}", script.display()))?;

    let settings = ValidatorSettings {
        max_concurrent_lookups: config.validator.max_concurrent_lookups,
        fuzzy_max_distance: config.validator.fuzzy_max_distance,
        max_suggestions: config.validator.max_suggestions,
    };
    let detector = HallucinationDetector::with_settings(store, settings);
    let report = detector.analyze(&source, repo).await?;

    if let Some(out) = save {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(out, json)
            .await
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("{} {}", "Report saved to".dimmed(), out.display());
    }
    Ok(Rendered::Report(report))
}

async fn execute_explore(store: Arc<dyn GraphStore>, repo: &str) -> Result<Rendered> {
    let meta = store
        .namespace_meta(repo)
        .await?
        .ok_or_else(|| anyhow!("Repository '{}' has not been ingested", repo))?;
    let nodes = store.namespace_nodes(repo).await?;

    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    for node in &nodes {
        *kinds.entry(node.kind.to_string()).or_default() += 1;
    }
    let mut files: Vec<String> = nodes
        .iter()
        .filter(|n| n.kind == SymbolKind::File)
        .map(|n| n.qualified_name.clone())
        .collect();
    files.sort();

    Ok(Rendered::Explore(ExploreSummary {
        repository: meta.repository,
        source_location: meta.source_location,
        ingested_at: meta.ingested_at,
        node_count: nodes.len(),
        kinds,
        files,
    }))
}

async fn execute_lookup(
    store: Arc<dyn GraphStore>,
    repo: &str,
    qualified_name: &str,
) -> Result<Rendered> {
    if store.namespace_meta(repo).await?.is_none() {
        return Err(anyhow!("Repository '{}' has not been ingested", repo));
    }
    let node = store
        .lookup(repo, qualified_name)
        .await?
        .ok_or_else(|| anyhow!("Symbol '{}' not found in '{}'", qualified_name, repo))?;
    let members = store.members_of(repo, qualified_name).await?;
    Ok(Rendered::Symbol { node, members })
}

async fn execute_search(store: Arc<dyn GraphStore>, repo: &str, name: &str) -> Result<Rendered> {
    if store.namespace_meta(repo).await?.is_none() {
        return Err(anyhow!("Repository '{}' has not been ingested", repo));
    }
    let nodes = store.find_by_name(repo, name).await?;
    Ok(Rendered::Nodes(nodes))
}

/// Repository summary assembled for `explore`.
#[derive(Serialize)]
struct ExploreSummary {
    repository: String,
    source_location: String,
    ingested_at: chrono::DateTime<chrono::Utc>,
    node_count: usize,
    kinds: BTreeMap<String, usize>,
    files: Vec<String>,
}

enum Rendered {
    Ingest(IngestResult),
    Report(HallucinationReport),
    Repos(Vec<NamespaceMeta>),
    Explore(ExploreSummary),
    Symbol {
        node: GraphNode,
        members: Vec<GraphNode>,
    },
    Nodes(Vec<GraphNode>),
}

impl Rendered {
    fn to_json(&self) -> Result<serde_json::Value> {
        let value = match self {
            Rendered::Ingest(result) => serde_json::to_value(result)?,
            Rendered::Report(report) => serde_json::to_value(report)?,
            Rendered::Repos(repos) => serde_json::to_value(repos)?,
            Rendered::Explore(summary) => serde_json::to_value(summary)?,
            Rendered::Symbol { node, members } => {
                serde_json::json!({ "symbol": node, "members": members })
            }
            Rendered::Nodes(nodes) => serde_json::to_value(nodes)?,
        };
        Ok(value)
    }
}

fn print_rendered(format: OutputFormat, rendered: &Rendered) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rendered.to_json()?)?),
        OutputFormat::Pretty => match rendered {
            Rendered::Ingest(result) => print_ingest(result),
            Rendered::Report(report) => print_report(report),
            Rendered::Repos(repos) => print_repos(repos),
            Rendered::Explore(summary) => print_explore(summary),
            Rendered::Symbol { node, members } => print_symbol(node, members),
            Rendered::Nodes(nodes) => print_nodes(nodes),
        },
    }
    Ok(())
}

fn print_ingest(result: &IngestResult) {
    println!("{}", format!("Ingested '{}'", result.repository).bold());
    println!("  files parsed:  {}", result.files_parsed);
    println!("  nodes created: {}", result.nodes_created);
    println!("  nodes updated: {}", result.nodes_updated);
    println!("  nodes deleted: {}", result.nodes_deleted);
    if result.is_zero_diff() {
        println!("  {}", "no changes since the last ingest".green());
    }
    if !result.files_skipped.is_empty() {
        let header = format!("{} file(s) skipped:", result.files_skipped.len());
        println!("  {}", header.yellow());
        for skipped in &result.files_skipped {
            println!("    {} ({})", skipped.path, skipped.reason.dimmed());
        }
    }
}

fn print_report(report: &HallucinationReport) {
    println!(
        "{}",
        format!("Validation report for '{}'", report.repository).bold()
    );
    println!();
    if report.findings.is_empty() {
        println!("  {}", "no call sites found in the script".dimmed());
    }
    for finding in &report.findings {
        let verdict = match finding.verdict {
            Verdict::Valid => "VALID".green(),
            Verdict::UnknownSymbol => "UNKNOWN_SYMBOL".red().bold(),
            Verdict::SignatureMismatch => "SIGNATURE_MISMATCH".yellow().bold(),
            Verdict::Unverifiable => "UNVERIFIABLE".dimmed(),
        };
        println!(
            "  line {:>4}  {}  {}",
            finding.line,
            verdict,
            finding.callee_text.cyan()
        );
        if let Some(reason) = &finding.reason {
            println!("            {}", reason.dimmed());
        }
        if !finding.suggestions.is_empty() {
            println!(
                "            did you mean: {}?",
                finding.suggestions.join(", ").green()
            );
        }
    }
    println!();
    println!(
        "  {} calls: {} valid, {} unknown, {} mismatched, {} unverifiable",
        report.total_calls,
        report.valid.to_string().green(),
        failure_count(report.unknown_symbol),
        failure_count(report.signature_mismatch),
        report.unverifiable.to_string().dimmed(),
    );
    println!("  severity score: {:.2}", report.severity_score);
    if report.has_hallucinations() {
        println!("  {}", "hallucinations detected".red().bold());
    } else {
        println!("  {}", "no hallucinations detected".green());
    }
}

fn failure_count(count: usize) -> colored::ColoredString {
    if count > 0 {
        count.to_string().red().bold()
    } else {
        count.to_string().green()
    }
}

fn print_repos(repos: &[NamespaceMeta]) {
    if repos.is_empty() {
        println!("{}", "No repositories ingested yet.".dimmed());
        return;
    }
    for meta in repos {
        println!(
            "{}  {} files, {} nodes, ingested {}",
            meta.repository.cyan().bold(),
            meta.file_count,
            meta.node_count,
            meta.ingested_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}

fn print_explore(summary: &ExploreSummary) {
    println!("{}", summary.repository.cyan().bold());
    println!("  source:   {}", summary.source_location);
    println!(
        "  ingested: {}",
        summary.ingested_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  nodes:    {}", summary.node_count);
    for (kind, count) in &summary.kinds {
        println!("    {:<10} {}", kind, count);
    }
    if !summary.files.is_empty() {
        println!("  files:");
        for file in &summary.files {
            println!("    {}", file);
        }
    }
}

fn print_symbol(node: &GraphNode, members: &[GraphNode]) {
    println!(
        "{} {}",
        format!("[{}]", node.kind).blue(),
        node.qualified_name.cyan().bold()
    );
    if let (Some(file), Some(line)) = (&node.file_path, node.line) {
        println!("  defined at {}:{}", file, line);
    }
    if let Some(signature) = &node.signature {
        println!("  {}", signature.render(&node.name));
    }
    if !node.bases.is_empty() {
        println!("  bases: {}", node.bases.join(", "));
    }
    if let Some(annotation) = &node.type_annotation {
        println!("  type: {}", annotation);
    }
    if !members.is_empty() {
        println!("  members:");
        for member in members {
            let badge = format!("[{}]", member.kind);
            match &member.signature {
                Some(signature) => {
                    println!("    {} {}", badge.blue(), signature.render(&member.name))
                }
                None => println!("    {} {}", badge.blue(), member.name),
            }
        }
    }
}

fn print_nodes(nodes: &[GraphNode]) {
    if nodes.is_empty() {
        println!("{}", "No matches found.".dimmed());
        return;
    }
    for node in nodes {
        let location = match (&node.file_path, node.line) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line),
            _ => String::new(),
        };
        println!(
            "{} {}{}",
            format!("[{}]", node.kind).blue(),
            node.qualified_name,
            location.dimmed()
        );
    }
}
