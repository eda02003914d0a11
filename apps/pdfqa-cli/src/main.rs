use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use pdfqa_core::config::Config;
use pdfqa_llm::pull::{DEFAULT_PULL_MODELS, TAGS_TIMEOUT};
use pdfqa_llm::{OllamaAdmin, PullThrottle};
use pdfqa_rag::Pipeline;

const PULL_PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "pdfqa-cli", about = "Index PDFs and ask questions about them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index a PDF, or every PDF under a directory.
    Ingest { path: PathBuf },
    /// Ask a question about an indexed document.
    Ask { id: String, question: String },
    /// List indexed documents.
    List,
    /// Pull models into the local Ollama server.
    Pull { models: Vec<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    let pipeline = || Pipeline::from_settings(settings.clone()).map(Arc::new);
    match cli.command {
        Command::Ingest { path } => ingest(&pipeline()?, &path).await,
        Command::Ask { id, question } => ask(&pipeline()?, &id, &question).await,
        Command::List => {
            for id in pipeline()?.documents().await? { println!("{id}"); }
            Ok(())
        }
        Command::Pull { models } => pull(&settings.ollama.base_url, models).await,
    }
}

/// PDFs named by `path`: the file itself, or every `.pdf` below a directory, sorted.
fn collect_pdfs(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() { return Ok(vec![path.to_path_buf()]); }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry?;
        let is_pdf = entry.path().extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if entry.file_type().is_file() && is_pdf { files.push(entry.into_path()); }
    }
    files.sort();
    Ok(files)
}

async fn ingest(pipeline: &Arc<Pipeline>, path: &Path) -> anyhow::Result<()> {
    let files = collect_pdfs(path)?;
    if files.is_empty() { anyhow::bail!("no PDF files found at {}", path.display()); }
    println!("PDF Indexer\n===========");
    println!("Index root: {}", pipeline.settings().index_root().display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    let mut failures = 0usize;
    for file in &files {
        let filename = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        pb.set_message(format!("indexing {filename}"));
        let bytes = tokio::fs::read(file).await?;
        match pipeline.index_upload(&filename, bytes).await {
            Ok(report) => pb.println(format!(
                "📄 {} -> {} chunks ({}{})",
                report.id,
                report.chunks,
                if report.semantic { "semantic + lexical" } else { "lexical only" },
                if report.mirrored { ", mirrored" } else { "" },
            )),
            Err(e) => {
                failures += 1;
                pb.println(format!("❌ {filename}: {e}"));
            }
        }
    }
    pb.finish_and_clear();
    println!("\n✅ Indexed {} of {} files", files.len() - failures, files.len());
    if failures > 0 { anyhow::bail!("{failures} file(s) failed to index"); }
    Ok(())
}

async fn ask(pipeline: &Arc<Pipeline>, id: &str, question: &str) -> anyhow::Result<()> {
    match pipeline.ask(id, question).await {
        Ok(outcome) => {
            println!("{}", outcome.answer);
            println!("\n(source: {id}, retrieval: {})", outcome.retrieval_path.label());
            Ok(())
        }
        Err(failure) => {
            if let pdfqa_core::error::Error::DocumentNotFound { available, .. } = &failure.error {
                if !available.is_empty() { eprintln!("Available documents: {}", available.join(", ")); }
            }
            Err(failure.error.into())
        }
    }
}

async fn pull(base_url: &str, models: Vec<String>) -> anyhow::Result<()> {
    let admin = OllamaAdmin::new(base_url)?;
    let before = admin.list_tags(TAGS_TIMEOUT).await.map_err(|e| {
        eprintln!("Ollama is not reachable at {base_url}: {e:#}");
        e
    })?;
    println!("Ollama at {base_url} has {} model(s)", before.len());

    let models = if models.is_empty() { DEFAULT_PULL_MODELS.iter().map(|m| m.to_string()).collect() } else { models };
    for model in &models {
        println!("⬇️  Pulling {model}");
        let mut throttle = PullThrottle::new(PULL_PROGRESS_INTERVAL);
        admin.pull(model, &mut throttle, |line| println!("  {line}")).await?;
    }

    let after = admin.list_tags(TAGS_TIMEOUT).await?;
    println!("\nInstalled models:");
    for tag in after { println!("  {tag}"); }
    Ok(())
}
