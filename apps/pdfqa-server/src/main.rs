use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pdfqa_core::config::Config;
use pdfqa_rag::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "pdfqa-server", about = "Upload PDFs and ask questions about them over HTTP")]
struct Args {
    /// Overrides `server.host`.
    #[arg(long)]
    host: Option<String>,
    /// Overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let host = args.host.unwrap_or_else(|| settings.server.host.clone());
    let port = args.port.unwrap_or(settings.server.port);

    let pipeline = Arc::new(Pipeline::from_settings(settings)?);
    let documents = pipeline.documents().await.map(|d| d.len()).unwrap_or(0);
    tracing::info!(
        index_root = %pipeline.settings().index_root().display(),
        documents,
        "pipeline ready"
    );

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, pdfqa_server::router(pipeline)).await?;
    Ok(())
}
