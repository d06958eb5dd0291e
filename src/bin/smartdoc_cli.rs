//! Command-line front end running the document pipeline in-process.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use smartdoc::{
    config::Config,
    extract::SourceFormat,
    logging,
    processing::{DocumentMetadata, DocumentService},
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "smartdoc-cli",
    version = env!("CARGO_PKG_VERSION"),
    about = "Chunk, summarize, and question documents from the command line"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the chunks a file is split into
    Chunks { file: PathBuf },
    /// Summarize a file
    Summarize { file: PathBuf },
    /// Answer a question from a file
    Ask { file: PathBuf, question: String },
    /// Register every supported file below a directory and print the listing
    Inventory {
        dir: PathBuf,
        /// Only list documents whose filename contains this fragment
        #[arg(long)]
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    logging::init_file_tracing();
    let config = Config::from_env().context("invalid configuration")?;
    let service = DocumentService::initialize(&config)
        .await
        .context("failed to build document service")?;

    let output = match cli.command {
        Command::Chunks { file } => {
            let metadata = load(&service, &file).await?;
            let chunks = service.get_chunks(metadata.doc_id).await?;
            json!({ "filename": metadata.filename, "chunks": chunks })
        }
        Command::Summarize { file } => {
            let metadata = load(&service, &file).await?;
            let summary = service.get_summary(metadata.doc_id).await?;
            json!({ "filename": metadata.filename, "summary": summary })
        }
        Command::Ask { file, question } => {
            let metadata = load(&service, &file).await?;
            let answer = service.query(metadata.doc_id, &question).await?;
            json!({
                "filename": metadata.filename,
                "answer": answer.answer,
                "confidence": answer.confidence,
                "low_confidence": answer.low_confidence,
                "source_chunk": answer.source_chunk,
            })
        }
        Command::Inventory { dir, filter } => inventory(&service, &dir, filter.as_deref()).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn load(service: &DocumentService, path: &Path) -> Result<DocumentMetadata> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    service
        .upload_document(filename, bytes, None)
        .await
        .with_context(|| format!("failed to register {}", path.display()))
}

async fn inventory(service: &DocumentService, dir: &Path, filter: Option<&str>) -> Result<Value> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut skipped = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy();
        if SourceFormat::detect(&name, None).is_err() {
            continue;
        }
        if let Err(err) = load(service, entry.path()).await {
            tracing::warn!(path = %entry.path().display(), error = %err, "Skipping file");
            skipped.push(json!({
                "path": entry.path().display().to_string(),
                "error": format!("{err:#}"),
            }));
        }
    }

    let documents = match filter {
        Some(fragment) => service.find_documents(fragment).await,
        None => service.list_documents().await,
    };
    Ok(json!({ "documents": documents, "skipped": skipped }))
}
