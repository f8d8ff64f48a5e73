use std::{
    io::BufRead,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::Parser;
use common::{
    document::Document,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use retrieval_pipeline::{InMemoryRetriever, OpenAiGeneration, WelfareRagService};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Ask one welfare-policy question against a JSONL document store.
#[derive(Debug, Parser)]
#[command(name = "welfare-rag", about = "Elderly welfare policy QA over embedded documents")]
struct Args {
    /// The question to answer.
    question: String,

    /// User profile region, e.g. "경상북도" or "경북".
    #[arg(long)]
    region: Option<String>,

    /// JSONL file of documents: one {"content", "metadata"} per line.
    #[arg(long)]
    documents: PathBuf,

    /// Seed for the region-sampling fallback; omit for entropy.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = Args::parse();

    let mut config = get_config()?;
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }

    let embedder = Arc::new(EmbeddingProvider::from_config(&config));
    info!(backend = embedder.backend_label(), "embedding provider ready");

    let documents = load_documents(&args.documents)?;
    info!(count = documents.len(), "documents loaded");

    let mut entries = Vec::with_capacity(documents.len());
    for document in documents {
        let embedding = embedder.embed(&document.content).await?;
        entries.push((document, embedding));
    }
    let retriever = Arc::new(InMemoryRetriever::new(entries));

    let generation = match &config.openai_api_key {
        Some(key) => {
            let client = async_openai::Client::with_config(
                async_openai::config::OpenAIConfig::new()
                    .with_api_key(key)
                    .with_api_base(&config.openai_base_url),
            );
            Some(Arc::new(OpenAiGeneration::new(
                client,
                config.chat_model.clone(),
                config.temperature,
                config.max_tokens,
                Duration::from_secs(config.request_timeout_secs),
                config.max_retries,
            )) as Arc<dyn retrieval_pipeline::GenerationClient>)
        }
        None => {
            warn!("no API key configured, template answers only");
            None
        }
    };

    let service = WelfareRagService::new(retriever, embedder, generation, &config);
    let response = service.answer(&args.question, args.region.as_deref()).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn load_documents(path: &Path) -> Result<Vec<Document>, anyhow::Error> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut documents = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document: Document = serde_json::from_str(&line)
            .map_err(|e| anyhow::anyhow!("line {}: {e}", line_no + 1))?;
        documents.push(document);
    }
    Ok(documents)
}
