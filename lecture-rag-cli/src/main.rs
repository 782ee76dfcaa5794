//! lecture-rag CLI
//!
//! Builds and queries a retrieval index over a folder of lecture documents
//! using a local Ollama server.
//!
//! # Usage
//!
//! ```bash
//! # Index every .txt/.md file in ./lectures
//! lecture-rag index --docs lectures --index index
//!
//! # Retrieve the closest chunks for a question
//! lecture-rag query --index index --top-k 5 "what is regularization?"
//!
//! # Show what a saved index contains
//! lecture-rag inspect --index index
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lecture_rag::ollama::{OllamaEmbeddingProvider, OllamaTextGenerator};
use lecture_rag::{
    ContextPassage, CorpusIndexer, IndexStore, PlainTextExtractor, RagConfig, Retriever,
    format_context, load_documents, unique_sources,
};

#[derive(Parser)]
#[command(name = "lecture-rag")]
#[command(about = "Index lecture documents and retrieve source-attributed context")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every subcommand. Unset values use the library defaults.
#[derive(Args)]
struct Settings {
    /// Words per chunk
    #[arg(long, global = true, env = "LECTURE_RAG_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// Words shared by consecutive chunks
    #[arg(long, global = true, env = "LECTURE_RAG_CHUNK_OVERLAP")]
    chunk_overlap: Option<usize>,

    /// Embedding model served by Ollama
    #[arg(long, global = true, env = "LECTURE_RAG_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Generation model used for query translation
    #[arg(long, global = true, env = "LECTURE_RAG_GENERATION_MODEL")]
    generation_model: Option<String>,

    /// Per-call embedding timeout in seconds
    #[arg(long, global = true, env = "LECTURE_RAG_EMBED_TIMEOUT_SECS")]
    embed_timeout_secs: Option<u64>,

    /// Embedding calls kept in flight while indexing
    #[arg(long, global = true, env = "LECTURE_RAG_EMBED_CONCURRENCY")]
    embed_concurrency: Option<usize>,

    /// Ollama base URL (defaults to OLLAMA_HOST, then http://localhost:11434)
    #[arg(long, global = true)]
    ollama_host: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and save every document in a directory
    Index {
        /// Directory of .txt/.md documents
        #[arg(short, long, env = "LECTURE_RAG_DOCS")]
        docs: PathBuf,

        /// Index directory to write
        #[arg(short, long, env = "LECTURE_RAG_INDEX", default_value = "index")]
        index: PathBuf,

        /// Also write chunks_export.json for inspection
        #[arg(long)]
        export: bool,
    },

    /// Retrieve the chunks closest to a query
    Query {
        /// Index directory to read
        #[arg(short, long, env = "LECTURE_RAG_INDEX", default_value = "index")]
        index: PathBuf,

        /// Number of chunks to return
        #[arg(short = 'k', long, env = "LECTURE_RAG_TOP_K")]
        top_k: Option<usize>,

        /// Translate the query into this language before embedding
        #[arg(long, env = "LECTURE_RAG_QUERY_LANGUAGE")]
        translate_to: Option<String>,

        /// Print the source-attributed context block instead of a result list
        #[arg(long)]
        context: bool,

        /// Query text
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Show the manifest of a saved index
    Inspect {
        /// Index directory to read
        #[arg(short, long, env = "LECTURE_RAG_INDEX", default_value = "index")]
        index: PathBuf,
    },
}

impl Settings {
    fn config(
        &self,
        top_k: Option<usize>,
        query_language: Option<String>,
    ) -> lecture_rag::Result<RagConfig> {
        let mut builder = RagConfig::builder();
        if let Some(size) = self.chunk_size {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = self.chunk_overlap {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(k) = top_k {
            builder = builder.top_k(k);
        }
        if let Some(model) = &self.embedding_model {
            builder = builder.embedding_model(model);
        }
        if let Some(model) = &self.generation_model {
            builder = builder.generation_model(model);
        }
        if let Some(secs) = self.embed_timeout_secs {
            builder = builder.embed_timeout(std::time::Duration::from_secs(secs));
        }
        if let Some(workers) = self.embed_concurrency {
            builder = builder.embed_concurrency(workers);
        }
        if let Some(language) = query_language {
            builder = builder.query_language(language);
        }
        builder.build()
    }

    fn embedder(&self, model: &str) -> lecture_rag::Result<OllamaEmbeddingProvider> {
        let provider = OllamaEmbeddingProvider::new(model)?;
        Ok(match &self.ollama_host {
            Some(host) => provider.with_base_url(host),
            None => provider,
        })
    }

    fn generator(&self, model: &str) -> lecture_rag::Result<OllamaTextGenerator> {
        let generator = OllamaTextGenerator::new(model)?;
        Ok(match &self.ollama_host {
            Some(host) => generator.with_base_url(host),
            None => generator,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index { docs, index, export } => {
            let config = cli.settings.config(None, None)?;
            run_index(&cli.settings, config, docs, index, export).await
        }
        Commands::Query { index, top_k, translate_to, context, query } => {
            let config = cli.settings.config(top_k, translate_to)?;
            run_query(&cli.settings, config, index, &query.join(" "), context).await
        }
        Commands::Inspect { index } => run_inspect(index),
    }
}

async fn run_index(
    settings: &Settings,
    config: RagConfig,
    docs: PathBuf,
    index: PathBuf,
    export: bool,
) -> anyhow::Result<()> {
    let documents = load_documents(&docs, &PlainTextExtractor)
        .with_context(|| format!("failed to load documents from {}", docs.display()))?;
    if documents.is_empty() {
        bail!("no documents with text found in {}", docs.display());
    }

    let embedder = settings.embedder(&config.embedding_model)?;
    let indexer =
        CorpusIndexer::builder().config(config).embedding_provider(Arc::new(embedder)).build()?;
    let store = IndexStore::new(&index).with_export(export);
    let (_, report) = indexer.rebuild(&documents, &store).await?;

    println!(
        "Indexed {} of {} chunks from {} documents into {} ({} failed, {} dimensions)",
        report.chunks_embedded,
        report.chunks_total,
        report.documents,
        index.display(),
        report.chunks_failed(),
        report.dimensions
    );
    for failure in &report.failures {
        println!(
            "  failed: {} #{} ({})",
            failure.metadata.doc_name, failure.metadata.chunk_id, failure.message
        );
    }
    Ok(())
}

async fn run_query(
    settings: &Settings,
    config: RagConfig,
    index: PathBuf,
    query: &str,
    context: bool,
) -> anyhow::Result<()> {
    let store = IndexStore::new(&index);
    let Some(corpus) = store.load()? else {
        bail!("no index in {}, run `index` first", index.display());
    };

    if corpus.embedding_model() != config.embedding_model {
        tracing::warn!(
            index_model = corpus.embedding_model(),
            configured_model = %config.embedding_model,
            "embedding queries with the model the index was built with"
        );
    }
    let embedder = settings.embedder(corpus.embedding_model())?;

    let mut builder = Retriever::builder().embedding_provider(Arc::new(embedder));
    if config.query_language.is_some() {
        builder = builder.text_generator(Arc::new(settings.generator(&config.generation_model)?));
    }
    let retriever = builder.config(config).build()?;

    let results = retriever.retrieve(query, &corpus).await?;
    if results.is_empty() {
        println!("No relevant context found.");
        return Ok(());
    }

    if context {
        let passages: Vec<ContextPassage> = results.iter().map(ContextPassage::from).collect();
        println!("{}", format_context(&passages));
        println!();
        println!("Sources: {}", unique_sources(&passages).join(", "));
    } else {
        for result in &results {
            println!(
                "{:>2}. {} #{} (distance {:.4})",
                result.rank + 1,
                result.doc_name,
                result.chunk_id,
                result.distance
            );
        }
    }
    Ok(())
}

fn run_inspect(index: PathBuf) -> anyhow::Result<()> {
    let store = IndexStore::new(&index);
    let Some(manifest) = store.manifest()? else {
        println!("No index in {}", index.display());
        return Ok(());
    };

    println!("Index:            {}", index.display());
    println!("Format version:   {}", manifest.format_version);
    println!("Embedding model:  {}", manifest.embedding_model);
    println!("Dimensions:       {}", manifest.dimensions);
    println!("Chunks:           {}", manifest.chunk_count);
    println!("Created:          {}", manifest.created_at.to_rfc3339());
    if !store.exists() {
        println!("Warning: bundle is incomplete; rebuild with `index`");
    }
    Ok(())
}
