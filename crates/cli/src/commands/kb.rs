//! `hoprag kb` — Knowledge base management.

use std::error::Error;
use std::path::Path;

use hoprag_config::AppConfig;
use hoprag_core::SimilaritySearch;
use hoprag_knowledge::{ChunkSettings, demo_passages, load_path};
use hoprag_providers::build_from_config;
use tracing::info;

use crate::render;
use crate::session::{RunOptions, load_config, open_store};

fn chunk_settings(config: &AppConfig) -> ChunkSettings {
    ChunkSettings {
        chunk_size: config.knowledge.chunk_size,
        chunk_overlap: config.knowledge.chunk_overlap,
    }
}

fn warn_if_ephemeral(config: &AppConfig) {
    if config.knowledge.backend == "memory" {
        eprintln!("  ⚠️  knowledge.backend = \"memory\": changes last only for this command");
    }
}

/// Rebuild the knowledge base from `docs_path`, or from the demo corpus.
pub async fn setup(docs_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    warn_if_ephemeral(&config);
    let router = build_from_config(&config);
    let store = open_store(&config, &router).await?;

    println!("🔧 正在设置知识库...");
    let passages = match docs_path {
        Some(path) => {
            println!("📁 从 {} 加载文档...", path.display());
            load_path(path, chunk_settings(&config))?
        }
        None => demo_passages(),
    };

    store.clear().await?;
    let added = store.add_passages(passages).await?;
    info!(added, backend = store.name(), "Knowledge base rebuilt");

    println!("📚 已添加 {added} 个文档到知识库");
    println!("✅ 知识库设置完成");
    Ok(())
}

/// Append the documents under `path`.
pub async fn add(path: &Path) -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    warn_if_ephemeral(&config);
    let router = build_from_config(&config);
    let store = open_store(&config, &router).await?;

    let passages = load_path(path, chunk_settings(&config))?;
    let added = store.add_passages(passages).await?;
    let total = store.count().await?;

    println!("📚 已添加 {added} 个文档片段 (共 {total} 个)");
    Ok(())
}

/// Run one similarity search and show the hits.
pub async fn search(query: &str, options: &RunOptions) -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    let router = build_from_config(&config);
    let store = open_store(&config, &router).await?;
    let threshold = options.threshold(&config);

    let passages = store.search(query, threshold).await?;
    if options.json {
        render::print_json(&passages)?;
    } else {
        println!("🔍 {query} (threshold {threshold})");
        print!("{}", render::format_passages(&passages));
    }
    Ok(())
}

/// Remove every passage. Refuses without `--confirm`.
pub async fn clear(confirm: bool) -> Result<(), Box<dyn Error>> {
    if !confirm {
        return Err("Refusing to clear the knowledge base without --confirm".into());
    }
    let config = load_config()?;
    let router = build_from_config(&config);
    let store = open_store(&config, &router).await?;

    let removed = store.count().await?;
    store.clear().await?;
    println!("🗑️  已清空知识库 ({removed} 个文档)");
    Ok(())
}

pub async fn stats(options: &RunOptions) -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    let router = build_from_config(&config);
    let store = open_store(&config, &router).await?;
    let count = store.count().await?;
    let knowledge = &config.knowledge;

    let scoring = if knowledge.uses_embeddings() {
        format!(
            "embeddings ({} / {})",
            knowledge.embedding_provider, knowledge.embedding_model
        )
    } else {
        "lexical (character bigrams)".to_string()
    };

    if options.json {
        render::print_json(&serde_json::json!({
            "backend": store.name(),
            "path": knowledge.path.display().to_string(),
            "documents": count,
            "max_results": knowledge.max_results,
            "scoring": scoring,
        }))?;
        return Ok(());
    }

    println!("📚 Knowledge Base");
    println!("================\n");
    println!("  Backend:      {}", store.name());
    if knowledge.backend == "file" {
        println!("  Path:         {}", knowledge.path.display());
    }
    println!("  Documents:    {count}");
    println!("  Max results:  {}", knowledge.max_results);
    println!("  Scoring:      {scoring}");
    println!(
        "  Chunking:     {} chars, {} overlap",
        knowledge.chunk_size, knowledge.chunk_overlap
    );
    Ok(())
}
