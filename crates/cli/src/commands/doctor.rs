//! `hoprag doctor` — Diagnose system health.

use hoprag_config::AppConfig;
use hoprag_core::SimilaritySearch;
use hoprag_providers::{build_from_config, embedding_provider};

use crate::session::{has_usable_key, open_store};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 HopRAG Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_path();
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                config
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                println!("\n  ⚠️  1 issue(s) found. Fix the config and re-run.");
                return Ok(());
            }
        }
    } else {
        println!("  ⚠️  No config file — run `hoprag onboard` (using defaults)");
        issues += 1;
        AppConfig::load()?
    };

    // Check API key
    if has_usable_key(&config) {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key — set DEEPSEEK_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    // Check provider reachability
    let router = build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ⚠️  Provider '{}' answered but reported unhealthy", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        },
        None => {
            println!("  ❌ Default provider '{}' not configured", config.default_provider);
            issues += 1;
        }
    }

    // Check embeddings
    if config.knowledge.uses_embeddings() {
        match embedding_provider(&config, &router) {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!(
                    "  ✅ Embedding provider '{}' reachable",
                    config.knowledge.embedding_provider
                ),
                _ => {
                    println!(
                        "  ⚠️  Embedding provider '{}' unreachable — searches will fail until it is back",
                        config.knowledge.embedding_provider
                    );
                    issues += 1;
                }
            },
            None => {
                println!(
                    "  ❌ Embedding provider '{}' not configured",
                    config.knowledge.embedding_provider
                );
                issues += 1;
            }
        }
    } else {
        println!("  ✅ Lexical scoring (no embedding provider)");
    }

    // Check knowledge base
    match open_store(&config, &router).await {
        Ok(store) => match store.count().await {
            Ok(0) => {
                println!("  ⚠️  Knowledge base is empty — run `hoprag kb setup`");
                issues += 1;
            }
            Ok(n) => println!("  ✅ Knowledge base has {n} passages ({})", store.name()),
            Err(e) => {
                println!("  ❌ Knowledge base unreadable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Knowledge base could not be opened: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
