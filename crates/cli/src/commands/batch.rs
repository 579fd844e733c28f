//! `hoprag batch` — Answer every question in a file.
//!
//! One question per line; blank lines are skipped. A question that fails
//! is recorded as `{"error": ..., "user_query": ...}` and the batch goes on.

use std::path::Path;

use hoprag_core::{QueryError, QueryResult};
use serde_json::Value;
use tracing::info;

use crate::render;
use crate::session::{RunOptions, Session};

pub async fn run(
    file: &Path,
    output: Option<&Path>,
    options: &RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let queries = read_queries(file)?;
    info!(count = queries.len(), file = %file.display(), "Batch loaded");

    let session = Session::open(options).await?;
    let mut records = Vec::with_capacity(queries.len());

    for (i, query) in queries.iter().enumerate() {
        eprintln!("\n处理查询 {}/{}: {query}", i + 1, queries.len());
        let outcome = session.ask(query).await;
        if output.is_none() && !options.json {
            match &outcome {
                Ok(result) => render::print_result(query, result),
                Err(e) => eprintln!("❌ 错误: {e}"),
            }
        }
        records.push(record(query, outcome)?);
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        println!("\n结果已保存到: {}", path.display());
    } else if options.json {
        render::print_json(&records)?;
    }

    Ok(())
}

/// Non-blank, trimmed lines of `path`.
fn read_queries(path: &Path) -> Result<Vec<String>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn record(
    query: &str,
    outcome: Result<QueryResult, QueryError>,
) -> Result<Value, serde_json::Error> {
    match outcome {
        Ok(result) => serde_json::to_value(result),
        Err(e) => Ok(serde_json::json!({
            "error": e.to_string(),
            "user_query": query,
        })),
    }
}
