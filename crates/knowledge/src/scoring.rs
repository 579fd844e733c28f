//! Similarity scoring and ranking.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity over embeddings
//! - Lexical similarity over character bigrams, which needs no tokenizer
//!   and so works the same for Chinese and English text

use std::collections::HashSet;

use hoprag_core::Passage;
use crate::entry::KnowledgeEntry;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Share of the query's distinct character bigrams that occur in `content`.
///
/// Case, whitespace and punctuation are ignored. A one-character query
/// scores 1.0 if that character occurs at all. Returns a value in [0, 1].
pub fn lexical_similarity(query: &str, content: &str) -> f32 {
    let query = normalize(query);
    let content = normalize(content);

    if query.is_empty() || content.is_empty() {
        return 0.0;
    }

    if query.len() == 1 {
        return if content.contains(&query[0]) { 1.0 } else { 0.0 };
    }

    let wanted = bigrams(&query);
    let present = bigrams(&content);
    let hits = wanted.iter().filter(|g| present.contains(g)).count();
    hits as f32 / wanted.len() as f32
}

fn normalize(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn bigrams(chars: &[char]) -> HashSet<(char, char)> {
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Score every entry, keep those at or above `threshold`, best first.
///
/// Entries with an embedding are scored by cosine similarity when a query
/// embedding is given; all others fall back to lexical similarity. Ties
/// keep insertion order.
pub fn rank_entries(
    entries: &[KnowledgeEntry],
    query: &str,
    query_embedding: Option<&[f32]>,
    threshold: f32,
    limit: usize,
) -> Vec<Passage> {
    let mut scored: Vec<(f32, &KnowledgeEntry)> = entries
        .iter()
        .filter_map(|entry| {
            let score = match (query_embedding, entry.embedding.as_deref()) {
                (Some(q), Some(e)) => cosine_similarity(q, e),
                _ => lexical_similarity(query, &entry.content),
            };
            (score >= threshold).then_some((score, entry))
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
        .into_iter()
        .map(|(score, entry)| entry.to_passage(score))
        .collect()
}
