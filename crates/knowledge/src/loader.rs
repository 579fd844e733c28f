//! Loading documents from disk and splitting them into passages.

use std::path::{Path, PathBuf};

use hoprag_core::error::SearchError;
use hoprag_core::Passage;
use tracing::{debug, info};

const EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];
const SENTENCE_ENDS: [char; 10] = ['。', '！', '？', '；', '.', '!', '?', ';', '\n', '\u{2026}'];

/// How documents are cut into passages, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            chunk_overlap: 30,
        }
    }
}

/// Split `text` into chunks of at most `chunk_size` characters.
///
/// A chunk ends at the last sentence boundary in its second half when there
/// is one. Consecutive chunks share up to `chunk_overlap` characters.
pub fn split_text(text: &str, settings: ChunkSettings) -> Vec<String> {
    let chars: Vec<char> = text.trim().chars().collect();
    let size = settings.chunk_size.max(1);
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() <= size {
        return vec![chars.iter().collect()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let mut end = (start + size).min(chars.len());
        if end < chars.len() {
            let floor = start + size / 2;
            if let Some(pos) = chars[floor..end].iter().rposition(|c| SENTENCE_ENDS.contains(c)) {
                end = floor + pos + 1;
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(settings.chunk_overlap).max(start + 1);
    }
    chunks
}

/// Load a `.txt`/`.md` file, or every such file under a directory.
///
/// Each chunk is tagged with `source` (the file path) and `chunk` (its index
/// within the file).
pub fn load_path(path: &Path, settings: ChunkSettings) -> Result<Vec<Passage>, SearchError> {
    let files = collect_files(path)?;
    let mut passages = Vec::new();
    for file in &files {
        let text = std::fs::read_to_string(file).map_err(|e| SearchError::LoadFailed {
            path: file.display().to_string(),
            reason: e.to_string(),
        })?;
        let chunks = split_text(&text, settings);
        debug!(file = %file.display(), chunks = chunks.len(), "Document split");
        let source = file.display().to_string();
        passages.extend(chunks.into_iter().enumerate().map(|(i, chunk)| {
            Passage::new(chunk)
                .with_tag("source", source.clone())
                .with_tag("chunk", i as u64)
        }));
    }
    info!(files = files.len(), passages = passages.len(), "Documents loaded");
    Ok(passages)
}

fn collect_files(path: &Path) -> Result<Vec<PathBuf>, SearchError> {
    let load_err = |p: &Path, reason: String| SearchError::LoadFailed {
        path: p.display().to_string(),
        reason,
    };

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(load_err(path, "no such file or directory".into()));
    }

    let mut files = Vec::new();
    let mut pending = vec![path.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| load_err(&dir, e.to_string()))?;
        for entry in entries {
            let entry_path = entry.map_err(|e| load_err(&dir, e.to_string()))?.path();
            if entry_path.is_dir() {
                pending.push(entry_path);
            } else if has_text_extension(&entry_path) {
                files.push(entry_path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}
