//! Corpus loading from JSON Lines.
//!
//! Each non-blank line is one chunk record:
//! `{"id": "...", "text": "...", "source": "...", "page": 3}`.
//! Only `text` is required. Records without an id get `<source>:<line>`.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Chunk;

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    id: Option<String>,
    text: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

pub fn load_jsonl(path: &Path) -> Result<Vec<Chunk>> {
    let file = File::open(path)?;
    let chunks = read_jsonl(file)?;
    tracing::info!(path = %path.display(), chunks = chunks.len(), "loaded corpus");
    Ok(chunks)
}

pub fn read_jsonl<R: Read>(reader: R) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for (line_no, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let record: ChunkRecord = serde_json::from_str(&line)
            .map_err(|e| Error::InvalidParameter(format!("corpus line {}: {}", line_no + 1, e)))?;
        let source = record.source.unwrap_or_else(|| "unknown".to_string());
        let sequence = chunks.len();
        let id = record.id.unwrap_or_else(|| format!("{}:{}", source, line_no + 1));
        chunks.push(Chunk { id, text: record.text, source, page: record.page, sequence });
    }
    Ok(chunks)
}
