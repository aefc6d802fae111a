//! Document extraction (C8): dispatches by file suffix to a format-specific reader and
//! normalizes the result into a `DocumentRecord`. Never propagates a read/parse failure to
//! the caller — a failed extraction still produces a record, with the failure folded into
//! its content and metadata, so that downstream stages (classification, chunking) always
//! have something to operate on.

mod docx;
mod pdf;
mod tabular;

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::text::extract_entities;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub file_path: String,
    pub size: u64,
    pub extension: String,
    pub content_hash: String,
    pub word_count: usize,
    pub character_count: usize,
    pub extracted_metadata: HashMap<String, String>,
    pub key_topics: Vec<String>,
    pub entities: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source_path: String,
    pub doc_type: String,
    pub upload_date: DateTime<Utc>,
    pub tags: Vec<String>,
    pub metadata: DocumentMetadata,
}

/// MD5 content hash of `content`, hex-encoded. Used both as the basis of `DocumentRecord::id`
/// and as `metadata.content_hash`, so that re-extracting byte-identical content always
/// produces the same document id (spec §4.10 idempotence).
fn content_hash(content: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The first three sentence-like spans of `content`, split on `.`, `!`, `?` followed by
/// whitespace or end of string.
fn summarize(content: &str) -> String {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = content.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'!' | b'?') {
            let end = i + 1;
            let candidate = content[start..end].trim();
            if !candidate.is_empty() {
                sentences.push(candidate.to_string());
            }
            start = end;
            if sentences.len() == 3 {
                break;
            }
        }
    }
    if sentences.len() < 3 && start < content.len() {
        let rest = content[start..].trim();
        if !rest.is_empty() && sentences.len() < 3 {
            sentences.push(rest.to_string());
        }
    }
    sentences.join(" ")
}

fn key_topics_and_entities(content: &str) -> (Vec<String>, Vec<String>) {
    let found = extract_entities(content);
    let mut entities: Vec<String> = found.iter().map(|e| e.text.clone()).collect();
    entities.sort();
    entities.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

    let mut key_topics: Vec<String> = found
        .iter()
        .filter(|e| e.entity_type == "CHEMICAL" || e.entity_type == "HAZARD" || e.entity_type == "MOLECULAR_FORMULA")
        .map(|e| e.text.clone())
        .collect();
    key_topics.sort();
    key_topics.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    key_topics.truncate(10);

    (key_topics, entities)
}

fn build_record(
    source_path: &Path,
    title: String,
    content: String,
    extension: String,
    size: u64,
    extracted_metadata: HashMap<String, String>,
    doc_type: &str,
) -> DocumentRecord {
    let hash = content_hash(&content);
    let (key_topics, entities) = key_topics_and_entities(&content);
    let word_count = content.split_whitespace().count();
    let character_count = content.chars().count();

    DocumentRecord {
        id: hash.clone(),
        title,
        content,
        source_path: source_path.to_string_lossy().into_owned(),
        doc_type: doc_type.to_string(),
        upload_date: Utc::now(),
        tags: Vec::new(),
        metadata: DocumentMetadata {
            file_path: source_path.to_string_lossy().into_owned(),
            size,
            extension,
            content_hash: hash,
            word_count,
            character_count,
            extracted_metadata,
            key_topics,
            entities,
            summary: String::new(),
        },
    }
}

/// Reads and normalizes the document at `path`. Dispatches by extension; on any
/// read/parse failure returns a record whose content and metadata describe the failure
/// rather than propagating an error, per spec §4.8.
pub fn extract_document(path: &Path) -> DocumentRecord {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();

    let result = match extension.as_str() {
        "pdf" => pdf::extract(path),
        "docx" => docx::extract(path),
        "txt" => read_text(path),
        "json" => tabular::extract_json(path),
        "csv" => tabular::extract_csv(path),
        other => Err(ExtractionError::UnsupportedFormat(other.to_string())),
    };

    match result {
        Ok((content, extracted_metadata)) => {
            let mut record = build_record(path, title, content, extension, size, extracted_metadata, "document");
            record.metadata.summary = summarize(&record.content);
            record
        }
        Err(err) => {
            let content = format!("[extraction failed: {}]", err);
            let mut record = build_record(path, title, content, extension, size, HashMap::new(), "error");
            record.metadata.summary = record.content.clone();
            record
        }
    }
}

fn read_text(path: &Path) -> Result<(String, HashMap<String, String>), ExtractionError> {
    let content = std::fs::read_to_string(path).map_err(|source| ExtractionError::ReadFailed {
        path: path.to_string_lossy().into_owned(),
        source,
    })?;
    Ok((content, HashMap::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn extracts_plain_text_with_content_hash_id() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "Sulfuric acid is corrosive. It reacts with water. Handle with care.").unwrap();
        let record = extract_document(file.path());
        assert_eq!(record.doc_type, "document");
        assert_eq!(record.id, record.metadata.content_hash);
        assert!(record.metadata.word_count > 0);
    }

    #[test]
    fn unsupported_extension_yields_error_record_not_panic() {
        let mut file = NamedTempFile::with_suffix(".xyz").unwrap();
        write!(file, "irrelevant").unwrap();
        let record = extract_document(file.path());
        assert_eq!(record.doc_type, "error");
        assert!(record.content.contains("extraction failed"));
    }

    #[test]
    fn identical_content_yields_identical_id() {
        let mut a = NamedTempFile::with_suffix(".txt").unwrap();
        let mut b = NamedTempFile::with_suffix(".txt").unwrap();
        write!(a, "Same content.").unwrap();
        write!(b, "Same content.").unwrap();
        let ra = extract_document(a.path());
        let rb = extract_document(b.path());
        assert_eq!(ra.id, rb.id);
    }

    #[test]
    fn summary_takes_first_three_sentences() {
        let summary = summarize("One. Two. Three. Four.");
        assert_eq!(summary, "One. Two. Three.");
    }
}
