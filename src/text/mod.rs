//! Text processing (C7): cleaning, document classification, overlap chunking, and entity
//! and relation extraction. Consumed by C10 after C8 has produced raw document text.

pub mod entities;
pub mod relations;

pub use entities::{are_related, extract_entities, is_valid_cas, ExtractedEntity};
pub use relations::{extract_relations, ExtractedRelation};

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DocumentType {
    Safety,
    Engineering,
    Regulatory,
    Research,
    General,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DocumentType::Safety => "safety",
            DocumentType::Engineering => "engineering",
            DocumentType::Regulatory => "regulatory",
            DocumentType::Research => "research",
            DocumentType::General => "general",
        };
        write!(f, "{}", label)
    }
}

const CLASSIFICATION_KEYWORDS: &[(DocumentType, &[&str])] = &[
    (DocumentType::Safety, &["msds", "sds", "safety data sheet", "ppe", "hazard", "first aid", "exposure limit"]),
    (DocumentType::Engineering, &["specification", "tolerance", "material", "drawing", "design", "pressure rating", "schematic"]),
    (DocumentType::Regulatory, &["regulation", "compliance", "osha", "epa", "cfr", "permit", "statute"]),
    (DocumentType::Research, &["abstract", "hypothesis", "experiment", "methodology", "citation", "study"]),
];

/// Collapses runs of whitespace, strips control characters, and trims. Does not alter case
/// or punctuation — downstream extraction relies on original casing.
pub fn clean_text(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut last_was_space = false;
    for ch in raw.chars() {
        if ch.is_control() && ch != '\n' {
            continue;
        }
        let normalized = if ch.is_whitespace() { ' ' } else { ch };
        if normalized == ' ' {
            if !last_was_space {
                cleaned.push(' ');
            }
            last_was_space = true;
        } else {
            cleaned.push(normalized);
            last_was_space = false;
        }
    }
    cleaned.trim().to_string()
}

/// Classifies a document into one of the five spec §4.7 categories by keyword vote: each
/// category's keyword occurrences are tallied (case-insensitive) and the highest count wins,
/// with `General` as the fallback when every category scores zero.
pub fn classify_document(text: &str) -> DocumentType {
    let lower = text.to_lowercase();
    let mut scores: HashMap<DocumentType, usize> = HashMap::new();

    for (doc_type, keywords) in CLASSIFICATION_KEYWORDS {
        let count: usize = keywords.iter().map(|k| lower.matches(k).count()).sum();
        if count > 0 {
            scores.insert(*doc_type, count);
        }
    }

    scores
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(doc_type, _)| doc_type)
        .unwrap_or(DocumentType::General)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Chunks `text` into overlapping windows (spec §4.7/§8): chunk size and overlap are
/// caller-supplied (defaults 1000/200 live in `TextConfig`). A string of length `L` with
/// `chunk_size` 1000 and `overlap` 200 yields `ceil((L - 200) / 800)` chunks for `L > 1000`
/// (equivalently for any `L` greater than `chunk_size`), else a single chunk covering the
/// whole string.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    let len = text.chars().count();
    if len == 0 {
        return Vec::new();
    }
    if len <= chunk_size {
        return vec![TextChunk { index: 0, text: text.to_string(), start: 0, end: len }];
    }

    let chars: Vec<char> = text.chars().collect();
    let stride = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    while start < len {
        let end = (start + chunk_size).min(len);
        chunks.push(TextChunk {
            index,
            text: chars[start..end].iter().collect(),
            start,
            end,
        });
        if end == len {
            break;
        }
        start += stride;
        index += 1;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace_and_control_chars() {
        let cleaned = clean_text("  Sulfuric\t\tacid\x07  is   corrosive.  ");
        assert_eq!(cleaned, "Sulfuric acid is corrosive.");
    }

    #[test]
    fn classify_document_picks_highest_scoring_category() {
        let text = "This safety data sheet lists PPE requirements and hazard exposure limits.";
        assert_eq!(classify_document(text), DocumentType::Safety);
    }

    #[test]
    fn classify_document_falls_back_to_general() {
        let text = "The quick brown fox jumps over the lazy dog.";
        assert_eq!(classify_document(text), DocumentType::General);
    }

    #[test]
    fn chunk_short_text_yields_one_chunk() {
        let text = "a".repeat(500);
        let chunks = chunk_text(&text, 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.len(), 500);
    }

    #[test]
    fn chunk_count_matches_spec_formula() {
        let length = 2600usize;
        let text = "a".repeat(length);
        let chunks = chunk_text(&text, 1000, 200);
        let expected = ((length as f64 - 200.0) / 800.0).ceil() as usize;
        assert_eq!(chunks.len(), expected);
    }

    #[test]
    fn chunks_overlap_by_configured_amount() {
        let text = "a".repeat(2600);
        let chunks = chunk_text(&text, 1000, 200);
        for window in chunks.windows(2) {
            assert_eq!(window[0].end - window[1].start, 200);
        }
    }
}
