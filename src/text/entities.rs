//! Entity extraction (spec §4.7): combines a statistical-tagger stand-in, regex pattern
//! matchers, and keyword dictionaries, deduplicating by `(lowercased text, start, end)`.
//!
//! Per spec §9 design note (b), the statistical tagger is replaced with a finite-state
//! tokenizer returning the same span-and-confidence shape, since no NLP model is in scope
//! here (spec §1 excludes "the embedding model, LLM" as external collaborators).

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEntity {
    pub text: String,
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

lazy_static! {
    static ref FORMULA_PATTERN: Regex = Regex::new(r"\b[A-Z][a-z]?\d*(?:\([A-Z][a-z]?\d*\)\d*|[A-Z][a-z]?\d*)*\d*\b").unwrap();
    static ref CAS_PATTERN: Regex = Regex::new(r"\b\d{1,7}-\d{2}-\d\b").unwrap();
    static ref CHEMICAL_NAME_SUFFIX: Regex = Regex::new(
        r"(?i)\b[A-Za-z]+(acid|hydroxide|chloride|sulfate|oxide|nitrate|carbonate|bromide|fluoride|sulfide|acetate|peroxide)\b"
    ).unwrap();
}

const HAZARD_KEYWORDS: &[&str] = &["corrosive", "toxic", "flammable", "reactive", "environmental"];
const PROPERTY_KEYWORDS: &[(&str, &str)] = &[
    ("physical_state", "solid"), ("physical_state", "liquid"), ("physical_state", "gas"), ("physical_state", "vapor"),
    ("color", "colorless"), ("color", "yellow"), ("color", "clear"),
    ("odor", "odor"), ("odor", "odorless"), ("odor", "pungent"),
    ("solubility", "soluble"), ("solubility", "insoluble"), ("solubility", "miscible"),
    ("density", "density"), ("density", "dense"),
    ("temperature", "temperature"), ("temperature", "degrees"),
];
const CONTAINER_KEYWORDS: &[&str] = &["glass", "plastic", "steel", "drum", "tank", "cylinder", "bottle", "container"];

/// A simple finite-state tagger standing in for a statistical NER model: consecutive
/// Title-Case words form a generic entity span, confidence fixed at 0.8 per spec §4.7.
fn statistical_entities(text: &str) -> Vec<ExtractedEntity> {
    let mut entities = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < text.len() {
        if !bytes[i].is_ascii_alphabetic() || !bytes[i].is_ascii_uppercase() {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        loop {
            let word_end = text[end..]
                .find(|c: char| c.is_whitespace() || ".,;:()".contains(c))
                .map(|offset| end + offset)
                .unwrap_or(text.len());
            end = word_end;
            // Peek ahead across exactly one whitespace run to chain multi-word names.
            let mut next = end;
            while next < text.len() && text.as_bytes()[next] == b' ' {
                next += 1;
            }
            if next < text.len() && text.as_bytes()[next].is_ascii_uppercase() {
                end = next;
                continue;
            }
            break;
        }
        if end > start + 1 {
            entities.push(ExtractedEntity {
                text: text[start..end].trim_end().to_string(),
                entity_type: "GENERIC".to_string(),
                start,
                end: start + text[start..end].trim_end().len(),
                confidence: 0.8,
            });
        }
        i = end.max(start + 1);
    }
    entities
}

fn regex_entities(text: &str) -> Vec<ExtractedEntity> {
    let mut entities = Vec::new();

    for m in CAS_PATTERN.find_iter(text) {
        entities.push(ExtractedEntity {
            text: m.as_str().to_string(),
            entity_type: "CAS_NUMBER".to_string(),
            start: m.start(),
            end: m.end(),
            confidence: 0.9,
        });
    }

    for m in CHEMICAL_NAME_SUFFIX.find_iter(text) {
        entities.push(ExtractedEntity {
            text: m.as_str().to_string(),
            entity_type: "CHEMICAL".to_string(),
            start: m.start(),
            end: m.end(),
            confidence: 0.9,
        });
    }

    for m in FORMULA_PATTERN.find_iter(text) {
        // A bare element-multiplicity token (e.g. "H2SO4") only counts once it has at
        // least one digit, otherwise every capitalized word would match the grammar.
        if m.as_str().chars().any(|c| c.is_ascii_digit()) {
            entities.push(ExtractedEntity {
                text: m.as_str().to_string(),
                entity_type: "MOLECULAR_FORMULA".to_string(),
                start: m.start(),
                end: m.end(),
                confidence: 0.9,
            });
        }
    }

    entities
}

fn keyword_entities(text: &str) -> Vec<ExtractedEntity> {
    let mut entities = Vec::new();
    let lower = text.to_lowercase();

    for keyword in HAZARD_KEYWORDS {
        for (start, _) in lower.match_indices(keyword) {
            entities.push(ExtractedEntity {
                text: text[start..start + keyword.len()].to_string(),
                entity_type: "HAZARD".to_string(),
                start,
                end: start + keyword.len(),
                confidence: 0.85,
            });
        }
    }

    for (category, keyword) in PROPERTY_KEYWORDS {
        for (start, _) in lower.match_indices(keyword) {
            entities.push(ExtractedEntity {
                text: text[start..start + keyword.len()].to_string(),
                entity_type: format!("PROPERTY:{}", category),
                start,
                end: start + keyword.len(),
                confidence: 0.80,
            });
        }
    }

    for keyword in CONTAINER_KEYWORDS {
        for (start, _) in lower.match_indices(keyword) {
            entities.push(ExtractedEntity {
                text: text[start..start + keyword.len()].to_string(),
                entity_type: "CONTAINER".to_string(),
                start,
                end: start + keyword.len(),
                confidence: 0.80,
            });
        }
    }

    entities
}

/// Runs all three extraction sources and deduplicates by `(lowercased text, start, end)`
/// (spec §4.7 and §8: "Two entities with identical start position, end position, and
/// lowercased text are collapsed to one").
pub fn extract_entities(text: &str) -> Vec<ExtractedEntity> {
    let mut all = Vec::new();
    all.extend(statistical_entities(text));
    all.extend(regex_entities(text));
    all.extend(keyword_entities(text));

    let mut seen: HashSet<(String, usize, usize)> = HashSet::new();
    let mut deduped = Vec::new();
    for entity in all {
        let key = (entity.text.to_lowercase(), entity.start, entity.end);
        if seen.insert(key) {
            deduped.push(entity);
        }
    }
    deduped.sort_by_key(|e| e.start);
    deduped
}

/// Two entities are "related" iff their start positions lie within 100 characters (spec
/// §4.7), used when attaching a hazard/property entity to a chemical.
pub fn are_related(a: &ExtractedEntity, b: &ExtractedEntity) -> bool {
    (a.start as i64 - b.start as i64).abs() <= 100
}

/// Whether `text` matches the CAS registry number pattern (spec §4.10 step 6 validation,
/// spec §8 boundary case: `7664-93-9` valid, `7664-93`/`7664-93-99` invalid).
pub fn is_valid_cas(text: &str) -> bool {
    CAS_PATTERN.is_match(text) && CAS_PATTERN.find(text).map(|m| m.as_str() == text).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cas_numbers() {
        let entities = extract_entities("The CAS number is 7664-93-9 for this substance.");
        assert!(entities.iter().any(|e| e.entity_type == "CAS_NUMBER" && e.text == "7664-93-9"));
    }

    #[test]
    fn extracts_hazard_keywords() {
        let entities = extract_entities("Sulfuric acid is corrosive and is stored in glass containers.");
        assert!(entities.iter().any(|e| e.entity_type == "HAZARD" && e.text.eq_ignore_ascii_case("corrosive")));
        assert!(entities.iter().any(|e| e.entity_type == "CONTAINER" && e.text.eq_ignore_ascii_case("glass")));
    }

    #[test]
    fn extracts_chemical_name_by_suffix() {
        let entities = extract_entities("Sulfuric acid reacts with sodium hydroxide.");
        assert!(entities.iter().any(|e| e.entity_type == "CHEMICAL"));
    }

    #[test]
    fn dedups_identical_spans() {
        let entities = vec![
            ExtractedEntity { text: "Acid".to_string(), entity_type: "A".to_string(), start: 0, end: 4, confidence: 0.9 },
            ExtractedEntity { text: "acid".to_string(), entity_type: "B".to_string(), start: 0, end: 4, confidence: 0.8 },
        ];
        let mut seen = HashSet::new();
        let deduped: Vec<_> = entities
            .into_iter()
            .filter(|e| seen.insert((e.text.to_lowercase(), e.start, e.end)))
            .collect();
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn cas_validation_boundary_cases() {
        assert!(is_valid_cas("7664-93-9"));
        assert!(!is_valid_cas("7664-93"));
        assert!(!is_valid_cas("7664-93-99"));
    }

    #[test]
    fn related_entities_within_100_chars() {
        let a = ExtractedEntity { text: "a".to_string(), entity_type: "X".to_string(), start: 0, end: 1, confidence: 0.8 };
        let b = ExtractedEntity { text: "b".to_string(), entity_type: "Y".to_string(), start: 50, end: 51, confidence: 0.8 };
        let c = ExtractedEntity { text: "c".to_string(), entity_type: "Z".to_string(), start: 200, end: 201, confidence: 0.8 };
        assert!(are_related(&a, &b));
        assert!(!are_related(&a, &c));
    }
}
