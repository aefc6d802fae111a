//! Relation extraction (spec §4.7): three passes over the entity list — surface verb
//! patterns, dependency-style subject-verb-object extraction, and semantic
//! hazard/property/usage templates — deduplicated by
//! `(lowercased source, lowercased target, relation type)`.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use super::entities::{are_related, ExtractedEntity};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRelation {
    pub source: String,
    pub target: String,
    pub relation_type: String,
    pub confidence: f64,
    pub span: (usize, usize),
}

struct SurfacePattern {
    regex: Regex,
    relation_type: &'static str,
}

lazy_static! {
    static ref SURFACE_PATTERNS: Vec<SurfacePattern> = vec![
        SurfacePattern {
            regex: Regex::new(r"(?i)([A-Za-z][A-Za-z0-9 ]{1,40}?)\s+causes?\s+([A-Za-z][A-Za-z0-9 ]{1,40})").unwrap(),
            relation_type: "causes",
        },
        SurfacePattern {
            regex: Regex::new(r"(?i)([A-Za-z][A-Za-z0-9 ]{1,40}?)\s+contains?\s+([A-Za-z][A-Za-z0-9 ]{1,40})").unwrap(),
            relation_type: "contains",
        },
        SurfacePattern {
            regex: Regex::new(r"(?i)([A-Za-z][A-Za-z0-9 ]{1,40}?)\s+reacts?\s+with\s+([A-Za-z][A-Za-z0-9 ]{1,40})").unwrap(),
            relation_type: "reacts_with",
        },
        SurfacePattern {
            regex: Regex::new(r"(?i)([A-Za-z][A-Za-z0-9 ]{1,40}?)\s+is\s+an?\s+([A-Za-z][A-Za-z0-9 ]{1,40})").unwrap(),
            relation_type: "is_a",
        },
        SurfacePattern {
            regex: Regex::new(r"(?i)([A-Za-z][A-Za-z0-9 ]{1,40}?)\s+has\s+([A-Za-z][A-Za-z0-9 ]{1,40})").unwrap(),
            relation_type: "has_property",
        },
        SurfacePattern {
            regex: Regex::new(r"(?i)([A-Za-z][A-Za-z0-9 ]{1,40}?)\s+requires?\s+([A-Za-z][A-Za-z0-9 ]{1,40})").unwrap(),
            relation_type: "requires",
        },
    ];

    static ref DEPENDENCY_VERBS: Vec<(&'static str, &'static str)> = vec![
        ("is", "is_a"),
        ("are", "is_a"),
        ("contains", "contains"),
        ("stored in", "STORED_IN"),
        ("reacts with", "reacts_with"),
    ];
}

fn surface_relations(text: &str) -> Vec<ExtractedRelation> {
    let mut relations = Vec::new();
    for pattern in SURFACE_PATTERNS.iter() {
        for caps in pattern.regex.captures_iter(text) {
            let full = caps.get(0).unwrap();
            let source = caps.get(1).unwrap().as_str().trim();
            let target = caps.get(2).unwrap().as_str().trim();
            if source.is_empty() || target.is_empty() {
                continue;
            }
            relations.push(ExtractedRelation {
                source: source.to_string(),
                target: target.to_string(),
                relation_type: pattern.relation_type.to_string(),
                confidence: 0.85,
                span: (full.start(), full.end()),
            });
        }
    }
    relations
}

/// Subject-verb-object extraction for entity pairs where both endpoints already appear in
/// the entity list: finds a recognized verb phrase occurring in the text span between two
/// entities and, if found, emits a relation between them.
fn dependency_relations(text: &str, entities: &[ExtractedEntity]) -> Vec<ExtractedRelation> {
    let mut relations = Vec::new();
    let lower = text.to_lowercase();

    for (i, e1) in entities.iter().enumerate() {
        for e2 in entities.iter().skip(i + 1) {
            if e2.start <= e1.end {
                continue;
            }
            let gap_start = e1.end;
            let gap_end = e2.start;
            if gap_end.saturating_sub(gap_start) > 60 {
                continue;
            }
            let Some(gap) = lower.get(gap_start..gap_end) else { continue };

            for (verb, relation_type) in DEPENDENCY_VERBS.iter() {
                if gap.contains(verb) {
                    relations.push(ExtractedRelation {
                        source: e1.text.clone(),
                        target: e2.text.clone(),
                        relation_type: relation_type.to_string(),
                        confidence: 0.7,
                        span: (e1.start, e2.end),
                    });
                    break;
                }
            }
        }
    }
    relations
}

/// Semantic templates for hazard/property/usage framings: a chemical related (within 100
/// characters, spec §4.7) to a hazard, property, or container entity yields a
/// domain-typed relation, independent of any literal verb between them.
fn semantic_relations(text: &str, entities: &[ExtractedEntity]) -> Vec<ExtractedRelation> {
    let mut relations = Vec::new();
    let chemicals: Vec<&ExtractedEntity> = entities
        .iter()
        .filter(|e| e.entity_type == "CHEMICAL" || e.entity_type == "MOLECULAR_FORMULA" || e.entity_type == "GENERIC")
        .collect();

    for chemical in &chemicals {
        for entity in entities {
            if std::ptr::eq(*chemical, entity) || !are_related(chemical, entity) {
                continue;
            }
            let relation_type = if entity.entity_type == "HAZARD" {
                Some("HAS_HAZARD_CLASS")
            } else if entity.entity_type == "CONTAINER" {
                let window_start = chemical.start.min(entity.start);
                let window_end = chemical.end.max(entity.end);
                let window = &text[window_start..window_end.min(text.len())];
                if window.to_lowercase().contains("stored") {
                    Some("STORED_IN")
                } else {
                    None
                }
            } else if entity.entity_type.starts_with("PROPERTY:") {
                Some("has_property")
            } else {
                None
            };

            if let Some(relation_type) = relation_type {
                relations.push(ExtractedRelation {
                    source: chemical.text.clone(),
                    target: entity.text.clone(),
                    relation_type: relation_type.to_string(),
                    confidence: 0.75,
                    span: (chemical.start.min(entity.start), chemical.end.max(entity.end)),
                });
            }
        }
    }
    relations
}

/// Runs all three passes and deduplicates by `(lowercased source, lowercased target,
/// relation type)` (spec §4.7). Each relation's confidence is clamped into `[0.6, 0.9]`.
pub fn extract_relations(text: &str, entities: &[ExtractedEntity]) -> Vec<ExtractedRelation> {
    let mut all = Vec::new();
    all.extend(surface_relations(text));
    all.extend(dependency_relations(text, entities));
    all.extend(semantic_relations(text, entities));

    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut deduped = Vec::new();
    for mut relation in all {
        relation.confidence = relation.confidence.clamp(0.6, 0.9);
        let key = (
            relation.source.to_lowercase(),
            relation.target.to_lowercase(),
            relation.relation_type.clone(),
        );
        if seen.insert(key) {
            deduped.push(relation);
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::entities::extract_entities;

    #[test]
    fn scenario_sulfuric_acid_proximity() {
        let text = "Sulfuric acid is corrosive and is stored in glass containers.";
        let entities = extract_entities(text);
        let relations = extract_relations(text, &entities);

        assert!(relations
            .iter()
            .any(|r| r.relation_type == "HAS_HAZARD_CLASS" && r.source.eq_ignore_ascii_case("sulfuric acid") && r.target.eq_ignore_ascii_case("corrosive")));
        assert!(relations
            .iter()
            .any(|r| r.relation_type == "STORED_IN" && r.source.eq_ignore_ascii_case("sulfuric acid") && r.target.eq_ignore_ascii_case("glass")));
        assert!(relations.iter().all(|r| r.confidence >= 0.6 && r.confidence <= 0.9));
    }

    #[test]
    fn surface_pattern_requires() {
        let text = "Handling this substance requires a face shield.";
        let relations = surface_relations(text);
        assert!(relations.iter().any(|r| r.relation_type == "requires"));
    }

    #[test]
    fn dedups_identical_relation_triples() {
        let relations = vec![
            ExtractedRelation { source: "Acid".to_string(), target: "Corrosive".to_string(), relation_type: "HAS_HAZARD_CLASS".to_string(), confidence: 0.8, span: (0, 1) },
            ExtractedRelation { source: "acid".to_string(), target: "corrosive".to_string(), relation_type: "HAS_HAZARD_CLASS".to_string(), confidence: 0.7, span: (2, 3) },
        ];
        let mut seen = HashSet::new();
        let deduped: Vec<_> = relations
            .into_iter()
            .filter(|r| seen.insert((r.source.to_lowercase(), r.target.to_lowercase(), r.relation_type.clone())))
            .collect();
        assert_eq!(deduped.len(), 1);
    }
}
