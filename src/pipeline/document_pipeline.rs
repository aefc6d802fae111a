//! Document→Graph pipeline (C10): extract text → classify → extract entities/relations →
//! chunk and embed → validate entities → merge into the graph. Seven sequential stages;
//! an earlier-stage failure short-circuits the later ones (spec §4.10).
//!
//! **Open question resolution** (spec §4.10 step 7 is silent on how `HAS_HAZARD_CLASS`
//! can be "created" when hazard entities never become nodes, and the graph store
//! rejects dangling edges, invariant 2): a resolved `HAS_HAZARD_CLASS` is recorded as the
//! `hazard_class` field on the created `HazardousSubstance` node rather than as a
//! separate edge. `STORED_IN` is created only when a `Container` node with a matching
//! name already exists in the graph (typically materialized by the ontology pipeline);
//! otherwise it is a per-item error, consistent with "both endpoints resolve".

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use serde::Serialize;

use crate::extract::{extract_document, DocumentRecord};
use crate::graph::GraphStore;
use crate::model::{EntityMeta, HazardClass, HazardousSubstance};
use crate::text::{chunk_text, classify_document, clean_text, extract_entities, extract_relations, is_valid_cas, DocumentType, ExtractedEntity};
use crate::validation::{validate_formula, HAZARD_CLASS_VOCAB};
use crate::vector::{VectorDocument, VectorStore};

use super::backpressure::{upsert_in_groups, DEFAULT_GROUP_SIZE};
use super::{PipelineState, StageOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct DocumentPipelineReport {
    pub state: PipelineState,
    pub overall_success: bool,
    pub stages: Vec<StageOutcome>,
    pub document_id: String,
    pub doc_type: String,
    pub entities_found: usize,
    pub entities_validated: usize,
    pub relations_found: usize,
    pub chunks_upserted: usize,
    pub nodes_created: usize,
    pub edges_created: usize,
}

struct ValidatedEntity {
    entity: ExtractedEntity,
    warning: Option<String>,
}

fn validate_entities(entities: Vec<ExtractedEntity>) -> (Vec<ValidatedEntity>, Vec<String>) {
    let mut validated = Vec::new();
    let mut rejected = Vec::new();

    for entity in entities {
        match entity.entity_type.as_str() {
            "MOLECULAR_FORMULA" => match validate_formula(&entity.text) {
                Ok(()) => validated.push(ValidatedEntity { entity, warning: None }),
                Err(e) => rejected.push(format!("'{}' dropped: {}", entity.text, e)),
            },
            "CAS_NUMBER" => {
                if is_valid_cas(&entity.text) {
                    validated.push(ValidatedEntity { entity, warning: None });
                } else {
                    rejected.push(format!("'{}' dropped: does not match the CAS pattern", entity.text));
                }
            }
            "HAZARD" => {
                let in_vocab = HAZARD_CLASS_VOCAB.iter().any(|v| v.eq_ignore_ascii_case(&entity.text));
                let warning = if in_vocab {
                    None
                } else {
                    Some(format!("'{}' is not in the hazard_class vocabulary", entity.text))
                };
                validated.push(ValidatedEntity { entity, warning });
            }
            _ => validated.push(ValidatedEntity { entity, warning: None }),
        }
    }

    (validated, rejected)
}

/// Runs all seven stages. `graph` must already be connected; `vector` is the configured
/// C3 backend. `requested_doc_type` honors an explicit caller-supplied type, or triggers
/// auto-classification when `None`.
pub fn run_document_to_graph_pipeline(
    path: &Path,
    requested_doc_type: Option<DocumentType>,
    graph: &mut GraphStore,
    vector: &mut dyn VectorStore,
    chunk_size: usize,
    chunk_overlap: usize,
) -> DocumentPipelineReport {
    let mut stages = Vec::new();

    // Stage 1: Ingest.
    let record: DocumentRecord = extract_document(path);
    if record.doc_type == "error" {
        stages.push(StageOutcome::failed("Ingesting", vec![record.content.clone()]));
        return DocumentPipelineReport {
            state: PipelineState::FailedAt("Ingesting".to_string()),
            overall_success: false,
            stages,
            document_id: record.id,
            doc_type: "error".to_string(),
            entities_found: 0,
            entities_validated: 0,
            relations_found: 0,
            chunks_upserted: 0,
            nodes_created: 0,
            edges_created: 0,
        };
    }
    stages.push(StageOutcome::ok("Ingesting"));

    // Stage 2: Classify.
    let doc_type = requested_doc_type.unwrap_or_else(|| classify_document(&record.content));
    stages.push(StageOutcome::ok("Extracting"));

    // Stage 3: Extract entities (with 50-character trailing source_text span, spec §4.10 step 3).
    let raw_entities = extract_entities(&record.content);
    let entities_found = raw_entities.len();
    let source_text_by_start: std::collections::HashMap<usize, String> = raw_entities
        .iter()
        .map(|e| {
            let context_end = (e.end + 50).min(record.content.len());
            let source_text = record.content.get(e.end..context_end).unwrap_or("").to_string();
            (e.start, source_text)
        })
        .collect();

    // Stage 4: Extract relations over the step-3 entities.
    let relations = extract_relations(&record.content, &raw_entities);
    let relations_found = relations.len();
    stages.push(StageOutcome::ok("Extracting"));

    // Stage 5: Chunk and embed.
    let cleaned = clean_text(&record.content);
    let chunks = chunk_text(&cleaned, chunk_size, chunk_overlap);
    let vector_docs: Vec<VectorDocument> = chunks
        .iter()
        .map(|chunk| {
            let mut metadata = std::collections::HashMap::new();
            metadata.insert("document_id".to_string(), record.id.clone());
            metadata.insert("chunk_index".to_string(), chunk.index.to_string());
            metadata.insert("doc_type".to_string(), doc_type.to_string());
            VectorDocument {
                id: format!("{}::{}", record.id, chunk.index),
                text: chunk.text.clone(),
                embedding: None,
                source: record.source_path.clone(),
                kind: doc_type.to_string(),
                created_at: Utc::now(),
                metadata,
            }
        })
        .collect();

    let chunks_upserted = match upsert_in_groups(vector, vector_docs, DEFAULT_GROUP_SIZE) {
        Ok(count) => {
            stages.push(StageOutcome::ok("Validating"));
            count
        }
        Err(e) => {
            stages.push(StageOutcome::failed("Validating", vec![e.to_string()]));
            return DocumentPipelineReport {
                state: PipelineState::FailedAt("Validating".to_string()),
                overall_success: false,
                stages,
                document_id: record.id,
                doc_type: doc_type.to_string(),
                entities_found,
                entities_validated: 0,
                relations_found,
                chunks_upserted: 0,
                nodes_created: 0,
                edges_created: 0,
            };
        }
    };

    // Stage 6: Validate entities.
    let (validated, rejected) = validate_entities(raw_entities);
    let entities_validated = validated.len();
    let warnings: Vec<String> = validated.iter().filter_map(|v| v.warning.clone()).chain(rejected).collect();
    stages.push(StageOutcome::ok_with_warnings("QualityChecking", warnings));

    // Stage 7: Merge into graph.
    let hazard_texts: Vec<String> = validated
        .iter()
        .filter(|v| v.entity.entity_type == "HAZARD")
        .map(|v| v.entity.text.to_lowercase())
        .collect();

    let mut merge_errors = Vec::new();
    let mut nodes_created = 0;
    let mut edges_created = 0;

    for chemical in validated.iter().filter(|v| v.entity.entity_type == "CHEMICAL" || v.entity.entity_type == "MOLECULAR_FORMULA") {
        let name = chemical.entity.text.clone();
        let hazard_class = hazard_texts
            .iter()
            .find_map(|text| HazardClass::from_str(text).ok());

        let Some(hazard_class) = hazard_class else {
            merge_errors.push(format!("'{}' dropped: no resolvable hazard_class", name));
            continue;
        };

        let substance = HazardousSubstance {
            meta: EntityMeta::new(format!("{}::{}", record.id, name.to_lowercase().replace(' ', "-"))),
            name: name.clone(),
            chemical_formula: (chemical.entity.entity_type == "MOLECULAR_FORMULA").then(|| name.clone()),
            molecular_weight: None,
            hazard_class,
            flash_point: None,
            boiling_point: None,
            melting_point: None,
            density: None,
            cas_number: None,
            description: Some(record.metadata.summary.chars().take(200).collect()),
        };

        let mut properties = std::collections::HashMap::new();
        properties.insert("name".to_string(), substance.name.clone());
        properties.insert("hazard_class".to_string(), substance.hazard_class.as_str().to_string());
        if let Some(formula) = &substance.chemical_formula {
            properties.insert("chemical_formula".to_string(), formula.clone());
        }
        if let Some(description) = &substance.description {
            properties.insert("description".to_string(), description.clone());
        }
        properties.insert("source_document".to_string(), record.id.clone());
        if let Some(source_text) = source_text_by_start.get(&chemical.entity.start) {
            properties.insert("source_text".to_string(), source_text.clone());
        }

        match graph.create_node("HazardousSubstance", &substance.meta.id, properties) {
            Ok(_) => nodes_created += 1,
            Err(e) => {
                merge_errors.push(format!("'{}': {}", name, e));
                continue;
            }
        }

        for container in validated.iter().filter(|v| v.entity.entity_type == "CONTAINER") {
            if !crate::text::are_related(&chemical.entity, &container.entity) {
                continue;
            }
            let matches = graph.search(&container.entity.text).unwrap_or_default();
            let Some(existing) = matches.into_iter().find(|n| n.kind == "Container") else {
                merge_errors.push(format!("container '{}' not found for STORED_IN", container.entity.text));
                continue;
            };
            match graph.create_edge(
                "STORED_IN",
                "HazardousSubstance",
                &substance.meta.id,
                "Container",
                &existing.id,
                std::collections::HashMap::new(),
            ) {
                Ok(()) => edges_created += 1,
                Err(e) => merge_errors.push(format!("STORED_IN {} -> {}: {}", name, existing.id, e)),
            }
        }
    }

    let merge_outcome = if merge_errors.is_empty() {
        StageOutcome::ok("Storing")
    } else {
        StageOutcome::ok_with_warnings("Storing", merge_errors)
    };
    stages.push(merge_outcome);

    DocumentPipelineReport {
        state: PipelineState::Done,
        overall_success: true,
        stages,
        document_id: record.id,
        doc_type: doc_type.to_string(),
        entities_found,
        entities_validated,
        relations_found,
        chunks_upserted,
        nodes_created,
        edges_created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorConfig;
    use crate::vector::build_vector_store;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn ingests_and_chunks_a_plain_text_document() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "Sulfuric acid is corrosive and is stored in glass containers.").unwrap();

        let mut graph = GraphStore::new();
        graph.connect("mem://test", "", "", "");
        graph.ensure_schema(&["HazardousSubstance", "Container"]).unwrap();
        graph
            .create_node("Container", "glass-drum", {
                let mut props = std::collections::HashMap::new();
                props.insert("name".to_string(), "glass".to_string());
                props
            })
            .unwrap();

        let config = VectorConfig {
            backend: crate::config::VectorBackend::Local,
            embedding_dim: 16,
            api_key: None,
            endpoint: None,
            index_name: "test".to_string(),
            local_store_dir: std::env::temp_dir().join("hazsafe-test-vectors").to_string_lossy().into_owned(),
        };
        let mut vector = build_vector_store(&config);
        vector.initialize().unwrap();

        let report = run_document_to_graph_pipeline(file.path(), None, &mut graph, vector.as_mut(), 1000, 200);

        assert!(report.overall_success);
        assert_eq!(report.chunks_upserted, 1);
        assert!(report.entities_found > 0);

        let node = graph
            .read_node("HazardousSubstance", &format!("{}::sulfuric-acid", report.document_id))
            .expect("merge stage creates the chemical node");
        let source_text = node.properties.get("source_text").expect("source_text attached per spec §4.10 step 3");
        assert!(!source_text.is_empty());
        assert!("Sulfuric acid is corrosive and is stored in glass containers.".contains(source_text.as_str()));
    }

    #[test]
    fn failed_extraction_halts_at_ingesting() {
        let mut file = NamedTempFile::with_suffix(".xyz").unwrap();
        write!(file, "irrelevant").unwrap();

        let mut graph = GraphStore::new();
        graph.connect("mem://test", "", "", "");
        let config = VectorConfig {
            backend: crate::config::VectorBackend::Local,
            embedding_dim: 16,
            api_key: None,
            endpoint: None,
            index_name: "test".to_string(),
            local_store_dir: std::env::temp_dir().join("hazsafe-test-vectors-2").to_string_lossy().into_owned(),
        };
        let mut vector = build_vector_store(&config);
        vector.initialize().unwrap();

        let report = run_document_to_graph_pipeline(file.path(), None, &mut graph, vector.as_mut(), 1000, 200);
        assert!(!report.overall_success);
        assert_eq!(report.state, PipelineState::FailedAt("Ingesting".to_string()));
    }
}
