//! Ontology→Graph pipeline (C9): parse RDF → extract schema/shapes → shape-validate →
//! quality gate → materialize into the graph store. Five strictly sequential stages; a
//! non-success at any stage halts the run and returns the partial result so far (spec
//! §4.9).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::error::{OntologyError, OntologyResult};
use crate::graph::GraphStore;
use crate::model::{Container, EntityMeta, HazardClass, HazardousSubstance, Material};
use crate::ontology::{OntologyStats, OntologyStore, ShaclValidator};
use crate::quality::{QualityEngine, QualityReport};
use crate::validation::{CompatibilityRules, Row, TabularBatch};

use super::{PipelineState, StageOutcome};

const ENTITY_KINDS: &[&str] = &["HazardousSubstance", "Container", "SafetyTest", "RiskAssessment", "Location"];
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

#[derive(Debug, Clone, Serialize)]
pub struct OntologyPipelineReport {
    pub state: PipelineState,
    pub overall_success: bool,
    pub stages: Vec<StageOutcome>,
    pub files_loaded: usize,
    pub total_triples: usize,
    pub entities_created: usize,
    pub relationships_created: usize,
    #[serde(skip)]
    pub quality_report: Option<QualityReport>,
    pub compatibility_violations: Vec<String>,
}

impl OntologyPipelineReport {
    fn failed(stages: Vec<StageOutcome>, state: PipelineState) -> Self {
        OntologyPipelineReport {
            state,
            overall_success: false,
            stages,
            files_loaded: 0,
            total_triples: 0,
            entities_created: 0,
            relationships_created: 0,
            quality_report: None,
            compatibility_violations: Vec::new(),
        }
    }
}

fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

struct Candidate {
    subject: String,
    kind: String,
    properties: HashMap<String, String>,
}

struct CandidateRelationship {
    source: String,
    target: String,
    edge_type: String,
}

fn extract_candidates(store: &OntologyStore) -> OntologyResult<(Vec<Candidate>, Vec<CandidateRelationship>)> {
    let triples = store.query("SELECT ?s ?p ?o WHERE { ?s ?p ?o }")?;

    let mut types: HashMap<String, String> = HashMap::new();
    for row in &triples {
        if row.get("p").map(String::as_str) == Some(RDF_TYPE) {
            if let Some(object) = row.get("o") {
                let kind = local_name(object);
                if ENTITY_KINDS.contains(&kind) {
                    types.insert(row["s"].clone(), kind.to_string());
                }
            }
        }
    }

    const RELATIONSHIP_PREDICATES: &[&str] = &[
        "HAS_HAZARD_CLASS", "STORED_IN", "TESTED_WITH", "ASSESSED_FOR", "COMPATIBLE_WITH",
        "INCOMPATIBLE_WITH", "REQUIRES_PPE", "LOCATED_AT", "MANUFACTURED_BY", "CONTAINS",
        "SIMILAR_TO", "REPLACES",
    ];
    let relationship_predicates: HashSet<&str> = RELATIONSHIP_PREDICATES.iter().copied().collect();

    let mut properties: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut relationships = Vec::new();

    for row in &triples {
        let Some(subject) = row.get("s") else { continue };
        let Some(predicate) = row.get("p") else { continue };
        let Some(object) = row.get("o") else { continue };
        if predicate == RDF_TYPE {
            continue;
        }

        let predicate_name = local_name(predicate);
        if relationship_predicates.contains(predicate_name) && types.contains_key(object) {
            relationships.push(CandidateRelationship {
                source: subject.clone(),
                target: object.clone(),
                edge_type: predicate_name.to_string(),
            });
            continue;
        }

        properties
            .entry(subject.clone())
            .or_default()
            .insert(predicate_name.to_string(), object.clone());
    }

    let candidates = types
        .into_iter()
        .map(|(subject, kind)| {
            let properties = properties.remove(&subject).unwrap_or_default();
            Candidate { subject, kind, properties }
        })
        .collect();

    Ok((candidates, relationships))
}

fn load_shapes(directory: &Path) -> OntologyResult<ShaclValidator> {
    let mut validator = ShaclValidator::new();
    let mut shape_files: Vec<_> = walk_shape_files(directory)?;
    shape_files.sort();
    for path in shape_files {
        validator.load_file(&path)?;
    }
    Ok(validator)
}

fn walk_shape_files(directory: &Path) -> OntologyResult<Vec<std::path::PathBuf>> {
    fn walk(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(&path, out)?;
            } else if matches!(path.extension().and_then(|e| e.to_str()), Some("shacl") | Some("shapes")) {
                out.push(path);
            }
        }
        Ok(())
    }
    let mut out = Vec::new();
    walk(directory, &mut out).map_err(|e| OntologyError::ReadFailed {
        path: directory.to_string_lossy().to_string(),
        source: e,
    })?;
    Ok(out)
}

fn candidate_to_entity(candidate: &Candidate) -> Row {
    let mut row: Row = candidate.properties.clone();
    if !row.contains_key("name") {
        row.insert("name".to_string(), local_name(&candidate.subject).to_string());
    }
    row
}

fn parse_substance(candidate: &Candidate) -> Option<HazardousSubstance> {
    let name = candidate.properties.get("name").cloned().unwrap_or_else(|| local_name(&candidate.subject).to_string());
    let hazard_class = candidate.properties.get("hazardClass").and_then(|v| v.parse::<HazardClass>().ok())?;
    Some(HazardousSubstance {
        meta: EntityMeta::new(local_name(&candidate.subject)).with_source_uri(candidate.subject.clone()),
        name,
        chemical_formula: candidate.properties.get("chemicalFormula").cloned(),
        molecular_weight: candidate.properties.get("molecularWeight").and_then(|v| v.parse().ok()),
        hazard_class,
        flash_point: candidate.properties.get("flashPoint").cloned(),
        boiling_point: candidate.properties.get("boilingPoint").and_then(|v| v.parse().ok()),
        melting_point: candidate.properties.get("meltingPoint").and_then(|v| v.parse().ok()),
        density: candidate.properties.get("density").and_then(|v| v.parse().ok()),
        cas_number: candidate.properties.get("casNumber").cloned(),
        description: candidate.properties.get("description").cloned(),
    })
}

fn parse_container(candidate: &Candidate) -> Option<Container> {
    let name = candidate.properties.get("name").cloned().unwrap_or_else(|| local_name(&candidate.subject).to_string());
    let material = candidate.properties.get("material").and_then(|v| v.parse::<Material>().ok())?;
    let capacity = candidate.properties.get("capacity").and_then(|v| v.parse().ok())?;
    Some(Container {
        meta: EntityMeta::new(local_name(&candidate.subject)).with_source_uri(candidate.subject.clone()),
        name,
        material,
        capacity,
        capacity_unit: candidate.properties.get("capacityUnit").cloned().unwrap_or_default(),
        pressure_rating: candidate.properties.get("pressureRating").and_then(|v| v.parse().ok()),
        temperature_rating: candidate.properties.get("temperatureRating").and_then(|v| v.parse().ok()),
        manufacturer: candidate.properties.get("manufacturer").cloned(),
        model: candidate.properties.get("model").cloned(),
    })
}

/// Runs all five stages against an already-connected `graph`. `quality` accumulates this
/// run's report into its history as a side effect of stage 4.
pub fn run_ontology_to_graph_pipeline(
    directory: &Path,
    quality: &QualityEngine,
    graph: &mut GraphStore,
) -> OntologyPipelineReport {
    let mut stages = Vec::new();
    let mut ontology = OntologyStore::new();

    // Stage 1: Ingest.
    let (loaded, load_errors) = match ontology.load_directory_report(directory) {
        Ok(result) => result,
        Err(e) => {
            stages.push(StageOutcome::failed("Ingesting", vec![e.to_string()]));
            return OntologyPipelineReport::failed(stages, PipelineState::FailedAt("Ingesting".to_string()));
        }
    };
    let stats: OntologyStats = ontology.statistics();
    stages.push(StageOutcome::ok_with_warnings(
        "Ingesting",
        load_errors.into_iter().map(|(path, reason)| format!("{}: {}", path, reason)).collect(),
    ));

    // Stage 2: Manage (schema + shapes cache).
    let shapes = match load_shapes(directory) {
        Ok(shapes) => shapes,
        Err(e) => {
            stages.push(StageOutcome::failed("Extracting", vec![e.to_string()]));
            return OntologyPipelineReport::failed(stages, PipelineState::FailedAt("Extracting".to_string()));
        }
    };
    stages.push(StageOutcome::ok("Extracting"));

    // Stage 3: Shape-validate.
    let (candidates, relationships) = match extract_candidates(&ontology) {
        Ok(result) => result,
        Err(e) => {
            stages.push(StageOutcome::failed("Validating", vec![e.to_string()]));
            return OntologyPipelineReport::failed(stages, PipelineState::FailedAt("Validating".to_string()));
        }
    };

    let shape_report = match shapes.validate(&ontology.rdf.store) {
        Ok(report) => report,
        Err(e) => {
            stages.push(StageOutcome::failed("Validating", vec![e.to_string()]));
            return OntologyPipelineReport::failed(stages, PipelineState::FailedAt("Validating".to_string()));
        }
    };
    let violating: HashSet<&str> = shape_report
        .violations
        .iter()
        .filter(|v| v.severity == crate::ontology::shapes::Severity::Violation)
        .map(|v| v.focus_node.as_str())
        .collect();

    let mut validation_errors = Vec::new();
    let validated: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| {
            if violating.contains(c.subject.as_str()) {
                validation_errors.push(format!("{} dropped: fails shape constraints", c.subject));
                false
            } else {
                true
            }
        })
        .collect();
    stages.push(StageOutcome::ok_with_warnings("Validating", validation_errors));

    // Stage 4: Quality gate.
    let rows: Vec<Row> = validated.iter().map(|c| candidate_to_entity(c)).collect();
    let columns: Vec<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect::<HashSet<_>>().into_iter().collect();
    let batch = TabularBatch::new(columns, rows);

    let quality_report = if batch.rows.is_empty() {
        None
    } else {
        quality.assess(None, &batch).ok()
    };

    let substances: Vec<HazardousSubstance> = validated.iter().filter_map(|c| (c.kind == "HazardousSubstance").then(|| parse_substance(c)).flatten()).collect();
    let containers: Vec<Container> = validated.iter().filter_map(|c| (c.kind == "Container").then(|| parse_container(c)).flatten()).collect();

    let mut compatibility_violations = Vec::new();
    for substance in &substances {
        for container in &containers {
            let report = CompatibilityRules::check(substance, container);
            for issue in report.errors {
                compatibility_violations.push(format!("{} in {}: {:?}", substance.name, container.name, issue));
            }
        }
    }

    let below_threshold = quality_report.as_ref().map(|r| r.overall < 0.7).unwrap_or(false);
    stages.push(StageOutcome::ok_with_warnings("QualityChecking", compatibility_violations.clone()));

    if below_threshold {
        // A sub-threshold score is a planned gate outcome, not a run failure: spec.md §8
        // scenario 4 requires `overall_success=true, stored=0, quality_gate=failed`.
        return OntologyPipelineReport {
            state: PipelineState::QualityFailed,
            overall_success: true,
            stages,
            files_loaded: loaded,
            total_triples: stats.triple_count,
            entities_created: 0,
            relationships_created: 0,
            quality_report,
            compatibility_violations,
        };
    }

    // Stage 5: Store.
    let _ = graph.ensure_schema(ENTITY_KINDS);
    let mut store_errors = Vec::new();
    let mut entities_created = 0;
    for candidate in &validated {
        let row = candidate_to_entity(candidate);
        match graph.create_node(&candidate.kind, local_name(&candidate.subject), row) {
            Ok(_) => entities_created += 1,
            Err(e) => store_errors.push(format!("{}: {}", candidate.subject, e)),
        }
    }

    let mut relationships_created = 0;
    for relationship in &relationships {
        let source_kind = validated.iter().find(|c| c.subject == relationship.source).map(|c| c.kind.clone());
        let target_kind = validated.iter().find(|c| c.subject == relationship.target).map(|c| c.kind.clone());
        let (Some(source_kind), Some(target_kind)) = (source_kind, target_kind) else {
            continue;
        };
        match graph.create_edge(
            &relationship.edge_type,
            &source_kind,
            local_name(&relationship.source),
            &target_kind,
            local_name(&relationship.target),
            HashMap::new(),
        ) {
            Ok(()) => relationships_created += 1,
            Err(e) => store_errors.push(format!("{} -{}-> {}: {}", relationship.source, relationship.edge_type, relationship.target, e)),
        }
    }

    let store_outcome = if store_errors.is_empty() {
        StageOutcome::ok("Storing")
    } else {
        StageOutcome::ok_with_warnings("Storing", store_errors)
    };
    stages.push(store_outcome);

    OntologyPipelineReport {
        state: PipelineState::Done,
        overall_success: true,
        stages,
        files_loaded: loaded,
        total_triples: stats.triple_count,
        entities_created,
        relationships_created,
        quality_report,
        compatibility_violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_ttl(dir: &TempDir, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        write!(file, "{}", content).unwrap();
    }

    #[test]
    fn zero_files_fails_at_ingesting() {
        let dir = TempDir::new().unwrap();
        let quality = QualityEngine::new();
        let mut graph = GraphStore::new();
        graph.connect("mem://test", "", "", "");
        let report = run_ontology_to_graph_pipeline(dir.path(), &quality, &mut graph);
        assert!(!report.overall_success);
        assert_eq!(report.state, PipelineState::FailedAt("Ingesting".to_string()));
    }

    #[test]
    fn loads_and_stores_a_single_substance() {
        let dir = TempDir::new().unwrap();
        write_ttl(
            &dir,
            "core.ttl",
            r#"
            @prefix hs: <http://hazardsafe-kg.org/ontology#> .
            @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
            hs:sulfuricAcid rdf:type hs:HazardousSubstance ;
                hs:name "Sulfuric Acid" ;
                hs:hazardClass "corrosive" ;
                hs:molecularWeight "98.08" .
            "#,
        );

        let quality = QualityEngine::new();
        let mut graph = GraphStore::new();
        graph.connect("mem://test", "", "", "");
        let report = run_ontology_to_graph_pipeline(dir.path(), &quality, &mut graph);
        assert_eq!(report.files_loaded, 1);
        assert!(report.total_triples > 0);
    }

    #[test]
    fn low_quality_batch_reports_success_with_nothing_stored() {
        // spec.md §8 scenario 4: a quality-gate failure is a planned outcome, not a run
        // failure — `overall_success=true, stored=0, quality_gate=failed`. The embedded tab
        // characters are garbled-source stand-ins that trip the accuracy dimension's
        // control-character check (quality::QualityEngine::accuracy's format-sanity
        // fallback), dragging the weighted overall score under the 0.7 gate.
        let dir = TempDir::new().unwrap();
        write_ttl(
            &dir,
            "garbled.ttl",
            r#"
            @prefix hs: <http://hazardsafe-kg.org/ontology#> .
            @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
            hs:unnamed1 rdf:type hs:HazardousSubstance ;
                hs:name "Acid\tX" .
            hs:unnamed2 rdf:type hs:HazardousSubstance ;
                hs:name "Base\tY" .
            "#,
        );

        let quality = QualityEngine::new();
        let mut graph = GraphStore::new();
        graph.connect("mem://test", "", "", "");
        let report = run_ontology_to_graph_pipeline(dir.path(), &quality, &mut graph);

        assert!(report.overall_success);
        assert_eq!(report.state, PipelineState::QualityFailed);
        assert_eq!(report.entities_created, 0);
        assert!(report.quality_report.as_ref().unwrap().overall < 0.7);
    }
}
