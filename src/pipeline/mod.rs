//! Pipeline orchestration (C9/C10): the Ontology→Graph and Document→Graph pipelines share
//! a state machine and a common per-stage result shape. Neither pipeline raises an
//! unhandled error to its caller — every stage returns a success flag and an error list,
//! aggregated into a structured run report (spec §7).

mod backpressure;
mod document_pipeline;
mod ontology_pipeline;
mod scheduler;

pub use document_pipeline::{run_document_to_graph_pipeline, DocumentPipelineReport};
pub use ontology_pipeline::{run_ontology_to_graph_pipeline, OntologyPipelineReport};
pub use scheduler::{CancellationToken, PipelineScheduler};

use serde::Serialize;

use crate::graph::GraphStore;
use crate::ontology::OntologyStore;
use crate::vector::VectorStore;

/// Bundles C1/C2/C3 so both pipelines' entry points are constructed against an explicit
/// context rather than reaching for globals (spec §9 design note: "pass an explicit
/// context holding references to C1/C2/C3 into pipeline constructors"). The pipeline
/// functions themselves take `&mut GraphStore`/`&mut dyn VectorStore` directly rather than
/// `&mut PipelineContext`, so a caller running both pipelines concurrently can hold only
/// the lock it needs (spec §5: "C1 may be shared read-only across runs... any mutation
/// requires exclusive access") instead of serializing on one context-wide lock; this
/// struct exists for callers (the CLI, tests) that want one place to construct and own
/// all three stores together.
pub struct PipelineContext {
    pub ontology: OntologyStore,
    pub graph: GraphStore,
    pub vector: Box<dyn VectorStore>,
}

impl PipelineContext {
    pub fn new(ontology: OntologyStore, graph: GraphStore, vector: Box<dyn VectorStore>) -> Self {
        PipelineContext { ontology, graph, vector }
    }
}

/// `Pending → Ingesting → Extracting → Validating → QualityChecking → Storing → Done`,
/// with `FailedAt<stage>` and `QualityFailed` as the terminal failure states (spec
/// "State machine for a pipeline run").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Pending,
    Ingesting,
    Extracting,
    Validating,
    QualityChecking,
    Storing,
    Done,
    QualityFailed,
    Cancelled,
    FailedAt(String),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::QualityFailed | PipelineState::Cancelled | PipelineState::FailedAt(_)
        )
    }
}

/// One stage's outcome, carried through to the run summary regardless of success (spec
/// §7: "a per-stage object with its own success flag and errors").
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: String,
    pub success: bool,
    pub errors: Vec<String>,
}

impl StageOutcome {
    pub fn ok(stage: impl Into<String>) -> Self {
        StageOutcome { stage: stage.into(), success: true, errors: Vec::new() }
    }

    pub fn ok_with_warnings(stage: impl Into<String>, warnings: Vec<String>) -> Self {
        StageOutcome { stage: stage.into(), success: true, errors: warnings }
    }

    pub fn failed(stage: impl Into<String>, errors: Vec<String>) -> Self {
        StageOutcome { stage: stage.into(), success: false, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_recognized() {
        assert!(PipelineState::Done.is_terminal());
        assert!(PipelineState::QualityFailed.is_terminal());
        assert!(PipelineState::FailedAt("Ingesting".to_string()).is_terminal());
        assert!(!PipelineState::Extracting.is_terminal());
    }

    #[test]
    fn context_bundles_all_three_stores() {
        use crate::config::VectorConfig;
        use crate::vector::build_vector_store;

        let vector_config = VectorConfig {
            backend: crate::config::VectorBackend::Local,
            embedding_dim: 8,
            api_key: None,
            endpoint: None,
            index_name: "ctx-test".to_string(),
            local_store_dir: std::env::temp_dir().join("hazsafe-ctx-test").to_string_lossy().into_owned(),
        };
        let ctx = PipelineContext::new(OntologyStore::new(), GraphStore::new(), build_vector_store(&vector_config));
        assert!(!ctx.graph.is_connected());
        assert_eq!(ctx.vector.statistics().backend, "local");
    }
}
