//! Error handling for hazsafe-kg
//!
//! This module provides the error taxonomy shared by every subsystem: the ontology
//! store, the graph and vector adapters, the validation and quality engines, document
//! extraction, and the two pipelines.

use thiserror::Error;

/// Top-level error type returned by pipeline entry points and most public APIs.
#[derive(Error, Debug)]
pub enum HazkgError {
    #[error("ontology error: {0}")]
    Ontology(#[from] OntologyError),

    #[error("graph store error: {0}")]
    Graph(#[from] GraphError),

    #[error("vector store error: {0}")]
    Vector(#[from] VectorError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("quality error: {0}")]
    Quality(#[from] QualityError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("oxigraph error: {0}")]
    Oxigraph(#[from] oxigraph::store::StorageError),

    #[error("IRI parse error: {0}")]
    IriParse(#[from] oxigraph::model::IriParseError),

    #[error("{0}")]
    Custom(String),
}

/// Errors raised while loading or querying the ontology store (C1).
#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("ontology directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("no recognized ontology files found under {0}")]
    NoFilesLoaded(String),

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path} as {format}: {message}")]
    ParseFailed {
        path: String,
        format: String,
        message: String,
    },

    #[error("unrecognized ontology file extension: {0}")]
    UnsupportedFormat(String),

    #[error("SPARQL query failed: {0}")]
    QueryFailed(String),

    #[error("shape graph not loaded")]
    ShapesNotLoaded,
}

/// Errors raised by the graph store adapter (C2).
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("not connected to a graph backend")]
    NotConnected,

    #[error("node already exists with conflicting kind: ({kind}, {id})")]
    Conflict { kind: String, id: String },

    #[error("graph backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("node not found: ({kind}, {id})")]
    NodeNotFound { kind: String, id: String },

    #[error("dangling edge: endpoint {0} does not exist")]
    DanglingEdge(String),

    #[error("operation timed out: {0}")]
    Timeout(String),
}

/// Errors raised by the vector store adapter (C3).
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("vector store not initialized")]
    NotInitialized,

    #[error("vector backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("persistence failure: {0}")]
    PersistenceFailed(String),
}

/// Errors raised by the validation engine (C4) and compatibility rules (C5).
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("cannot parse input: {0}")]
    InputMalformed(String),

    #[error("schema violation in field '{field}': {reason}")]
    SchemaViolation { field: String, reason: String },

    #[error("range violation in field '{field}': {reason}")]
    RangeViolation { field: String, reason: String },

    #[error("shape violation at {focus_node} on path {path}: {message}")]
    ShapeViolation {
        focus_node: String,
        path: String,
        message: String,
    },

    #[error("incompatible pair forbidden: {0}")]
    CompatibilityForbidden(String),
}

/// Errors raised by the quality assessment engine (C6).
#[derive(Error, Debug)]
pub enum QualityError {
    #[error("overall quality score {score:.3} below minimum {minimum:.3}")]
    BelowThreshold { score: f64, minimum: f64 },

    #[error("cannot compute quality on an empty batch")]
    EmptyBatch,

    #[error("failed to export metrics to {path}: {source}")]
    ExportFailed {
        path: String,
        source: std::io::Error,
    },
}

/// Errors raised by the document extractor (C8).
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("unsupported document extension: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to extract text from {path}: {message}")]
    ExtractFailed { path: String, message: String },
}

/// Errors raised by pipeline orchestration (C9/C10).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("stage {stage} failed: {reason}")]
    FailedAtStage { stage: String, reason: String },

    #[error("pipeline run was cancelled")]
    Cancelled,

    #[error("stage {0} exceeded its deadline")]
    Timeout(String),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("missing configuration parameter: {0}")]
    MissingParameter(String),
}

pub type Result<T> = std::result::Result<T, HazkgError>;
pub type OntologyResult<T> = std::result::Result<T, OntologyError>;
pub type GraphResult<T> = std::result::Result<T, GraphError>;
pub type VectorResult<T> = std::result::Result<T, VectorError>;
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
pub type QualityResult<T> = std::result::Result<T, QualityError>;
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_subsystem_errors() {
        let err: HazkgError = GraphError::NotConnected.into();
        assert!(matches!(err, HazkgError::Graph(GraphError::NotConnected)));
    }

    #[test]
    fn displays_readable_messages() {
        let err = ValidationError::SchemaViolation {
            field: "hazard_class".to_string(),
            reason: "value not in vocabulary".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "schema violation in field 'hazard_class': value not in vocabulary"
        );
    }
}
