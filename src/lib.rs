//! hazsafe-kg: a knowledge-graph system for hazardous-substance safety data.
//!
//! Two pipelines build and maintain the graph: one ingests domain ontologies (C1/C9),
//! the other ingests unstructured safety documents (C7/C8/C10). A validation engine
//! (C4/C5) and quality assessment engine (C6) gate what reaches the graph and vector
//! stores (C2/C3).

pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod model;
pub mod ontology;
pub mod pipeline;
pub mod quality;
pub mod storage;
pub mod text;
pub mod validation;
pub mod vector;

pub use error::{HazkgError, Result};
