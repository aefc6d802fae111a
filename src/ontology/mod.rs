//! The ontology store (C1): loads a directory of ontology files into one append-only RDF
//! graph and validates instance data against SHACL-style shapes found among them.

pub mod shapes;
pub mod store;

pub use shapes::{ConstraintKind, ShaclShape, ShaclValidator, ShapeReport, Violation};
pub use store::{OntologyStats, OntologyStore};
