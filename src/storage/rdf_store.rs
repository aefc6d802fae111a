//! A thin wrapper around an in-memory oxigraph `Store`, shared by the ontology store (C1)
//! and the graph store adapter (C2). Both the ontology merge path and the graph ingest
//! path need the same primitives: load a file by format, insert triples, run a SPARQL
//! query and get back bindings instead of a raw `QueryResults` to pass around.

use oxigraph::io::RdfFormat;
use oxigraph::model::*;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::collections::HashMap;
use std::io::Cursor;

use crate::error::{OntologyError, OntologyResult};

pub struct RDFStore {
    pub store: Store,
}

impl Default for RDFStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RDFStore {
    pub fn new() -> Self {
        RDFStore {
            store: Store::new().expect("in-memory oxigraph store is infallible to construct"),
        }
    }

    /// Loads RDF data in the given format into the default graph. Append-only: existing
    /// triples from earlier loads are never removed (spec §4.1 merge semantics).
    pub fn load_str(&mut self, data: &str, format: RdfFormat) -> OntologyResult<()> {
        let reader = Cursor::new(data.as_bytes());
        self.store
            .load_from_reader(format, reader)
            .map_err(|e| OntologyError::ParseFailed {
                path: "<inline>".to_string(),
                format: format!("{:?}", format),
                message: e.to_string(),
            })
    }

    pub fn insert(&self, quad: &Quad) -> OntologyResult<()> {
        self.store
            .insert(quad)
            .map(|_| ())
            .map_err(|e| OntologyError::QueryFailed(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.store.len().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs a SPARQL SELECT and flattens the bindings into owned strings, so callers
    /// don't need to hold a borrow on the store or match on `Term` themselves.
    pub fn select(&self, sparql: &str) -> OntologyResult<Vec<HashMap<String, String>>> {
        let results = self
            .store
            .query(sparql)
            .map_err(|e| OntologyError::QueryFailed(e.to_string()))?;

        let mut rows = Vec::new();
        if let QueryResults::Solutions(solutions) = results {
            for solution in solutions {
                let solution =
                    solution.map_err(|e| OntologyError::QueryFailed(e.to_string()))?;
                let mut row = HashMap::new();
                for (variable, term) in solution.iter() {
                    row.insert(variable.as_str().to_string(), term_to_string(term));
                }
                rows.push(row);
            }
        }
        Ok(rows)
    }

    pub fn query_raw(&self, sparql: &str) -> OntologyResult<QueryResults> {
        self.store
            .query(sparql)
            .map_err(|e| OntologyError::QueryFailed(e.to_string()))
    }
}

pub fn term_to_string(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::Literal(lit) => lit.value().to_string(),
        Term::BlankNode(node) => node.as_str().to_string(),
        #[allow(unreachable_patterns)]
        _ => term.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_turtle_and_selects_bindings() {
        let mut store = RDFStore::new();
        store
            .load_str(
                "@prefix ex: <http://example.org/> . ex:acid ex:hazardClass \"corrosive\" .",
                RdfFormat::Turtle,
            )
            .unwrap();

        let rows = store
            .select("SELECT ?o WHERE { ?s <http://example.org/hazardClass> ?o }")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("o").map(String::as_str), Some("corrosive"));
    }

    #[test]
    fn append_only_accumulates_triples() {
        let mut store = RDFStore::new();
        store
            .load_str("@prefix ex: <http://example.org/> . ex:a ex:p \"1\" .", RdfFormat::Turtle)
            .unwrap();
        store
            .load_str("@prefix ex: <http://example.org/> . ex:b ex:p \"2\" .", RdfFormat::Turtle)
            .unwrap();
        assert_eq!(store.len(), 2);
    }
}
