//! The ontology store (C1): loads every recognized ontology file under a directory into
//! one in-memory RDF graph, merging append-only, and exposes the class/property/instance
//! operations and parameterized queries the rest of the system needs.

use oxigraph::io::RdfFormat;
use oxigraph::model::{NamedNode, Quad};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OntologyError, OntologyResult};
use crate::storage::rdf_store::RDFStore;

/// Maps a file extension to the RDF serialization oxigraph should parse it as. `.owl` is
/// almost always RDF/XML in the wild (Protégé's default save format), so it is not a
/// separate format of its own.
fn format_for_extension(ext: &str) -> Option<RdfFormat> {
    match ext.to_lowercase().as_str() {
        "ttl" | "turtle" => Some(RdfFormat::Turtle),
        "owl" | "rdf" | "xml" | "rdfxml" => Some(RdfFormat::RdfXml),
        "jsonld" => Some(RdfFormat::JsonLd {
            profile: oxigraph::io::JsonLdProfileSet::empty(),
        }),
        "nt" => Some(RdfFormat::NTriples),
        "n3" => Some(RdfFormat::N3),
        "trig" => Some(RdfFormat::TriG),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct OntologyStats {
    pub triple_count: usize,
    pub class_count: usize,
    pub property_count: usize,
    pub instance_count: usize,
    pub files_loaded: usize,
}

pub struct OntologyStore {
    pub rdf: RDFStore,
    pub namespaces: HashMap<String, String>,
    pub loaded_files: Vec<String>,
}

impl Default for OntologyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OntologyStore {
    pub fn new() -> Self {
        let mut namespaces = HashMap::new();
        namespaces.insert("rdf".to_string(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#".to_string());
        namespaces.insert("rdfs".to_string(), "http://www.w3.org/2000/01/rdf-schema#".to_string());
        namespaces.insert("owl".to_string(), "http://www.w3.org/2002/07/owl#".to_string());
        namespaces.insert("xsd".to_string(), "http://www.w3.org/2001/XMLSchema#".to_string());
        namespaces.insert("sh".to_string(), "http://www.w3.org/ns/shacl#".to_string());
        OntologyStore {
            rdf: RDFStore::new(),
            namespaces,
            loaded_files: Vec::new(),
        }
    }

    /// Recursively walks `directory`, returning every file path with a recognized
    /// ontology extension, sorted lexicographically for deterministic, last-writer-wins
    /// scan order (spec §4.9 tie-break rule).
    pub fn recognized_files<P: AsRef<Path>>(directory: P) -> OntologyResult<Vec<PathBuf>> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(OntologyError::DirectoryNotFound(
                directory.to_string_lossy().to_string(),
            ));
        }

        fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out)?;
                } else if path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|ext| format_for_extension(ext).is_some())
                    .unwrap_or(false)
                {
                    out.push(path);
                }
            }
            Ok(())
        }

        let mut files = Vec::new();
        walk(directory, &mut files).map_err(|e| OntologyError::ReadFailed {
            path: directory.to_string_lossy().to_string(),
            source: e,
        })?;
        files.sort();
        Ok(files)
    }

    /// Recursively loads every recognized file under `directory` (spec §4.9 step 1: "Walk
    /// an ontology directory... consumes an entire directory (recursively)"). A per-file
    /// read or parse failure is recorded and the scan continues to the next file, rather
    /// than aborting — returned alongside the count of files actually loaded.
    pub fn load_directory<P: AsRef<Path>>(&mut self, directory: P) -> OntologyResult<usize> {
        let (loaded, _errors) = self.load_directory_report(directory)?;
        Ok(loaded)
    }

    /// Same recursive, continue-on-failure walk as [`Self::load_directory`], but also
    /// returns the per-file failures instead of discarding them.
    pub fn load_directory_report<P: AsRef<Path>>(
        &mut self,
        directory: P,
    ) -> OntologyResult<(usize, Vec<(String, String)>)> {
        let files = Self::recognized_files(&directory)?;

        let mut loaded = 0;
        let mut errors = Vec::new();
        for path in files {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let Some(format) = format_for_extension(ext) else {
                continue;
            };

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    errors.push((path.to_string_lossy().to_string(), e.to_string()));
                    continue;
                }
            };

            match self.rdf.load_str(&content, format) {
                Ok(()) => {
                    self.loaded_files.push(path.to_string_lossy().to_string());
                    loaded += 1;
                }
                Err(e) => {
                    errors.push((path.to_string_lossy().to_string(), e.to_string()));
                }
            }
        }

        if loaded == 0 {
            return Err(OntologyError::NoFilesLoaded(
                directory.as_ref().to_string_lossy().to_string(),
            ));
        }

        Ok((loaded, errors))
    }

    pub fn add_namespace(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.namespaces.insert(prefix.into(), iri.into());
    }

    pub fn add_class(&mut self, class_iri: &str) -> OntologyResult<()> {
        self.insert_triple(
            class_iri,
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
            "http://www.w3.org/2002/07/owl#Class",
        )
    }

    pub fn add_property(&mut self, property_iri: &str, is_object_property: bool) -> OntologyResult<()> {
        let property_type = if is_object_property {
            "http://www.w3.org/2002/07/owl#ObjectProperty"
        } else {
            "http://www.w3.org/2002/07/owl#DatatypeProperty"
        };
        self.insert_triple(
            property_iri,
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
            property_type,
        )
    }

    pub fn add_instance(&mut self, instance_iri: &str, class_iri: &str) -> OntologyResult<()> {
        self.insert_triple(
            instance_iri,
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
            class_iri,
        )
    }

    fn insert_triple(&self, subject: &str, predicate: &str, object: &str) -> OntologyResult<()> {
        let subject = NamedNode::new(subject).map_err(|_| {
            OntologyError::ParseFailed {
                path: "<triple>".to_string(),
                format: "iri".to_string(),
                message: format!("invalid subject IRI: {}", subject),
            }
        })?;
        let predicate = NamedNode::new(predicate).map_err(|_| OntologyError::ParseFailed {
            path: "<triple>".to_string(),
            format: "iri".to_string(),
            message: format!("invalid predicate IRI: {}", predicate),
        })?;
        let object = NamedNode::new(object).map_err(|_| OntologyError::ParseFailed {
            path: "<triple>".to_string(),
            format: "iri".to_string(),
            message: format!("invalid object IRI: {}", object),
        })?;
        self.rdf
            .insert(&Quad::new(subject, predicate, object, oxigraph::model::GraphName::DefaultGraph))
    }

    /// Runs a parameterized SPARQL SELECT, returning each row as a string-keyed binding map.
    pub fn query(&self, sparql: &str) -> OntologyResult<Vec<HashMap<String, String>>> {
        self.rdf.select(sparql)
    }

    pub fn export(&self, format: RdfFormat) -> OntologyResult<String> {
        let mut buffer = Vec::new();
        self.rdf
            .store
            .dump_to_writer(format, &mut buffer)
            .map_err(|e| OntologyError::QueryFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| OntologyError::QueryFailed(e.to_string()))
    }

    pub fn statistics(&self) -> OntologyStats {
        let class_count = self
            .query(
                "PREFIX owl: <http://www.w3.org/2002/07/owl#> \
                 PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> \
                 SELECT ?c WHERE { ?c rdf:type owl:Class }",
            )
            .map(|rows| rows.len())
            .unwrap_or(0);

        let property_count = self
            .query(
                "PREFIX owl: <http://www.w3.org/2002/07/owl#> \
                 PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> \
                 SELECT ?p WHERE { { ?p rdf:type owl:ObjectProperty } UNION { ?p rdf:type owl:DatatypeProperty } }",
            )
            .map(|rows| rows.len())
            .unwrap_or(0);

        let instance_count = self
            .query(
                "PREFIX owl: <http://www.w3.org/2002/07/owl#> \
                 PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> \
                 SELECT ?i ?c WHERE { ?i rdf:type ?c . FILTER(?c != owl:Class) FILTER(?c != owl:ObjectProperty) FILTER(?c != owl:DatatypeProperty) }",
            )
            .map(|rows| rows.len())
            .unwrap_or(0);

        OntologyStats {
            triple_count: self.rdf.len(),
            class_count,
            property_count,
            instance_count,
            files_loaded: self.loaded_files.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn loads_turtle_files_from_a_directory() {
        let dir = TempDir::new().unwrap();
        let mut file = fs::File::create(dir.path().join("core.ttl")).unwrap();
        writeln!(
            file,
            "@prefix owl: <http://www.w3.org/2002/07/owl#> . \
             @prefix ex: <http://example.org/> . \
             ex:HazardousSubstance a owl:Class ."
        )
        .unwrap();

        let mut store = OntologyStore::new();
        let loaded = store.load_directory(dir.path()).unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(store.statistics().class_count, 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let mut store = OntologyStore::new();
        assert!(store.load_directory("/no/such/directory").is_err());
    }

    #[test]
    fn merges_across_multiple_loads_append_only() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.ttl"),
            "@prefix ex: <http://example.org/> . ex:a ex:p \"1\" .",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.ttl"),
            "@prefix ex: <http://example.org/> . ex:b ex:p \"2\" .",
        )
        .unwrap();

        let mut store = OntologyStore::new();
        store.load_directory(dir.path()).unwrap();
        assert_eq!(store.statistics().triple_count, 2);
    }

    #[test]
    fn add_instance_and_query_round_trips() {
        let mut store = OntologyStore::new();
        store
            .add_class("http://example.org/HazardousSubstance")
            .unwrap();
        store
            .add_instance(
                "http://example.org/acid-1",
                "http://example.org/HazardousSubstance",
            )
            .unwrap();

        let rows = store
            .query("SELECT ?s WHERE { ?s <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/HazardousSubstance> }")
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
