//! SHACL-style shape validation (C1's "shape validation (SHACL-like constraints):
//! cardinality, datatype, value range, pattern, required property"), adapted from a
//! reasoner-backed validator down to direct `rdf:type` matching: this system's shapes
//! only ever need to know whether a focus node has a given class asserted, not whether
//! it belongs to that class transitively through subclass inference.

use oxigraph::model::{NamedNodeRef, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::error::{OntologyError, OntologyResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    MinCount(u32),
    MaxCount(u32),
    Datatype(String),
    Pattern(String),
    MinInclusive(f64),
    MaxInclusive(f64),
}

#[derive(Debug, Clone)]
pub struct ShaclProperty {
    pub path: String,
    pub constraints: Vec<ConstraintKind>,
}

#[derive(Debug, Clone)]
pub struct ShaclShape {
    pub id: String,
    pub target_class: String,
    pub properties: Vec<ShaclProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Violation,
}

#[derive(Debug, Clone)]
pub struct Violation {
    pub focus_node: String,
    pub path: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ShapeReport {
    pub conforms: bool,
    pub violations: Vec<Violation>,
}

pub struct ShaclValidator {
    shapes: Vec<ShaclShape>,
}

impl ShaclValidator {
    pub fn new() -> Self {
        ShaclValidator { shapes: Vec::new() }
    }

    pub fn shapes(&self) -> &[ShaclShape] {
        &self.shapes
    }

    /// Loads `sh:NodeShape` definitions out of a Turtle file (a `.shacl`/`.shapes` file
    /// per the ontology directory convention) and adds them to this validator's shape set.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> OntologyResult<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| OntologyError::ReadFailed {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let store = Store::new().map_err(|e| OntologyError::QueryFailed(e.to_string()))?;
        store
            .load_from_reader(oxigraph::io::RdfFormat::Turtle, Cursor::new(content.as_bytes()))
            .map_err(|e| OntologyError::ParseFailed {
                path: path.to_string_lossy().to_string(),
                format: "turtle".to_string(),
                message: e.to_string(),
            })?;

        let extracted = Self::extract_shapes(&store)?;
        let count = extracted.len();
        self.shapes.extend(extracted);
        Ok(count)
    }

    fn extract_shapes(store: &Store) -> OntologyResult<Vec<ShaclShape>> {
        let mut shapes = Vec::new();

        let shape_query = r#"
            PREFIX sh: <http://www.w3.org/ns/shacl#>
            SELECT ?shape ?targetClass WHERE {
                ?shape a sh:NodeShape ;
                       sh:targetClass ?targetClass .
            }
        "#;

        let results = store
            .query(shape_query)
            .map_err(|e| OntologyError::QueryFailed(e.to_string()))?;

        if let QueryResults::Solutions(solutions) = results {
            for solution in solutions {
                let solution = solution.map_err(|e| OntologyError::QueryFailed(e.to_string()))?;
                let (Some(Term::NamedNode(shape)), Some(Term::NamedNode(target_class))) =
                    (solution.get("shape"), solution.get("targetClass"))
                else {
                    continue;
                };

                let properties = Self::extract_properties(store, shape.as_ref())?;
                shapes.push(ShaclShape {
                    id: shape.as_str().to_string(),
                    target_class: target_class.as_str().to_string(),
                    properties,
                });
            }
        }

        Ok(shapes)
    }

    fn extract_properties(
        store: &Store,
        shape: NamedNodeRef,
    ) -> OntologyResult<Vec<ShaclProperty>> {
        let query = format!(
            r#"
            PREFIX sh: <http://www.w3.org/ns/shacl#>
            SELECT ?path ?minCount ?maxCount ?datatype ?pattern ?minInclusive ?maxInclusive WHERE {{
                <{}> sh:property ?prop .
                ?prop sh:path ?path .
                OPTIONAL {{ ?prop sh:minCount ?minCount }}
                OPTIONAL {{ ?prop sh:maxCount ?maxCount }}
                OPTIONAL {{ ?prop sh:datatype ?datatype }}
                OPTIONAL {{ ?prop sh:pattern ?pattern }}
                OPTIONAL {{ ?prop sh:minInclusive ?minInclusive }}
                OPTIONAL {{ ?prop sh:maxInclusive ?maxInclusive }}
            }}
            "#,
            shape.as_str()
        );

        let results = store
            .query(&query)
            .map_err(|e| OntologyError::QueryFailed(e.to_string()))?;

        let mut properties = Vec::new();
        if let QueryResults::Solutions(solutions) = results {
            for solution in solutions {
                let solution = solution.map_err(|e| OntologyError::QueryFailed(e.to_string()))?;
                let Some(path_term) = solution.get("path") else {
                    continue;
                };
                let path = crate::storage::rdf_store::term_to_string(path_term);

                let mut constraints = Vec::new();
                if let Some(Term::Literal(lit)) = solution.get("minCount") {
                    if let Ok(n) = lit.value().parse() {
                        constraints.push(ConstraintKind::MinCount(n));
                    }
                }
                if let Some(Term::Literal(lit)) = solution.get("maxCount") {
                    if let Ok(n) = lit.value().parse() {
                        constraints.push(ConstraintKind::MaxCount(n));
                    }
                }
                if let Some(term) = solution.get("datatype") {
                    constraints.push(ConstraintKind::Datatype(crate::storage::rdf_store::term_to_string(term)));
                }
                if let Some(Term::Literal(lit)) = solution.get("pattern") {
                    constraints.push(ConstraintKind::Pattern(lit.value().to_string()));
                }
                if let Some(Term::Literal(lit)) = solution.get("minInclusive") {
                    if let Ok(n) = lit.value().parse() {
                        constraints.push(ConstraintKind::MinInclusive(n));
                    }
                }
                if let Some(Term::Literal(lit)) = solution.get("maxInclusive") {
                    if let Ok(n) = lit.value().parse() {
                        constraints.push(ConstraintKind::MaxInclusive(n));
                    }
                }

                properties.push(ShaclProperty { path, constraints });
            }
        }

        Ok(properties)
    }

    /// Validates every instance of each shape's target class found in `data`, checking
    /// min/max cardinality, pattern, and inclusive-range constraints on each property path.
    pub fn validate(&self, data: &Store) -> OntologyResult<ShapeReport> {
        let mut violations = Vec::new();

        for shape in &self.shapes {
            let instance_query = format!(
                "SELECT ?instance WHERE {{ ?instance <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <{}> }}",
                shape.target_class
            );
            let results = data
                .query(&instance_query)
                .map_err(|e| OntologyError::QueryFailed(e.to_string()))?;

            let mut instances = Vec::new();
            if let QueryResults::Solutions(solutions) = results {
                for solution in solutions {
                    let solution = solution.map_err(|e| OntologyError::QueryFailed(e.to_string()))?;
                    if let Some(Term::NamedNode(node)) = solution.get("instance") {
                        instances.push(node.as_str().to_string());
                    }
                }
            }

            for instance in instances {
                for property in &shape.properties {
                    let values = Self::property_values(data, &instance, &property.path)?;
                    violations.extend(Self::check_property(&instance, property, &values));
                }
            }
        }

        Ok(ShapeReport {
            conforms: violations
                .iter()
                .all(|v| v.severity != Severity::Violation),
            violations,
        })
    }

    fn property_values(
        data: &Store,
        instance: &str,
        path: &str,
    ) -> OntologyResult<Vec<String>> {
        let query = format!("SELECT ?value WHERE {{ <{}> <{}> ?value }}", instance, path);
        let results = data
            .query(&query)
            .map_err(|e| OntologyError::QueryFailed(e.to_string()))?;

        let mut values = Vec::new();
        if let QueryResults::Solutions(solutions) = results {
            for solution in solutions {
                let solution = solution.map_err(|e| OntologyError::QueryFailed(e.to_string()))?;
                if let Some(term) = solution.get("value") {
                    values.push(crate::storage::rdf_store::term_to_string(term));
                }
            }
        }
        Ok(values)
    }

    fn check_property(
        instance: &str,
        property: &ShaclProperty,
        values: &[String],
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        for constraint in &property.constraints {
            match constraint {
                ConstraintKind::MinCount(min) => {
                    if values.len() < *min as usize {
                        violations.push(Violation {
                            focus_node: instance.to_string(),
                            path: property.path.clone(),
                            severity: Severity::Violation,
                            message: format!(
                                "expected at least {} value(s), found {}",
                                min,
                                values.len()
                            ),
                        });
                    }
                }
                ConstraintKind::MaxCount(max) => {
                    if values.len() > *max as usize {
                        violations.push(Violation {
                            focus_node: instance.to_string(),
                            path: property.path.clone(),
                            severity: Severity::Violation,
                            message: format!(
                                "expected at most {} value(s), found {}",
                                max,
                                values.len()
                            ),
                        });
                    }
                }
                ConstraintKind::Pattern(pattern) => {
                    if let Ok(re) = regex::Regex::new(pattern) {
                        for value in values {
                            if !re.is_match(value) {
                                violations.push(Violation {
                                    focus_node: instance.to_string(),
                                    path: property.path.clone(),
                                    severity: Severity::Violation,
                                    message: format!(
                                        "value '{}' does not match pattern '{}'",
                                        value, pattern
                                    ),
                                });
                            }
                        }
                    }
                }
                ConstraintKind::MinInclusive(min) => {
                    for value in values {
                        if let Ok(n) = value.parse::<f64>() {
                            if n < *min {
                                violations.push(Violation {
                                    focus_node: instance.to_string(),
                                    path: property.path.clone(),
                                    severity: Severity::Violation,
                                    message: format!("value {} is below minimum {}", n, min),
                                });
                            }
                        }
                    }
                }
                ConstraintKind::MaxInclusive(max) => {
                    for value in values {
                        if let Ok(n) = value.parse::<f64>() {
                            if n > *max {
                                violations.push(Violation {
                                    focus_node: instance.to_string(),
                                    path: property.path.clone(),
                                    severity: Severity::Violation,
                                    message: format!("value {} exceeds maximum {}", n, max),
                                });
                            }
                        }
                    }
                }
                ConstraintKind::Datatype(datatype) => {
                    for value in values {
                        if !literal_matches_datatype(value, datatype) {
                            violations.push(Violation {
                                focus_node: instance.to_string(),
                                path: property.path.clone(),
                                severity: Severity::Violation,
                                message: format!("value '{}' does not match datatype '{}'", value, datatype),
                            });
                        }
                    }
                }
            }
        }
        violations
    }
}

/// Checks `value`'s lexical form against a `sh:datatype` IRI's local name. Unrecognized
/// datatype IRIs (anything outside the common XSD set) are accepted rather than flagged,
/// matching the "falls back to format sanity when no reference is available" pattern used
/// elsewhere in this crate (e.g. `quality::QualityEngine::accuracy`).
fn literal_matches_datatype(value: &str, datatype_iri: &str) -> bool {
    let local = datatype_iri.rsplit(['#', '/']).next().unwrap_or(datatype_iri);
    match local {
        "integer" | "int" | "long" | "short" | "nonNegativeInteger" | "positiveInteger" => value.parse::<i64>().is_ok(),
        "decimal" | "double" | "float" => value.parse::<f64>().is_ok(),
        "boolean" => value == "true" || value == "false",
        "dateTime" => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
        "date" => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        "string" => true,
        _ => true,
    }
}

impl Default for ShaclValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn shape_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix ex: <http://example.org/> .
            ex:SubstanceShape a sh:NodeShape ;
                sh:targetClass ex:HazardousSubstance ;
                sh:property [ sh:path ex:name ; sh:minCount 1 ] .
            "#
        )
        .unwrap();
        file
    }

    #[test]
    fn flags_missing_required_property() {
        let mut validator = ShaclValidator::new();
        let shape_file = shape_file();
        validator.load_file(shape_file.path()).unwrap();

        let data = Store::new().unwrap();
        data.load_from_reader(
            oxigraph::io::RdfFormat::Turtle,
            Cursor::new(
                b"@prefix ex: <http://example.org/> . ex:s1 a ex:HazardousSubstance ." as &[u8],
            ),
        )
        .unwrap();

        let report = validator.validate(&data).unwrap();
        assert!(!report.conforms);
        assert_eq!(report.violations.len(), 1);
    }

    #[test]
    fn flags_datatype_mismatch() {
        let mut validator = ShaclValidator::new();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
            @prefix ex: <http://example.org/> .
            ex:SubstanceShape a sh:NodeShape ;
                sh:targetClass ex:HazardousSubstance ;
                sh:property [ sh:path ex:molecularWeight ; sh:datatype xsd:decimal ] .
            "#
        )
        .unwrap();
        validator.load_file(file.path()).unwrap();

        let data = Store::new().unwrap();
        data.load_from_reader(
            oxigraph::io::RdfFormat::Turtle,
            Cursor::new(
                b"@prefix ex: <http://example.org/> . ex:s1 a ex:HazardousSubstance ; ex:molecularWeight \"not-a-number\" ."
                    as &[u8],
            ),
        )
        .unwrap();

        let report = validator.validate(&data).unwrap();
        assert!(!report.conforms);
        assert!(report.violations.iter().any(|v| v.message.contains("datatype")));
    }

    #[test]
    fn conforms_when_required_property_present() {
        let mut validator = ShaclValidator::new();
        let shape_file = shape_file();
        validator.load_file(shape_file.path()).unwrap();

        let data = Store::new().unwrap();
        data.load_from_reader(
            oxigraph::io::RdfFormat::Turtle,
            Cursor::new(
                b"@prefix ex: <http://example.org/> . ex:s1 a ex:HazardousSubstance ; ex:name \"Sulfuric acid\" ."
                    as &[u8],
            ),
        )
        .unwrap();

        let report = validator.validate(&data).unwrap();
        assert!(report.conforms);
    }
}
