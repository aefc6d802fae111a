//! The validation engine (C4) and compatibility rules (C5): spec §4.4/§4.5.
//!
//! Reworked from the teacher's security-input-validation module
//! (`input_validator.rs`'s fluent `ValidationContext` builder, `sanitizer.rs`'s
//! `SanitizationConfig`) into the domain's structural/semantic/compatibility checks: this
//! system validates hazardous-substance records against a declared schema and a fixed
//! incompatibility table, not HTTP request bodies against injection patterns, so the field
//! names changed but the "accumulate errors, never raise" idiom did not.

pub mod compatibility;
pub mod csv_batch;
pub mod formula;
pub mod semantic;

pub use compatibility::{CompatibilityIssue, CompatibilityReport, CompatibilityRules};
pub use csv_batch::{CsvValidationReport, CsvValidator, TabularBatch};
pub use formula::validate_formula;
pub use semantic::{validate_record, SemanticFinding};

use std::collections::HashMap;

/// The five column datatypes the CSV structural validator recognizes (spec §4.4 check 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Str,
    Float,
    StringOrFloat,
    Date,
}

/// A declared column: its type, optional numeric range, and whether it is required.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub required: bool,
    pub range: Option<(f64, f64)>,
    /// `true` if the range bounds are exclusive (molecular weight: `0 < x < 10000`).
    pub exclusive: bool,
    pub vocabulary: Option<&'static [&'static str]>,
}

impl ColumnSpec {
    const fn required(name: &'static str, column_type: ColumnType) -> Self {
        ColumnSpec { name, column_type, required: true, range: None, exclusive: false, vocabulary: None }
    }

    const fn optional(name: &'static str, column_type: ColumnType) -> Self {
        ColumnSpec { name, column_type, required: false, range: None, exclusive: false, vocabulary: None }
    }

    const fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    const fn exclusive_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self.exclusive = true;
        self
    }

    const fn with_vocabulary(mut self, vocabulary: &'static [&'static str]) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }
}

pub const HAZARD_CLASS_VOCAB: &[&str] = &[
    "flammable", "toxic", "corrosive", "explosive", "oxidizing", "environmental",
    "health", "irritant", "sensitizer", "carcinogen", "mutagen", "reproductive_toxin",
];
pub const MATERIAL_VOCAB: &[&str] = &[
    "stainless_steel", "glass", "plastic", "aluminum", "carbon_steel", "titanium", "ceramic",
];
pub const TEST_TYPE_VOCAB: &[&str] = &[
    "pressure_test", "leak_test", "material_compatibility", "temperature_test", "corrosion_test", "impact_test",
];
pub const RISK_LEVEL_VOCAB: &[&str] = &["low", "medium", "high", "critical"];

/// Returns the declared column schema for one of the five spec §3 entity kinds. Returns
/// `None` for an unrecognized kind name.
pub fn schema_for_kind(kind: &str) -> Option<Vec<ColumnSpec>> {
    match kind {
        "HazardousSubstance" => Some(vec![
            ColumnSpec::required("name", ColumnType::Str),
            ColumnSpec::optional("chemical_formula", ColumnType::Str),
            ColumnSpec::required("molecular_weight", ColumnType::Float).exclusive_range(0.0, 10000.0),
            ColumnSpec::required("hazard_class", ColumnType::Str).with_vocabulary(HAZARD_CLASS_VOCAB),
            ColumnSpec::optional("flash_point", ColumnType::StringOrFloat),
            ColumnSpec::optional("boiling_point", ColumnType::Float).with_range(-273.0, 5000.0),
            ColumnSpec::optional("melting_point", ColumnType::Float).with_range(-273.0, 5000.0),
            ColumnSpec::optional("density", ColumnType::Float).with_range(0.0, 100.0),
            ColumnSpec::optional("cas_number", ColumnType::Str),
            ColumnSpec::optional("description", ColumnType::Str),
        ]),
        "Container" => Some(vec![
            ColumnSpec::required("name", ColumnType::Str),
            ColumnSpec::required("material", ColumnType::Str).with_vocabulary(MATERIAL_VOCAB),
            ColumnSpec::required("capacity", ColumnType::Float).with_range(0.0, 100000.0),
            ColumnSpec::optional("capacity_unit", ColumnType::Str),
            ColumnSpec::optional("pressure_rating", ColumnType::Float).with_range(0.0, 10000.0),
            ColumnSpec::optional("temperature_rating", ColumnType::Float).with_range(-200.0, 1000.0),
            ColumnSpec::optional("manufacturer", ColumnType::Str),
            ColumnSpec::optional("model", ColumnType::Str),
        ]),
        "SafetyTest" => Some(vec![
            ColumnSpec::required("name", ColumnType::Str),
            ColumnSpec::required("test_type", ColumnType::Str).with_vocabulary(TEST_TYPE_VOCAB),
            ColumnSpec::optional("standard", ColumnType::Str),
            ColumnSpec::optional("method", ColumnType::Str),
            ColumnSpec::optional("duration", ColumnType::Float).with_range(0.0, 10000.0),
            ColumnSpec::optional("temperature", ColumnType::Float).with_range(-273.0, 5000.0),
            ColumnSpec::optional("pressure", ColumnType::Float).with_range(0.0, 10000.0),
            ColumnSpec::optional("result", ColumnType::Str),
        ]),
        "RiskAssessment" => Some(vec![
            ColumnSpec::required("title", ColumnType::Str),
            ColumnSpec::required("substance_id", ColumnType::Str),
            ColumnSpec::required("risk_level", ColumnType::Str).with_vocabulary(RISK_LEVEL_VOCAB),
            ColumnSpec::optional("hazards", ColumnType::Str),
            ColumnSpec::optional("mitigation", ColumnType::Str),
            ColumnSpec::optional("ppe", ColumnType::Str),
            ColumnSpec::optional("storage_requirements", ColumnType::Str),
            ColumnSpec::optional("emergency_procedures", ColumnType::Str),
            ColumnSpec::optional("assessor", ColumnType::Str),
            ColumnSpec::optional("date", ColumnType::Date),
        ]),
        "Location" => Some(vec![
            ColumnSpec::required("name", ColumnType::Str),
            ColumnSpec::required("location_type", ColumnType::Str),
            ColumnSpec::optional("building", ColumnType::Str),
            ColumnSpec::optional("floor", ColumnType::Str),
            ColumnSpec::optional("room", ColumnType::Str),
        ]),
        _ => None,
    }
}

/// Parses a value against a declared type, returning `Ok` with a normalized string on
/// success. Used by both the CSV structural validator (C4) and the quality engine (C6).
pub fn parses_as(value: &str, column_type: ColumnType) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true; // emptiness is a completeness concern, not a type concern
    }
    match column_type {
        ColumnType::Str => true,
        ColumnType::Float => value.parse::<f64>().is_ok(),
        ColumnType::StringOrFloat => true,
        ColumnType::Date => {
            chrono::DateTime::parse_from_rfc3339(value).is_ok()
                || chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        }
    }
}

pub type Row = HashMap<String, String>;
