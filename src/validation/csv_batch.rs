//! CSV-batch structural validation (spec §4.4): the single authority for "is this tabular
//! batch, declared as one of the five entity kinds, structurally well-formed".

use std::collections::{HashMap, HashSet};

use super::{parses_as, schema_for_kind, Row};

/// A tabular batch: an ordered column list plus rows keyed by column name. Column order is
/// kept (not just a `HashSet`) because "present columns still type-check" (spec §8) needs
/// to know which declared columns were actually supplied, independent of row content.
#[derive(Debug, Clone, Default)]
pub struct TabularBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TabularBatch {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        TabularBatch { columns, rows }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CsvValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_rows: usize,
    pub valid_rows: usize,
}

pub struct CsvValidator;

impl CsvValidator {
    /// Runs the five ordered checks from spec §4.4 against `batch`, declared as entity
    /// kind `kind`. Unknown kinds produce a single schema error rather than panicking.
    pub fn validate_batch(kind: &str, batch: &TabularBatch) -> CsvValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let Some(schema) = schema_for_kind(kind) else {
            errors.push(format!("unrecognized entity kind '{}'", kind));
            return CsvValidationReport {
                valid: false,
                errors,
                warnings,
                total_rows: batch.rows.len(),
                valid_rows: 0,
            };
        };

        // Check 1: every required column is present. Missing columns still let the later
        // checks run against whichever columns *are* present (spec: "subsequent checks
        // still run on present columns").
        for column in &schema {
            if column.required && !batch.has_column(column.name) {
                errors.push(format!("missing required column '{}'", column.name));
            }
        }

        let mut row_errors = vec![false; batch.rows.len()];

        for column in &schema {
            if !batch.has_column(column.name) {
                continue;
            }

            for (row_idx, row) in batch.rows.iter().enumerate() {
                let Some(value) = row.get(column.name) else { continue };
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    continue;
                }

                // Check 2: declared type.
                if !parses_as(trimmed, column.column_type) {
                    errors.push(format!(
                        "row {}: column '{}' value '{}' does not match declared type",
                        row_idx, column.name, trimmed
                    ));
                    row_errors[row_idx] = true;
                    continue;
                }

                // Check 3: numeric range, when declared.
                if let Some((min, max)) = column.range {
                    if let Ok(n) = trimmed.parse::<f64>() {
                        let out_of_range = if column.exclusive {
                            !(n > min && n < max)
                        } else {
                            !(n >= min && n <= max)
                        };
                        if out_of_range {
                            errors.push(format!(
                                "row {}: column '{}' value {} is outside the allowed range [{}, {}]",
                                row_idx, column.name, n, min, max
                            ));
                            row_errors[row_idx] = true;
                        }
                    }
                }

                // Check 4: vocabulary membership, when declared.
                if let Some(vocab) = column.vocabulary {
                    let normalized = trimmed.to_lowercase();
                    if !vocab.contains(&normalized.as_str()) {
                        errors.push(format!(
                            "row {}: column '{}' value '{}' is not in the fixed vocabulary",
                            row_idx, column.name, trimmed
                        ));
                        row_errors[row_idx] = true;
                    }
                }
            }
        }

        // Check 5: duplicate names are warnings, never errors.
        if batch.has_column("name") {
            let mut seen: HashMap<String, Vec<usize>> = HashMap::new();
            for (row_idx, row) in batch.rows.iter().enumerate() {
                if let Some(name) = row.get("name") {
                    let normalized = name.trim().to_lowercase();
                    if !normalized.is_empty() {
                        seen.entry(normalized).or_default().push(row_idx);
                    }
                }
            }
            for (name, indices) in seen {
                if indices.len() > 1 {
                    warnings.push(format!(
                        "duplicate name '{}' at rows {:?}",
                        name, indices
                    ));
                }
            }
        }

        let valid_rows = row_errors.iter().filter(|has_error| !**has_error).count();
        let distinct_invalid_rows: HashSet<usize> = row_errors
            .iter()
            .enumerate()
            .filter(|(_, has_error)| **has_error)
            .map(|(idx, _)| idx)
            .collect();
        if !distinct_invalid_rows.is_empty() {
            let mut indices: Vec<usize> = distinct_invalid_rows.iter().copied().collect();
            indices.sort_unstable();
            warnings.push(format!(
                "{} row(s) contain at least one error: rows {:?}",
                indices.len(),
                indices
            ));
        }

        CsvValidationReport {
            valid: errors.is_empty(),
            warnings,
            total_rows: batch.rows.len(),
            valid_rows: if errors.is_empty() { batch.rows.len() } else { valid_rows },
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn happy_path_substance_batch_has_no_errors() {
        let batch = TabularBatch::new(
            vec!["name", "chemical_formula", "molecular_weight", "hazard_class"]
                .into_iter()
                .map(String::from)
                .collect(),
            vec![row(&[
                ("name", "Sulfuric Acid"),
                ("chemical_formula", "H2SO4"),
                ("molecular_weight", "98.08"),
                ("hazard_class", "corrosive"),
            ])],
        );

        let report = CsvValidator::validate_batch("HazardousSubstance", &batch);
        assert!(report.valid);
        assert_eq!(report.errors.len(), 0);
        assert_eq!(report.valid_rows, 1);
    }

    #[test]
    fn unknown_hazard_class_is_one_error() {
        let batch = TabularBatch::new(
            vec!["name", "molecular_weight", "hazard_class"].into_iter().map(String::from).collect(),
            vec![row(&[("name", "X"), ("molecular_weight", "10"), ("hazard_class", "unknown_hazard")])],
        );
        let report = CsvValidator::validate_batch("HazardousSubstance", &batch);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("hazard_class"));
    }

    #[test]
    fn missing_one_required_column_yields_exactly_one_error_for_it() {
        let batch = TabularBatch::new(
            vec!["name", "molecular_weight"].into_iter().map(String::from).collect(),
            vec![row(&[("name", "X"), ("molecular_weight", "10")])],
        );
        let report = CsvValidator::validate_batch("HazardousSubstance", &batch);
        let missing_col_errors: Vec<_> = report
            .errors
            .iter()
            .filter(|e| e.contains("missing required column"))
            .collect();
        assert_eq!(missing_col_errors.len(), 1);
        assert!(missing_col_errors[0].contains("hazard_class"));
    }

    #[test]
    fn duplicate_names_are_warnings_not_errors() {
        let batch = TabularBatch::new(
            vec!["name", "molecular_weight", "hazard_class"].into_iter().map(String::from).collect(),
            vec![
                row(&[("name", "Acid"), ("molecular_weight", "10"), ("hazard_class", "corrosive")]),
                row(&[("name", "acid"), ("molecular_weight", "20"), ("hazard_class", "toxic")]),
            ],
        );
        let report = CsvValidator::validate_batch("HazardousSubstance", &batch);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn invalid_rows_are_reported_with_their_indices() {
        let batch = TabularBatch::new(
            vec!["name", "molecular_weight", "hazard_class"].into_iter().map(String::from).collect(),
            vec![
                row(&[("name", "Acid"), ("molecular_weight", "10"), ("hazard_class", "corrosive")]),
                row(&[("name", "Bad"), ("molecular_weight", "not-a-number"), ("hazard_class", "toxic")]),
            ],
        );
        let report = CsvValidator::validate_batch("HazardousSubstance", &batch);
        assert!(!report.valid);
        assert!(report.warnings.iter().any(|w| w.contains('1') && w.contains("row")));
    }

    #[test]
    fn molecular_weight_boundary_values() {
        let make = |mw: &str| {
            TabularBatch::new(
                vec!["name", "molecular_weight", "hazard_class"].into_iter().map(String::from).collect(),
                vec![row(&[("name", "X"), ("molecular_weight", mw), ("hazard_class", "toxic")])],
            )
        };
        assert!(!CsvValidator::validate_batch("HazardousSubstance", &make("0")).valid);
        assert!(!CsvValidator::validate_batch("HazardousSubstance", &make("10000")).valid);
        assert!(CsvValidator::validate_batch("HazardousSubstance", &make("0.000001")).valid);
        assert!(CsvValidator::validate_batch("HazardousSubstance", &make("9999.9999")).valid);
    }
}
