//! JSON and CSV extraction: JSON is re-serialized with a top-level key listing; CSV is
//! converted to a pipe-joined tabular string rendering.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ExtractionError;

pub fn extract_json(path: &Path) -> Result<(String, HashMap<String, String>), ExtractionError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ExtractionError::ReadFailed {
        path: path.to_string_lossy().into_owned(),
        source,
    })?;

    let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| ExtractionError::ExtractFailed {
        path: path.to_string_lossy().into_owned(),
        message: e.to_string(),
    })?;

    let top_level_keys: Vec<String> = match &value {
        serde_json::Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };

    let pretty = serde_json::to_string_pretty(&value).map_err(|e| ExtractionError::ExtractFailed {
        path: path.to_string_lossy().into_owned(),
        message: e.to_string(),
    })?;

    let mut metadata = HashMap::new();
    metadata.insert("top_level_keys".to_string(), top_level_keys.join(","));

    Ok((pretty, metadata))
}

pub fn extract_csv(path: &Path) -> Result<(String, HashMap<String, String>), ExtractionError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| ExtractionError::ExtractFailed {
        path: path.to_string_lossy().into_owned(),
        message: e.to_string(),
    })?;

    let headers = reader
        .headers()
        .map_err(|e| ExtractionError::ExtractFailed {
            path: path.to_string_lossy().into_owned(),
            message: e.to_string(),
        })?
        .clone();

    let mut lines = vec![headers.iter().collect::<Vec<_>>().join(" | ")];
    let mut row_count = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| ExtractionError::ExtractFailed {
            path: path.to_string_lossy().into_owned(),
            message: e.to_string(),
        })?;
        lines.push(record.iter().collect::<Vec<_>>().join(" | "));
        row_count += 1;
    }

    let mut metadata = HashMap::new();
    metadata.insert("row_count".to_string(), row_count.to_string());
    metadata.insert("column_count".to_string(), headers.len().to_string());

    Ok((lines.join("\n"), metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn json_extraction_lists_top_level_keys() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"name": "Sulfuric Acid", "hazard_class": "corrosive"}}"#).unwrap();
        let (content, metadata) = extract_json(file.path()).unwrap();
        assert!(content.contains("Sulfuric Acid"));
        let keys = metadata.get("top_level_keys").unwrap();
        assert!(keys.contains("name") && keys.contains("hazard_class"));
    }

    #[test]
    fn csv_extraction_renders_pipe_joined_rows() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "name,hazard_class\nSulfuric Acid,corrosive\n").unwrap();
        let (content, metadata) = extract_csv(file.path()).unwrap();
        assert!(content.contains("name | hazard_class"));
        assert!(content.contains("Sulfuric Acid | corrosive"));
        assert_eq!(metadata.get("row_count").unwrap(), "1");
    }
}
