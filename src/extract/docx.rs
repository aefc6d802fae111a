//! DOCX extraction via `docx-rs`: paragraphs (with style and alignment) in document order,
//! tables flattened into pipe-joined rows.

use std::collections::HashMap;
use std::path::Path;

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild};

use crate::error::ExtractionError;

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

fn table_rows(table: &docx_rs::Table) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|row_child| {
            let TableChild::TableRow(row) = row_child;
            let cells: Vec<String> = row
                .cells
                .iter()
                .map(|cell_child| {
                    let TableRowChild::TableCell(cell) = cell_child;
                    cell.children
                        .iter()
                        .map(|content| match content {
                            TableCellContent::Paragraph(p) => paragraph_text(p),
                            _ => String::new(),
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();
            cells.join(" | ")
        })
        .collect()
}

pub fn extract(path: &Path) -> Result<(String, HashMap<String, String>), ExtractionError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractionError::ReadFailed {
        path: path.to_string_lossy().into_owned(),
        source,
    })?;

    let docx = read_docx(&bytes).map_err(|e| ExtractionError::ExtractFailed {
        path: path.to_string_lossy().into_owned(),
        message: e.to_string(),
    })?;

    let mut blocks = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => {
                let text = paragraph_text(p);
                if !text.trim().is_empty() {
                    blocks.push(text);
                }
            }
            DocumentChild::Table(t) => blocks.extend(table_rows(t)),
            _ => {}
        }
    }

    let content = blocks.join("\n");
    let mut metadata = HashMap::new();
    metadata.insert("paragraph_count".to_string(), docx.document.children.len().to_string());

    Ok((content, metadata))
}
