//! The local file-based vector backend: persists documents and embeddings to two JSON
//! files under a configured directory and recomputes similarity on each query (spec §4.3).

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::{cosine_similarity, fallback_embedding, ScoredDocument, VectorDocument, VectorStats, VectorStore};
use crate::error::{VectorError, VectorResult};

pub struct LocalVectorStore {
    directory: PathBuf,
    embedding_dim: usize,
    documents: HashMap<String, VectorDocument>,
    embeddings: HashMap<String, Vec<f64>>,
}

impl LocalVectorStore {
    pub fn new(directory: impl Into<PathBuf>, embedding_dim: usize) -> Self {
        LocalVectorStore {
            directory: directory.into(),
            embedding_dim,
            documents: HashMap::new(),
            embeddings: HashMap::new(),
        }
    }

    fn documents_path(&self) -> PathBuf {
        self.directory.join("documents.json")
    }

    fn embeddings_path(&self) -> PathBuf {
        self.directory.join("embeddings.json")
    }

    fn persist(&self) -> VectorResult<()> {
        let docs_json = serde_json::to_string_pretty(&self.documents)
            .map_err(|e| VectorError::PersistenceFailed(e.to_string()))?;
        fs::write(self.documents_path(), docs_json)
            .map_err(|e| VectorError::PersistenceFailed(e.to_string()))?;

        let embeddings_json = serde_json::to_string_pretty(&self.embeddings)
            .map_err(|e| VectorError::PersistenceFailed(e.to_string()))?;
        fs::write(self.embeddings_path(), embeddings_json)
            .map_err(|e| VectorError::PersistenceFailed(e.to_string()))?;
        Ok(())
    }

    fn load(&mut self) -> VectorResult<()> {
        if let Ok(content) = fs::read_to_string(self.documents_path()) {
            self.documents = serde_json::from_str(&content).unwrap_or_default();
        }
        if let Ok(content) = fs::read_to_string(self.embeddings_path()) {
            self.embeddings = serde_json::from_str(&content).unwrap_or_default();
        }
        Ok(())
    }
}

impl VectorStore for LocalVectorStore {
    fn initialize(&mut self) -> VectorResult<()> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| VectorError::PersistenceFailed(e.to_string()))?;
        self.load()
    }

    /// Upserts replace any existing record with the same id, which is how C10's
    /// idempotence requirement (re-running a document's pipeline must not duplicate
    /// chunks) is satisfied: chunk ids are derived deterministically from
    /// `(document_id, chunk_index)`, so a second run overwrites rather than appends.
    fn upsert_batch(&mut self, documents: Vec<VectorDocument>) -> VectorResult<usize> {
        let mut count = 0;
        for mut doc in documents {
            let embedding = doc
                .embedding
                .take()
                .unwrap_or_else(|| fallback_embedding(&doc.text, self.embedding_dim));
            self.embeddings.insert(doc.id.clone(), embedding);
            self.documents.insert(doc.id.clone(), doc);
            count += 1;
        }
        self.persist()?;
        Ok(count)
    }

    fn search(&self, query_text: &str, k: usize) -> VectorResult<Vec<ScoredDocument>> {
        let query_embedding = fallback_embedding(query_text, self.embedding_dim);
        let mut scored: Vec<ScoredDocument> = self
            .documents
            .values()
            .map(|doc| {
                let embedding = self
                    .embeddings
                    .get(&doc.id)
                    .cloned()
                    .unwrap_or_else(|| fallback_embedding(&doc.text, self.embedding_dim));
                let score = cosine_similarity(&query_embedding, &embedding);
                ScoredDocument {
                    document: doc.clone(),
                    score,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn delete(&mut self, id: &str) -> VectorResult<bool> {
        let removed = self.documents.remove(id).is_some();
        self.embeddings.remove(id);
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn statistics(&self) -> VectorStats {
        VectorStats {
            document_count: self.documents.len(),
            embedding_dim: self.embedding_dim,
            backend: "local".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn doc(id: &str, text: &str) -> VectorDocument {
        VectorDocument {
            id: id.to_string(),
            text: text.to_string(),
            embedding: None,
            source: "test".to_string(),
            kind: "chunk".to_string(),
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn upsert_persists_to_both_json_files() {
        let dir = TempDir::new().unwrap();
        let mut store = LocalVectorStore::new(dir.path(), 64);
        store.initialize().unwrap();
        store.upsert_batch(vec![doc("d1", "sulfuric acid is corrosive")]).unwrap();

        assert!(dir.path().join("documents.json").exists());
        assert!(dir.path().join("embeddings.json").exists());
        assert_eq!(store.statistics().document_count, 1);
    }

    #[test]
    fn reupsert_of_same_id_does_not_duplicate() {
        let dir = TempDir::new().unwrap();
        let mut store = LocalVectorStore::new(dir.path(), 64);
        store.initialize().unwrap();
        store.upsert_batch(vec![doc("d1", "text one")]).unwrap();
        store.upsert_batch(vec![doc("d1", "text one updated")]).unwrap();
        assert_eq!(store.statistics().document_count, 1);
        assert_eq!(store.documents.get("d1").unwrap().text, "text one updated");
    }

    #[test]
    fn search_ranks_more_similar_text_higher() {
        let dir = TempDir::new().unwrap();
        let mut store = LocalVectorStore::new(dir.path(), 64);
        store.initialize().unwrap();
        store
            .upsert_batch(vec![
                doc("d1", "sulfuric acid is corrosive and stored in glass"),
                doc("d2", "unrelated text about shipping logistics"),
            ])
            .unwrap();

        let results = store.search("sulfuric acid corrosive glass", 2).unwrap();
        assert_eq!(results[0].document.id, "d1");
    }

    #[test]
    fn delete_removes_document_and_embedding() {
        let dir = TempDir::new().unwrap();
        let mut store = LocalVectorStore::new(dir.path(), 64);
        store.initialize().unwrap();
        store.upsert_batch(vec![doc("d1", "text")]).unwrap();
        assert!(store.delete("d1").unwrap());
        assert_eq!(store.statistics().document_count, 0);
    }
}
