//! Process-wide configuration (spec §6: "Configuration (process-wide, read at startup)").
//!
//! Mirrors the teacher's nested-struct-plus-TOML convention, but the sections are the ones
//! the spec actually names: graph backend connection, vector backend selection, quality
//! thresholds, chunking parameters, and the ontology directory path. Once loaded,
//! configuration is immutable for the lifetime of the process (spec §5: "Configuration...
//! is immutable after initialization").

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub graph: GraphConfig,
    pub vector: VectorConfig,
    pub quality: QualityConfig,
    pub text: TextConfig,
    pub ontology: OntologyDirConfig,
    pub logging: LoggingConfig,
}

/// Connection descriptor for the graph backend (C2). The backend implementation itself is
/// out of scope per spec §1; this only carries what a real driver would need to connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    Local,
    RemoteA,
    RemoteB,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    pub backend: VectorBackend,
    /// Embedding dimension; defaults by selector (1536 local-equivalent / openai-style,
    /// 384 for remote-a, 1024 for remote-b, 3072 reserved for a larger remote-a model)
    /// per spec §6.
    pub embedding_dim: usize,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub index_name: String,
    /// Directory the local backend persists `documents.json`/`embeddings.json` under.
    pub local_store_dir: String,
}

impl VectorBackend {
    pub fn default_embedding_dim(&self) -> usize {
        match self {
            VectorBackend::Local => 1536,
            VectorBackend::RemoteA => 384,
            VectorBackend::RemoteB => 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub completeness_threshold: f64,
    pub accuracy_threshold: f64,
    pub consistency_threshold: f64,
    pub timeliness_threshold: f64,
    pub uniqueness_threshold: f64,
    pub minimum_overall_for_storage: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        QualityConfig {
            completeness_threshold: 0.8,
            accuracy_threshold: 0.9,
            consistency_threshold: 0.85,
            timeliness_threshold: 0.95,
            uniqueness_threshold: 0.9,
            minimum_overall_for_storage: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        TextConfig {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyDirConfig {
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            graph: GraphConfig {
                uri: "bolt://localhost:7687".to_string(),
                user: "neo4j".to_string(),
                password: String::new(),
                database: "hazsafe".to_string(),
            },
            vector: VectorConfig {
                backend: VectorBackend::Local,
                embedding_dim: VectorBackend::Local.default_embedding_dim(),
                api_key: None,
                endpoint: None,
                index_name: "hazardsafe-kg".to_string(),
                local_store_dir: "data/rag/vector_db/local".to_string(),
            },
            quality: QualityConfig::default(),
            text: TextConfig::default(),
            ontology: OntologyDirConfig {
                directory: "ontologies".to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|_| {
            ConfigError::FileNotFound(path_ref.to_string_lossy().to_string())
        })?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("failed to load config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        fs::write(path, content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_matches_spec_thresholds() {
        let config = Config::default();
        assert_eq!(config.quality.completeness_threshold, 0.8);
        assert_eq!(config.quality.accuracy_threshold, 0.9);
        assert_eq!(config.quality.minimum_overall_for_storage, 0.7);
        assert_eq!(config.text.chunk_size, 1000);
        assert_eq!(config.text.chunk_overlap, 200);
    }

    #[test]
    fn vector_backend_default_dims_match_spec() {
        assert_eq!(VectorBackend::Local.default_embedding_dim(), 1536);
        assert_eq!(VectorBackend::RemoteA.default_embedding_dim(), 384);
        assert_eq!(VectorBackend::RemoteB.default_embedding_dim(), 1024);
    }

    #[test]
    fn round_trips_through_toml_file() {
        let config = Config::default();
        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();
        let loaded = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.quality.completeness_threshold,
            loaded.quality.completeness_threshold
        );
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = Config::load_or_default("/nonexistent/path/config.toml");
        assert_eq!(config.vector.backend, VectorBackend::Local);
    }
}
