//! Thin CLI binary for manually exercising the two pipelines.
//!
//! Per spec §6 ("No CLI is part of the core. The core is invoked programmatically by a
//! thin orchestration layer") this binary is explicitly outside the specified core: it
//! only wires a `Config`, a `GraphStore`, and a `VectorStore` together and calls into the
//! library, mirroring the teacher's `clap`-subcommand `main.rs`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hazsafe_kg::config::Config;
use hazsafe_kg::graph::GraphStore;
use hazsafe_kg::pipeline::{run_document_to_graph_pipeline, run_ontology_to_graph_pipeline};
use hazsafe_kg::quality::QualityEngine;
use hazsafe_kg::text::DocumentType;
use hazsafe_kg::vector::build_vector_store;

#[derive(Parser)]
#[command(name = "hazsafe-kg")]
#[command(about = "Hazardous-substance knowledge graph pipelines", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults are used when absent or unreadable.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Ontology→Graph pipeline (C9) over a directory of ontology files.
    IngestOntology {
        /// Defaults to the configured ontology directory when omitted.
        directory: Option<PathBuf>,
    },
    /// Run the Document→Graph pipeline (C10) over a single document.
    IngestDocument {
        path: PathBuf,
        /// One of safety, engineering, regulatory, research, general; omit to auto-classify.
        #[arg(long)]
        doc_type: Option<String>,
    },
    /// Print the effective configuration as TOML.
    ShowConfig,
}

fn parse_doc_type(raw: &str) -> Option<DocumentType> {
    match raw.to_lowercase().as_str() {
        "safety" => Some(DocumentType::Safety),
        "engineering" => Some(DocumentType::Engineering),
        "regulatory" => Some(DocumentType::Regulatory),
        "research" => Some(DocumentType::Research),
        "general" => Some(DocumentType::General),
        _ => None,
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = cli.config.map(Config::load_or_default).unwrap_or_default();

    match cli.command {
        Commands::IngestOntology { directory } => {
            let dir = directory.unwrap_or_else(|| PathBuf::from(&config.ontology.directory));
            let mut graph = GraphStore::new();
            graph.connect(&config.graph.uri, &config.graph.user, &config.graph.password, &config.graph.database);
            let quality = QualityEngine::new();
            let report = run_ontology_to_graph_pipeline(&dir, &quality, &mut graph);
            println!("{}", serde_json::to_string_pretty(&report).expect("report serializes"));
            if !report.overall_success {
                std::process::exit(1);
            }
        }
        Commands::IngestDocument { path, doc_type } => {
            let requested = doc_type.as_deref().and_then(parse_doc_type);
            let mut graph = GraphStore::new();
            graph.connect(&config.graph.uri, &config.graph.user, &config.graph.password, &config.graph.database);
            let mut vector = build_vector_store(&config.vector);
            if let Err(e) = vector.initialize() {
                eprintln!("failed to initialize vector store: {e}");
                std::process::exit(1);
            }
            let report = run_document_to_graph_pipeline(
                &path,
                requested,
                &mut graph,
                vector.as_mut(),
                config.text.chunk_size,
                config.text.chunk_overlap,
            );
            println!("{}", serde_json::to_string_pretty(&report).expect("report serializes"));
            if !report.overall_success {
                std::process::exit(1);
            }
        }
        Commands::ShowConfig => {
            println!("{}", toml::to_string_pretty(&config).expect("config serializes"));
        }
    }
}
