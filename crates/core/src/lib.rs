pub mod chunking;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod ingest;
pub mod keywords;
pub mod languages;
pub mod models;
pub mod orchestrator;
pub mod scoring;
pub mod stores;
pub mod traits;

pub use chunking::{chunk_text, normalize_whitespace, ChunkingConfig};
pub use error::{IngestError, QueryError};
pub use extractor::{extract_pdf_text, extract_text, FileKind, MIN_EXTRACTED_CHARS};
pub use gateway::AiGateway;
pub use ingest::{IngestionPipeline, IngestionReport};
pub use keywords::{parse_keyword_list, synthesize_keywords};
pub use languages::LanguageDirective;
pub use models::{
    ChatMessage, ChatRole, ChunkRecord, Document, DocumentCategory, DocumentStatus,
    IngestionOptions, RetrievalOptions, RetrievedChunk, SourceRecord, SourceRef,
};
pub use orchestrator::{QueryCoordinator, QueryOutcome, QueryRequest};
pub use scoring::{rank_chunks, score_chunk};
pub use stores::{BucketStore, RestRecordStore};
pub use traits::{CompletionStream, ObjectStorage, RecordStore, TextGenerator};
