use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an uploaded document. `Ready` and `Error` are terminal;
/// a failed document requires a fresh upload, there is no retry loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Ready,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Error => "error",
        }
    }
}

/// Category tag derived from the declared file type at upload time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Report,
    Dataset,
    Structured,
    Notes,
    Other,
}

/// An uploaded document as persisted in the `knowledge_documents` table.
/// Mutated only by the ingestion pipeline, never by the query pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub file_name: String,
    pub file_path: String,
    pub byte_size: u64,
    pub status: DocumentStatus,
    pub category: DocumentCategory,
    pub chunks_count: u32,
    pub uploaded_at: DateTime<Utc>,
}

/// One retrieval unit: a bounded, overlapping slice of a document's
/// extracted text. Immutable once written; re-ingestion appends a new
/// generation of chunks instead of patching old ones.
///
/// `keywords` is `None` for chunks past the per-document synthesis bound
/// and for chunks whose synthesis call failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub document_id: String,
    pub source_id: Option<String>,
    pub chunk_index: u32,
    pub text: String,
    pub keywords: Option<Vec<String>>,
}

/// Provenance record summarizing one ingested document, persisted in the
/// `data_sources` table alongside the chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub source_type: String,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub chunks_count: u32,
    pub document_id: String,
    pub created_at: DateTime<Utc>,
}

/// A document that contributed at least one retained chunk to a query's
/// grounding context. Returned to callers as out-of-band metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRef {
    pub name: String,
    pub category: DocumentCategory,
}

/// A chunk retained by the retrieval scorer, with its relevance score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: ChunkRecord,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Tunables for the ingestion pipeline.
///
/// The chunking defaults follow the 800/150 revision; the earlier
/// 1000/200 variant is treated as superseded. `keyword_chunk_limit`
/// bounds synthesis cost: only the first N chunks of a document get a
/// synthesized keyword list, the remainder keep `None` permanently.
#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_chars: usize,
    pub keyword_chunk_limit: usize,
    pub excerpt_chars: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
            min_chunk_chars: 50,
            keyword_chunk_limit: 20,
            excerpt_chars: 5_000,
        }
    }
}

/// Tunables for the query pipeline. `candidate_limit` caps the linear
/// candidate scan; retrieval quality degrades past that corpus size.
#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub top_k: usize,
    pub candidate_limit: u32,
    pub history_limit: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            candidate_limit: 500,
            history_limit: 10,
        }
    }
}
