use crate::error::{IngestError, QueryError};
use crate::models::{ChatMessage, ChunkRecord, Document, DocumentStatus, SourceRecord};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Incremental tokens from a streamed completion. Dropping the stream
/// cancels the upstream request; an `Err` item ends the stream.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, QueryError>> + Send>>;

/// Object storage holding raw uploaded file bytes.
#[async_trait]
pub trait ObjectStorage {
    /// Downloads the object at `path`. A missing object is a
    /// `IngestError::Fetch`, fatal for the owning document.
    async fn download(&self, path: &str) -> Result<Vec<u8>, IngestError>;

    /// Removes the object at `path`. Removing an absent object is not
    /// an error.
    async fn remove(&self, path: &str) -> Result<(), IngestError>;
}

/// Relational record store for documents, provenance sources, and
/// chunks. Chunks are append-only: inserted once per ingestion run and
/// never updated in place.
#[async_trait]
pub trait RecordStore {
    async fn set_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        chunks_count: Option<u32>,
    ) -> Result<(), IngestError>;

    async fn insert_source(&self, source: &SourceRecord) -> Result<(), IngestError>;

    /// Persists chunk records preserving the order of the slice.
    async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> Result<(), IngestError>;

    /// Bounded candidate scan for retrieval. At most `limit` records are
    /// returned; larger corpora are silently truncated at this cap.
    async fn list_chunks(&self, limit: u32) -> Result<Vec<ChunkRecord>, QueryError>;

    /// Resolves documents by identifier set, for provenance display.
    async fn documents_by_ids(&self, ids: &[String]) -> Result<Vec<Document>, QueryError>;

    /// Deletes a document together with its chunk and provenance rows.
    /// Chunks go first so a partial failure never leaves orphans.
    async fn delete_document(&self, document_id: &str) -> Result<(), IngestError>;
}

/// External text-generation service (chat-completions shaped).
#[async_trait]
pub trait TextGenerator {
    /// Single-shot completion; returns the assistant message content.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, QueryError>;

    /// Streamed completion; yields content deltas until the terminator
    /// frame. A stream that ends without the terminator surfaces
    /// `QueryError::Truncated` as its final item.
    async fn stream(&self, messages: &[ChatMessage]) -> Result<CompletionStream, QueryError>;
}
