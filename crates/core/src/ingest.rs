//! Ingestion pipeline: download, extract, chunk, synthesize, persist.
//!
//! Status transitions are pending -> processing -> ready | error. Both
//! end states are terminal; a failed document is re-uploaded, never
//! retried in place.

use crate::chunking::{chunk_text, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::{extract_text, FileKind};
use crate::keywords::synthesize_keywords;
use crate::models::{ChunkRecord, DocumentStatus, IngestionOptions, SourceRecord};
use crate::traits::{ObjectStorage, RecordStore, TextGenerator};
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub struct IngestionReport {
    pub document_id: String,
    pub chunks_created: u32,
}

pub struct IngestionPipeline<S, R, G> {
    storage: S,
    records: R,
    generator: G,
    options: IngestionOptions,
}

impl<S, R, G> IngestionPipeline<S, R, G>
where
    S: ObjectStorage,
    R: RecordStore,
    G: TextGenerator,
{
    pub fn new(storage: S, records: R, generator: G, options: IngestionOptions) -> Self {
        Self {
            storage,
            records,
            generator,
            options,
        }
    }

    /// Runs the full pipeline for one uploaded document and settles its
    /// terminal status. The original error is propagated to the caller
    /// even when recording the `error` status itself fails.
    pub async fn run(
        &self,
        document_id: &str,
        file_path: &str,
    ) -> Result<IngestionReport, IngestError> {
        self.records
            .set_document_status(document_id, DocumentStatus::Processing, None)
            .await?;

        match self.process(document_id, file_path).await {
            Ok(report) => {
                self.records
                    .set_document_status(
                        document_id,
                        DocumentStatus::Ready,
                        Some(report.chunks_created),
                    )
                    .await?;
                tracing::info!(
                    document_id,
                    chunks = report.chunks_created,
                    "document ingested"
                );
                Ok(report)
            }
            Err(error) => {
                tracing::warn!(document_id, %error, "ingestion failed");
                if let Err(status_error) = self
                    .records
                    .set_document_status(document_id, DocumentStatus::Error, None)
                    .await
                {
                    tracing::warn!(document_id, %status_error, "failed to record error status");
                }
                Err(error)
            }
        }
    }

    async fn process(
        &self,
        document_id: &str,
        file_path: &str,
    ) -> Result<IngestionReport, IngestError> {
        let bytes = self.storage.download(file_path).await?;
        let kind = FileKind::from_path(file_path);
        let text = extract_text(&bytes, kind)?;

        let chunks = chunk_text(&text, &ChunkingConfig::from(&self.options))?;
        let chunks_created = chunks.len() as u32;

        let source = SourceRecord {
            id: Uuid::new_v4().to_string(),
            source_type: "document".to_string(),
            url: file_path.to_string(),
            title: file_name(file_path).to_string(),
            excerpt: text.chars().take(self.options.excerpt_chars).collect(),
            chunks_count: chunks_created,
            document_id: document_id.to_string(),
            created_at: Utc::now(),
        };
        self.records.insert_source(&source).await?;

        let mut records = Vec::with_capacity(chunks.len());
        for (index, text) in chunks.into_iter().enumerate() {
            let keywords = if index < self.options.keyword_chunk_limit {
                let list = synthesize_keywords(&self.generator, &text).await;
                (!list.is_empty()).then_some(list)
            } else {
                None
            };

            records.push(ChunkRecord {
                id: make_chunk_id(document_id, index, &text),
                document_id: document_id.to_string(),
                source_id: Some(source.id.clone()),
                chunk_index: index as u32,
                text,
                keywords,
            });
        }
        self.records.insert_chunks(&records).await?;

        Ok(IngestionReport {
            document_id: document_id.to_string(),
            chunks_created,
        })
    }

    /// Removes the stored object and every record derived from it.
    /// The document row is deleted last, so an interrupted delete can
    /// leave a document without chunks but never chunks without a
    /// document.
    pub async fn delete(&self, document_id: &str, file_path: &str) -> Result<(), IngestError> {
        self.storage.remove(file_path).await?;
        self.records.delete_document(document_id).await?;
        tracing::info!(document_id, "document deleted");
        Ok(())
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Deterministic chunk identity: the same document, position, and text
/// always hash to the same id, so a re-run upserts instead of forking.
fn make_chunk_id(document_id: &str, index: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
