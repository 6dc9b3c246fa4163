//! PostgREST record store.
//!
//! Three tables carry the ingestion output: `knowledge_documents` (one
//! row per upload, owned by the dashboard), `data_sources` (provenance,
//! one row per ingestion run) and `embeddings` (one row per chunk; the
//! name is historical, rows hold text and keywords, not vectors).

use crate::error::{IngestError, QueryError};
use crate::models::{
    ChunkRecord, Document, DocumentCategory, DocumentStatus, SourceRecord,
};
use crate::traits::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use url::Url;

const BACKEND: &str = "records";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RestRecordStore {
    client: Client,
    base: Url,
    api_key: String,
}

impl RestRecordStore {
    pub fn new(base: &str, api_key: impl Into<String>) -> Result<Self, IngestError> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base,
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, url::ParseError> {
        self.base.join(&format!("rest/v1/{table}"))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// Reads the body of a failed response into the backend error details.
async fn ensure_success(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let details = response.text().await.unwrap_or_default();
    Err(format!("{status}: {details}"))
}

fn ingest_store_error(details: String) -> IngestError {
    IngestError::Store {
        backend: BACKEND.to_string(),
        details,
    }
}

fn query_store_error(details: String) -> QueryError {
    QueryError::Store {
        backend: BACKEND.to_string(),
        details,
    }
}

/// Wire row for the `embeddings` table. Chunk text lives in the
/// `content_chunk` column; document linkage and keywords ride in the
/// row's JSON metadata.
#[derive(Serialize, Deserialize)]
struct EmbeddingRow {
    id: String,
    source_id: Option<String>,
    content_chunk: String,
    chunk_index: u32,
    metadata: EmbeddingMetadata,
}

#[derive(Serialize, Deserialize, Default)]
struct EmbeddingMetadata {
    #[serde(rename = "documentId", default)]
    document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keywords: Option<Vec<String>>,
}

impl From<&ChunkRecord> for EmbeddingRow {
    fn from(chunk: &ChunkRecord) -> Self {
        Self {
            id: chunk.id.clone(),
            source_id: chunk.source_id.clone(),
            content_chunk: chunk.text.clone(),
            chunk_index: chunk.chunk_index,
            metadata: EmbeddingMetadata {
                document_id: chunk.document_id.clone(),
                keywords: chunk.keywords.clone(),
            },
        }
    }
}

impl From<EmbeddingRow> for ChunkRecord {
    fn from(row: EmbeddingRow) -> Self {
        Self {
            id: row.id,
            document_id: row.metadata.document_id,
            source_id: row.source_id,
            chunk_index: row.chunk_index,
            text: row.content_chunk,
            keywords: row.metadata.keywords,
        }
    }
}

/// Wire row for `knowledge_documents`. The table predates this service
/// and keeps its own column names.
#[derive(Deserialize)]
struct DocumentRow {
    id: String,
    file_name: String,
    file_path: String,
    #[serde(default)]
    file_size: u64,
    status: DocumentStatus,
    #[serde(default = "default_category")]
    category: DocumentCategory,
    #[serde(default)]
    chunks_count: u32,
    uploaded_at: DateTime<Utc>,
}

fn default_category() -> DocumentCategory {
    DocumentCategory::Other
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            file_name: row.file_name,
            file_path: row.file_path,
            byte_size: row.file_size,
            status: row.status,
            category: row.category,
            chunks_count: row.chunks_count,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn set_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        chunks_count: Option<u32>,
    ) -> Result<(), IngestError> {
        let mut url = self.table_url("knowledge_documents")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{document_id}"));

        let mut patch = serde_json::Map::new();
        patch.insert("status".to_string(), json!(status.as_str()));
        if let Some(count) = chunks_count {
            patch.insert("chunks_count".to_string(), json!(count));
        }

        let response = self
            .request(self.client.patch(url))
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await?;
        ensure_success(response).await.map_err(ingest_store_error)?;
        Ok(())
    }

    async fn insert_source(&self, source: &SourceRecord) -> Result<(), IngestError> {
        let row = json!({
            "id": source.id,
            "source_type": source.source_type,
            "url": source.url,
            "title": source.title,
            "content": source.excerpt,
            "metadata": {
                "documentId": source.document_id,
                "chunksCount": source.chunks_count,
            },
            "created_at": source.created_at,
        });

        let response = self
            .request(self.client.post(self.table_url("data_sources")?))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        ensure_success(response).await.map_err(ingest_store_error)?;
        Ok(())
    }

    async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> Result<(), IngestError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let rows: Vec<EmbeddingRow> = chunks.iter().map(EmbeddingRow::from).collect();
        let response = self
            .request(self.client.post(self.table_url("embeddings")?))
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;
        ensure_success(response).await.map_err(ingest_store_error)?;
        Ok(())
    }

    async fn list_chunks(&self, limit: u32) -> Result<Vec<ChunkRecord>, QueryError> {
        let mut url = self.table_url("embeddings")?;
        url.query_pairs_mut()
            .append_pair("select", "id,source_id,content_chunk,chunk_index,metadata")
            .append_pair("order", "id.asc")
            .append_pair("limit", &limit.to_string());

        let response = self.request(self.client.get(url)).send().await?;
        let response = ensure_success(response).await.map_err(query_store_error)?;

        let rows: Vec<EmbeddingRow> = response.json().await?;
        Ok(rows.into_iter().map(ChunkRecord::from).collect())
    }

    async fn documents_by_ids(&self, ids: &[String]) -> Result<Vec<Document>, QueryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.table_url("knowledge_documents")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("in.({})", ids.join(",")));

        let response = self.request(self.client.get(url)).send().await?;
        let response = ensure_success(response).await.map_err(query_store_error)?;

        let rows: Vec<DocumentRow> = response.json().await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), IngestError> {
        // Chunks first, then provenance, then the document row. A crash
        // mid-way leaves a document without chunks, never chunks without
        // a document.
        let filter_column = [
            ("embeddings", "metadata->>documentId"),
            ("data_sources", "metadata->>documentId"),
            ("knowledge_documents", "id"),
        ];

        for (table, column) in filter_column {
            let mut url = self.table_url(table)?;
            url.query_pairs_mut()
                .append_pair(column, &format!("eq.{document_id}"));

            let response = self.request(self.client.delete(url)).send().await?;
            ensure_success(response).await.map_err(ingest_store_error)?;
        }

        Ok(())
    }
}
