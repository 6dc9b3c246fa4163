use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("store request failed on {backend}: {details}")]
    Store { backend: String, details: String },
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("rate limit exceeded, retry later")]
    RateLimited,

    #[error("generation quota exhausted")]
    QuotaExhausted,

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("response stream ended before completion")]
    Truncated,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("store request failed on {backend}: {details}")]
    Store { backend: String, details: String },
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
