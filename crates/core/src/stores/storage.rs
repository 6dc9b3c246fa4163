//! Object storage client for the upload bucket.

use crate::error::IngestError;
use crate::traits::ObjectStorage;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

const BACKEND: &str = "storage";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct BucketStore {
    client: Client,
    base: Url,
    bucket: String,
    api_key: String,
}

impl BucketStore {
    pub fn new(
        base: &str,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, IngestError> {
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
            bucket: bucket.into(),
            api_key: api_key.into(),
        })
    }

    fn object_url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base
            .join(&format!("storage/v1/object/{}/{}", self.bucket, path))
    }
}

#[async_trait]
impl ObjectStorage for BucketStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, IngestError> {
        let response = self
            .client
            .get(self.object_url(path)?)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(IngestError::Fetch(format!("object not found: {path}")));
        }
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(IngestError::Store {
                backend: BACKEND.to_string(),
                details: format!("{status}: {details}"),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn remove(&self, path: &str) -> Result<(), IngestError> {
        let response = self
            .client
            .delete(self.object_url(path)?)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        // Deleting an object that is already gone is a no-op.
        if status == StatusCode::NOT_FOUND || status.is_success() {
            return Ok(());
        }

        let details = response.text().await.unwrap_or_default();
        Err(IngestError::Store {
            backend: BACKEND.to_string(),
            details: format!("{status}: {details}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_urls_nest_bucket_and_path() {
        let store = BucketStore::new("https://project.example.co", "knowledge-base", "key").unwrap();
        let url = store.object_url("uploads/report.pdf").unwrap();
        assert_eq!(
            url.as_str(),
            "https://project.example.co/storage/v1/object/knowledge-base/uploads/report.pdf"
        );
    }
}
