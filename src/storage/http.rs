//! HTTP-backed content store

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url, header};
use std::time::Duration;
use tracing::debug;

use super::{ContentStore, Result, StorageError, StoreKey};
use crate::config::ContentStoreConfig;

/// Content store reached over plain HTTP GET
///
/// No retries: a failed read is reported once and the caller decides.
#[derive(Debug, Clone)]
pub struct HttpContentStore {
    client: Client,
    base_url: String,
    max_document_bytes: usize,
}

impl HttpContentStore {
    pub fn new(config: &ContentStoreConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| StorageError::InvalidConfig(format!("base_url: {}", e)))?;

        let mut headers = header::HeaderMap::new();
        if let Some(token) = &config.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| StorageError::InvalidConfig("token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            max_document_bytes: config.max_document_bytes.as_usize(),
        })
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<Bytes>> {
        let url = self.url_for(key);
        debug!(%url, "Fetching store document");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                StorageError::Timeout { url: url.clone() }
            } else {
                StorageError::RequestFailed {
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%url, "Store document absent");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StorageError::UnexpectedStatus {
                url,
                status: status.as_u16(),
            });
        }

        let limit = self.max_document_bytes;
        if response
            .content_length()
            .is_some_and(|length| length > limit as u64)
        {
            return Err(StorageError::TooLarge { url, limit });
        }

        let body = response.bytes().await.map_err(|e| StorageError::RequestFailed {
            url: url.clone(),
            message: format!("Failed to read body: {}", e),
        })?;

        if body.len() > limit {
            return Err(StorageError::TooLarge { url, limit });
        }

        debug!(%url, size = body.len(), "Store document fetched");
        Ok(Some(body))
    }

    fn url_for(&self, key: &StoreKey) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;

    fn config(base_url: &str) -> ContentStoreConfig {
        ContentStoreConfig {
            base_url: base_url.to_string(),
            max_document_bytes: ByteSize(1024),
            ..ContentStoreConfig::default()
        }
    }

    #[test]
    fn joins_keys_without_double_slashes() {
        let store = HttpContentStore::new(&config("https://raw.example.com/")).unwrap();
        assert_eq!(
            store.url_for(&StoreKey::new("u/c/tag/n/1.0/latest.json")),
            "https://raw.example.com/u/c/tag/n/1.0/latest.json"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let store = HttpContentStore::new(&config("http://localhost:9000/mirror")).unwrap();
        assert_eq!(
            store.url_for(&StoreKey::new("a/b")),
            "http://localhost:9000/mirror/a/b"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = HttpContentStore::new(&config("not a url")).unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig(_)));
    }
}
