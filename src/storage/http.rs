//! HTTP implementation of StoreSource backed by `reqwest`

use crate::config::ListingConfig;
use crate::core::error::{ConfigError, FetchError};
use crate::core::query::CanonicalQuery;
use crate::core::service::StoreSource;
use crate::core::store::Store;
use async_trait::async_trait;

/// Fetches pages from a REST collection
///
/// `GET <collection_url>?<query>`; the body must be a JSON array of stores.
#[derive(Clone)]
pub struct HttpStoreSource {
    client: reqwest::Client,
    collection_url: String,
}

impl HttpStoreSource {
    /// Create a source with a default client
    pub fn new(collection_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), collection_url)
    }

    pub fn with_client(client: reqwest::Client, collection_url: impl Into<String>) -> Self {
        Self {
            client,
            collection_url: collection_url.into(),
        }
    }

    /// Create a source for the collection and timeout of `config`
    pub fn from_config(config: &ListingConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "request_timeout_ms".to_string(),
                value: config.request_timeout_ms.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::with_client(client, config.collection_url()))
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    /// URL requested for `query`
    pub fn request_url(&self, query: &CanonicalQuery) -> String {
        if query.is_empty() {
            self.collection_url.clone()
        } else {
            format!("{}?{}", self.collection_url, query.to_query_string())
        }
    }
}

#[async_trait]
impl StoreSource for HttpStoreSource {
    async fn fetch(&self, query: &CanonicalQuery) -> Result<Vec<Store>, FetchError> {
        let url = self.request_url(query);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(
                status.as_u16(),
                format!("server answered {}", status),
            ));
        }

        let body = response.bytes().await?;
        let stores: Vec<Store> = serde_json::from_slice(&body)?;
        Ok(stores)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url() {
        let source = HttpStoreSource::new("http://localhost:3001/stores");
        let query = CanonicalQuery::parse("name_like=%5EA&_sort=name").with_page(2, 20);
        assert_eq!(
            source.request_url(&query),
            "http://localhost:3001/stores?name_like=%5EA&_sort=name&_page=2&_limit=20"
        );
        assert_eq!(
            source.request_url(&CanonicalQuery::new()),
            "http://localhost:3001/stores"
        );
    }

    #[test]
    fn test_from_config() {
        let source = HttpStoreSource::from_config(&ListingConfig::default_config()).unwrap();
        assert_eq!(source.collection_url(), "http://localhost:3001/stores");
    }
}
