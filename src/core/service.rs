//! Service trait for the remote store collection

use crate::core::error::FetchError;
use crate::core::query::CanonicalQuery;
use crate::core::store::Store;
use async_trait::async_trait;

/// Source of store pages
///
/// Implementations receive the complete query, pagination parameters
/// included, and return the stores of that page in server order. The feed
/// is agnostic to how the collection is reached.
#[async_trait]
pub trait StoreSource: Send + Sync {
    /// Fetch one page of stores
    async fn fetch(&self, query: &CanonicalQuery) -> Result<Vec<Store>, FetchError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "store-source"
    }
}
