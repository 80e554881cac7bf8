// # Metadata Fetcher Trait
//
// Defines the interface for retrieving the raw interface document from the
// host-local metadata service.
//
// ## Implementations
//
// - HTTP: `ipam-metadata-http` crate

use async_trait::async_trait;

/// Trait for metadata fetcher implementations
///
/// One call performs exactly one request. Fetchers never retry: a failed
/// fetch aborts the current refresh and the next scheduled tick starts over.
///
/// # Resource Handling
///
/// The response body must be read completely and the underlying connection
/// released before `fetch` returns, on success and on failure.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch the raw metadata document
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<u8>)`: The complete response body
    /// - `Err(Error::Fetch)`: Transport failure, timeout or unsuccessful status
    async fn fetch(&self) -> Result<Vec<u8>, crate::Error>;

    /// Endpoint description (for logging/debugging)
    fn endpoint(&self) -> &str;
}
