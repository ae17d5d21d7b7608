use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to {address} failed: {message}")]
    Request { address: String, message: String },

    #[error("Unexpected status {status} from {address}")]
    Status { address: String, status: u16 },

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Transport setup failed: {0}")]
    Setup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Response to a partial-content request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialContent {
    /// Raw `Content-Range` header, when the source honoured the range
    pub content_range: Option<String>,
    /// Bytes actually received
    pub received: u64,
}

/// Port for reading asset bytes and metadata from an address
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AssetTransport: Send + Sync {
    /// Metadata-only probe; `Ok(None)` when no length is reported
    async fn probe_length(&self, address: &str) -> Result<Option<u64>, TransportError>;

    /// Request the inclusive byte range `first..=last`
    async fn fetch_range(
        &self,
        address: &str,
        first: u64,
        last: u64,
    ) -> Result<PartialContent, TransportError>;

    /// Full download
    async fn fetch(&self, address: &str) -> Result<Bytes, TransportError>;
}
