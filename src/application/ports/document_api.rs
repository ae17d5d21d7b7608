use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a host-side API (document or content repository)
#[derive(Debug, Error)]
pub enum HostApiError {
    #[error("Host API unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed host data: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Canvas node exposing a background image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    pub name: String,
    /// Raw background-image address as reported by the host
    pub background_image_address: Option<String>,
}

/// Opaque handle to an image uploaded into the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub String);

impl std::fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port for the host document holding the visual canvas
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// All nodes that carry a background-image attribute
    async fn list_nodes_with_background_image(&self) -> Result<Vec<CanvasNode>, HostApiError>;

    /// Upload encoded image bytes and get a handle usable on nodes
    async fn upload_image(
        &self,
        bytes: Bytes,
        file_name: &str,
        mime_type: &str,
    ) -> Result<AssetHandle, HostApiError>;

    /// Point a node's background image at an uploaded asset
    async fn replace_background_image(
        &self,
        node_id: &str,
        handle: &AssetHandle,
    ) -> Result<(), HostApiError>;
}
