//! Errors surfaced by the exposed operations
//!
//! Per-item and phase-level failures inside a scan never reach these types;
//! they are logged and recovered where they happen.

use thiserror::Error;

use crate::application::discovery::DiscoveryError;
use crate::application::pipeline::CompressionError;
use crate::application::ports::{CodecError, HostApiError, TransportError};
use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan not permitted by the current entitlement")]
    NotEntitled,

    #[error("Scan failed: {0}")]
    Discovery(#[from] DiscoveryError),
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Byte budget must be greater than zero")]
    InvalidBudget,

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Failed to load source image: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to decode source image: {0}")]
    Codec(#[from] CodecError),

    #[error("Compression failed: {0}")]
    Compression(#[from] CompressionError),

    #[error("Compression worker failed: {0}")]
    Worker(String),

    #[error("Asset {0} was rediscovered while its search ran; result discarded")]
    Superseded(String),
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Host rejected the update: {0}")]
    Host(#[from] HostApiError),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Canvas asset {0} is applied in place and has no download")]
    NotDownloadable(String),

    #[error("Asset {0} has no optimized artifact")]
    MissingArtifact(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ProvenanceKind;

    #[test]
    fn test_domain_error_converts_into_apply_error() {
        let err: ApplyError = DomainError::NotApplicable(ProvenanceKind::Repository).into();
        assert!(matches!(err, ApplyError::Domain(_)));
        assert!(err.to_string().contains("repository"));
    }

    #[test]
    fn test_transport_error_message_is_kept() {
        let err: OptimizeError = TransportError::NotFound("/tmp/a.png".to_string()).into();
        assert!(err.to_string().contains("/tmp/a.png"));
    }
}
