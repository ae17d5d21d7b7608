use thiserror::Error;

use super::value_objects::{AssetState, ProvenanceKind};

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: AssetState, to: AssetState },

    #[error("Assets of {0} origin cannot be applied to the document")]
    NotApplicable(ProvenanceKind),

    #[error("Asset {0} has no optimized artifact")]
    MissingArtifact(String),

    #[error("Invalid source address: {0}")]
    InvalidAddress(String),

    #[error("Quality must be in (0, 1], got {0}")]
    InvalidQuality(f64),

    #[error("Scale must be in (0, 1], got {0}")]
    InvalidScale(f64),
}
