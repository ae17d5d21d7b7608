use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::domain::{
    errors::DomainError,
    value_objects::{
        AssetIdentity, AssetState, OptimizationHint, Provenance, Quality, Scale, SourceAddress,
        Thumbnail,
    },
};

/// Re-encoded variant of an asset produced by a compression search
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedArtifact {
    bytes: Bytes,
    width: u32,
    height: u32,
    quality: Quality,
    scale: Scale,
    within_budget: bool,
    mime_type: &'static str,
    file_name: String,
    digest: String,
    created_at: DateTime<Utc>,
}

impl OptimizedArtifact {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bytes: impl Into<Bytes>,
        width: u32,
        height: u32,
        quality: Quality,
        scale: Scale,
        within_budget: bool,
        mime_type: &'static str,
        file_name: impl Into<String>,
    ) -> Self {
        let bytes = bytes.into();
        let digest = hex::encode(Sha256::digest(&bytes));
        Self {
            bytes,
            width,
            height,
            quality,
            scale,
            within_budget,
            mime_type,
            file_name: file_name.into(),
            digest,
            created_at: Utc::now(),
        }
    }

    /// Handle to the encoded bytes (cheap to clone)
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// False when only the emergency encode was available and it still exceeds the budget
    pub fn within_budget(&self) -> bool {
        self.within_budget
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Hex SHA-256 of the encoded bytes
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn bytes_saved(&self, original_byte_size: u64) -> u64 {
        original_byte_size.saturating_sub(self.byte_size())
    }

    /// Fraction of the original size removed, in [0, 1]
    pub fn reduction_ratio(&self, original_byte_size: u64) -> f64 {
        if original_byte_size == 0 {
            return 0.0;
        }
        self.bytes_saved(original_byte_size) as f64 / original_byte_size as f64
    }
}

/// One discovered image reference and its optimization state
#[derive(Debug, Clone)]
pub struct AssetDescriptor {
    identity: AssetIdentity,
    display_label: String,
    provenance: Provenance,
    source_address: SourceAddress,
    original_byte_size: u64,
    optimization_hint: Option<OptimizationHint>,
    preview_thumbnail: Option<Thumbnail>,
    optimized_artifact: Option<OptimizedArtifact>,
    state: AssetState,
}

impl AssetDescriptor {
    /// Create new descriptor in DISCOVERED state
    pub fn new(
        provenance: Provenance,
        source_address: SourceAddress,
        original_byte_size: u64,
        optimization_hint: Option<OptimizationHint>,
        preview_thumbnail: Option<Thumbnail>,
    ) -> Self {
        Self {
            identity: provenance.identity(),
            display_label: provenance.display_label(),
            provenance,
            source_address,
            original_byte_size,
            optimization_hint,
            preview_thumbnail,
            optimized_artifact: None,
            state: AssetState::Discovered,
        }
    }

    /// Enter SEARCH_RUNNING; allowed from DISCOVERED and OPTIMIZED_PENDING
    pub fn begin_search(&mut self) -> Result<(), DomainError> {
        self.transition(AssetState::SearchRunning)
    }

    /// Attach a freshly produced artifact, replacing any previous one
    pub fn complete_search(&mut self, artifact: OptimizedArtifact) -> Result<(), DomainError> {
        self.transition(AssetState::OptimizedPending)?;
        self.optimized_artifact = Some(artifact);
        Ok(())
    }

    /// Leave SEARCH_RUNNING without touching the previous artifact
    pub fn abort_search(&mut self) -> Result<(), DomainError> {
        let target = if self.optimized_artifact.is_some() {
            AssetState::OptimizedPending
        } else {
            AssetState::Discovered
        };
        self.transition(target)
    }

    /// Record that the artifact was committed back to the host document
    pub fn mark_applied(&mut self) -> Result<(), DomainError> {
        if !self.provenance.is_canvas() {
            return Err(DomainError::NotApplicable(self.provenance.kind()));
        }
        if self.optimized_artifact.is_none() {
            return Err(DomainError::MissingArtifact(self.identity.to_string()));
        }
        self.transition(AssetState::Applied)
    }

    fn transition(&mut self, target: AssetState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }

    pub fn exceeds_budget(&self, budget_bytes: u64) -> bool {
        self.original_byte_size > budget_bytes
    }

    /// Over budget and not yet optimized
    pub fn needs_optimization(&self, budget_bytes: u64) -> bool {
        self.exceeds_budget(budget_bytes)
            && self.optimized_artifact.is_none()
            && self.state == AssetState::Discovered
    }

    /// Canvas asset with a pending artifact
    pub fn is_applicable(&self) -> bool {
        self.provenance.is_canvas() && self.state == AssetState::OptimizedPending
    }

    // Getters
    pub fn identity(&self) -> &AssetIdentity {
        &self.identity
    }

    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn source_address(&self) -> &SourceAddress {
        &self.source_address
    }

    pub fn is_remote(&self) -> bool {
        self.source_address.is_remote()
    }

    pub fn original_byte_size(&self) -> u64 {
        self.original_byte_size
    }

    pub fn already_optimized(&self) -> bool {
        self.optimization_hint.is_some()
    }

    pub fn optimization_hint(&self) -> Option<OptimizationHint> {
        self.optimization_hint
    }

    pub fn preview_thumbnail(&self) -> Option<&Thumbnail> {
        self.preview_thumbnail.as_ref()
    }

    pub fn optimized_artifact(&self) -> Option<&OptimizedArtifact> {
        self.optimized_artifact.as_ref()
    }

    pub fn applied_to_document(&self) -> bool {
        self.state == AssetState::Applied
    }

    pub fn state(&self) -> AssetState {
        self.state
    }
}
