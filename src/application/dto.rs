use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::AssetDescriptor,
    value_objects::{AssetIdentity, AssetState, OptimizationHint, ProvenanceKind},
};

/// Outcome of one scan invocation
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub descriptors: Vec<AssetDescriptor>,
    pub canvas_count: usize,
    pub repository_count: usize,
    pub duplicates_removed: usize,
    pub repository_phase_failed: bool,
}

impl ScanReport {
    /// Descriptors whose transfer size exceeds `budget_bytes`
    pub fn over_budget(&self, budget_bytes: u64) -> usize {
        self.descriptors
            .iter()
            .filter(|d| d.exceeds_budget(budget_bytes))
            .count()
    }

    /// One-line success summary
    pub fn summary(&self, budget_bytes: u64) -> String {
        let mut summary = format!(
            "Found {} image(s) ({} on canvas, {} in content repository), {} over budget",
            self.descriptors.len(),
            self.canvas_count,
            self.repository_count,
            self.over_budget(budget_bytes)
        );
        if self.duplicates_removed > 0 {
            summary.push_str(&format!(", {} duplicate(s) merged", self.duplicates_removed));
        }
        if self.repository_phase_failed {
            summary.push_str("; content repository unavailable");
        }
        summary
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Serializable view of a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDto {
    pub identity: AssetIdentity,
    pub label: String,
    pub provenance: ProvenanceKind,
    pub source_address: String,
    pub original_byte_size: u64,
    pub over_budget: bool,
    pub already_optimized: bool,
    pub optimization_hint: Option<OptimizationHint>,
    pub state: AssetState,
    pub optimized: Option<ArtifactDto>,
    pub applied_to_document: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDto {
    pub file_name: String,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
    pub quality: f64,
    pub scale: f64,
    pub within_budget: bool,
    pub reduction_ratio: f64,
    pub digest: String,
}

impl AssetDto {
    pub fn from_descriptor(descriptor: &AssetDescriptor, budget_bytes: u64) -> Self {
        let original = descriptor.original_byte_size();
        let optimized = descriptor.optimized_artifact().map(|artifact| {
            let (width, height) = artifact.dimensions();
            ArtifactDto {
                file_name: artifact.file_name().to_string(),
                byte_size: artifact.byte_size(),
                width,
                height,
                quality: artifact.quality().value(),
                scale: artifact.scale().value(),
                within_budget: artifact.within_budget(),
                reduction_ratio: artifact.reduction_ratio(original),
                digest: artifact.digest().to_string(),
            }
        });
        Self {
            identity: descriptor.identity().clone(),
            label: descriptor.display_label().to_string(),
            provenance: descriptor.provenance().kind(),
            source_address: descriptor.source_address().to_string(),
            original_byte_size: original,
            over_budget: descriptor.exceeds_budget(budget_bytes),
            already_optimized: descriptor.already_optimized(),
            optimization_hint: descriptor.optimization_hint(),
            state: descriptor.state(),
            optimized,
            applied_to_document: descriptor.applied_to_document(),
        }
    }
}

/// Per-asset failure collected during a bulk operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetFailure {
    pub identity: AssetIdentity,
    pub reason: String,
}

/// Result of optimizing every asset over budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub optimized: Vec<AssetIdentity>,
    pub failed: Vec<AssetFailure>,
    /// Artifacts that only reached the emergency encode and still exceed the budget
    pub over_budget: Vec<AssetIdentity>,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl OptimizationSummary {
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Result of committing pending artifacts to the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub applied: usize,
    pub failed: Vec<AssetFailure>,
    /// Pending artifacts that cannot be applied in place (content repository)
    pub skipped: usize,
}

/// Bytes handed out by a download
#[derive(Debug, Clone)]
pub struct DownloadedArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Bytes,
}
