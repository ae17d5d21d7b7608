use std::sync::Arc;
use tracing::{info, warn};

use crate::application::dto::{ApplySummary, AssetFailure};
use crate::application::errors::ApplyError;
use crate::application::ports::{AssetHandle, DocumentApi};
use crate::domain::entities::AssetDescriptor;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{AssetState, Provenance};

/// Use case: commit pending artifacts back into the document
pub struct ApplyOptimizationsUseCase {
    document: Arc<dyn DocumentApi>,
}

impl ApplyOptimizationsUseCase {
    pub fn new(document: Arc<dyn DocumentApi>) -> Self {
        Self { document }
    }

    /// Upload the artifact of `descriptor` and swap it into its canvas node.
    ///
    /// Does not change the descriptor; callers mark it applied on success.
    pub async fn upload_and_replace(
        &self,
        descriptor: &AssetDescriptor,
    ) -> Result<AssetHandle, ApplyError> {
        let Provenance::Canvas { node_id, .. } = descriptor.provenance() else {
            return Err(DomainError::NotApplicable(descriptor.provenance().kind()).into());
        };
        if !descriptor.is_applicable() {
            return Err(DomainError::InvalidStateTransition {
                from: descriptor.state(),
                to: AssetState::Applied,
            }
            .into());
        }
        let artifact = descriptor
            .optimized_artifact()
            .ok_or_else(|| DomainError::MissingArtifact(descriptor.identity().to_string()))?;

        let handle = self
            .document
            .upload_image(artifact.bytes(), artifact.file_name(), artifact.mime_type())
            .await?;
        self.document
            .replace_background_image(node_id, &handle)
            .await?;
        Ok(handle)
    }

    /// Apply one descriptor in place
    pub async fn execute(&self, descriptor: &mut AssetDescriptor) -> Result<(), ApplyError> {
        let handle = self.upload_and_replace(descriptor).await?;
        descriptor.mark_applied()?;
        info!(asset = %descriptor.identity(), %handle, "Artifact applied to document");
        Ok(())
    }

    /// Apply every pending canvas artifact, one at a time.
    ///
    /// Individual failures are logged and counted; the batch always runs to the end.
    pub async fn execute_all(&self, descriptors: &mut [AssetDescriptor]) -> ApplySummary {
        let mut summary = ApplySummary::default();
        for descriptor in descriptors.iter_mut() {
            if descriptor.optimized_artifact().is_none() || descriptor.applied_to_document() {
                continue;
            }
            if !descriptor.is_applicable() {
                summary.skipped += 1;
                continue;
            }
            match self.execute(descriptor).await {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    warn!(asset = %descriptor.identity(), error = %e, "Failed to apply artifact");
                    summary.failed.push(AssetFailure {
                        identity: descriptor.identity().clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            applied = summary.applied,
            failed = summary.failed.len(),
            skipped = summary.skipped,
            "Apply finished"
        );
        summary
    }
}
