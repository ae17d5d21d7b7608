use tracing::debug;

use crate::application::dto::DownloadedArtifact;
use crate::application::errors::DownloadError;
use crate::domain::entities::AssetDescriptor;

/// Use case: hand out the optimized bytes of a content-repository asset
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadArtifactUseCase;

impl DownloadArtifactUseCase {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, descriptor: &AssetDescriptor) -> Result<DownloadedArtifact, DownloadError> {
        let identity = descriptor.identity().to_string();
        if descriptor.provenance().is_canvas() {
            return Err(DownloadError::NotDownloadable(identity));
        }
        let artifact = descriptor
            .optimized_artifact()
            .ok_or(DownloadError::MissingArtifact(identity))?;

        debug!(asset = %descriptor.identity(), bytes = artifact.byte_size(), "Artifact downloaded");
        Ok(DownloadedArtifact {
            file_name: artifact.file_name().to_string(),
            mime_type: artifact.mime_type(),
            bytes: artifact.bytes(),
        })
    }
}
