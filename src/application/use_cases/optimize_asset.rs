use std::sync::Arc;
use tracing::{info, warn};

use crate::application::errors::OptimizeError;
use crate::application::pipeline::{CompressedImage, CompressionEngine};
use crate::application::ports::AssetTransport;
use crate::domain::entities::{AssetDescriptor, OptimizedArtifact};
use crate::domain::value_objects::{OptimizationClassifier, SourceAddress};

const FALLBACK_EXTENSION: &str = "img";

/// Use case: run the compression search for one asset
pub struct OptimizeAssetUseCase {
    transport: Arc<dyn AssetTransport>,
    engine: Arc<CompressionEngine>,
    classifier: OptimizationClassifier,
}

impl OptimizeAssetUseCase {
    pub fn new(
        transport: Arc<dyn AssetTransport>,
        engine: Arc<CompressionEngine>,
        classifier: OptimizationClassifier,
    ) -> Self {
        Self {
            transport,
            engine,
            classifier,
        }
    }

    /// Validate the budget and mark `descriptor` as searching.
    /// Returns the address to search.
    pub fn begin(
        &self,
        descriptor: &mut AssetDescriptor,
        budget_bytes: u64,
    ) -> Result<SourceAddress, OptimizeError> {
        if budget_bytes == 0 {
            return Err(OptimizeError::InvalidBudget);
        }
        descriptor.begin_search()?;
        Ok(descriptor.source_address().clone())
    }

    /// Attach a finished search to `descriptor`, or roll it back on failure
    pub fn finish(
        &self,
        descriptor: &mut AssetDescriptor,
        result: Result<OptimizedArtifact, OptimizeError>,
    ) -> Result<OptimizedArtifact, OptimizeError> {
        match result {
            Ok(artifact) => {
                descriptor.complete_search(artifact.clone())?;
                Ok(artifact)
            }
            Err(e) => {
                descriptor.abort_search()?;
                Err(e)
            }
        }
    }

    /// Fetch, decode and compress the image at `address`
    pub async fn search(
        &self,
        address: &SourceAddress,
        budget_bytes: u64,
    ) -> Result<OptimizedArtifact, OptimizeError> {
        if budget_bytes == 0 {
            return Err(OptimizeError::InvalidBudget);
        }

        let source = self.transport.fetch(address.as_str()).await?;
        let engine = Arc::clone(&self.engine);
        let compressed = tokio::task::spawn_blocking(move || -> Result<CompressedImage, OptimizeError> {
            let image = engine.codec().decode(&source)?;
            Ok(engine.compress(&image, budget_bytes)?)
        })
        .await
        .map_err(|e| OptimizeError::Worker(e.to_string()))??;

        if !compressed.within_budget {
            warn!(
                %address,
                bytes = compressed.byte_size(),
                budget = budget_bytes,
                "Optimized artifact exceeds budget"
            );
        }

        let codec = self.engine.codec();
        let extension = codec
            .extensions()
            .first()
            .copied()
            .unwrap_or(FALLBACK_EXTENSION);
        let file_name = self
            .classifier
            .artifact_file_name(&address.file_stem(), extension);

        info!(
            %address,
            bytes = compressed.byte_size(),
            width = compressed.width,
            height = compressed.height,
            quality = %compressed.quality,
            emergency = compressed.emergency,
            "Asset optimized"
        );

        Ok(OptimizedArtifact::new(
            compressed.bytes,
            compressed.width,
            compressed.height,
            compressed.quality,
            compressed.scale,
            compressed.within_budget,
            codec.mime_type(),
            file_name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_utils::{
        canvas_descriptor, encoded_dimensions, optimized, FixtureTransport, SizedCodec,
    };
    use crate::domain::value_objects::AssetState;
    use bytes::Bytes;

    const HERO: &str = "https://cdn.test/images/hero.png";

    /// begin, search and finish in sequence, as the session drives them
    async fn run(
        use_case: &OptimizeAssetUseCase,
        descriptor: &mut AssetDescriptor,
        budget_bytes: u64,
    ) -> Result<OptimizedArtifact, OptimizeError> {
        let address = use_case.begin(descriptor, budget_bytes)?;
        let result = use_case.search(&address, budget_bytes).await;
        use_case.finish(descriptor, result)
    }

    fn use_case(transport: FixtureTransport) -> OptimizeAssetUseCase {
        let engine = Arc::new(CompressionEngine::new(Arc::new(SizedCodec { density: 1.0 })));
        OptimizeAssetUseCase::new(
            Arc::new(transport),
            engine,
            OptimizationClassifier::for_target(&["jpg", "jpeg"]),
        )
    }

    #[tokio::test]
    async fn test_search_attaches_artifact() {
        let transport = FixtureTransport::default().with(HERO, 900_000, encoded_dimensions(100, 100));
        let mut descriptor = canvas_descriptor("1", HERO, 900_000);

        // 100*100*0.70 = 7000 is the first entry at or under 7500
        run(&use_case(transport), &mut descriptor, 7_500).await.unwrap();

        assert_eq!(descriptor.state(), AssetState::OptimizedPending);
        let artifact = descriptor.optimized_artifact().unwrap();
        assert_eq!(artifact.byte_size(), 7_000);
        assert_eq!(artifact.dimensions(), (100, 100));
        assert_eq!(artifact.quality().value(), 0.70);
        assert!(artifact.within_budget());
        assert_eq!(artifact.file_name(), "hero-optimized.jpg");
        assert_eq!(artifact.mime_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn test_emergency_artifact_flagged_over_budget() {
        let transport = FixtureTransport::default().with(HERO, 900_000, encoded_dimensions(100, 100));
        let mut descriptor = canvas_descriptor("1", HERO, 900_000);

        run(&use_case(transport), &mut descriptor, 10).await.unwrap();

        let artifact = descriptor.optimized_artifact().unwrap();
        assert_eq!(artifact.dimensions(), (15, 15));
        assert!(!artifact.within_budget());
    }

    #[tokio::test]
    async fn test_decode_failure_restores_state() {
        let transport = FixtureTransport::default().with(HERO, 900_000, Bytes::from_static(b"junk"));
        let mut descriptor = canvas_descriptor("1", HERO, 900_000);

        let result = run(&use_case(transport), &mut descriptor, 1_000).await;

        assert!(matches!(result, Err(OptimizeError::Codec(_))));
        assert_eq!(descriptor.state(), AssetState::Discovered);
        assert!(descriptor.optimized_artifact().is_none());
    }

    #[tokio::test]
    async fn test_failed_reoptimization_keeps_previous_artifact() {
        let mut descriptor = optimized(canvas_descriptor("1", HERO, 900_000), 400);

        let result = run(&use_case(FixtureTransport::default()), &mut descriptor, 1_000).await;

        assert!(matches!(result, Err(OptimizeError::Transport(_))));
        assert_eq!(descriptor.state(), AssetState::OptimizedPending);
        assert_eq!(descriptor.optimized_artifact().unwrap().byte_size(), 400);
    }

    #[tokio::test]
    async fn test_zero_budget_rejected_before_search() {
        let mut descriptor = canvas_descriptor("1", HERO, 900_000);
        let result = run(&use_case(FixtureTransport::default()), &mut descriptor, 0).await;
        assert!(matches!(result, Err(OptimizeError::InvalidBudget)));
        assert_eq!(descriptor.state(), AssetState::Discovered);
    }
}
