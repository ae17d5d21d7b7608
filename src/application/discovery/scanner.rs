use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::extract::{field_address, is_populated, node_address, ExtractionError};
use crate::application::pipeline::{
    BatchConfig, BatchRunner, ConcurrencyGate, ProgressBand, ProgressSink, SizeResolver,
    ThumbnailGenerator,
};
use crate::application::ports::{
    AssetTransport, CanvasNode, CollectionInfo, ContentRepository, DocumentApi, FieldInfo,
    HostApiError,
};
use crate::domain::entities::AssetDescriptor;
use crate::domain::value_objects::{OptimizationClassifier, Provenance, SourceAddress};

const CANVAS_BAND: ProgressBand = ProgressBand::new(0, 50);
const REPOSITORY_BAND: ProgressBand = ProgressBand::new(50, 100);

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Document API unavailable: {0}")]
    Document(#[from] HostApiError),
}

/// Result of both discovery phases after deduplication
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub descriptors: Vec<AssetDescriptor>,
    pub canvas_count: usize,
    pub repository_count: usize,
    pub duplicates_removed: usize,
    /// The repository phase failed as a whole and contributed nothing
    pub repository_phase_failed: bool,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub batch: BatchConfig,
    pub probe_concurrency: usize,
    pub probe_range_bytes: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            probe_concurrency: ConcurrencyGate::DEFAULT_CAPACITY,
            probe_range_bytes: SizeResolver::DEFAULT_RANGE_BYTES,
        }
    }
}

/// Image field of one record, queued for resolution
#[derive(Debug, Clone)]
struct FieldCandidate {
    collection: CollectionInfo,
    record_id: String,
    record_name: String,
    field: FieldInfo,
    value: serde_json::Value,
}

/// Enumerates image references on the canvas and in the content repository
pub struct DiscoveryScanner {
    document: Arc<dyn DocumentApi>,
    repository: Arc<dyn ContentRepository>,
    transport: Arc<dyn AssetTransport>,
    thumbnails: Arc<ThumbnailGenerator>,
    classifier: OptimizationClassifier,
    runner: BatchRunner,
    gate: ConcurrencyGate,
    probe_range_bytes: u64,
}

impl DiscoveryScanner {
    pub fn new(
        document: Arc<dyn DocumentApi>,
        repository: Arc<dyn ContentRepository>,
        transport: Arc<dyn AssetTransport>,
        thumbnails: Arc<ThumbnailGenerator>,
        classifier: OptimizationClassifier,
        config: ScannerConfig,
    ) -> Self {
        Self {
            document,
            repository,
            transport,
            thumbnails,
            classifier,
            runner: BatchRunner::new(config.batch),
            gate: ConcurrencyGate::new(config.probe_concurrency),
            probe_range_bytes: config.probe_range_bytes,
        }
    }

    /// Run both phases. Only a document API failure aborts the scan.
    pub async fn scan(&self, progress: &dyn ProgressSink) -> Result<DiscoveryOutcome, DiscoveryError> {
        // fresh memo cache per scan
        let resolver = SizeResolver::with_range_bytes(
            Arc::clone(&self.transport),
            self.gate.clone(),
            self.probe_range_bytes,
        );

        let canvas = self.scan_canvas(&resolver, progress).await?;
        info!("Canvas phase found {} image(s)", canvas.len());

        let (repository, repository_phase_failed) =
            match self.scan_repository(&resolver, progress).await {
                Ok(found) => {
                    info!("Content repository phase found {} image(s)", found.len());
                    (found, false)
                }
                Err(e) => {
                    warn!("Content repository phase failed, continuing with canvas results: {}", e);
                    (Vec::new(), true)
                }
            };
        progress.report(100);

        let canvas_count = canvas.len();
        let repository_count = repository.len();
        let mut all = canvas;
        all.extend(repository);
        let (descriptors, duplicates_removed) = deduplicate(all);

        Ok(DiscoveryOutcome {
            descriptors,
            canvas_count,
            repository_count,
            duplicates_removed,
            repository_phase_failed,
        })
    }

    async fn scan_canvas(
        &self,
        resolver: &SizeResolver,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<AssetDescriptor>, DiscoveryError> {
        let nodes = self.document.list_nodes_with_background_image().await?;
        Ok(self
            .runner
            .run(
                nodes,
                |node| self.describe_node(resolver, node),
                CANVAS_BAND,
                progress,
            )
            .await)
    }

    async fn scan_repository(
        &self,
        resolver: &SizeResolver,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<AssetDescriptor>, HostApiError> {
        let collections = self.repository.list_collections().await?;

        let mut candidates = Vec::new();
        for collection in collections {
            match self.collect_fields(&collection).await {
                Ok(found) => candidates.extend(found),
                Err(e) => warn!("Skipping collection {}: {}", collection.name, e),
            }
        }

        Ok(self
            .runner
            .run(
                candidates,
                |candidate| self.describe_field(resolver, candidate),
                REPOSITORY_BAND,
                progress,
            )
            .await)
    }

    async fn collect_fields(
        &self,
        collection: &CollectionInfo,
    ) -> Result<Vec<FieldCandidate>, HostApiError> {
        let image_fields: Vec<FieldInfo> = self
            .repository
            .list_fields(&collection.id)
            .await?
            .into_iter()
            .filter(FieldInfo::is_image)
            .collect();
        if image_fields.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.repository.list_records(&collection.id).await?;
        let mut candidates = Vec::new();
        for record in records {
            for field in &image_fields {
                let Some(value) = record.fields.get(&field.id) else {
                    continue;
                };
                if !is_populated(value) {
                    continue;
                }
                candidates.push(FieldCandidate {
                    collection: collection.clone(),
                    record_id: record.id.clone(),
                    record_name: record.name.clone(),
                    field: field.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(candidates)
    }

    async fn describe_node(
        &self,
        resolver: &SizeResolver,
        node: CanvasNode,
    ) -> Result<AssetDescriptor, ExtractionError> {
        let address = node_address(&node).inspect_err(|e| warn!("Skipping canvas item: {}", e))?;
        let provenance = Provenance::Canvas {
            node_id: node.id,
            node_name: node.name,
        };
        Ok(self.describe(resolver, provenance, address).await)
    }

    async fn describe_field(
        &self,
        resolver: &SizeResolver,
        candidate: FieldCandidate,
    ) -> Result<AssetDescriptor, ExtractionError> {
        let item = format!(
            "{}/{}/{}",
            candidate.collection.name, candidate.record_id, candidate.field.name
        );
        let address = field_address(&item, &candidate.value)
            .inspect_err(|e| warn!("Skipping repository item: {}", e))?;
        let provenance = Provenance::Repository {
            collection_id: candidate.collection.id,
            collection_name: candidate.collection.name,
            record_id: candidate.record_id,
            record_name: candidate.record_name,
            field_id: candidate.field.id,
            field_name: candidate.field.name,
        };
        Ok(self.describe(resolver, provenance, address).await)
    }

    /// Resolve size and preview concurrently
    async fn describe(
        &self,
        resolver: &SizeResolver,
        provenance: Provenance,
        address: SourceAddress,
    ) -> AssetDescriptor {
        let (size, thumbnail) = tokio::join!(
            resolver.resolve(address.as_str()),
            self.thumbnails.generate(address.as_str())
        );
        let hint = self.classifier.classify(&address, provenance.name());
        AssetDescriptor::new(provenance, address, size, hint, Some(thumbnail))
    }
}

/// Keep the first descriptor per source address, preserving discovery order
pub fn deduplicate(descriptors: Vec<AssetDescriptor>) -> (Vec<AssetDescriptor>, usize) {
    let before = descriptors.len();
    let mut seen = HashSet::new();
    let unique: Vec<AssetDescriptor> = descriptors
        .into_iter()
        .filter(|d| seen.insert(d.source_address().clone()))
        .collect();
    let removed = before - unique.len();
    (unique, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::{ScanProgress, ThumbnailConfig};
    use crate::application::ports::{
        FieldType, MockAssetTransport, MockContentRepository, MockDocumentApi, MockImageCodec,
        RecordData, TransportError,
    };
    use crate::domain::value_objects::{OptimizationHint, ProvenanceKind};
    use serde_json::json;
    use std::collections::HashMap;

    fn node(id: &str, address: Option<&str>) -> CanvasNode {
        CanvasNode {
            id: id.to_string(),
            name: format!("Frame {}", id),
            background_image_address: address.map(str::to_string),
        }
    }

    fn sized_transport(sizes: HashMap<&'static str, u64>) -> MockAssetTransport {
        let mut transport = MockAssetTransport::new();
        transport
            .expect_probe_length()
            .returning(move |address| Ok(sizes.get(address).copied()));
        transport
            .expect_fetch_range()
            .returning(|address, _, _| Err(TransportError::NotFound(address.to_string())));
        transport
            .expect_fetch()
            .returning(|address| Err(TransportError::NotFound(address.to_string())));
        transport
    }

    fn blog_repository() -> MockContentRepository {
        let mut repository = MockContentRepository::new();
        repository.expect_list_collections().returning(|| {
            Ok(vec![CollectionInfo {
                id: "c1".to_string(),
                name: "Blog".to_string(),
            }])
        });
        repository.expect_list_fields().returning(|_| {
            Ok(vec![
                FieldInfo {
                    id: "f-cover".to_string(),
                    name: "Cover".to_string(),
                    field_type: FieldType::Image,
                },
                FieldInfo {
                    id: "f-title".to_string(),
                    name: "Title".to_string(),
                    field_type: FieldType::String,
                },
            ])
        });
        repository.expect_list_records().returning(|_| {
            Ok(vec![
                RecordData {
                    id: "r1".to_string(),
                    name: "Launch".to_string(),
                    fields: HashMap::from([
                        ("f-cover".to_string(), json!({ "url": "https://cdn.test/shared.png" })),
                        ("f-title".to_string(), json!("https://cdn.test/not-an-image-field.png")),
                    ]),
                },
                RecordData {
                    id: "r2".to_string(),
                    name: "Roadmap".to_string(),
                    fields: HashMap::from([(
                        "f-cover".to_string(),
                        json!("https://cdn.test/cover-optimized.png"),
                    )]),
                },
                RecordData {
                    id: "r3".to_string(),
                    name: "Draft".to_string(),
                    fields: HashMap::from([("f-cover".to_string(), json!(null))]),
                },
            ])
        });
        repository
    }

    fn scanner(
        document: MockDocumentApi,
        repository: MockContentRepository,
        transport: MockAssetTransport,
    ) -> DiscoveryScanner {
        let transport: Arc<dyn AssetTransport> = Arc::new(transport);
        let thumbnails = Arc::new(ThumbnailGenerator::new(
            Arc::clone(&transport),
            Arc::new(MockImageCodec::new()),
            ThumbnailConfig::default(),
        ));
        DiscoveryScanner::new(
            Arc::new(document),
            Arc::new(repository),
            transport,
            thumbnails,
            OptimizationClassifier::for_target(&["jpg", "jpeg"]),
            ScannerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_scan_merges_phases_and_keeps_first_duplicate() {
        let mut document = MockDocumentApi::new();
        document.expect_list_nodes_with_background_image().returning(|| {
            Ok(vec![
                node("n1", Some("https://cdn.test/hero.png")),
                node("n2", Some("https://cdn.test/shared.png")),
            ])
        });
        let transport = sized_transport(HashMap::from([
            ("https://cdn.test/hero.png", 900_000),
            ("https://cdn.test/shared.png", 1_200_000),
            ("https://cdn.test/cover-optimized.png", 40_000),
        ]));

        let progress = ScanProgress::new();
        let outcome = scanner(document, blog_repository(), transport)
            .scan(&progress)
            .await
            .unwrap();

        assert_eq!(outcome.canvas_count, 2);
        assert_eq!(outcome.repository_count, 2);
        assert_eq!(outcome.duplicates_removed, 1);
        assert!(!outcome.repository_phase_failed);
        assert_eq!(progress.current(), 100);

        let labels: Vec<String> = outcome.descriptors.iter().map(|d| d.display_label().to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "Canvas / Frame n1",
                "Canvas / Frame n2",
                "Blog / Roadmap / Cover",
            ]
        );

        let shared = &outcome.descriptors[1];
        assert_eq!(shared.provenance().kind(), ProvenanceKind::Canvas);
        assert_eq!(shared.original_byte_size(), 1_200_000);
        assert!(shared.preview_thumbnail().unwrap().is_placeholder());

        let cover = &outcome.descriptors[2];
        assert_eq!(cover.optimization_hint(), Some(OptimizationHint::MarkerInAddress));
        assert!(cover.already_optimized());
    }

    #[tokio::test]
    async fn test_repository_failure_keeps_canvas_results() {
        let mut document = MockDocumentApi::new();
        document
            .expect_list_nodes_with_background_image()
            .returning(|| Ok(vec![node("n1", Some("https://cdn.test/hero.png"))]));
        let mut repository = MockContentRepository::new();
        repository
            .expect_list_collections()
            .returning(|| Err(HostApiError::Unavailable("cms offline".to_string())));
        let transport = sized_transport(HashMap::from([("https://cdn.test/hero.png", 10)]));

        let progress = ScanProgress::new();
        let outcome = scanner(document, repository, transport)
            .scan(&progress)
            .await
            .unwrap();

        assert!(outcome.repository_phase_failed);
        assert_eq!(outcome.descriptors.len(), 1);
        assert_eq!(outcome.repository_count, 0);
        assert_eq!(progress.current(), 100);
    }

    #[tokio::test]
    async fn test_failing_collection_is_skipped() {
        let mut document = MockDocumentApi::new();
        document
            .expect_list_nodes_with_background_image()
            .returning(|| Ok(vec![]));
        let mut repository = MockContentRepository::new();
        repository.expect_list_collections().returning(|| {
            Ok(vec![
                CollectionInfo {
                    id: "broken".to_string(),
                    name: "Broken".to_string(),
                },
                CollectionInfo {
                    id: "ok".to_string(),
                    name: "Gallery".to_string(),
                },
            ])
        });
        repository.expect_list_fields().returning(|collection_id| {
            if collection_id == "broken" {
                Err(HostApiError::Malformed("bad schema".to_string()))
            } else {
                Ok(vec![FieldInfo {
                    id: "img".to_string(),
                    name: "Image".to_string(),
                    field_type: FieldType::Image,
                }])
            }
        });
        repository.expect_list_records().returning(|_| {
            Ok(vec![RecordData {
                id: "r1".to_string(),
                name: "Sunset".to_string(),
                fields: HashMap::from([("img".to_string(), json!("https://cdn.test/sunset.png"))]),
            }])
        });
        let transport = sized_transport(HashMap::from([("https://cdn.test/sunset.png", 5)]));

        let outcome = scanner(document, repository, transport)
            .scan(&ScanProgress::new())
            .await
            .unwrap();

        assert!(!outcome.repository_phase_failed);
        assert_eq!(outcome.descriptors.len(), 1);
        assert_eq!(outcome.descriptors[0].display_label(), "Gallery / Sunset / Image");
    }

    #[tokio::test]
    async fn test_invalid_items_are_omitted() {
        let mut document = MockDocumentApi::new();
        document.expect_list_nodes_with_background_image().returning(|| {
            Ok(vec![
                node("n1", None),
                node("n2", Some("data:image/png;base64,AAAA")),
                node("n3", Some("https://cdn.test/ok.png")),
            ])
        });
        let mut repository = MockContentRepository::new();
        repository.expect_list_collections().returning(|| Ok(vec![]));
        let transport = sized_transport(HashMap::new());

        let outcome = scanner(document, repository, transport)
            .scan(&ScanProgress::new())
            .await
            .unwrap();

        assert_eq!(outcome.descriptors.len(), 1);
        // unresolvable size is kept as zero
        assert_eq!(outcome.descriptors[0].original_byte_size(), 0);
    }

    #[tokio::test]
    async fn test_document_failure_fails_scan() {
        let mut document = MockDocumentApi::new();
        document
            .expect_list_nodes_with_background_image()
            .returning(|| Err(HostApiError::Unavailable("editor closed".to_string())));

        let result = scanner(document, MockContentRepository::new(), sized_transport(HashMap::new()))
            .scan(&ScanProgress::new())
            .await;

        assert!(matches!(result, Err(DiscoveryError::Document(_))));
    }
}
