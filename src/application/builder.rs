use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::application::discovery::DiscoveryScanner;
use crate::application::pipeline::{CompressionEngine, ThumbnailGenerator};
use crate::application::ports::{
    AssetTransport, ContentRepository, DocumentApi, EntitlementGate, ImageCodec,
};
use crate::application::session::AssetSession;
use crate::application::use_cases::{
    ApplyOptimizationsUseCase, DownloadArtifactUseCase, OptimizeAssetUseCase, ScanAssetsUseCase,
};
use crate::config::Config;
use crate::domain::value_objects::OptimizationClassifier;
use crate::infrastructure::{
    codec::JpegImageCodec,
    entitlement::ScanAllowance,
    host::ProjectFileHost,
    transport::{HttpTransport, HttpTransportOptions, LocalFileTransport, RoutingTransport},
};

pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// Wires ports, pipeline components and use cases into an [`AssetSession`]
pub struct SessionBuilder {
    config: Config,
    document: Option<Arc<dyn DocumentApi>>,
    repository: Option<Arc<dyn ContentRepository>>,
    entitlement: Option<Arc<dyn EntitlementGate>>,
    transport: Option<Arc<dyn AssetTransport>>,
    codec: Option<Arc<dyn ImageCodec>>,
}

impl SessionBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            document: None,
            repository: None,
            entitlement: None,
            transport: None,
            codec: None,
        }
    }

    pub fn with_document(mut self, document: Arc<dyn DocumentApi>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_content_repository(mut self, repository: Arc<dyn ContentRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Use one project file as both document and content repository
    pub fn with_project(self, host: Arc<ProjectFileHost>) -> Self {
        self.with_document(host.clone()).with_content_repository(host)
    }

    pub fn with_entitlement(mut self, entitlement: Arc<dyn EntitlementGate>) -> Self {
        self.entitlement = Some(entitlement);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn AssetTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Fill unset adapters: HTTP + local transport rooted at `local_root`,
    /// JPEG codec and an unlimited scan allowance
    pub fn with_default_adapters(mut self, local_root: impl Into<PathBuf>) -> Result<Self, BuildError> {
        if self.transport.is_none() {
            let http = HttpTransport::new(HttpTransportOptions {
                connect_timeout: Duration::from_secs(self.config.http_connect_timeout_secs),
                request_timeout: Duration::from_secs(self.config.http_request_timeout_secs),
            })?;
            let local = LocalFileTransport::new(local_root);
            self.transport = Some(Arc::new(RoutingTransport::new(http, local)));
        }
        if self.codec.is_none() {
            self.codec = Some(Arc::new(JpegImageCodec::new()));
        }
        if self.entitlement.is_none() {
            self.entitlement = Some(Arc::new(ScanAllowance::unlimited()));
        }
        Ok(self)
    }

    pub fn build(self) -> Result<AssetSession, BuildError> {
        self.config.validate()?;

        let document = self.document.ok_or("Document API not configured")?;
        let repository = self
            .repository
            .ok_or("Content repository not configured")?;
        let entitlement = self.entitlement.ok_or("Entitlement gate not configured")?;
        let transport = self.transport.ok_or("Asset transport not configured")?;
        let codec = self.codec.ok_or("Image codec not configured")?;

        let classifier = OptimizationClassifier::for_target(codec.extensions());
        let thumbnails = Arc::new(ThumbnailGenerator::new(
            Arc::clone(&transport),
            Arc::clone(&codec),
            self.config.thumbnail(),
        ));
        let scanner = Arc::new(DiscoveryScanner::new(
            Arc::clone(&document),
            repository,
            Arc::clone(&transport),
            thumbnails,
            classifier.clone(),
            self.config.scanner(),
        ));
        let engine = Arc::new(CompressionEngine::new(Arc::clone(&codec)));

        info!(
            probe_concurrency = self.config.probe_concurrency,
            chunk_size = self.config.scan_chunk_size,
            target = codec.mime_type(),
            "Asset session initialized"
        );

        Ok(AssetSession::new(
            ScanAssetsUseCase::new(entitlement, scanner),
            OptimizeAssetUseCase::new(transport, engine, classifier),
            ApplyOptimizationsUseCase::new(document),
            DownloadArtifactUseCase::new(),
        ))
    }
}
