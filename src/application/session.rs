//! Stateful facade over the use cases for one document
//!
//! Holds the descriptors of the latest scan. Locks are only held for
//! synchronous bookkeeping; all host, network and codec work happens on
//! snapshots.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::application::dto::{
    ApplySummary, AssetFailure, DownloadedArtifact, OptimizationSummary, ScanReport,
};
use crate::application::errors::{ApplyError, DownloadError, OptimizeError, ScanError};
use crate::application::pipeline::ScanProgress;
use crate::application::use_cases::{
    ApplyOptimizationsUseCase, DownloadArtifactUseCase, OptimizeAssetUseCase, ScanAssetsUseCase,
};
use crate::domain::entities::{AssetDescriptor, OptimizedArtifact};
use crate::domain::value_objects::AssetIdentity;

pub struct AssetSession {
    scan: ScanAssetsUseCase,
    optimize: OptimizeAssetUseCase,
    apply: ApplyOptimizationsUseCase,
    download: DownloadArtifactUseCase,
    descriptors: RwLock<Vec<AssetDescriptor>>,
    /// Bumped whenever the descriptor list is replaced; written under the descriptor lock
    generation: AtomicU64,
    progress: ScanProgress,
}

fn find_mut<'a>(
    descriptors: &'a mut [AssetDescriptor],
    identity: &AssetIdentity,
) -> Option<&'a mut AssetDescriptor> {
    descriptors.iter_mut().find(|d| d.identity() == identity)
}

impl AssetSession {
    pub fn new(
        scan: ScanAssetsUseCase,
        optimize: OptimizeAssetUseCase,
        apply: ApplyOptimizationsUseCase,
        download: DownloadArtifactUseCase,
    ) -> Self {
        Self {
            scan,
            optimize,
            apply,
            download,
            descriptors: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
            progress: ScanProgress::new(),
        }
    }

    /// Live scan progress, 0..=100
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub fn descriptors(&self) -> Vec<AssetDescriptor> {
        self.descriptors.read().clone()
    }

    pub fn descriptor(&self, identity: &AssetIdentity) -> Option<AssetDescriptor> {
        self.descriptors
            .read()
            .iter()
            .find(|d| d.identity() == identity)
            .cloned()
    }

    /// Discard all descriptors and rediscover. A failed scan leaves the session empty.
    pub async fn run_scan(&self) -> Result<ScanReport, ScanError> {
        {
            let mut descriptors = self.descriptors.write();
            descriptors.clear();
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        let report = self.scan.execute(&self.progress).await?;
        let mut descriptors = self.descriptors.write();
        *descriptors = report.descriptors.clone();
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(report)
    }

    /// Run the compression search for one asset and attach the result.
    ///
    /// A result that finishes after the descriptors were replaced by a rescan
    /// is dropped with [`OptimizeError::Superseded`].
    pub async fn optimize(
        &self,
        identity: &AssetIdentity,
        budget_bytes: u64,
    ) -> Result<OptimizedArtifact, OptimizeError> {
        let (address, generation) = {
            let mut descriptors = self.descriptors.write();
            let descriptor = find_mut(&mut descriptors, identity)
                .ok_or_else(|| OptimizeError::NotFound(identity.to_string()))?;
            let address = self.optimize.begin(descriptor, budget_bytes)?;
            (address, self.generation.load(Ordering::SeqCst))
        };

        let result = self.optimize.search(&address, budget_bytes).await;

        let mut descriptors = self.descriptors.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            warn!(asset = %identity, "Descriptors replaced during search, discarding result");
            return Err(OptimizeError::Superseded(identity.to_string()));
        }
        let descriptor = find_mut(&mut descriptors, identity)
            .ok_or_else(|| OptimizeError::NotFound(identity.to_string()))?;
        self.optimize.finish(descriptor, result)
    }

    /// Optimize every asset over `budget_bytes` that has no artifact yet
    pub async fn optimize_all(&self, budget_bytes: u64) -> OptimizationSummary {
        let candidates: Vec<(AssetIdentity, u64)> = self
            .descriptors
            .read()
            .iter()
            .filter(|d| d.needs_optimization(budget_bytes))
            .map(|d| (d.identity().clone(), d.original_byte_size()))
            .collect();
        info!(
            candidates = candidates.len(),
            budget = budget_bytes,
            "Optimizing assets over budget"
        );

        let mut summary = OptimizationSummary::default();
        for (identity, original) in candidates {
            match self.optimize(&identity, budget_bytes).await {
                Ok(artifact) => {
                    summary.bytes_before += original;
                    summary.bytes_after += artifact.byte_size();
                    if !artifact.within_budget() {
                        summary.over_budget.push(identity.clone());
                    }
                    summary.optimized.push(identity);
                }
                Err(e) => {
                    warn!(asset = %identity, error = %e, "Optimization failed");
                    summary.failed.push(AssetFailure {
                        identity,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            optimized = summary.optimized.len(),
            failed = summary.failed.len(),
            bytes_saved = summary.bytes_saved(),
            "Optimization finished"
        );
        summary
    }

    /// Commit one pending canvas artifact to the document
    pub async fn apply_to_document(&self, identity: &AssetIdentity) -> Result<(), ApplyError> {
        let mut snapshot = self
            .descriptor(identity)
            .ok_or_else(|| ApplyError::NotFound(identity.to_string()))?;
        self.apply.execute(&mut snapshot).await?;
        self.record_applied(std::slice::from_ref(&snapshot));
        Ok(())
    }

    /// Commit every pending canvas artifact; content-repository artifacts are skipped
    pub async fn apply_all(&self) -> ApplySummary {
        let mut pending: Vec<AssetDescriptor> = self
            .descriptors
            .read()
            .iter()
            .filter(|d| d.optimized_artifact().is_some() && !d.applied_to_document())
            .cloned()
            .collect();
        let summary = self.apply.execute_all(&mut pending).await;
        self.record_applied(&pending);
        summary
    }

    /// Optimized bytes of a content-repository asset
    pub fn download_artifact(
        &self,
        identity: &AssetIdentity,
    ) -> Result<DownloadedArtifact, DownloadError> {
        let descriptors = self.descriptors.read();
        let descriptor = descriptors
            .iter()
            .find(|d| d.identity() == identity)
            .ok_or_else(|| DownloadError::NotFound(identity.to_string()))?;
        self.download.execute(descriptor)
    }

    fn record_applied(&self, snapshots: &[AssetDescriptor]) {
        let mut descriptors = self.descriptors.write();
        for snapshot in snapshots.iter().filter(|d| d.applied_to_document()) {
            let Some(descriptor) = find_mut(&mut descriptors, snapshot.identity()) else {
                continue;
            };
            if let Err(e) = descriptor.mark_applied() {
                warn!(asset = %snapshot.identity(), error = %e, "Applied asset changed during apply");
            }
        }
    }
}
