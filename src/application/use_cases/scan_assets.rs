use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::discovery::DiscoveryScanner;
use crate::application::dto::ScanReport;
use crate::application::errors::ScanError;
use crate::application::pipeline::ScanProgress;
use crate::application::ports::EntitlementGate;

/// Use case: discover every image asset in the document
pub struct ScanAssetsUseCase {
    entitlement: Arc<dyn EntitlementGate>,
    scanner: Arc<DiscoveryScanner>,
}

impl ScanAssetsUseCase {
    pub fn new(entitlement: Arc<dyn EntitlementGate>, scanner: Arc<DiscoveryScanner>) -> Self {
        Self {
            entitlement,
            scanner,
        }
    }

    /// Run a full scan, publishing 0..=100 on `progress` while it runs
    pub async fn execute(&self, progress: &ScanProgress) -> Result<ScanReport, ScanError> {
        if !self.entitlement.is_allowed_to_scan().await {
            info!("Scan refused by entitlement gate");
            return Err(ScanError::NotEntitled);
        }

        let scan_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%scan_id, "Scan started");

        progress.reset();
        let result = self.scanner.scan(progress).await;
        progress.reset();

        let outcome = result.inspect_err(|e| error!(%scan_id, error = %e, "Scan failed"))?;
        self.entitlement.record_scan_used().await;

        let report = ScanReport {
            scan_id,
            started_at,
            finished_at: Utc::now(),
            descriptors: outcome.descriptors,
            canvas_count: outcome.canvas_count,
            repository_count: outcome.repository_count,
            duplicates_removed: outcome.duplicates_removed,
            repository_phase_failed: outcome.repository_phase_failed,
        };
        info!(
            %scan_id,
            assets = report.descriptors.len(),
            elapsed_ms = report.elapsed_ms(),
            "Scan finished"
        );
        Ok(report)
    }
}
