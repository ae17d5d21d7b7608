use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

use crate::application::ports::EntitlementGate;

/// In-process scan allowance: unlimited, or a fixed number of scans
#[derive(Debug, Default)]
pub struct ScanAllowance {
    limit: Option<u32>,
    used: AtomicU32,
}

impl ScanAllowance {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn limited(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            used: AtomicU32::new(0),
        }
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EntitlementGate for ScanAllowance {
    async fn is_allowed_to_scan(&self) -> bool {
        match self.limit {
            Some(limit) => self.used() < limit,
            None => true,
        }
    }

    async fn record_scan_used(&self) {
        let used = self.used.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(used, limit = ?self.limit, "scan recorded");
    }
}
