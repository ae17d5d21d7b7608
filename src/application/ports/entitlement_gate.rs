use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};

/// Yes/no gate in front of scanning. Quota and licensing live behind it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EntitlementGate: Send + Sync {
    async fn is_allowed_to_scan(&self) -> bool;

    async fn record_scan_used(&self);
}
