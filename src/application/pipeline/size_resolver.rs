use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::concurrency_gate::ConcurrencyGate;
use crate::application::ports::AssetTransport;

static CONTENT_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*bytes\s+(?:\d+-\d+|\*)\s*/\s*(\d+)\s*$").expect("static regex is valid")
});

/// Total resource length from a `Content-Range` value such as `bytes 0-1023/48213`
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    CONTENT_RANGE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|total| total.as_str().parse().ok())
}

/// Which probe produced a size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSource {
    Metadata,
    PartialContent,
    FullDownload,
    Unresolved,
}

/// Byte-size lookup with minimal transfer, memoized per address.
///
/// Construct one per scan and drop it afterwards; the cache never evicts.
/// Concurrent calls for the same address share a single probe.
pub struct SizeResolver {
    transport: Arc<dyn AssetTransport>,
    gate: ConcurrencyGate,
    range_bytes: u64,
    cache: DashMap<String, Arc<OnceCell<(u64, SizeSource)>>>,
}

impl SizeResolver {
    pub const DEFAULT_RANGE_BYTES: u64 = 1024;

    pub fn new(transport: Arc<dyn AssetTransport>, gate: ConcurrencyGate) -> Self {
        Self::with_range_bytes(transport, gate, Self::DEFAULT_RANGE_BYTES)
    }

    pub fn with_range_bytes(
        transport: Arc<dyn AssetTransport>,
        gate: ConcurrencyGate,
        range_bytes: u64,
    ) -> Self {
        Self {
            transport,
            gate,
            range_bytes: range_bytes.max(1),
            cache: DashMap::new(),
        }
    }

    /// Byte size of `address`, or 0 when every strategy failed
    pub async fn resolve(&self, address: &str) -> u64 {
        self.resolve_with_source(address).await.0
    }

    pub async fn resolve_with_source(&self, address: &str) -> (u64, SizeSource) {
        let cell = Arc::clone(
            self.cache
                .entry(address.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );
        *cell
            .get_or_init(|| self.gate.run(|| self.probe(address)))
            .await
    }

    /// Number of addresses seen so far
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    async fn probe(&self, address: &str) -> (u64, SizeSource) {
        match self.transport.probe_length(address).await {
            Ok(Some(length)) => {
                debug!(address, length, "size from metadata probe");
                return (length, SizeSource::Metadata);
            }
            Ok(None) => debug!(address, "metadata probe reported no length"),
            Err(e) => debug!(address, error = %e, "metadata probe failed"),
        }

        match self
            .transport
            .fetch_range(address, 0, self.range_bytes - 1)
            .await
        {
            Ok(partial) => {
                if let Some(total) = partial
                    .content_range
                    .as_deref()
                    .and_then(parse_content_range_total)
                {
                    debug!(address, total, "size from content range");
                    return (total, SizeSource::PartialContent);
                }
                debug!(address, "range request returned no usable content range");
            }
            Err(e) => debug!(address, error = %e, "range request failed"),
        }

        match self.transport.fetch(address).await {
            Ok(body) => {
                debug!(address, length = body.len(), "size from full download");
                (body.len() as u64, SizeSource::FullDownload)
            }
            Err(e) => {
                warn!(address, error = %e, "Could not resolve asset size");
                (0, SizeSource::Unresolved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockAssetTransport, PartialContent, TransportError};
    use bytes::Bytes;

    fn resolver(transport: MockAssetTransport) -> SizeResolver {
        SizeResolver::new(Arc::new(transport), ConcurrencyGate::new(5))
    }

    fn failure() -> TransportError {
        TransportError::Request {
            address: "x".to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range_total("bytes 0-1023/48213"), Some(48213));
        assert_eq!(parse_content_range_total("bytes */512"), Some(512));
        assert_eq!(parse_content_range_total("  bytes 0-0 / 7 "), Some(7));
        assert_eq!(parse_content_range_total("bytes 0-1023/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[tokio::test]
    async fn test_metadata_probe_wins() {
        let mut transport = MockAssetTransport::new();
        transport
            .expect_probe_length()
            .times(1)
            .returning(|_| Ok(Some(900_000)));
        transport.expect_fetch_range().never();
        transport.expect_fetch().never();

        let resolver = resolver(transport);
        assert_eq!(
            resolver.resolve_with_source("https://a/b.png").await,
            (900_000, SizeSource::Metadata)
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_content_range() {
        let mut transport = MockAssetTransport::new();
        transport.expect_probe_length().returning(|_| Ok(None));
        transport
            .expect_fetch_range()
            .withf(|_, first, last| *first == 0 && *last == 1023)
            .times(1)
            .returning(|_, _, _| {
                Ok(PartialContent {
                    content_range: Some("bytes 0-1023/1200000".to_string()),
                    received: 1024,
                })
            });
        transport.expect_fetch().never();

        let resolver = resolver(transport);
        assert_eq!(
            resolver.resolve_with_source("https://a/b.png").await,
            (1_200_000, SizeSource::PartialContent)
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_full_download() {
        let mut transport = MockAssetTransport::new();
        transport.expect_probe_length().returning(|_| Err(failure()));
        transport
            .expect_fetch_range()
            .returning(|_, _, _| Ok(PartialContent::default()));
        transport
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Bytes::from(vec![0u8; 4096])));

        let resolver = resolver(transport);
        assert_eq!(
            resolver.resolve_with_source("https://a/b.png").await,
            (4096, SizeSource::FullDownload)
        );
    }

    #[tokio::test]
    async fn test_total_failure_yields_zero() {
        let mut transport = MockAssetTransport::new();
        transport.expect_probe_length().returning(|_| Err(failure()));
        transport.expect_fetch_range().returning(|_, _, _| Err(failure()));
        transport.expect_fetch().returning(|_| Err(failure()));

        let resolver = resolver(transport);
        assert_eq!(resolver.resolve("https://a/b.png").await, 0);
    }

    #[tokio::test]
    async fn test_memoizes_per_address() {
        let mut transport = MockAssetTransport::new();
        transport
            .expect_probe_length()
            .times(2)
            .returning(|address| Ok(Some(address.len() as u64)));

        let resolver = resolver(transport);
        let first = resolver.resolve("https://a/one.png").await;
        let second = resolver.resolve("https://a/one.png").await;
        assert_eq!(first, second);

        resolver.resolve("https://a/two-two.png").await;
        assert_eq!(resolver.cached_entries(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_probe() {
        let mut transport = MockAssetTransport::new();
        transport
            .expect_probe_length()
            .times(1)
            .returning(|_| Ok(Some(42)));

        let resolver = resolver(transport);
        let (a, b, c) = tokio::join!(
            resolver.resolve("https://a/x.png"),
            resolver.resolve("https://a/x.png"),
            resolver.resolve("https://a/x.png"),
        );
        assert_eq!((a, b, c), (42, 42, 42));
    }

    #[tokio::test]
    async fn test_failed_resolution_is_memoized_too() {
        let mut transport = MockAssetTransport::new();
        transport
            .expect_probe_length()
            .times(1)
            .returning(|_| Err(failure()));
        transport
            .expect_fetch_range()
            .times(1)
            .returning(|_, _, _| Err(failure()));
        transport.expect_fetch().times(1).returning(|_| Err(failure()));

        let resolver = resolver(transport);
        assert_eq!(resolver.resolve("https://a/x.png").await, 0);
        assert_eq!(resolver.resolve("https://a/x.png").await, 0);
    }
}
