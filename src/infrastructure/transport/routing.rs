use async_trait::async_trait;
use bytes::Bytes;

use super::{HttpTransport, LocalFileTransport};
use crate::application::ports::{AssetTransport, PartialContent, TransportError};

/// Sends `http(s)://` addresses to the network and everything else to disk
pub struct RoutingTransport {
    http: HttpTransport,
    local: LocalFileTransport,
}

impl RoutingTransport {
    pub fn new(http: HttpTransport, local: LocalFileTransport) -> Self {
        Self { http, local }
    }

    fn route(&self, address: &str) -> &dyn AssetTransport {
        let lower = address.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            &self.http
        } else {
            &self.local
        }
    }
}

#[async_trait]
impl AssetTransport for RoutingTransport {
    async fn probe_length(&self, address: &str) -> Result<Option<u64>, TransportError> {
        self.route(address).probe_length(address).await
    }

    async fn fetch_range(
        &self,
        address: &str,
        first: u64,
        last: u64,
    ) -> Result<PartialContent, TransportError> {
        self.route(address).fetch_range(address, first, last).await
    }

    async fn fetch(&self, address: &str) -> Result<Bytes, TransportError> {
        self.route(address).fetch(address).await
    }
}
