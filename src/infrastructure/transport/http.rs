use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::{Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::application::ports::{AssetTransport, PartialContent, TransportError};

#[derive(Debug, Clone)]
pub struct HttpTransportOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpTransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Remote assets over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(options: HttpTransportOptions) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self { client })
    }

    fn url(address: &str) -> Result<Url, TransportError> {
        Url::parse(address).map_err(|e| TransportError::Request {
            address: address.to_string(),
            message: e.to_string(),
        })
    }

    fn check(address: &str, response: Response) -> Result<Response, TransportError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(TransportError::NotFound(address.to_string()))
            }
            status => Err(TransportError::Status {
                address: address.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

fn request_error(address: &str, error: reqwest::Error) -> TransportError {
    TransportError::Request {
        address: address.to_string(),
        message: error.to_string(),
    }
}

/// Declared `Content-Length`, ignoring absent, unparseable and zero values
pub(crate) fn declared_length(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|length| *length > 0)
}

#[async_trait]
impl AssetTransport for HttpTransport {
    async fn probe_length(&self, address: &str) -> Result<Option<u64>, TransportError> {
        let response = self
            .client
            .head(Self::url(address)?)
            .send()
            .await
            .map_err(|e| request_error(address, e))?;
        let response = Self::check(address, response)?;
        // HEAD bodies are empty, so read the header rather than the body size hint
        let length = declared_length(
            response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok()),
        );
        Ok(length)
    }

    async fn fetch_range(
        &self,
        address: &str,
        first: u64,
        last: u64,
    ) -> Result<PartialContent, TransportError> {
        let response = self
            .client
            .get(Self::url(address)?)
            .header(RANGE, format!("bytes={}-{}", first, last))
            .send()
            .await
            .map_err(|e| request_error(address, e))?;
        let response = Self::check(address, response)?;

        if response.status() != StatusCode::PARTIAL_CONTENT {
            debug!(address, status = %response.status(), "range not honoured");
            return Ok(PartialContent::default());
        }

        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(address, e))?;
        Ok(PartialContent {
            content_range,
            received: body.len() as u64,
        })
    }

    async fn fetch(&self, address: &str) -> Result<Bytes, TransportError> {
        let response = self
            .client
            .get(Self::url(address)?)
            .send()
            .await
            .map_err(|e| request_error(address, e))?;
        Self::check(address, response)?
            .bytes()
            .await
            .map_err(|e| request_error(address, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_length() {
        assert_eq!(declared_length(Some("48213")), Some(48213));
        assert_eq!(declared_length(Some(" 12 ")), Some(12));
        assert_eq!(declared_length(Some("0")), None);
        assert_eq!(declared_length(Some("abc")), None);
        assert_eq!(declared_length(None), None);
    }

    #[tokio::test]
    async fn test_invalid_url_is_request_error() {
        let transport = HttpTransport::new(HttpTransportOptions::default()).unwrap();
        let result = transport.fetch("not a url").await;
        assert!(matches!(result, Err(TransportError::Request { .. })));
    }
}
