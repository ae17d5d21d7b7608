use async_trait::async_trait;
use bytes::Bytes;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use url::Url;

use crate::application::ports::{AssetTransport, PartialContent, TransportError};

/// Assets on the local filesystem: `file://` URLs or paths relative to a root
#[derive(Debug, Clone)]
pub struct LocalFileTransport {
    root: PathBuf,
}

impl LocalFileTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `address`
    pub fn resolve(&self, address: &str) -> Result<PathBuf, TransportError> {
        if address.starts_with("file:") {
            let url = Url::parse(address).map_err(|e| TransportError::Request {
                address: address.to_string(),
                message: e.to_string(),
            })?;
            return url.to_file_path().map_err(|_| TransportError::Request {
                address: address.to_string(),
                message: "not a local file URL".to_string(),
            });
        }
        let path = Path::new(address);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.root.join(path))
        }
    }
}

fn io_error(address: &str, error: std::io::Error) -> TransportError {
    if error.kind() == ErrorKind::NotFound {
        TransportError::NotFound(address.to_string())
    } else {
        TransportError::Io(error)
    }
}

#[async_trait]
impl AssetTransport for LocalFileTransport {
    async fn probe_length(&self, address: &str) -> Result<Option<u64>, TransportError> {
        let metadata = fs::metadata(self.resolve(address)?)
            .await
            .map_err(|e| io_error(address, e))?;
        Ok(Some(metadata.len()).filter(|len| *len > 0))
    }

    async fn fetch_range(
        &self,
        address: &str,
        first: u64,
        last: u64,
    ) -> Result<PartialContent, TransportError> {
        let mut file = File::open(self.resolve(address)?)
            .await
            .map_err(|e| io_error(address, e))?;
        let total = file.metadata().await?.len();
        if first >= total || last < first {
            return Ok(PartialContent::default());
        }

        let last = last.min(total - 1);
        file.seek(SeekFrom::Start(first)).await?;
        let mut buffer = Vec::new();
        (&mut file)
            .take(last - first + 1)
            .read_to_end(&mut buffer)
            .await?;

        Ok(PartialContent {
            content_range: Some(format!("bytes {}-{}/{}", first, last, total)),
            received: buffer.len() as u64,
        })
    }

    async fn fetch(&self, address: &str) -> Result<Bytes, TransportError> {
        let bytes = fs::read(self.resolve(address)?)
            .await
            .map_err(|e| io_error(address, e))?;
        Ok(Bytes::from(bytes))
    }
}
