use image::{imageops::FilterType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::application::ports::{AssetTransport, CodecError, ImageCodec, TransportError};
use crate::domain::value_objects::Thumbnail;

const THUMBNAIL_MIME: &str = "image/png";

#[derive(Debug, Error)]
enum PreviewError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Failed to draw preview: {0}")]
    Draw(String),

    #[error("Preview worker failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Edge length of the square preview in pixels
    pub size: u32,
    pub timeout: Duration,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: 64,
            timeout: Duration::from_secs(2),
        }
    }
}

/// Best-effort square preview generation.
///
/// Fetches through the transport directly (not behind the probe gate),
/// decodes and downsamples off the async runtime, and falls back to a fixed
/// placeholder on timeout or any failure.
pub struct ThumbnailGenerator {
    transport: Arc<dyn AssetTransport>,
    codec: Arc<dyn ImageCodec>,
    config: ThumbnailConfig,
    placeholder: Thumbnail,
}

impl ThumbnailGenerator {
    pub fn new(
        transport: Arc<dyn AssetTransport>,
        codec: Arc<dyn ImageCodec>,
        config: ThumbnailConfig,
    ) -> Self {
        let size = config.size.max(1);
        let placeholder = Thumbnail::placeholder(placeholder_png(size), THUMBNAIL_MIME);
        Self {
            transport,
            codec,
            config,
            placeholder,
        }
    }

    pub fn placeholder(&self) -> &Thumbnail {
        &self.placeholder
    }

    /// Preview for `address`; never fails
    pub async fn generate(&self, address: &str) -> Thumbnail {
        match tokio::time::timeout(self.config.timeout, self.render(address)).await {
            Ok(Ok(thumbnail)) => thumbnail,
            Ok(Err(e)) => {
                debug!(address, error = %e, "thumbnail failed, using placeholder");
                self.placeholder.clone()
            }
            Err(_) => {
                debug!(address, timeout = ?self.config.timeout, "thumbnail timed out, using placeholder");
                self.placeholder.clone()
            }
        }
    }

    async fn render(&self, address: &str) -> Result<Thumbnail, PreviewError> {
        let bytes = self.transport.fetch(address).await?;
        let codec = Arc::clone(&self.codec);
        let size = self.config.size.max(1);

        let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, PreviewError> {
            let image = codec.decode(&bytes)?;
            let preview = image.resize_to_fill(size, size, FilterType::Triangle);
            encode_png(&preview)
        })
        .await
        .map_err(|e| PreviewError::Join(e.to_string()))??;

        Ok(Thumbnail::new(encoded, THUMBNAIL_MIME))
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PreviewError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PreviewError::Draw(e.to_string()))?;
    Ok(buffer)
}

/// Neutral grey tile with a darker frame
fn placeholder_png(size: u32) -> Vec<u8> {
    let border = (size / 8).max(1);
    let tile = RgbaImage::from_fn(size, size, |x, y| {
        let edge = x < border || y < border || x >= size - border || y >= size - border;
        if edge {
            Rgba([176, 176, 176, 255])
        } else {
            Rgba([224, 224, 224, 255])
        }
    });
    encode_png(&DynamicImage::ImageRgba8(tile)).unwrap_or_default()
}
