use image::DynamicImage;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::domain::value_objects::Quality;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Port for raster decode/encode into the target format
#[cfg_attr(test, automock)]
pub trait ImageCodec: Send + Sync {
    /// Decode any supported source format
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError>;

    /// Resize `image` to exactly `width` x `height` and encode it in the target format
    fn encode(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;

    /// MIME type of the target format
    fn mime_type(&self) -> &'static str;

    /// File extensions of the target format, preferred one first
    fn extensions(&self) -> &'static [&'static str];
}
