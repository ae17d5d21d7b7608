use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

use crate::application::ports::{CodecError, ImageCodec};
use crate::domain::value_objects::Quality;

/// Baseline JPEG output; transparent areas are flattened onto white
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegImageCodec;

impl JpegImageCodec {
    pub fn new() -> Self {
        Self
    }
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = u16::from(pixel[3]);
        let blend =
            |channel: u8| -> u8 { ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8 };
        Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])])
    })
}

impl ImageCodec for JpegImageCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        let flattened = if image.dimensions() == (width, height) {
            flatten_onto_white(image)
        } else {
            flatten_onto_white(&image.resize_exact(width, height, FilterType::Triangle))
        };

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality.as_percent())
            .encode_image(&DynamicImage::ImageRgb8(flattened))
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["jpg", "jpeg"]
    }
}
