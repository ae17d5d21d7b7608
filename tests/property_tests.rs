//! Property-based tests using proptest
//!
//! Invariants of the compression search and the size probes that should
//! hold for any image size and budget.

use image::{DynamicImage, RgbImage};
use proptest::prelude::*;
use std::sync::Arc;

use asset_budget::application::pipeline::{parse_content_range_total, CompressionEngine};
use asset_budget::application::ports::{CodecError, ImageCodec};
use asset_budget::value_objects::{PolicyEntry, Quality, Scale, DEFAULT_POLICY, EMERGENCY_ENTRY};

/// Encoded size is proportional to pixel count and quality
struct AreaCodec;

impl AreaCodec {
    fn size_for(width: u32, height: u32, quality: Quality) -> usize {
        ((width as f64) * (height as f64) * quality.value()).ceil() as usize
    }
}

impl ImageCodec for AreaCodec {
    fn decode(&self, _bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        Err(CodecError::Decode("not used".to_string()))
    }

    fn encode(
        &self,
        _image: &DynamicImage,
        width: u32,
        height: u32,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(vec![0; Self::size_for(width, height, quality)])
    }

    fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["jpg"]
    }
}

fn expected_size(entry: &PolicyEntry, width: u32, height: u32) -> u64 {
    let (w, h) = entry.target_dimensions(width, height);
    AreaCodec::size_for(w, h, entry.quality) as u64
}

proptest! {
    #[test]
    fn prop_first_fitting_entry_wins(
        width in 1u32..300,
        height in 1u32..300,
        budget in 1u64..100_000,
    ) {
        let engine = CompressionEngine::new(Arc::new(AreaCodec));
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));

        let result = engine.compress(&image, budget).unwrap();

        match DEFAULT_POLICY
            .iter()
            .position(|entry| expected_size(entry, width, height) <= budget)
        {
            Some(index) => {
                let entry = DEFAULT_POLICY[index];
                prop_assert!(result.within_budget);
                prop_assert!(!result.emergency);
                prop_assert_eq!(result.quality, entry.quality);
                prop_assert_eq!(result.scale, entry.scale);
                prop_assert_eq!(result.attempts.len(), index + 1);
            }
            None => {
                prop_assert!(result.emergency);
                prop_assert_eq!(result.quality, EMERGENCY_ENTRY.quality);
                prop_assert_eq!(result.scale, EMERGENCY_ENTRY.scale);
                prop_assert_eq!(result.within_budget, result.byte_size() <= budget);
                prop_assert_eq!(result.attempts.len(), DEFAULT_POLICY.len() + 1);
            }
        }
    }

    #[test]
    fn prop_search_never_upscales(
        width in 1u32..400,
        height in 1u32..400,
        budget in 1u64..200_000,
    ) {
        let engine = CompressionEngine::new(Arc::new(AreaCodec));
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));

        let result = engine.compress(&image, budget).unwrap();

        prop_assert!(result.width >= 1 && result.width <= width);
        prop_assert!(result.height >= 1 && result.height <= height);
    }

    #[test]
    fn prop_within_budget_matches_size(
        width in 1u32..200,
        height in 1u32..200,
        budget in 1u64..50_000,
    ) {
        let engine = CompressionEngine::new(Arc::new(AreaCodec));
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));

        let result = engine.compress(&image, budget).unwrap();

        prop_assert_eq!(result.within_budget, result.byte_size() <= budget);
    }

    #[test]
    fn prop_scale_is_floored_and_clamped(
        dimension in 0u32..10_000,
        factor in 0.01f64..=1.0,
    ) {
        let scale = Scale::new(factor).unwrap();
        let scaled = scale.apply(dimension);

        prop_assert!(scaled >= 1);
        prop_assert!(scaled <= dimension.max(1));
        if dimension as f64 * factor >= 1.0 {
            prop_assert_eq!(scaled, (dimension as f64 * factor).floor() as u32);
        }
    }

    #[test]
    fn prop_smaller_scale_never_larger(
        dimension in 1u32..10_000,
        a in 0.01f64..=1.0,
        b in 0.01f64..=1.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low = Scale::new(low).unwrap().apply(dimension);
        let high = Scale::new(high).unwrap().apply(dimension);
        prop_assert!(low <= high);
    }

    #[test]
    fn prop_content_range_total_parsed(
        first in 0u64..1_000_000,
        len in 1u64..1_000_000,
        extra in 0u64..1_000_000,
    ) {
        let last = first + len - 1;
        let total = last + 1 + extra;
        let header = format!("bytes {}-{}/{}", first, last, total);
        prop_assert_eq!(parse_content_range_total(&header), Some(total));
    }

    #[test]
    fn prop_content_range_unknown_total_rejected(first in 0u64..1000, last in 0u64..1000) {
        let header = format!("bytes {}-{}/*", first, last);
        prop_assert_eq!(parse_content_range_total(&header), None);
    }

    #[test]
    fn prop_quality_percent_in_range(value in 0.001f64..=1.0) {
        let percent = Quality::new(value).unwrap().as_percent();
        prop_assert!((1..=100).contains(&percent));
    }
}
