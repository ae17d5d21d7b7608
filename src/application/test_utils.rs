use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use crate::application::ports::{
    AssetHandle, AssetTransport, CanvasNode, CodecError, DocumentApi, HostApiError, ImageCodec,
    PartialContent, TransportError,
};
use crate::domain::entities::{AssetDescriptor, OptimizedArtifact};
use crate::domain::value_objects::{Provenance, Quality, Scale, SourceAddress};

/// Source bytes understood by [`SizedCodec`]: the pixel dimensions, little endian
pub fn encoded_dimensions(width: u32, height: u32) -> Bytes {
    let mut bytes = Vec::with_capacity(8);
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    Bytes::from(bytes)
}

/// Codec whose output size is `width * height * quality * density`
pub struct SizedCodec {
    pub density: f64,
}

impl ImageCodec for SizedCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        if bytes.len() != 8 {
            return Err(CodecError::Decode("unrecognised test image".to_string()));
        }
        let width = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let height = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(DynamicImage::new_rgb8(width, height))
    }

    fn encode(
        &self,
        _image: &DynamicImage,
        width: u32,
        height: u32,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        let size = (width as f64 * height as f64 * quality.value() * self.density) as usize;
        Ok(vec![0u8; size.max(1)])
    }

    fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["jpg", "jpeg"]
    }
}

/// Transport serving fixed bodies with a declared length per address
#[derive(Default)]
pub struct FixtureTransport {
    entries: HashMap<String, (u64, Bytes)>,
}

impl FixtureTransport {
    pub fn with(mut self, address: &str, declared_size: u64, body: Bytes) -> Self {
        self.entries
            .insert(address.to_string(), (declared_size, body));
        self
    }
}

#[async_trait]
impl AssetTransport for FixtureTransport {
    async fn probe_length(&self, address: &str) -> Result<Option<u64>, TransportError> {
        Ok(self.entries.get(address).map(|(size, _)| *size))
    }

    async fn fetch_range(
        &self,
        address: &str,
        _first: u64,
        _last: u64,
    ) -> Result<PartialContent, TransportError> {
        Err(TransportError::NotFound(address.to_string()))
    }

    async fn fetch(&self, address: &str) -> Result<Bytes, TransportError> {
        self.entries
            .get(address)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| TransportError::NotFound(address.to_string()))
    }
}

/// Document that records uploads and replacements
#[derive(Default)]
pub struct RecordingDocument {
    pub nodes: Vec<CanvasNode>,
    pub failing_nodes: HashSet<String>,
    pub uploads: Mutex<Vec<(String, String, usize)>>,
    pub replacements: Mutex<Vec<(String, AssetHandle)>>,
}

#[async_trait]
impl DocumentApi for RecordingDocument {
    async fn list_nodes_with_background_image(&self) -> Result<Vec<CanvasNode>, HostApiError> {
        Ok(self.nodes.clone())
    }

    async fn upload_image(
        &self,
        bytes: Bytes,
        file_name: &str,
        mime_type: &str,
    ) -> Result<AssetHandle, HostApiError> {
        let mut uploads = self.uploads.lock();
        uploads.push((file_name.to_string(), mime_type.to_string(), bytes.len()));
        Ok(AssetHandle(format!("upload-{}", uploads.len())))
    }

    async fn replace_background_image(
        &self,
        node_id: &str,
        handle: &AssetHandle,
    ) -> Result<(), HostApiError> {
        if self.failing_nodes.contains(node_id) {
            return Err(HostApiError::NotFound(node_id.to_string()));
        }
        self.replacements
            .lock()
            .push((node_id.to_string(), handle.clone()));
        Ok(())
    }
}

pub fn canvas_descriptor(node_id: &str, address: &str, size: u64) -> AssetDescriptor {
    AssetDescriptor::new(
        Provenance::Canvas {
            node_id: node_id.to_string(),
            node_name: format!("Frame {}", node_id),
        },
        SourceAddress::new(address).unwrap(),
        size,
        None,
        None,
    )
}

pub fn repository_descriptor(record_id: &str, address: &str, size: u64) -> AssetDescriptor {
    AssetDescriptor::new(
        Provenance::Repository {
            collection_id: "posts".to_string(),
            collection_name: "Posts".to_string(),
            record_id: record_id.to_string(),
            record_name: format!("Post {}", record_id),
            field_id: "cover".to_string(),
            field_name: "Cover".to_string(),
        },
        SourceAddress::new(address).unwrap(),
        size,
        None,
        None,
    )
}

pub fn artifact(size: usize) -> OptimizedArtifact {
    OptimizedArtifact::new(
        vec![7u8; size],
        32,
        32,
        Quality::new(0.7).unwrap(),
        Scale::new(1.0).unwrap(),
        true,
        "image/jpeg",
        "asset-optimized.jpg",
    )
}

/// Descriptor already holding a pending artifact
pub fn optimized(mut descriptor: AssetDescriptor, size: usize) -> AssetDescriptor {
    descriptor.begin_search().unwrap();
    descriptor.complete_search(artifact(size)).unwrap();
    descriptor
}
