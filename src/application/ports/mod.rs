mod asset_transport;
mod content_repository;
mod document_api;
mod entitlement_gate;
mod image_codec;

pub use asset_transport::{AssetTransport, PartialContent, TransportError};
pub use content_repository::{
    CollectionInfo, ContentRepository, FieldInfo, FieldType, RecordData,
};
pub use document_api::{AssetHandle, CanvasNode, DocumentApi, HostApiError};
pub use entitlement_gate::EntitlementGate;
pub use image_codec::{CodecError, ImageCodec};

#[cfg(test)]
pub use asset_transport::MockAssetTransport;
#[cfg(test)]
pub use content_repository::MockContentRepository;
#[cfg(test)]
pub use document_api::MockDocumentApi;
#[cfg(test)]
pub use entitlement_gate::MockEntitlementGate;
#[cfg(test)]
pub use image_codec::MockImageCodec;
