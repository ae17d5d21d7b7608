use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;

/// Small encoded preview of an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    bytes: Bytes,
    mime_type: &'static str,
    placeholder: bool,
}

impl Thumbnail {
    pub fn new(bytes: impl Into<Bytes>, mime_type: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type,
            placeholder: false,
        }
    }

    /// Fixed fallback graphic shown when a preview cannot be produced
    pub fn placeholder(bytes: impl Into<Bytes>, mime_type: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type,
            placeholder: true,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }
}
