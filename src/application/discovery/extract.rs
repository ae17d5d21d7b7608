use serde_json::Value;
use thiserror::Error;

use crate::application::ports::CanvasNode;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::SourceAddress;

/// Per-item failure while turning host data into an address
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{item}: no image address")]
    MissingAddress { item: String },

    #[error("{item}: {source}")]
    InvalidAddress {
        item: String,
        #[source]
        source: DomainError,
    },

    #[error("{item}: unsupported field value {value}")]
    MalformedValue { item: String, value: String },
}

/// Keys under which a structured field value may expose its address
const ADDRESS_KEYS: [&str; 2] = ["url", "src"];

/// Address of a canvas node's background image
pub fn node_address(node: &CanvasNode) -> Result<SourceAddress, ExtractionError> {
    let item = format!("node {}", node.id);
    let raw = node
        .background_image_address
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| ExtractionError::MissingAddress { item: item.clone() })?;
    SourceAddress::new(raw).map_err(|source| ExtractionError::InvalidAddress { item, source })
}

/// True when an image field holds something worth resolving
pub fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Address carried by an image field value: a bare string, or an object with `url`/`src`
pub fn field_address(item: &str, value: &Value) -> Result<SourceAddress, ExtractionError> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => ADDRESS_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .ok_or_else(|| ExtractionError::MissingAddress {
                item: item.to_string(),
            })?,
        other => {
            return Err(ExtractionError::MalformedValue {
                item: item.to_string(),
                value: other.to_string(),
            })
        }
    };
    SourceAddress::new(raw).map_err(|source| ExtractionError::InvalidAddress {
        item: item.to_string(),
        source,
    })
}
