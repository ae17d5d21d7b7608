use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::HostApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: String,
    pub name: String,
}

/// Declared type of a collection field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Image,
    File,
    String,
    FormattedText,
    Number,
    Boolean,
    Date,
    Link,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldInfo {
    pub fn is_image(&self) -> bool {
        self.field_type == FieldType::Image
    }
}

/// One record with its raw field values keyed by field id.
///
/// An image field value is either a direct address string or an object
/// exposing the address under `url` (or `src`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
}

/// Port for the structured content repository
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, HostApiError>;

    async fn list_fields(&self, collection_id: &str) -> Result<Vec<FieldInfo>, HostApiError>;

    async fn list_records(&self, collection_id: &str) -> Result<Vec<RecordData>, HostApiError>;
}
