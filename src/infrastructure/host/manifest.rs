use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::ports::{CanvasNode, CollectionInfo, FieldInfo, HostApiError, RecordData};

/// On-disk description of a document and its content repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub canvas: Vec<CanvasNode>,
    #[serde(default)]
    pub collections: Vec<CollectionManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionManifest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub records: Vec<RecordData>,
}

impl CollectionManifest {
    pub fn info(&self) -> CollectionInfo {
        CollectionInfo {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Yaml,
}

impl ManifestFormat {
    /// `.yaml`/`.yml` files are YAML, everything else JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => ManifestFormat::Yaml,
            _ => ManifestFormat::Json,
        }
    }

    pub fn parse(self, text: &str) -> Result<ProjectManifest, HostApiError> {
        match self {
            ManifestFormat::Json => {
                serde_json::from_str(text).map_err(|e| HostApiError::Malformed(e.to_string()))
            }
            ManifestFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| HostApiError::Malformed(e.to_string()))
            }
        }
    }

    pub fn render(self, manifest: &ProjectManifest) -> Result<String, HostApiError> {
        match self {
            ManifestFormat::Json => serde_json::to_string_pretty(manifest)
                .map_err(|e| HostApiError::Malformed(e.to_string())),
            ManifestFormat::Yaml => {
                serde_yaml::to_string(manifest).map_err(|e| HostApiError::Malformed(e.to_string()))
            }
        }
    }
}
