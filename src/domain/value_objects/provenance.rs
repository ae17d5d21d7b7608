use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Where a discovered asset came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Background image of a node on the visual canvas
    Canvas { node_id: String, node_name: String },
    /// Image-typed field of a content-repository record
    Repository {
        collection_id: String,
        collection_name: String,
        record_id: String,
        record_name: String,
        field_id: String,
        field_name: String,
    },
}

/// Provenance without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceKind {
    Canvas,
    Repository,
}

impl std::fmt::Display for ProvenanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvenanceKind::Canvas => write!(f, "canvas"),
            ProvenanceKind::Repository => write!(f, "repository"),
        }
    }
}

impl Provenance {
    pub fn kind(&self) -> ProvenanceKind {
        match self {
            Provenance::Canvas { .. } => ProvenanceKind::Canvas,
            Provenance::Repository { .. } => ProvenanceKind::Repository,
        }
    }

    pub fn is_canvas(&self) -> bool {
        self.kind() == ProvenanceKind::Canvas
    }

    /// Stable key for this provenance, unique within a scan
    pub fn identity(&self) -> AssetIdentity {
        match self {
            Provenance::Canvas { node_id, .. } => {
                AssetIdentity(format!("canvas:{}", escape_component(node_id)))
            }
            Provenance::Repository {
                collection_id,
                record_id,
                field_id,
                ..
            } => AssetIdentity(format!(
                "repository:{}:{}:{}",
                escape_component(collection_id),
                escape_component(record_id),
                escape_component(field_id)
            )),
        }
    }

    /// Human-readable label combining provenance and name
    pub fn display_label(&self) -> String {
        match self {
            Provenance::Canvas { node_name, .. } => format!("Canvas / {}", node_name),
            Provenance::Repository {
                collection_name,
                record_name,
                field_name,
                ..
            } => format!("{} / {} / {}", collection_name, record_name, field_name),
        }
    }

    /// Name used by the naming heuristics
    pub fn name(&self) -> &str {
        match self {
            Provenance::Canvas { node_name, .. } => node_name,
            Provenance::Repository { record_name, .. } => record_name,
        }
    }
}

/// Percent-encodes the key separator (and `%` itself) inside one key component
fn escape_component(value: &str) -> Cow<'_, str> {
    if !value.contains(|c: char| c == ':' || c == '%') {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Stable string key of a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetIdentity(String);

impl AssetIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
