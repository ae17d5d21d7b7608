use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::errors::DomainError;

/// Resolvable location of an asset's bytes (remote URL or local path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceAddress(String);

impl SourceAddress {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidAddress("address cannot be empty".to_string()));
        }
        if trimmed.starts_with("data:") {
            return Err(DomainError::InvalidAddress(
                "inline data addresses are not resolvable assets".to_string(),
            ));
        }
        if let Ok(url) = Url::parse(trimmed) {
            if !matches!(url.scheme(), "http" | "https" | "file") && url.scheme().len() > 1 {
                return Err(DomainError::InvalidAddress(format!(
                    "unsupported scheme: {}",
                    url.scheme()
                )));
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolving this address requires a network fetch
    pub fn is_remote(&self) -> bool {
        Url::parse(&self.0)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Path component without query or fragment
    pub fn path(&self) -> String {
        match Url::parse(&self.0) {
            Ok(url) if url.scheme().len() > 1 => url.path().to_string(),
            _ => self
                .0
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Lowercased file extension of the path, if any
    pub fn extension(&self) -> Option<String> {
        let path = self.path();
        let file_name = path.rsplit(['/', '\\']).next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// File name without extension, falling back to "image"
    pub fn file_stem(&self) -> String {
        let path = self.path();
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or_default();
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => file_name,
        };
        if stem.is_empty() {
            "image".to_string()
        } else {
            stem.to_string()
        }
    }
}

impl std::fmt::Display for SourceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SourceAddress {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
