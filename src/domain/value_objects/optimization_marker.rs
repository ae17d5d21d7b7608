use serde::{Deserialize, Serialize};

use super::SourceAddress;

/// Which naming rule flagged an asset as already optimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationHint {
    /// The address path contains the marker token
    MarkerInAddress,
    /// The node or record name contains the marker token
    MarkerInName,
    /// The address already carries the target format's extension
    TargetFormat,
}

/// Naming heuristics that detect a prior optimization pass.
///
/// Rules are checked in declaration order of [`OptimizationHint`]; the first
/// match wins. Matching is ASCII case-insensitive.
#[derive(Debug, Clone)]
pub struct OptimizationClassifier {
    marker: String,
    target_extensions: Vec<String>,
}

impl OptimizationClassifier {
    pub const DEFAULT_MARKER: &'static str = "optimized";

    pub fn new(marker: impl Into<String>, target_extensions: &[&str]) -> Self {
        Self {
            marker: marker.into().to_ascii_lowercase(),
            target_extensions: target_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Classifier with the default marker for the given target extensions
    pub fn for_target(target_extensions: &[&str]) -> Self {
        Self::new(Self::DEFAULT_MARKER, target_extensions)
    }

    pub fn classify(&self, address: &SourceAddress, name: &str) -> Option<OptimizationHint> {
        if !self.marker.is_empty() {
            if address.path().to_ascii_lowercase().contains(&self.marker) {
                return Some(OptimizationHint::MarkerInAddress);
            }
            if name.to_ascii_lowercase().contains(&self.marker) {
                return Some(OptimizationHint::MarkerInName);
            }
        }
        match address.extension() {
            Some(ext) if self.target_extensions.iter().any(|t| *t == ext) => {
                Some(OptimizationHint::TargetFormat)
            }
            _ => None,
        }
    }

    pub fn is_already_optimized(&self, address: &SourceAddress, name: &str) -> bool {
        self.classify(address, name).is_some()
    }

    /// Marker-tagged file name for a freshly optimized artifact
    pub fn artifact_file_name(&self, stem: &str, extension: &str) -> String {
        if stem.to_ascii_lowercase().contains(&self.marker) {
            format!("{}.{}", stem, extension)
        } else {
            format!("{}-{}.{}", stem, self.marker, extension)
        }
    }
}
