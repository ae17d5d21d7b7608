use serde::{Deserialize, Serialize};

/// Optimization lifecycle of a discovered asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetState {
    /// Found by a scan, nothing attempted yet
    #[default]
    Discovered,
    /// Compression search in flight
    SearchRunning,
    /// An optimized artifact is attached but not yet committed
    OptimizedPending,
    /// Artifact committed back to the host document
    Applied,
}

impl AssetState {
    /// Check if transition is valid
    pub fn can_transition_to(&self, target: AssetState) -> bool {
        matches!(
            (self, target),
            (AssetState::Discovered, AssetState::SearchRunning)
                | (AssetState::OptimizedPending, AssetState::SearchRunning)
                | (AssetState::SearchRunning, AssetState::OptimizedPending)
                | (AssetState::SearchRunning, AssetState::Discovered)
                | (AssetState::OptimizedPending, AssetState::Applied)
        )
    }
}

impl std::fmt::Display for AssetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetState::Discovered => write!(f, "DISCOVERED"),
            AssetState::SearchRunning => write!(f, "SEARCH_RUNNING"),
            AssetState::OptimizedPending => write!(f, "OPTIMIZED_PENDING"),
            AssetState::Applied => write!(f, "APPLIED"),
        }
    }
}
