mod asset_state;
mod compression_policy;
mod optimization_marker;
mod provenance;
mod source_address;
mod thumbnail;

pub use asset_state::AssetState;
pub use compression_policy::{PolicyEntry, Quality, Scale, DEFAULT_POLICY, EMERGENCY_ENTRY};
pub use optimization_marker::{OptimizationClassifier, OptimizationHint};
pub use provenance::{AssetIdentity, Provenance, ProvenanceKind};
pub use source_address::SourceAddress;
pub use thumbnail::Thumbnail;
