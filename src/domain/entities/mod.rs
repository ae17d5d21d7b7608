mod asset;

pub use asset::{AssetDescriptor, OptimizedArtifact};
