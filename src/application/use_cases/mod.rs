mod apply_optimizations;
mod download_artifact;
mod optimize_asset;
mod scan_assets;

pub use apply_optimizations::ApplyOptimizationsUseCase;
pub use download_artifact::DownloadArtifactUseCase;
pub use optimize_asset::OptimizeAssetUseCase;
pub use scan_assets::ScanAssetsUseCase;
