mod manifest;
mod project_file;

pub use manifest::{CollectionManifest, ManifestFormat, ProjectManifest};
pub use project_file::ProjectFileHost;
