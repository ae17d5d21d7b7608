use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::manifest::{CollectionManifest, ManifestFormat, ProjectManifest};
use crate::application::ports::{
    AssetHandle, CanvasNode, CollectionInfo, ContentRepository, DocumentApi, FieldInfo,
    HostApiError, RecordData,
};

/// Document and content repository backed by a project manifest on disk.
///
/// Uploaded images are written into `asset_dir`; replacing a background
/// rewrites the manifest in place.
pub struct ProjectFileHost {
    manifest_path: PathBuf,
    asset_dir: PathBuf,
    format: ManifestFormat,
    manifest: RwLock<ProjectManifest>,
}

impl ProjectFileHost {
    pub async fn open(
        manifest_path: impl Into<PathBuf>,
        asset_dir: impl Into<PathBuf>,
    ) -> Result<Self, HostApiError> {
        let manifest_path = manifest_path.into();
        let format = ManifestFormat::from_path(&manifest_path);
        let text = fs::read_to_string(&manifest_path).await?;
        let manifest = format.parse(&text)?;
        info!(
            "Loaded project {:?}: {} canvas node(s), {} collection(s)",
            manifest_path,
            manifest.canvas.len(),
            manifest.collections.len()
        );
        Ok(Self {
            manifest_path,
            asset_dir: asset_dir.into(),
            format,
            manifest: RwLock::new(manifest),
        })
    }

    /// Directory relative addresses in the manifest are resolved against
    pub fn project_root(&self) -> &Path {
        self.manifest_path.parent().unwrap_or(Path::new("."))
    }

    pub async fn snapshot(&self) -> ProjectManifest {
        self.manifest.read().await.clone()
    }

    /// Address stored in the manifest for a file written to `path`
    fn address_for(&self, path: &Path) -> String {
        path.strip_prefix(self.project_root())
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    async fn unused_path(&self, file_name: &str) -> PathBuf {
        let candidate = self.asset_dir.join(file_name);
        if fs::metadata(&candidate).await.is_err() {
            return candidate;
        }
        let tag = Uuid::new_v4().simple().to_string();
        self.asset_dir.join(format!("{}-{}", &tag[..8], file_name))
    }

    /// Write through a temp file and rename
    async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), HostApiError> {
        let temp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&temp_path, contents).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, path).await {
            warn!("Failed to move {:?} into place: {}", temp_path, e);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn collection<'a>(
        manifest: &'a ProjectManifest,
        collection_id: &str,
    ) -> Result<&'a CollectionManifest, HostApiError> {
        manifest
            .collections
            .iter()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| HostApiError::NotFound(format!("collection {}", collection_id)))
    }
}

#[async_trait]
impl DocumentApi for ProjectFileHost {
    async fn list_nodes_with_background_image(&self) -> Result<Vec<CanvasNode>, HostApiError> {
        Ok(self
            .manifest
            .read()
            .await
            .canvas
            .iter()
            .filter(|node| node.background_image_address.is_some())
            .cloned()
            .collect())
    }

    async fn upload_image(
        &self,
        bytes: Bytes,
        file_name: &str,
        mime_type: &str,
    ) -> Result<AssetHandle, HostApiError> {
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| HostApiError::Malformed(format!("invalid file name {:?}", file_name)))?;

        fs::create_dir_all(&self.asset_dir).await?;
        let path = self.unused_path(file_name).await;
        Self::write_atomically(&path, &bytes).await?;
        debug!(?path, mime_type, bytes = bytes.len(), "image uploaded");
        Ok(AssetHandle(self.address_for(&path)))
    }

    async fn replace_background_image(
        &self,
        node_id: &str,
        handle: &AssetHandle,
    ) -> Result<(), HostApiError> {
        let mut manifest = self.manifest.write().await;
        let node = manifest
            .canvas
            .iter_mut()
            .find(|node| node.id == node_id)
            .ok_or_else(|| HostApiError::NotFound(format!("node {}", node_id)))?;
        let previous = node.background_image_address.replace(handle.0.clone());

        let rendered = self.format.render(&manifest)?;
        if let Err(e) = Self::write_atomically(&self.manifest_path, rendered.as_bytes()).await {
            // keep memory and disk in agreement
            if let Some(node) = manifest.canvas.iter_mut().find(|node| node.id == node_id) {
                node.background_image_address = previous;
            }
            return Err(e);
        }
        info!(node_id, address = %handle, "Background image replaced");
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for ProjectFileHost {
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, HostApiError> {
        Ok(self
            .manifest
            .read()
            .await
            .collections
            .iter()
            .map(|c| c.info())
            .collect())
    }

    async fn list_fields(&self, collection_id: &str) -> Result<Vec<FieldInfo>, HostApiError> {
        let manifest = self.manifest.read().await;
        Ok(Self::collection(&manifest, collection_id)?.fields.clone())
    }

    async fn list_records(&self, collection_id: &str) -> Result<Vec<RecordData>, HostApiError> {
        let manifest = self.manifest.read().await;
        Ok(Self::collection(&manifest, collection_id)?.records.clone())
    }
}
