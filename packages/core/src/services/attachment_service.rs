//! Image attachment uploads.
//!
//! Bytes are written to `<images_dir>/<uuid>.<ext>` and the metadata recorded
//! in the `images` table. Documents reference attachments by id through the
//! image node's `attachmentId` attribute.

use crate::db::NodeStore;
use crate::models::Attachment;
use crate::services::error::AttachmentError;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

/// What the editor needs to embed an uploaded image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAttachment {
    pub id: String,
    pub path: String,
    pub size: i64,
}

pub struct AttachmentService {
    store: Arc<dyn NodeStore>,
    images_dir: PathBuf,
}

impl AttachmentService {
    pub fn new(store: Arc<dyn NodeStore>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            images_dir: images_dir.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Store `bytes` and record the upload
    ///
    /// The stored file keeps the original extension (lowercased); names without
    /// one are stored without an extension. If recording the metadata fails the
    /// written file is removed again.
    pub async fn upload(
        &self,
        note_id: Option<&str>,
        original_name: &str,
        bytes: &[u8],
        mime_type: Option<&str>,
    ) -> Result<UploadedAttachment, AttachmentError> {
        fs::create_dir_all(&self.images_dir).await?;

        let id = Uuid::new_v4().to_string();
        let filename = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.clone(),
        };
        let path = self.images_dir.join(&filename);
        fs::write(&path, bytes).await?;

        let attachment = Attachment {
            id: id.clone(),
            note_id: note_id.map(str::to_string),
            filename,
            original_name: original_name.to_string(),
            path: path.to_string_lossy().into_owned(),
            size: bytes.len() as i64,
            mime_type: mime_type.map(str::to_string),
            created_at: Utc::now(),
        };

        let stored = match self.store.create_attachment(attachment).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Failed to record attachment {}: {:#}", id, e);
                if let Err(cleanup) = fs::remove_file(&path).await {
                    tracing::warn!("Could not remove orphaned file {}: {}", path.display(), cleanup);
                }
                return Err(e.into());
            }
        };

        tracing::info!("Stored attachment {} ({} bytes)", stored.id, stored.size);
        Ok(UploadedAttachment {
            id: stored.id,
            path: stored.path,
            size: stored.size,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<Attachment>, AttachmentError> {
        Ok(self.store.get_attachment(id).await?)
    }

    pub async fn path_of(&self, id: &str) -> Result<PathBuf, AttachmentError> {
        self.get(id)
            .await?
            .map(|a| PathBuf::from(a.path))
            .ok_or_else(|| AttachmentError::NotFound { id: id.to_string() })
    }

    /// Remove the metadata row and the stored file
    pub async fn delete(&self, id: &str) -> Result<(), AttachmentError> {
        let attachment = self
            .get(id)
            .await?
            .ok_or_else(|| AttachmentError::NotFound { id: id.to_string() })?;

        self.store.delete_attachment(id).await?;
        match fs::remove_file(&attachment.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Attachment file {} was already gone", attachment.path);
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
}
