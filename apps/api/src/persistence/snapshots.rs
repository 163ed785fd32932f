use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::editor::views::PreviewView;
use crate::persistence::PersistError;

/// Uploads Markdown renderings of the preview to S3 / MinIO on explicit saves.
#[derive(Clone)]
pub struct SnapshotExporter {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl SnapshotExporter {
    pub fn new(s3: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { s3, bucket }
    }

    /// Uploads the preview and returns the object key.
    pub async fn export(&self, preview: &PreviewView) -> Result<String, PersistError> {
        let key = snapshot_key(preview.document_id, preview.revision);
        let body = preview.to_markdown();

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body.into_bytes()))
            .content_type("text/markdown")
            .send()
            .await
            .map_err(|e| PersistError::Snapshot(e.to_string()))?;

        info!("Uploaded preview snapshot to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

pub fn snapshot_key(document_id: Uuid, revision: u64) -> String {
    format!("snapshots/{document_id}/r{revision}.md")
}
