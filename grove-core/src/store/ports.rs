use async_trait::async_trait;
use grove_model::{ContentUnit, FolderNode, MediaRecord};

use crate::error::Result;

/// Persisted folder snapshot store. Loaded wholesale at the start of a run
/// and written back batch-wise by the commit stage.
#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<FolderNode>>;
    /// Upsert by id; returns the applied records. Expected to apply the
    /// whole batch transactionally.
    async fn save_all(&self, nodes: Vec<FolderNode>) -> Result<Vec<FolderNode>>;
    async fn delete_all(&self, nodes: Vec<FolderNode>) -> Result<()>;
}

/// Content unit store for one media kind partition.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<ContentUnit>>;
    async fn save_all(&self, units: Vec<ContentUnit>) -> Result<Vec<ContentUnit>>;
    async fn delete_all(&self, units: Vec<ContentUnit>) -> Result<()>;
}

/// Media file record store for one media kind partition.
#[async_trait]
pub trait MediaRecordStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<MediaRecord>>;
    async fn save_all(&self, records: Vec<MediaRecord>) -> Result<Vec<MediaRecord>>;
    async fn delete_all(&self, records: Vec<MediaRecord>) -> Result<()>;
}
